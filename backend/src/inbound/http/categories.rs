//! Category handlers.
//!
//! ```text
//! GET  /api/v1/categories
//! POST /api/v1/categories
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Category;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_category_name, require};

/// A category of the signed-in user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    #[schema(example = "Groceries")]
    pub name: String,
    #[schema(example = "🛒")]
    pub glyph: String,
    pub is_default: bool,
}

impl From<Category> for CategoryResponse {
    fn from(value: Category) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name.to_string(),
            glyph: value.glyph,
            is_default: value.is_default,
        }
    }
}

/// New custom category.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[schema(example = "Coffee")]
    pub name: Option<String>,
    /// Defaults to 📁.
    #[schema(example = "☕")]
    pub glyph: Option<String>,
}

/// List the user's categories, seeding the defaults on first use.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Categories", body = [CategoryResponse]),
        (status = 401, description = "Not signed in", body = crate::domain::Error),
        (status = 403, description = "Profile incomplete", body = crate::domain::Error),
        (status = 503, description = "Store unavailable", body = crate::domain::Error)
    ),
    tags = ["categories"],
    operation_id = "listCategories"
)]
#[get("/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CategoryResponse>>> {
    let active = state.dashboard(&session).await?;
    let categories = active.dashboard.categories().sync().await?;
    Ok(web::Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// Create a custom category.
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = CategoryResponse),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 401, description = "Not signed in", body = crate::domain::Error),
        (status = 409, description = "Name already used", body = crate::domain::Error)
    ),
    tags = ["categories"],
    operation_id = "createCategory"
)]
#[post("/categories")]
pub async fn create_category(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCategoryRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let field = FieldName::new("name");
    let name = parse_category_name(&require(payload.name, field)?, field)?;

    let active = state.dashboard(&session).await?;
    let category = active
        .dashboard
        .categories()
        .add_category(name.as_ref(), payload.glyph.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(CategoryResponse::from(category)))
}
