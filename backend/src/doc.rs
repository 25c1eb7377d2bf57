//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer, the
//! response schemas they reference and the session cookie security scheme.
//! The document backs Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::categories::{CategoryResponse, CreateCategoryRequest};
use crate::inbound::http::dashboard::{
    CalendarResponse, DayResponse, SelectDateRequest, SelectionResponse, SummaryCardResponse,
    SummaryResponse,
};
use crate::inbound::http::sessions::{
    CompleteProfileRequest, CurrencyResponse, ProfileResponse, SessionErrorResponse,
    SessionResponse, SignInOutcomeKind, SignInRequest, SignInResponse,
};
use crate::inbound::http::transactions::{
    CategorySnapshotResponse, CreateTransactionRequest, TransactionResponse,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted client cookie issued on the first /api/v1/session call.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Tally API",
        description = "Session reconciliation, categories, transactions and dashboard aggregates."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::sessions::get_session,
        crate::inbound::http::sessions::bootstrap_session,
        crate::inbound::http::sessions::sign_in,
        crate::inbound::http::sessions::complete_profile,
        crate::inbound::http::sessions::retry_profile_load,
        crate::inbound::http::sessions::sign_out,
        crate::inbound::http::sessions::clear_error,
        crate::inbound::http::sessions::list_currencies,
        crate::inbound::http::categories::list_categories,
        crate::inbound::http::categories::create_category,
        crate::inbound::http::transactions::list_transactions,
        crate::inbound::http::transactions::create_transaction,
        crate::inbound::http::transactions::delete_transaction,
        crate::inbound::http::dashboard::get_summary,
        crate::inbound::http::dashboard::get_calendar,
        crate::inbound::http::dashboard::toggle_selection,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        ProfileResponse,
        SessionErrorResponse,
        SessionResponse,
        SignInRequest,
        SignInOutcomeKind,
        SignInResponse,
        CompleteProfileRequest,
        CurrencyResponse,
        CategoryResponse,
        CreateCategoryRequest,
        CategorySnapshotResponse,
        TransactionResponse,
        CreateTransactionRequest,
        SummaryCardResponse,
        SummaryResponse,
        DayResponse,
        SelectionResponse,
        CalendarResponse,
        SelectDateRequest,
    )),
    tags(
        (name = "session", description = "Sign-in, profile completion and sign-out"),
        (name = "categories", description = "Default and custom categories"),
        (name = "transactions", description = "Ledger entries of the signed-in user"),
        (name = "dashboard", description = "Summary cards and the calendar heat-map"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
