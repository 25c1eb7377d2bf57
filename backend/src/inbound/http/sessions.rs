//! Sign-in, profile completion and session state handlers.
//!
//! ```text
//! GET    /api/v1/session
//! POST   /api/v1/session/bootstrap
//! POST   /api/v1/session/sign-in
//! POST   /api/v1/session/profile
//! POST   /api/v1/session/retry
//! POST   /api/v1/session/sign-out
//! DELETE /api/v1/session/error
//! GET    /api/v1/currencies
//! ```

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CurrencyOption, DeviceProfile, FailureKind, LandingView, SUPPORTED_CURRENCIES, SessionError,
    SessionErrorCode, SessionSnapshot, SignInOutcome, SignInPhase, UserProfile,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::session_failure;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_currency, parse_display_name, require,
};

/// Profile of the signed-in user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[schema(example = "dev-user")]
    pub id: String,
    #[schema(example = "Alex")]
    pub name: String,
    pub email: String,
    #[schema(example = "EUR")]
    pub currency: String,
    pub avatar_url: Option<String>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(value: UserProfile) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            email: value.email,
            currency: value.currency.to_string(),
            avatar_url: value.avatar_url.map(String::from),
        }
    }
}

/// The `lastError` slot.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionErrorResponse {
    #[schema(value_type = String, example = "transport")]
    pub kind: FailureKind,
    #[schema(value_type = String, example = "network_failure")]
    pub code: SessionErrorCode,
    pub message: String,
}

impl From<SessionError> for SessionErrorResponse {
    fn from(value: SessionError) -> Self {
        Self {
            kind: value.kind(),
            code: value.code(),
            message: value.message().to_owned(),
        }
    }
}

/// Unified session state plus the view the front end should render.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: Option<ProfileResponse>,
    pub is_loading: bool,
    pub is_new_user: bool,
    pub last_error: Option<SessionErrorResponse>,
    #[schema(value_type = String, example = "resolved")]
    pub phase: SignInPhase,
    #[schema(value_type = String, example = "dashboard")]
    pub landing: LandingView,
}

impl From<SessionSnapshot> for SessionResponse {
    fn from(value: SessionSnapshot) -> Self {
        let landing = value.landing();
        Self {
            user: value.user.map(ProfileResponse::from),
            is_loading: value.is_loading,
            is_new_user: value.is_new_user,
            last_error: value.last_error.map(SessionErrorResponse::from),
            phase: value.phase,
            landing,
        }
    }
}

/// Device hints used to choose between popup and redirect sign-in.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// Defaults to the request's `User-Agent` header.
    pub user_agent: Option<String>,
    pub viewport_width: Option<u32>,
    pub touch: Option<bool>,
}

/// How a sign-in attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignInOutcomeKind {
    Completed,
    Redirecting,
    Failed,
}

/// Result of a sign-in attempt.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub outcome: SignInOutcomeKind,
    /// Consent page to navigate to when `outcome` is `redirecting`.
    pub redirect_url: Option<String>,
    pub session: SessionResponse,
}

/// Profile completion form.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteProfileRequest {
    #[schema(example = "Alex")]
    pub display_name: Option<String>,
    #[schema(example = "EUR")]
    pub currency: Option<String>,
}

/// Currency offered by the profile form.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrencyResponse {
    #[schema(example = "EUR")]
    pub code: String,
    #[schema(example = "€")]
    pub symbol: String,
    #[schema(example = "Euro")]
    pub name: String,
}

impl From<&CurrencyOption> for CurrencyResponse {
    fn from(value: &CurrencyOption) -> Self {
        Self {
            code: value.code.to_owned(),
            symbol: value.symbol.to_owned(),
            name: value.name.to_owned(),
        }
    }
}

fn device_profile(request: &HttpRequest, payload: SignInRequest) -> DeviceProfile {
    let user_agent = payload.user_agent.unwrap_or_else(|| {
        request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    });
    DeviceProfile {
        user_agent,
        viewport_width: payload.viewport_width,
        touch: payload.touch.unwrap_or(false),
    }
}

/// Current session state.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses((status = 200, description = "Session state", body = SessionResponse)),
    tags = ["session"],
    operation_id = "getSession"
)]
#[get("/session")]
pub async fn get_session(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SessionResponse>> {
    let client = state.client(&session).await?;
    Ok(web::Json(client.refresh().await.into()))
}

/// Start a page load: resolve any pending redirect result once.
#[utoipa::path(
    post,
    path = "/api/v1/session/bootstrap",
    responses((status = 200, description = "Session state after ambient restoration", body = SessionResponse)),
    tags = ["session"],
    operation_id = "bootstrapSession"
)]
#[post("/session/bootstrap")]
pub async fn bootstrap_session(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SessionResponse>> {
    let client = state.client(&session).await?;
    client.reconciler().begin_page_load();
    Ok(web::Json(client.reconciler().restore_ambient().await.into()))
}

/// Sign in by popup, or by redirect on small touch devices and when the
/// popup is blocked.
#[utoipa::path(
    post,
    path = "/api/v1/session/sign-in",
    request_body = SignInRequest,
    responses((status = 200, description = "Attempt outcome", body = SignInResponse)),
    tags = ["session"],
    operation_id = "signIn"
)]
#[post("/session/sign-in")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    payload: Option<web::Json<SignInRequest>>,
) -> ApiResult<web::Json<SignInResponse>> {
    let client = state.client(&session).await?;
    let device = device_profile(
        &request,
        payload.map(web::Json::into_inner).unwrap_or_default(),
    );
    let (outcome, redirect_url) = match client.reconciler().sign_in(&device).await {
        SignInOutcome::Completed => (SignInOutcomeKind::Completed, None),
        SignInOutcome::Redirecting { url } => (SignInOutcomeKind::Redirecting, Some(url.into())),
        SignInOutcome::Failed(_) => (SignInOutcomeKind::Failed, None),
    };
    Ok(web::Json(SignInResponse {
        outcome,
        redirect_url,
        session: client.refresh().await.into(),
    }))
}

/// Save the display name and currency of a first-time user.
#[utoipa::path(
    post,
    path = "/api/v1/session/profile",
    request_body = CompleteProfileRequest,
    responses(
        (status = 200, description = "Completed profile", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 401, description = "Not signed in", body = crate::domain::Error),
        (status = 503, description = "Profile could not be saved", body = crate::domain::Error)
    ),
    tags = ["session"],
    operation_id = "completeProfile"
)]
#[post("/session/profile")]
pub async fn complete_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CompleteProfileRequest>,
) -> ApiResult<web::Json<ProfileResponse>> {
    let payload = payload.into_inner();
    let name_field = FieldName::new("displayName");
    let currency_field = FieldName::new("currency");
    let name = parse_display_name(&require(payload.display_name, name_field)?, name_field)?;
    let currency = parse_currency(&require(payload.currency, currency_field)?, currency_field)?;

    let client = state.client(&session).await?;
    client.refresh().await;
    let profile = client
        .reconciler()
        .complete_profile(name, currency)
        .await
        .map_err(session_failure)?;
    Ok(web::Json(profile.into()))
}

/// Retry a failed profile load or save.
#[utoipa::path(
    post,
    path = "/api/v1/session/retry",
    responses((status = 200, description = "Session state after the retry", body = SessionResponse)),
    tags = ["session"],
    operation_id = "retryProfileLoad"
)]
#[post("/session/retry")]
pub async fn retry_profile_load(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SessionResponse>> {
    let client = state.client(&session).await?;
    Ok(web::Json(client.reconciler().retry_profile_load().await.into()))
}

/// End the session with the identity provider.
#[utoipa::path(
    post,
    path = "/api/v1/session/sign-out",
    responses(
        (status = 204, description = "Signed out"),
        (status = 503, description = "Provider unreachable", body = crate::domain::Error)
    ),
    tags = ["session"],
    operation_id = "signOut"
)]
#[post("/session/sign-out")]
pub async fn sign_out(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    state.client(&session).await?.sign_out().await?;
    state.evict(&session).await?;
    session.forget();
    Ok(HttpResponse::NoContent().finish())
}

/// Dismiss the current error.
#[utoipa::path(
    delete,
    path = "/api/v1/session/error",
    responses((status = 200, description = "Session state", body = SessionResponse)),
    tags = ["session"],
    operation_id = "clearSessionError"
)]
#[delete("/session/error")]
pub async fn clear_error(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SessionResponse>> {
    let client = state.client(&session).await?;
    client.reconciler().clear_error();
    Ok(web::Json(client.reconciler().snapshot().into()))
}

/// Currencies offered on the profile form.
#[utoipa::path(
    get,
    path = "/api/v1/currencies",
    responses((status = 200, description = "Supported currencies", body = [CurrencyResponse])),
    tags = ["session"],
    operation_id = "listCurrencies"
)]
#[get("/currencies")]
pub async fn list_currencies() -> web::Json<Vec<CurrencyResponse>> {
    web::Json(SUPPORTED_CURRENCIES.iter().map(CurrencyResponse::from).collect())
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
