//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::test::TestRequest;
use actix_web::{App, web};
use chrono::{DateTime, TimeZone, Utc};
use mockable::MockClock;
use url::Url;

use crate::domain::{Principal, UserId};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::{InMemoryIdentityConnector, MemoryDocumentStore};

pub const DEV_UID: &str = "dev-user";
pub const CONSENT_URL: &str = "https://identity.example/consent";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set by a response, if any.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// 2024-05-17 12:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Adapters behind a [`TestState`].
pub struct TestState {
    pub state: web::Data<HttpState>,
    pub store: Arc<MemoryDocumentStore>,
    pub identity: Arc<InMemoryIdentityConnector>,
}

/// HTTP state over in-memory adapters with the clock pinned to
/// [`fixed_now`].
pub fn test_state() -> TestState {
    test_state_with(HttpState::new)
}

/// [`test_state`] with client sessions expiring after `idle_ttl`.
pub fn test_state_idle_after(idle_ttl: std::time::Duration) -> TestState {
    test_state_with(|ports| HttpState::with_idle_ttl(ports, idle_ttl))
}

fn test_state_with(build: impl FnOnce(HttpStatePorts) -> HttpState) -> TestState {
    let store = Arc::new(MemoryDocumentStore::new());
    let mut account = Principal::new(UserId::new(DEV_UID).expect("fixture uid"));
    account.display_name = Some("Alex Doe".into());
    account.email = Some("alex@example.com".into());
    let identity = Arc::new(InMemoryIdentityConnector::new(
        account,
        Url::parse(CONSENT_URL).expect("fixture url"),
    ));
    let mut clock = MockClock::new();
    clock.expect_utc().returning(fixed_now);
    clock
        .expect_local()
        .returning(|| fixed_now().with_timezone(&chrono::Local));
    let state = web::Data::new(build(HttpStatePorts {
        identity: identity.clone(),
        profiles: store.clone(),
        categories: store.clone(),
        transactions: store.clone(),
        clock: Arc::new(clock),
    }));
    TestState {
        state,
        store,
        identity,
    }
}

/// Application under `/api/v1` with the test session middleware.
pub fn api_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(test_session_middleware())
        .service(web::scope("/api/v1").configure(super::configure))
}

/// Attach the remembered session cookie to a request.
pub fn with_cookie(request: TestRequest, jar: &Option<Cookie<'static>>) -> TestRequest {
    match jar {
        Some(cookie) => request.cookie(cookie.clone()),
        None => request,
    }
}

/// Remember the session cookie a response sets; a removal cookie empties
/// the jar.
pub fn remember<B>(response: &ServiceResponse<B>, jar: &mut Option<Cookie<'static>>) {
    if let Some(cookie) = session_cookie(response) {
        *jar = (!cookie.value().is_empty()).then_some(cookie);
    }
}

/// Send a request as the browser owning `jar`, keeping its session cookie.
macro_rules! call {
    ($app:expr, $jar:expr, $request:expr) => {{
        let response = ::actix_web::test::call_service(
            $app,
            $crate::inbound::http::test_utils::with_cookie($request, $jar).to_request(),
        )
        .await;
        $crate::inbound::http::test_utils::remember(&response, $jar);
        response
    }};
}

pub(crate) use call;
