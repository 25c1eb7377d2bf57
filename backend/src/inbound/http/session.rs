//! Cookie session wrapper for HTTP handlers.
//!
//! The cookie only carries an opaque client id. Everything the id stands
//! for (identity-provider session, reconciler, dashboard) lives in
//! [`HttpState`](super::state::HttpState).

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;
use uuid::Uuid;

use crate::domain::Error;

pub(crate) const CLIENT_ID_KEY: &str = "client_id";

/// Newtype wrapper exposing client-id operations on the Actix session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Client id stored in the cookie, if any.
    ///
    /// A tampered or malformed value is treated as absent.
    pub fn client_id(&self) -> Result<Option<Uuid>, Error> {
        let raw = self
            .0
            .get::<String>(CLIENT_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|value| match Uuid::parse_str(&value) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(%error, "invalid client id in session cookie");
                None
            }
        }))
    }

    /// Client id, issuing and persisting a fresh one when absent.
    pub fn ensure_client_id(&self) -> Result<Uuid, Error> {
        if let Some(id) = self.client_id()? {
            return Ok(id);
        }
        let id = Uuid::new_v4();
        self.0
            .insert(CLIENT_ID_KEY, id.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))?;
        Ok(id)
    }

    /// Drop the client id so the next request starts a new client.
    pub fn forget(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
