//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data`. It maps each
//! browser client id to its [`ClientSession`] and only depends on domain
//! ports, so handlers stay testable without I/O. Clients idle for longer
//! than the session cookie lives are evicted.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use moka::future::Cache;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    CategoryRepository, IdentityConnector, ProfileRepository, TransactionRepository,
};
use crate::domain::{ActiveDashboard, ClientSession, DashboardStores, Error};
use crate::inbound::http::session::SessionContext;

/// Parameter object bundling the port implementations handlers need.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub identity: Arc<dyn IdentityConnector>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub clock: Arc<dyn Clock + Send + Sync>,
}

/// Idle time after which a client session is dropped; matches the
/// persistent session cookie TTL.
pub const CLIENT_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Dependency bundle for HTTP handlers.
pub struct HttpState {
    identity: Arc<dyn IdentityConnector>,
    profiles: Arc<dyn ProfileRepository>,
    stores: DashboardStores,
    clients: Cache<Uuid, Arc<ClientSession>>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use tally::domain::{Principal, UserId};
    /// use tally::inbound::http::state::{HttpState, HttpStatePorts};
    /// use tally::outbound::memory::{InMemoryIdentityConnector, MemoryDocumentStore};
    ///
    /// let store = Arc::new(MemoryDocumentStore::new());
    /// let account = Principal::new(UserId::new("dev-user").expect("id"));
    /// let consent = url::Url::parse("http://localhost:8080/consent").expect("url");
    /// let state = HttpState::new(HttpStatePorts {
    ///     identity: Arc::new(InMemoryIdentityConnector::new(account, consent)),
    ///     profiles: store.clone(),
    ///     categories: store.clone(),
    ///     transactions: store,
    ///     clock: Arc::new(mockable::DefaultClock),
    /// });
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        Self::with_idle_ttl(ports, CLIENT_IDLE_TTL)
    }

    /// Construct state whose client sessions expire after `idle_ttl`
    /// without a request.
    pub fn with_idle_ttl(ports: HttpStatePorts, idle_ttl: Duration) -> Self {
        let HttpStatePorts {
            identity,
            profiles,
            categories,
            transactions,
            clock,
        } = ports;
        Self {
            identity,
            profiles,
            stores: DashboardStores {
                categories,
                transactions,
                clock,
            },
            clients: Cache::builder().time_to_idle(idle_ttl).build(),
        }
    }

    /// Session context of the requesting client, created on first use.
    pub async fn client(&self, session: &SessionContext) -> Result<Arc<ClientSession>, Error> {
        let id = session.ensure_client_id()?;
        let client = self
            .clients
            .get_with(id, async {
                debug!(client_id = %id, "client session created");
                Arc::new(ClientSession::new(
                    self.identity.connect(),
                    Arc::clone(&self.profiles),
                    self.stores.clone(),
                ))
            })
            .await;
        Ok(client)
    }

    /// Dashboard of the requesting client's signed-in user.
    pub async fn dashboard(&self, session: &SessionContext) -> Result<ActiveDashboard, Error> {
        self.client(session).await?.dashboard().await
    }

    /// Drop the requesting client's session context, if it has one.
    pub async fn evict(&self, session: &SessionContext) -> Result<(), Error> {
        if let Some(id) = session.client_id()? {
            if self.clients.remove(&id).await.is_some() {
                debug!(client_id = %id, "client session evicted");
            }
        }
        Ok(())
    }

    /// Number of live clients.
    pub async fn client_count(&self) -> u64 {
        self.clients.run_pending_tasks().await;
        self.clients.entry_count()
    }
}
