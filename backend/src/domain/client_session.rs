//! Per-browser-client context: the session reconciler plus the dashboard of
//! whoever is signed in.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{IdentityProvider, ProfileRepository};
use crate::domain::{
    Dashboard, DashboardStores, Error, LandingView, SessionReconciler, SessionSnapshot,
    UserProfile,
};

/// Dashboard handle together with the profile it was resolved for.
pub struct ActiveDashboard {
    /// Live dashboard.
    pub dashboard: Arc<Dashboard>,
    /// Reconciled profile (name, currency).
    pub profile: UserProfile,
}

/// Session context of one browser client.
///
/// Nothing here is global: every client gets its own identity-provider
/// session, reconciler and dashboard.
pub struct ClientSession {
    reconciler: SessionReconciler,
    stores: DashboardStores,
    dashboard: tokio::sync::Mutex<Option<Arc<Dashboard>>>,
}

impl ClientSession {
    /// Create a client context.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepository>,
        stores: DashboardStores,
    ) -> Self {
        Self {
            reconciler: SessionReconciler::new(identity, profiles),
            stores,
            dashboard: tokio::sync::Mutex::new(None),
        }
    }

    /// The client's reconciler.
    pub fn reconciler(&self) -> &SessionReconciler {
        &self.reconciler
    }

    /// Snapshot after applying pending principal-changed events.
    pub async fn refresh(&self) -> SessionSnapshot {
        self.reconciler.sync_listener().await;
        self.reconciler.snapshot()
    }

    /// Dashboard of the signed-in user.
    ///
    /// # Errors
    /// - `unauthorized` when nobody is signed in;
    /// - `forbidden` while the profile is incomplete;
    /// - `service_unavailable` while the profile cannot be loaded.
    pub async fn dashboard(&self) -> Result<ActiveDashboard, Error> {
        let snapshot = self.refresh().await;
        let profile = match (snapshot.landing(), snapshot.user) {
            (LandingView::Dashboard, Some(profile)) => profile,
            (LandingView::ProfileCompletion, _) => {
                return Err(Error::forbidden("profile completion required"));
            }
            (LandingView::ProfileUnavailable, _) => {
                return Err(Error::service_unavailable("Failed to load user profile"));
            }
            _ => return Err(Error::unauthorized("login required")),
        };

        let mut slot = self.dashboard.lock().await;
        if let Some(existing) = slot.as_ref().filter(|d| d.user_id() == &profile.id) {
            return Ok(ActiveDashboard {
                dashboard: Arc::clone(existing),
                profile,
            });
        }
        let dashboard = Arc::new(Dashboard::open(profile.id.clone(), &self.stores).await?);
        info!(user_id = %profile.id, "dashboard opened");
        *slot = Some(Arc::clone(&dashboard));
        Ok(ActiveDashboard { dashboard, profile })
    }

    /// Sign out and drop the dashboard subscriptions.
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.reconciler
            .sign_out()
            .await
            .map_err(|err| Error::service_unavailable(err.message().to_owned()))?;
        self.dashboard.lock().await.take();
        Ok(())
    }
}
