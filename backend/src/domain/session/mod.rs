//! Sign-in reconciliation.
//!
//! Three sources can report a signed-in principal for the same browser
//! client: the interactive popup, the redirect result resolved after
//! navigation, and the provider's principal-changed feed. They race freely.
//! [`SessionReconciler`] folds them into one snapshot:
//!
//! - the profile lookup and the provisional write run under a single async
//!   gate, so two sources never both create the profile document;
//! - a principal already reconciled is skipped (one-shot guard keyed by user
//!   id), so a returning user never flips to `is_new_user`;
//! - the redirect result is resolved at most once per page load.
//!
//! Sign-out clears every guard.

mod error;
mod landing;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

pub use self::error::{FailureKind, SessionError, SessionErrorCode};
pub use self::landing::LandingView;
use super::ports::{IdentityProvider, IdentityProviderError, ProfileRepository};
use super::{CurrencyCode, DeviceProfile, DisplayName, Principal, UserId, UserProfile};

/// Where the sign-in state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInPhase {
    /// Nobody is signed in and no attempt is running.
    Idle,
    /// The popup flow is open.
    AwaitingInteractive,
    /// Waiting for the redirect result or the first listener event.
    AwaitingAmbient,
    /// A principal is signed in.
    Resolved,
    /// The last attempt failed; see `last_error`.
    Failed,
}

/// Point-in-time view of the session, serialised for the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Profile of the signed-in user (provisional until reconciled).
    pub user: Option<UserProfile>,
    /// Initial resolution has not finished yet.
    pub is_loading: bool,
    /// The profile document did not exist before this session.
    pub is_new_user: bool,
    /// Most recent failure, until dismissed.
    pub last_error: Option<SessionError>,
    /// The profile lookup or provisional write failed; cleared only by a
    /// successful retry or sign-out, never by dismissing the error.
    pub profile_unresolved: bool,
    /// Sign-in state machine position.
    pub phase: SignInPhase,
}

impl SessionSnapshot {
    /// Identifier of the signed-in user.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.id)
    }

    /// Logical view the front end should render.
    pub fn landing(&self) -> LandingView {
        LandingView::for_session(self)
    }
}

/// Result of [`SessionReconciler::sign_in`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// A principal was accepted (profile state is in the snapshot).
    Completed,
    /// The redirect flow started; the client must navigate to `url`.
    Redirecting {
        /// Consent page.
        url: Url,
    },
    /// The attempt failed; the error is also stored as `last_error`.
    Failed(SessionError),
}

#[derive(Debug)]
struct SessionState {
    phase: SignInPhase,
    principal: Option<Principal>,
    profile: Option<UserProfile>,
    is_loading: bool,
    is_new_user: bool,
    last_error: Option<SessionError>,
    profile_unresolved: bool,
    reconciled_for: Option<UserId>,
    ambient_checked: bool,
    pending_principal: Option<Principal>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SignInPhase::Idle,
            principal: None,
            profile: None,
            is_loading: true,
            is_new_user: false,
            last_error: None,
            profile_unresolved: false,
            reconciled_for: None,
            ambient_checked: false,
            pending_principal: None,
        }
    }
}

impl SessionState {
    fn clear_identity(&mut self) {
        self.phase = SignInPhase::Idle;
        self.principal = None;
        self.profile = None;
        self.is_new_user = false;
        self.reconciled_for = None;
        self.ambient_checked = false;
        self.pending_principal = None;
        self.profile_unresolved = false;
        self.last_error = None;
    }

    fn record_failure(&mut self, error: SessionError) {
        self.phase = if self.principal.is_some() {
            SignInPhase::Resolved
        } else {
            SignInPhase::Failed
        };
        self.last_error = Some(error);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.profile.clone(),
            is_loading: self.is_loading,
            is_new_user: self.is_new_user,
            last_error: self.last_error.clone(),
            profile_unresolved: self.profile_unresolved,
            phase: self.phase,
        }
    }
}

struct ListenerState {
    feed: watch::Receiver<Option<Principal>>,
    primed: bool,
}

/// Reconciles the sign-in sources of one browser client.
pub struct SessionReconciler {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
    state: Mutex<SessionState>,
    gate: tokio::sync::Mutex<()>,
    listener: Mutex<ListenerState>,
}

impl SessionReconciler {
    /// Create a reconciler subscribed to `identity`'s principal feed.
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileRepository>) -> Self {
        let feed = identity.subscribe();
        Self {
            identity,
            profiles,
            state: Mutex::new(SessionState::default()),
            gate: tokio::sync::Mutex::new(()),
            listener: Mutex::new(ListenerState {
                feed,
                primed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    /// Signed-in user id, if any.
    pub fn current_user_id(&self) -> Option<UserId> {
        self.state().principal.as_ref().map(|p| p.uid.clone())
    }

    /// Start a new page load, re-arming ambient restoration.
    pub fn begin_page_load(&self) {
        let mut state = self.state();
        state.ambient_checked = false;
        state.is_loading = true;
    }

    /// Resolve a pending redirect sign-in, once per page load.
    pub async fn restore_ambient(&self) -> SessionSnapshot {
        let run = {
            let mut state = self.state();
            let first = !state.ambient_checked;
            if first {
                state.ambient_checked = true;
                if state.principal.is_none() {
                    state.phase = SignInPhase::AwaitingAmbient;
                }
            }
            first
        };
        if run {
            match self.identity.resolve_redirect_result().await {
                Ok(Some(principal)) => {
                    info!(user_id = %principal.uid, "redirect sign-in resolved");
                    self.accept_principal(principal).await;
                }
                Ok(None) => debug!("no pending redirect result"),
                Err(err) => {
                    self.record_provider_error(&err);
                }
            }
        }
        self.sync_listener().await;
        let mut state = self.state();
        state.is_loading = false;
        if state.phase == SignInPhase::AwaitingAmbient && state.principal.is_none() {
            state.phase = SignInPhase::Idle;
        }
        state.snapshot()
    }

    /// Apply any principal-changed event not yet observed.
    ///
    /// The first call processes the feed's current value.
    pub async fn sync_listener(&self) {
        let event = {
            let mut listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
            if !listener.primed {
                listener.primed = true;
                Some(listener.feed.borrow_and_update().clone())
            } else if listener.feed.has_changed().unwrap_or(false) {
                Some(listener.feed.borrow_and_update().clone())
            } else {
                None
            }
        };
        if let Some(principal) = event {
            self.apply_listener_event(principal).await;
        }
    }

    /// Follow the principal feed on a background task until the handle drops.
    pub fn spawn_listener(self: &Arc<Self>) -> ListenerHandle {
        let reconciler = Arc::clone(self);
        let mut feed = self.identity.subscribe();
        let task = tokio::spawn(async move {
            let initial = feed.borrow_and_update().clone();
            reconciler.apply_listener_event(initial).await;
            while feed.changed().await.is_ok() {
                let principal = feed.borrow_and_update().clone();
                reconciler.apply_listener_event(principal).await;
            }
            debug!("principal feed closed");
        });
        ListenerHandle { task }
    }

    async fn apply_listener_event(&self, principal: Option<Principal>) {
        match principal {
            Some(principal) => self.accept_principal(principal).await,
            None => {
                let _gate = self.gate.lock().await;
                let mut state = self.state();
                if state.principal.is_some() {
                    info!("principal feed reported sign-out");
                    state.clear_identity();
                }
            }
        }
        self.state().is_loading = false;
    }

    /// Begin an interactive sign-in appropriate for `device`.
    ///
    /// Popup-hostile devices go straight to the redirect flow; a blocked
    /// popup falls back to it.
    pub async fn sign_in(&self, device: &DeviceProfile) -> SignInOutcome {
        {
            let mut state = self.state();
            state.phase = SignInPhase::AwaitingInteractive;
            state.last_error = None;
        }
        if device.prefers_redirect() {
            debug!("device prefers redirect sign-in");
            return self.start_redirect(false).await;
        }
        match self.identity.sign_in_with_popup().await {
            Ok(principal) => {
                info!(user_id = %principal.uid, "popup sign-in resolved");
                self.accept_principal(principal).await;
                SignInOutcome::Completed
            }
            Err(IdentityProviderError::PopupBlocked) => {
                warn!("sign-in popup blocked; falling back to redirect");
                self.start_redirect(true).await
            }
            Err(err) => SignInOutcome::Failed(self.record_provider_error(&err)),
        }
    }

    async fn start_redirect(&self, after_blocked_popup: bool) -> SignInOutcome {
        match self.identity.sign_in_with_redirect().await {
            Ok(url) => {
                let mut state = self.state();
                state.phase = SignInPhase::AwaitingAmbient;
                state.ambient_checked = false;
                SignInOutcome::Redirecting { url }
            }
            Err(err) if after_blocked_popup => {
                warn!(error = %err, "redirect fallback failed");
                SignInOutcome::Failed(
                    self.record_provider_error(&IdentityProviderError::PopupBlocked),
                )
            }
            Err(err) => SignInOutcome::Failed(self.record_provider_error(&err)),
        }
    }

    fn record_provider_error(&self, err: &IdentityProviderError) -> SessionError {
        let mapped = SessionError::from_provider(err);
        warn!(error = %err, code = ?mapped.code(), "sign-in failed");
        self.state().record_failure(mapped.clone());
        mapped
    }

    /// Classify `principal` as new or returning and publish its profile.
    ///
    /// Runs under the reconcile gate. A principal already reconciled is a
    /// no-op.
    pub async fn accept_principal(&self, principal: Principal) {
        let _gate = self.gate.lock().await;
        let provisional = {
            let mut state = self.state();
            if state.reconciled_for.as_ref() == Some(&principal.uid) {
                debug!(user_id = %principal.uid, "principal already reconciled");
                state.phase = SignInPhase::Resolved;
                return;
            }
            let provisional = UserProfile::provisional(&principal);
            if state.profile.as_ref().map(|p| &p.id) != Some(&principal.uid) {
                state.profile = Some(provisional.clone());
                state.is_new_user = false;
            }
            state.principal = Some(principal.clone());
            state.phase = SignInPhase::Resolved;
            provisional
        };

        let outcome = match self.profiles.find_by_id(&principal.uid).await {
            Ok(Some(profile)) => Ok((profile, false)),
            Ok(None) => match self.profiles.save(&provisional).await {
                Ok(()) => Ok((provisional, true)),
                Err(err) => {
                    warn!(user_id = %principal.uid, error = %err, "provisional profile save failed");
                    Err(SessionError::profile_save())
                }
            },
            Err(err) => {
                warn!(user_id = %principal.uid, error = %err, "profile lookup failed");
                Err(SessionError::profile_load())
            }
        };

        let mut state = self.state();
        match outcome {
            Ok((profile, is_new_user)) => {
                info!(user_id = %principal.uid, is_new_user, "principal reconciled");
                state.profile = Some(profile);
                state.is_new_user = is_new_user;
                state.reconciled_for = Some(principal.uid);
                state.pending_principal = None;
                state.profile_unresolved = false;
                if state
                    .last_error
                    .as_ref()
                    .is_some_and(|e| e.kind() == FailureKind::DataIntegrity)
                {
                    state.last_error = None;
                }
            }
            Err(error) => {
                state.pending_principal = Some(principal);
                state.profile_unresolved = true;
                state.last_error = Some(error);
            }
        }
        state.is_loading = false;
    }

    /// Re-run reconciliation for a principal whose profile load or save
    /// failed.
    pub async fn retry_profile_load(&self) -> SessionSnapshot {
        let pending = self.state().pending_principal.clone();
        if let Some(principal) = pending {
            self.accept_principal(principal).await;
        }
        self.snapshot()
    }

    /// Persist the profile chosen on the completion form.
    pub async fn complete_profile(
        &self,
        name: DisplayName,
        currency: CurrencyCode,
    ) -> Result<UserProfile, SessionError> {
        let _gate = self.gate.lock().await;
        let base = {
            let mut state = self.state();
            if state.profile_unresolved {
                let error = SessionError::profile_load();
                state.last_error = Some(error.clone());
                return Err(error);
            }
            match (&state.profile, &state.principal) {
                (Some(profile), Some(_)) => Some(profile.clone()),
                (None, Some(principal)) => Some(UserProfile::provisional(principal)),
                _ => None,
            }
        };
        let Some(base) = base else {
            let error = SessionError::not_signed_in();
            self.state().last_error = Some(error.clone());
            return Err(error);
        };

        let profile = base.completed(name, currency);
        if let Err(err) = self.profiles.save(&profile).await {
            warn!(user_id = %profile.id, error = %err, "profile completion failed");
            let error = SessionError::profile_save();
            self.state().last_error = Some(error.clone());
            return Err(error);
        }

        info!(user_id = %profile.id, currency = %profile.currency, "profile completed");
        let mut state = self.state();
        state.profile = Some(profile.clone());
        state.is_new_user = false;
        state.reconciled_for = Some(profile.id.clone());
        state.pending_principal = None;
        state.profile_unresolved = false;
        state.last_error = None;
        Ok(profile)
    }

    /// Sign out of the provider and clear all session state and guards.
    ///
    /// On failure the signed-in state is kept and the error is recorded.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let _gate = self.gate.lock().await;
        match self.identity.sign_out().await {
            Ok(()) => {
                let mut state = self.state();
                if let Some(principal) = &state.principal {
                    info!(user_id = %principal.uid, "signed out");
                }
                state.clear_identity();
                state.is_loading = false;
                Ok(())
            }
            Err(err) => {
                let mapped = SessionError::from_provider(&err);
                warn!(error = %err, "sign-out failed");
                self.state().last_error = Some(mapped.clone());
                Err(mapped)
            }
        }
    }

    /// Dismiss `last_error`.
    ///
    /// An unresolved profile stays unresolved; only
    /// [`Self::retry_profile_load`] can unblock the dashboard.
    pub fn clear_error(&self) {
        let mut state = self.state();
        state.last_error = None;
        if state.phase == SignInPhase::Failed {
            state.phase = SignInPhase::Idle;
        }
    }
}

/// Owns a background listener task; aborts it on drop.
#[derive(Debug)]
pub struct ListenerHandle {
    task: JoinHandle<()>,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests;
