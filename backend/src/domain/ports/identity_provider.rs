//! Port for the hosted identity provider.
//!
//! The provider owns credentials and session persistence. Besides the
//! explicit sign-in calls it publishes a principal-changed feed that fires on
//! sign-in, sign-out and token refresh.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use url::Url;

use crate::domain::Principal;

use super::define_port_error;

define_port_error! {
    /// Failure conditions reported by the identity provider.
    pub enum IdentityProviderError {
        /// The provider could not be reached.
        NetworkFailure => "network request failed",
        /// The user dismissed the popup.
        PopupClosed => "popup closed by user",
        /// The browser refused to open the popup.
        PopupBlocked => "popup blocked",
        /// Too many attempts in a short period.
        RateLimited => "too many requests",
        /// The sign-in method is disabled for this application.
        ProviderDisabled => "operation not allowed",
        /// The browser cannot persist the sign-in state.
        StorageUnsupported => "web storage unsupported",
        /// Any other provider failure, with its message (possibly empty).
        Provider { message: String } => "identity provider error: {message}",
    }
}

/// Per-client session with the identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive popup flow.
    async fn sign_in_with_popup(&self) -> Result<Principal, IdentityProviderError>;

    /// Start the redirect flow, returning the consent URL to navigate to.
    async fn sign_in_with_redirect(&self) -> Result<Url, IdentityProviderError>;

    /// Resolve a pending redirect result after navigation back.
    ///
    /// Returns `None` when no redirect was pending.
    async fn resolve_redirect_result(&self) -> Result<Option<Principal>, IdentityProviderError>;

    /// Subscribe to principal-changed events.
    ///
    /// The receiver's current value is the principal at subscription time.
    fn subscribe(&self) -> watch::Receiver<Option<Principal>>;

    /// End the provider session.
    async fn sign_out(&self) -> Result<(), IdentityProviderError>;
}

/// Hands each browser client its own identity-provider session.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityConnector: Send + Sync {
    /// Open a provider session for a new client.
    fn connect(&self) -> Arc<dyn IdentityProvider>;
}
