//! User-facing sign-in and profile failures.

use serde::Serialize;

use crate::domain::ports::IdentityProviderError;

/// How a failure is surfaced and recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Dismissible banner; the operation is abandoned and state is unchanged.
    Transport,
    /// Informational text; nothing is retried automatically.
    Interaction,
    /// Blocks dependent views until the triggering action is retried.
    DataIntegrity,
}

/// Stable code for a [`SessionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionErrorCode {
    /// Provider unreachable.
    NetworkFailure,
    /// Provider throttled the attempt.
    RateLimited,
    /// User dismissed the popup.
    PopupClosed,
    /// Popup blocked and the redirect fallback failed too.
    PopupBlocked,
    /// Sign-in method disabled.
    ProviderDisabled,
    /// Browser cannot persist sign-in state.
    StorageUnsupported,
    /// Any other provider failure.
    Provider,
    /// Profile lookup failed.
    ProfileLoad,
    /// Profile write failed.
    ProfileSave,
    /// Profile completion attempted without a signed-in principal.
    NotSignedIn,
}

impl SessionErrorCode {
    /// Failure class of this code.
    pub fn kind(self) -> FailureKind {
        match self {
            Self::NetworkFailure | Self::RateLimited | Self::Provider => FailureKind::Transport,
            Self::PopupClosed
            | Self::PopupBlocked
            | Self::ProviderDisabled
            | Self::StorageUnsupported => FailureKind::Interaction,
            Self::ProfileLoad | Self::ProfileSave | Self::NotSignedIn => FailureKind::DataIntegrity,
        }
    }
}

/// The `lastError` slot of a session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct SessionError {
    kind: FailureKind,
    code: SessionErrorCode,
    message: String,
}

impl SessionError {
    fn with_code(code: SessionErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: code.kind(),
            code,
            message: message.into(),
        }
    }

    /// Map a provider failure to its user-facing message.
    ///
    /// # Examples
    /// ```
    /// use tally::domain::ports::IdentityProviderError;
    /// use tally::domain::{FailureKind, SessionError};
    ///
    /// let err = SessionError::from_provider(&IdentityProviderError::PopupClosed);
    /// assert_eq!(err.message(), "Sign-in was cancelled");
    /// assert_eq!(err.kind(), FailureKind::Interaction);
    /// ```
    pub fn from_provider(error: &IdentityProviderError) -> Self {
        use IdentityProviderError as E;
        use SessionErrorCode as C;
        match error {
            E::NetworkFailure => Self::with_code(
                C::NetworkFailure,
                "Network error. Please check your connection",
            ),
            E::RateLimited => Self::with_code(
                C::RateLimited,
                "Too many attempts. Please try again later",
            ),
            E::PopupClosed => Self::with_code(C::PopupClosed, "Sign-in was cancelled"),
            E::PopupBlocked => Self::with_code(
                C::PopupBlocked,
                "Sign-in popup was blocked by the browser",
            ),
            E::ProviderDisabled => Self::with_code(
                C::ProviderDisabled,
                "Sign-in is not enabled for this application. Please contact support",
            ),
            E::StorageUnsupported => Self::with_code(
                C::StorageUnsupported,
                "Your browser doesn't support web storage. Please enable cookies and try again",
            ),
            E::Provider { message } if !message.trim().is_empty() => {
                Self::with_code(C::Provider, message.trim())
            }
            E::Provider { .. } => Self::with_code(C::Provider, "Unknown authentication error"),
        }
    }

    pub(crate) fn profile_load() -> Self {
        Self::with_code(SessionErrorCode::ProfileLoad, "Failed to load user profile")
    }

    pub(crate) fn profile_save() -> Self {
        Self::with_code(SessionErrorCode::ProfileSave, "Failed to save user profile")
    }

    pub(crate) fn not_signed_in() -> Self {
        Self::with_code(
            SessionErrorCode::NotSignedIn,
            "Cannot complete profile without a signed-in user",
        )
    }

    /// Failure class.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Stable code.
    pub fn code(&self) -> SessionErrorCode {
        self.code
    }

    /// User-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
