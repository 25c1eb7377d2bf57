//! Which logical view a session snapshot calls for.

use serde::Serialize;

use super::SessionSnapshot;

/// The three application views plus the transitional states around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingView {
    /// Initial resolution still running.
    Loading,
    /// Nobody is signed in.
    SignIn,
    /// Signed in for the first time; name and currency are required.
    ProfileCompletion,
    /// Signed in with a complete profile.
    Dashboard,
    /// Signed in but the profile could not be loaded or saved.
    ProfileUnavailable,
}

impl LandingView {
    /// Map a snapshot to its view.
    pub fn for_session(snapshot: &SessionSnapshot) -> Self {
        if snapshot.is_loading {
            return Self::Loading;
        }
        if snapshot.user.is_none() {
            return Self::SignIn;
        }
        // The provisional profile is a guess until the store answers.
        if snapshot.profile_unresolved {
            Self::ProfileUnavailable
        } else if snapshot.is_new_user {
            // A failed completion keeps the form up with the error shown.
            Self::ProfileCompletion
        } else {
            Self::Dashboard
        }
    }
}
