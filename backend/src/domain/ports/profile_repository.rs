//! Port for profile documents keyed by user id.
use async_trait::async_trait;

use crate::domain::{UserId, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile storage adapters.
    pub enum ProfileRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "profile store connection failed: {message}",
        /// A read or write was rejected.
        Query { message: String } => "profile store query failed: {message}",
    }
}

/// Keyed get/save on user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the profile document for `id`.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, ProfileRepositoryError>;

    /// Create or overwrite the profile document keyed by `profile.id`.
    async fn save(&self, profile: &UserProfile) -> Result<(), ProfileRepositoryError>;
}
