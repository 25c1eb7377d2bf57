//! Port for category documents.
use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{Category, NewCategory, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by category storage adapters.
    pub enum CategoryRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "category store connection failed: {message}",
        /// A read or write was rejected.
        Query { message: String } => "category store query failed: {message}",
    }
}

/// Live query and insert for one user's categories.
///
/// Subscriptions deliver the full current set on every change; order is not
/// significant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Subscribe to the categories owned by `user_id`.
    async fn subscribe(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Vec<Category>>, CategoryRepositoryError>;

    /// Store a new category document and return it with its identifier.
    async fn insert(&self, category: NewCategory) -> Result<Category, CategoryRepositoryError>;
}
