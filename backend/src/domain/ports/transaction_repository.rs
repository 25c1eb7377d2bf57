//! Port for transaction documents.
use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{NewTransaction, Transaction, TransactionId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by transaction storage adapters.
    pub enum TransactionRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "transaction store connection failed: {message}",
        /// A read or write was rejected.
        Query { message: String } => "transaction store query failed: {message}",
        /// No transaction with this id belongs to the user.
        NotFound { id: String } => "transaction {id} not found",
    }
}

/// Live query, insert and delete for one user's transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Subscribe to the transactions owned by `user_id`, newest date first.
    async fn subscribe(
        &self,
        user_id: &UserId,
    ) -> Result<watch::Receiver<Vec<Transaction>>, TransactionRepositoryError>;

    /// Store a new transaction document and return it with its identifier.
    async fn insert(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepositoryError>;

    /// Remove a transaction owned by `user_id`.
    async fn delete(
        &self,
        user_id: &UserId,
        id: TransactionId,
    ) -> Result<(), TransactionRepositoryError>;
}
