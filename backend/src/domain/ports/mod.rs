//! Collaborator contracts at the hexagonal boundary.
//!
//! The identity provider and the document store are external systems; the
//! domain only ever talks to them through these traits.

mod macros;
pub(crate) use macros::define_port_error;

mod category_repository;
mod identity_provider;
mod profile_repository;
mod transaction_repository;

#[cfg(test)]
pub use category_repository::MockCategoryRepository;
pub use category_repository::{CategoryRepository, CategoryRepositoryError};
#[cfg(test)]
pub use identity_provider::{MockIdentityConnector, MockIdentityProvider};
pub use identity_provider::{IdentityConnector, IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{ProfileRepository, ProfileRepositoryError};
#[cfg(test)]
pub use transaction_repository::MockTransactionRepository;
pub use transaction_repository::{TransactionRepository, TransactionRepositoryError};
