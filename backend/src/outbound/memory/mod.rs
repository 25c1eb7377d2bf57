//! In-memory adapters for the identity provider and the document store.
//!
//! They back development runs and tests. State lives for the lifetime of the
//! process.

mod document_store;
mod identity;

pub use document_store::MemoryDocumentStore;
pub use identity::{InMemoryIdentityConnector, InMemoryIdentityProvider};
