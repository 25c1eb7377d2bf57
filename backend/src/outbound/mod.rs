//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: in-process identity provider and document store used for
//!   development runs and tests
//!
//! Adapters are thin translators between domain types and the backing
//! service. They contain no business logic.

pub mod memory;
