//! Shared test utilities for unit and integration tests.
//!
//! Enabled by the `testkit` feature, which the crate turns on for its own
//! tests through a self dev-dependency.
//!
//! - [`store`]: [`MemoryStore`](store::MemoryStore), an in-memory
//!   [`ClusterStore`](crate::store::ClusterStore) with garbage collection
//!   and failure injection.
//! - [`fixtures`]: builders for `Zeebe` resources.

pub mod fixtures;
pub mod store;

pub use fixtures::{zeebe, zeebe_with_spec, ZeebeBuilder};
pub use store::{FailPoint, MemoryStore, Write};
