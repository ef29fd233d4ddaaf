//! SQLite backend for the Convoy assignment store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every [`AssignmentStore`] operation is
//! one SQLite transaction.
//!
//! [`AssignmentStore`]: convoy_core::store::AssignmentStore

mod encode;
mod schema;
mod store;
mod tx;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
