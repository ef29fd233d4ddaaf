//! Core types and trait definitions for the Convoy assignment engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod assignment;
pub mod audit;
pub mod compliance;
pub mod conflict;
pub mod driver;
pub mod engine;
pub mod error;
pub mod projection;
pub mod store;
pub mod vehicle;

pub use error::{Error, ErrorKind, Result};
