//! JSON REST API for Convoy.
//!
//! Exposes an axum [`Router`] backed by an [`AssignmentEngine`] over any
//! [`convoy_core::store::AssignmentStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", convoy_api::api_router(engine.clone()))
//! ```

pub mod assignments;
pub mod audit;
pub mod compliance;
pub mod drivers;
pub mod error;
pub mod extract;
pub mod vehicles;

use axum::{
  Router,
  routing::{get, post},
};
use convoy_core::{engine::AssignmentEngine, store::AssignmentStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: AssignmentEngine<S>) -> Router<()>
where
  S: AssignmentStore + 'static,
{
  Router::new()
    // Vehicles
    .route(
      "/vehicle-types",
      get(vehicles::list_types::<S>).post(vehicles::create_type::<S>),
    )
    .route("/vehicles", get(vehicles::list::<S>).post(vehicles::create::<S>))
    .route("/vehicles/{id}", get(vehicles::get_one::<S>))
    .route("/vehicles/{id}/primary", get(vehicles::primary::<S>))
    .route("/vehicles/{id}/conflict", get(vehicles::conflict::<S>))
    .route("/vehicles/{id}/history", get(vehicles::history::<S>))
    .route("/vehicles/{id}/maintenance", post(vehicles::maintenance::<S>))
    // Drivers
    .route("/drivers", get(drivers::list::<S>).post(drivers::create::<S>))
    .route("/drivers/{id}", get(drivers::get_one::<S>))
    .route("/drivers/{id}/history", get(drivers::history::<S>))
    .route("/drivers/{id}/primary", post(drivers::set_primary::<S>))
    // Assignments
    .route("/compliance/check", post(compliance::check::<S>))
    .route(
      "/assignments",
      get(assignments::list::<S>).post(assignments::assign::<S>),
    )
    .route("/assignments/unassign", post(assignments::unassign::<S>))
    .route("/assignments/{id}", get(assignments::get_one::<S>))
    .route("/audit", get(audit::handler::<S>))
    .with_state(engine)
}

#[cfg(test)]
mod tests;
