//! `GET /audit`: check the ledger invariants over one snapshot.

use axum::{Json, extract::State};
use convoy_core::{
  audit::Violation, engine::AssignmentEngine, store::AssignmentStore,
};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct AuditResponse {
  pub consistent: bool,
  pub violations: Vec<Violation>,
}

pub async fn handler<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
) -> Result<Json<AuditResponse>, ApiError> {
  let violations = engine.store().audit().await?;
  if !violations.is_empty() {
    tracing::warn!(count = violations.len(), "ledger audit found violations");
  }
  Ok(Json(AuditResponse { consistent: violations.is_empty(), violations }))
}
