//! `POST /compliance/check`: dry-run the license check for a stored driver
//! and vehicle. A failing check is a 200 with `valid: false`.

use axum::{Json, extract::State};
use convoy_core::{
  compliance::ComplianceReport, engine::AssignmentEngine, store::AssignmentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, extract};

#[derive(Debug, Deserialize)]
pub struct CheckBody {
  pub driver_id:  Uuid,
  pub vehicle_id: Uuid,
}

pub async fn check<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  extract::Json(body): extract::Json<CheckBody>,
) -> Result<Json<ComplianceReport>, ApiError> {
  Ok(Json(engine.check(body.driver_id, body.vehicle_id).await?))
}
