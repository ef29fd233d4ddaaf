//! Handlers for `/assignments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/assignments` | Ledger query; [`ListParams`] |
//! | `POST` | `/assignments` | Body: [`AssignBody`]; returns 201 + the new record |
//! | `GET`  | `/assignments/:id` | Single record |
//! | `POST` | `/assignments/unassign` | Body: [`UnassignBody`] |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use convoy_core::{
  assignment::{
    AssignRequest, AssignmentMode, AssignmentRecord, Takeover, UnassignRequest,
  },
  engine::AssignmentEngine,
  store::{AssignmentStore, HistoryQuery},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{self, Path, Query},
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub vehicle_id:  Option<Uuid>,
  pub driver_id:   Option<Uuid>,
  #[serde(default)]
  pub active_only: bool,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl From<ListParams> for HistoryQuery {
  fn from(p: ListParams) -> Self {
    HistoryQuery {
      vehicle_id:  p.vehicle_id,
      driver_id:   p.driver_id,
      active_only: p.active_only,
      limit:       p.limit,
      offset:      p.offset,
    }
  }
}

/// `GET /assignments[?vehicle_id=..][&driver_id=..][&active_only=true][&limit=..][&offset=..]`
pub async fn list<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AssignmentRecord>>, ApiError> {
  Ok(Json(engine.store().history(params.into()).await?))
}

/// `GET /assignments/:id`
pub async fn get_one<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<AssignmentRecord>, ApiError> {
  let record = engine
    .store()
    .get_record(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("assignment {id} not found")))?;
  Ok(Json(record))
}

// ─── Assign ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /assignments`.
#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub driver_id:      Uuid,
  pub vehicle_id:     Uuid,
  pub assigned_by:    String,
  pub start_odometer: Option<u32>,
  pub notes:          Option<String>,
  #[serde(default)]
  pub mode:           AssignmentMode,
  /// e.g. `{"policy":"expect","record_id":null}`; defaults to `force`.
  #[serde(default)]
  pub takeover:       Takeover,
}

impl From<AssignBody> for AssignRequest {
  fn from(b: AssignBody) -> Self {
    AssignRequest {
      driver_id:      b.driver_id,
      vehicle_id:     b.vehicle_id,
      assigned_by:    b.assigned_by,
      start_odometer: b.start_odometer,
      notes:          b.notes,
      mode:           b.mode,
      takeover:       b.takeover,
    }
  }
}

/// `POST /assignments`: returns 201 + the new record.
pub async fn assign<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  extract::Json(body): extract::Json<AssignBody>,
) -> Result<impl IntoResponse, ApiError> {
  let record_id = engine.assign(body.into()).await?;
  let record = engine
    .store()
    .get_record(record_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("assignment {record_id} not found")))?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Unassign ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UnassignBody {
  pub driver_id:     Uuid,
  pub vehicle_id:    Uuid,
  pub unassigned_by: String,
  pub end_odometer:  Option<u32>,
}

impl From<UnassignBody> for UnassignRequest {
  fn from(b: UnassignBody) -> Self {
    UnassignRequest {
      driver_id:     b.driver_id,
      vehicle_id:    b.vehicle_id,
      unassigned_by: b.unassigned_by,
      end_odometer:  b.end_odometer,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct UnassignResponse {
  pub ended: Vec<Uuid>,
}

/// `POST /assignments/unassign`
pub async fn unassign<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  extract::Json(body): extract::Json<UnassignBody>,
) -> Result<Json<UnassignResponse>, ApiError> {
  let ended = engine.unassign(body.into()).await?;
  Ok(Json(UnassignResponse { ended }))
}
