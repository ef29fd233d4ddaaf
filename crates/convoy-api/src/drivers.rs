//! Handlers for `/drivers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/drivers` | Sorted by display name |
//! | `POST` | `/drivers` | Body: [`NewDriverBody`]; returns 201 |
//! | `GET`  | `/drivers/:id` | 404 if not found |
//! | `GET`  | `/drivers/:id/history` | [`HistoryParams`] |
//! | `POST` | `/drivers/:id/primary` | Body: [`SetPrimaryBody`]; returns 204 |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use convoy_core::{
  assignment::{AssignmentRecord, SetPrimaryRequest},
  driver::{Driver, DriverStatus, NewDriver},
  engine::AssignmentEngine,
  store::{AssignmentStore, HistoryQuery},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{self, Path, Query},
  vehicles::HistoryParams,
};

/// `GET /drivers`
pub async fn list<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
) -> Result<Json<Vec<Driver>>, ApiError> {
  Ok(Json(engine.store().list_drivers().await?))
}

/// JSON body accepted by `POST /drivers`.
#[derive(Debug, Deserialize)]
pub struct NewDriverBody {
  pub display_name:    String,
  #[serde(default)]
  pub license_classes: Vec<String>,
  #[serde(default)]
  pub status:          DriverStatus,
}

impl From<NewDriverBody> for NewDriver {
  fn from(b: NewDriverBody) -> Self {
    NewDriver {
      display_name:    b.display_name,
      license_classes: b.license_classes,
      status:          b.status,
    }
  }
}

/// `POST /drivers`: returns 201 + the stored driver.
pub async fn create<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  extract::Json(body): extract::Json<NewDriverBody>,
) -> Result<impl IntoResponse, ApiError> {
  let driver = engine.store().add_driver(body.into()).await?;
  Ok((StatusCode::CREATED, Json(driver)))
}

/// `GET /drivers/:id`
pub async fn get_one<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Driver>, ApiError> {
  let driver = engine
    .store()
    .get_driver(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("driver {id} not found")))?;
  Ok(Json(driver))
}

/// `GET /drivers/:id/history[?active_only=true][&limit=..][&offset=..]`
pub async fn history<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<AssignmentRecord>>, ApiError> {
  if engine.store().get_driver(id).await?.is_none() {
    return Err(ApiError::NotFound(format!("driver {id} not found")));
  }
  let query = params.into_query(HistoryQuery::for_driver(id));
  Ok(Json(engine.store().history(query).await?))
}

#[derive(Debug, Deserialize)]
pub struct SetPrimaryBody {
  pub vehicle_id: Uuid,
  pub updated_by: String,
  /// Take the vehicle's primary slot from another driver.
  #[serde(default)]
  pub force:      bool,
}

/// `POST /drivers/:id/primary`: 409 if another driver holds the vehicle and
/// `force` is not set.
pub async fn set_primary<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
  extract::Json(body): extract::Json<SetPrimaryBody>,
) -> Result<StatusCode, ApiError> {
  engine
    .set_primary_vehicle(SetPrimaryRequest {
      driver_id:  id,
      vehicle_id: body.vehicle_id,
      updated_by: body.updated_by,
      force:      body.force,
    })
    .await?;
  Ok(StatusCode::NO_CONTENT)
}
