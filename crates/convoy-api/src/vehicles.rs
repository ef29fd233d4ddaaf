//! Handlers for `/vehicle-types` and `/vehicles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/vehicle-types` | |
//! | `POST` | `/vehicle-types` | Body: `{"name":"Truck 18t"}` |
//! | `GET`  | `/vehicles` | Sorted by license plate |
//! | `POST` | `/vehicles` | Body: [`NewVehicleBody`]; returns 201 |
//! | `GET`  | `/vehicles/:id` | 404 if not found |
//! | `GET`  | `/vehicles/:id/primary` | Active primary record or `null` |
//! | `GET`  | `/vehicles/:id/conflict` | `?driver_id=`; the holder a takeover would displace |
//! | `GET`  | `/vehicles/:id/history` | [`HistoryParams`] |
//! | `POST` | `/vehicles/:id/maintenance` | Body: `{"on":true}` |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use convoy_core::{
  assignment::AssignmentRecord,
  conflict::{ConflictResolver, PrimaryHolder},
  engine::AssignmentEngine,
  store::{AssignmentStore, HistoryQuery},
  vehicle::{NewVehicle, Vehicle, VehicleType},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{self, Path, Query},
};

// ─── Vehicle types ───────────────────────────────────────────────────────────

/// `GET /vehicle-types`
pub async fn list_types<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
) -> Result<Json<Vec<VehicleType>>, ApiError> {
  Ok(Json(engine.store().list_vehicle_types().await?))
}

#[derive(Debug, Deserialize)]
pub struct NewVehicleTypeBody {
  pub name: String,
}

/// `POST /vehicle-types`
pub async fn create_type<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  extract::Json(body): extract::Json<NewVehicleTypeBody>,
) -> Result<impl IntoResponse, ApiError> {
  let vehicle_type = engine.store().add_vehicle_type(body.name).await?;
  Ok((StatusCode::CREATED, Json(vehicle_type)))
}

// ─── Vehicles ────────────────────────────────────────────────────────────────

/// `GET /vehicles`
pub async fn list<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
  Ok(Json(engine.store().list_vehicles().await?))
}

/// JSON body accepted by `POST /vehicles`.
#[derive(Debug, Deserialize)]
pub struct NewVehicleBody {
  pub license_plate:         String,
  #[serde(default)]
  pub odometer:              u32,
  pub vehicle_type_id:       Option<Uuid>,
  pub trailer_license_plate: Option<String>,
}

impl From<NewVehicleBody> for NewVehicle {
  fn from(b: NewVehicleBody) -> Self {
    NewVehicle {
      license_plate:         b.license_plate,
      odometer:              b.odometer,
      vehicle_type_id:       b.vehicle_type_id,
      trailer_license_plate: b.trailer_license_plate,
    }
  }
}

/// `POST /vehicles`: returns 201 + the stored vehicle.
pub async fn create<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  extract::Json(body): extract::Json<NewVehicleBody>,
) -> Result<impl IntoResponse, ApiError> {
  let vehicle = engine.store().add_vehicle(body.into()).await?;
  Ok((StatusCode::CREATED, Json(vehicle)))
}

/// `GET /vehicles/:id`
pub async fn get_one<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
  Ok(Json(require_vehicle(&engine, id).await?))
}

/// `GET /vehicles/:id/primary`
pub async fn primary<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Option<AssignmentRecord>>, ApiError> {
  require_vehicle(&engine, id).await?;
  let resolver = ConflictResolver::new(engine.store().clone());
  Ok(Json(resolver.primary_assignment(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ConflictParams {
  pub driver_id: Uuid,
}

/// Response of `GET /vehicles/:id/conflict`. `holder` is `null` when the
/// driver can be assigned without displacing anyone.
#[derive(Debug, Serialize)]
pub struct ConflictResponse {
  pub holder:  Option<PrimaryHolder>,
  pub warning: Option<String>,
}

/// `GET /vehicles/:id/conflict?driver_id=<id>`
pub async fn conflict<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ConflictParams>,
) -> Result<Json<ConflictResponse>, ApiError> {
  require_vehicle(&engine, id).await?;
  let resolver = ConflictResolver::new(engine.store().clone());
  let holder = resolver.conflict_for(id, params.driver_id).await?;
  let warning = holder.as_ref().map(PrimaryHolder::warning);
  Ok(Json(ConflictResponse { holder, warning }))
}

/// Query parameters shared by the per-vehicle and per-driver history routes.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
  #[serde(default)]
  pub active_only: bool,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl HistoryParams {
  pub fn into_query(self, base: HistoryQuery) -> HistoryQuery {
    HistoryQuery {
      active_only: self.active_only,
      limit: self.limit,
      offset: self.offset,
      ..base
    }
  }
}

/// `GET /vehicles/:id/history[?active_only=true][&limit=..][&offset=..]`
pub async fn history<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<AssignmentRecord>>, ApiError> {
  require_vehicle(&engine, id).await?;
  let query = params.into_query(HistoryQuery::for_vehicle(id));
  Ok(Json(engine.store().history(query).await?))
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceBody {
  pub on: bool,
}

/// `POST /vehicles/:id/maintenance`: body: `{"on":true}`
pub async fn maintenance<S: AssignmentStore>(
  State(engine): State<AssignmentEngine<S>>,
  Path(id): Path<Uuid>,
  extract::Json(body): extract::Json<MaintenanceBody>,
) -> Result<Json<Vehicle>, ApiError> {
  Ok(Json(engine.set_maintenance(id, body.on).await?))
}

async fn require_vehicle<S: AssignmentStore>(
  engine: &AssignmentEngine<S>,
  id: Uuid,
) -> Result<Vehicle, ApiError> {
  engine
    .store()
    .get_vehicle(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("vehicle {id} not found")))
}
