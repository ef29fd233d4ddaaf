//! Vehicles and vehicle types.
//!
//! `driver_id`, `driver_name` and `status` are a materialised view over the
//! assignment ledger. Only [`crate::engine::AssignmentEngine`] writes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Operational status of a vehicle.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleStatus {
  /// No active assignment.
  #[default]
  Available,
  /// Linked to one or more drivers, none of them operational.
  Ready,
  /// Has an operational (primary) driver.
  InUse,
  Maintenance,
}

// ─── Vehicle type ────────────────────────────────────────────────────────────

/// A vehicle category such as "Van" or "Truck 18t". The name feeds the
/// license compliance rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleType {
  pub vehicle_type_id: Uuid,
  pub name:            String,
}

// ─── Vehicle ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
  pub vehicle_id:            Uuid,
  pub license_plate:         String,
  pub status:                VehicleStatus,
  /// Driver of the vehicle's primary assignment, if any.
  pub driver_id:             Option<Uuid>,
  pub driver_name:           Option<String>,
  pub odometer:              u32,
  pub vehicle_type_id:       Option<Uuid>,
  /// Plate of the attached trailer; presence means a trailer is attached.
  pub trailer_license_plate: Option<String>,
  pub created_at:            DateTime<Utc>,
}

impl Vehicle {
  pub fn has_trailer(&self) -> bool {
    self
      .trailer_license_plate
      .as_deref()
      .is_some_and(|plate| !plate.trim().is_empty())
  }
}

/// Input to [`crate::store::AssignmentStore::add_vehicle`].
#[derive(Debug, Clone)]
pub struct NewVehicle {
  pub license_plate:         String,
  pub odometer:              u32,
  pub vehicle_type_id:       Option<Uuid>,
  pub trailer_license_plate: Option<String>,
}

impl NewVehicle {
  pub fn new(license_plate: impl Into<String>) -> Self {
    Self {
      license_plate:         license_plate.into(),
      odometer:              0,
      vehicle_type_id:       None,
      trailer_license_plate: None,
    }
  }

  /// Build the persisted vehicle. A new vehicle has no assignment and is
  /// therefore `Available`.
  pub fn into_vehicle(self) -> crate::Result<Vehicle> {
    let license_plate = self.license_plate.trim().to_owned();
    if license_plate.is_empty() {
      return Err(crate::Error::Invalid("license plate is empty".into()));
    }
    let trailer_license_plate = self
      .trailer_license_plate
      .map(|plate| plate.trim().to_owned())
      .filter(|plate| !plate.is_empty());

    Ok(Vehicle {
      vehicle_id: Uuid::new_v4(),
      license_plate,
      status: VehicleStatus::Available,
      driver_id: None,
      driver_name: None,
      odometer: self.odometer,
      vehicle_type_id: self.vehicle_type_id,
      trailer_license_plate,
      created_at: Utc::now(),
    })
  }
}
