//! Error types for `convoy-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::compliance::ComplianceViolation;

#[derive(Debug, Error)]
pub enum Error {
  #[error("license check failed: {0}")]
  Compliance(#[from] ComplianceViolation),

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("vehicle {0} is in maintenance")]
  VehicleInMaintenance(Uuid),

  #[error("odometer reading {end} is below the assignment start reading {start}")]
  OdometerRegression { start: u32, end: u32 },

  #[error("vehicle not found: {0}")]
  VehicleNotFound(Uuid),

  #[error("driver not found: {0}")]
  DriverNotFound(Uuid),

  #[error("vehicle type not found: {0}")]
  VehicleTypeNotFound(Uuid),

  #[error("assignment record not found: {0}")]
  RecordNotFound(Uuid),

  #[error("driver {driver_id} has no active assignment on vehicle {vehicle_id}")]
  NotLinked { driver_id: Uuid, vehicle_id: Uuid },

  #[error("vehicle {vehicle_id} is currently primary for driver {driver_id}")]
  PrimaryHeld {
    vehicle_id: Uuid,
    driver_id:  Uuid,
    record_id:  Uuid,
  },

  #[error(
    "primary assignment of vehicle {vehicle_id} changed (expected {expected:?}, found {found:?})"
  )]
  PrimaryChanged {
    vehicle_id: Uuid,
    expected:   Option<Uuid>,
    found:      Option<Uuid>,
  },

  #[error("vehicle {0} still has active assignments")]
  VehicleBusy(Uuid),

  #[error("assignment record {0} is ended")]
  RecordEnded(Uuid),

  #[error("write conflict: {0}")]
  WriteConflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification used at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The request was rejected before anything was written.
  Validation,
  NotFound,
  /// Another writer got there first, or the caller must confirm a takeover.
  /// Safe to retry.
  Conflict,
  Store,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Compliance(_)
      | Self::Invalid(_)
      | Self::VehicleInMaintenance(_)
      | Self::OdometerRegression { .. } => ErrorKind::Validation,
      Self::VehicleNotFound(_)
      | Self::DriverNotFound(_)
      | Self::VehicleTypeNotFound(_)
      | Self::RecordNotFound(_)
      | Self::NotLinked { .. } => ErrorKind::NotFound,
      Self::PrimaryHeld { .. }
      | Self::PrimaryChanged { .. }
      | Self::VehicleBusy(_)
      | Self::RecordEnded(_)
      | Self::WriteConflict(_) => ErrorKind::Conflict,
      Self::Store(_) => ErrorKind::Store,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
