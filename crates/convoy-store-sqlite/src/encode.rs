//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed nanosecond precision
//! so that text ordering matches time ordering. License classes are a compact
//! JSON array. UUIDs are stored as hyphenated lowercase strings. Enum columns
//! use the snake_case names derived on the core types.

use std::{collections::BTreeSet, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use convoy_core::{
  assignment::{AssignmentRecord, RecordStatus},
  driver::{Driver, DriverStatus},
  vehicle::{Vehicle, VehicleStatus, VehicleType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_enum<T: AsRef<str>>(value: &T) -> &str { value.as_ref() }

fn decode_enum<T: FromStr>(column: &'static str, value: &str) -> Result<T> {
  value.parse().map_err(|_| Error::UnknownVariant {
    column,
    value: value.to_owned(),
  })
}

pub fn encode_classes(classes: &BTreeSet<String>) -> Result<String> {
  Ok(serde_json::to_string(classes)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `vehicles` query; matches [`RawVehicle`].
pub const VEHICLE_COLUMNS: &str = "vehicle_id, license_plate, status, driver_id, \
  driver_name, odometer, vehicle_type_id, trailer_license_plate, created_at";

/// Raw values read directly from a `vehicles` row.
pub struct RawVehicle {
  pub vehicle_id:            String,
  pub license_plate:         String,
  pub status:                String,
  pub driver_id:             Option<String>,
  pub driver_name:           Option<String>,
  pub odometer:              u32,
  pub vehicle_type_id:       Option<String>,
  pub trailer_license_plate: Option<String>,
  pub created_at:            String,
}

impl RawVehicle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vehicle_id:            row.get(0)?,
      license_plate:         row.get(1)?,
      status:                row.get(2)?,
      driver_id:             row.get(3)?,
      driver_name:           row.get(4)?,
      odometer:              row.get(5)?,
      vehicle_type_id:       row.get(6)?,
      trailer_license_plate: row.get(7)?,
      created_at:            row.get(8)?,
    })
  }

  pub fn into_vehicle(self) -> Result<Vehicle> {
    Ok(Vehicle {
      vehicle_id:            decode_uuid(&self.vehicle_id)?,
      license_plate:         self.license_plate,
      status:                decode_enum::<VehicleStatus>("vehicles.status", &self.status)?,
      driver_id:             decode_opt_uuid(self.driver_id)?,
      driver_name:           self.driver_name,
      odometer:              self.odometer,
      vehicle_type_id:       decode_opt_uuid(self.vehicle_type_id)?,
      trailer_license_plate: self.trailer_license_plate,
      created_at:            decode_dt(&self.created_at)?,
    })
  }
}

pub const DRIVER_COLUMNS: &str =
  "driver_id, display_name, license_classes, status, assigned_vehicle_id, created_at";

/// Raw values read directly from a `drivers` row.
pub struct RawDriver {
  pub driver_id:           String,
  pub display_name:        String,
  pub license_classes:     String,
  pub status:              String,
  pub assigned_vehicle_id: Option<String>,
  pub created_at:          String,
}

impl RawDriver {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      driver_id:           row.get(0)?,
      display_name:        row.get(1)?,
      license_classes:     row.get(2)?,
      status:              row.get(3)?,
      assigned_vehicle_id: row.get(4)?,
      created_at:          row.get(5)?,
    })
  }

  pub fn into_driver(self) -> Result<Driver> {
    Ok(Driver {
      driver_id:           decode_uuid(&self.driver_id)?,
      display_name:        self.display_name,
      license_classes:     serde_json::from_str(&self.license_classes)?,
      status:              decode_enum::<DriverStatus>("drivers.status", &self.status)?,
      assigned_vehicle_id: decode_opt_uuid(self.assigned_vehicle_id)?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `vehicle_types` row.
pub struct RawVehicleType {
  pub vehicle_type_id: String,
  pub name:            String,
}

impl RawVehicleType {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { vehicle_type_id: row.get(0)?, name: row.get(1)? })
  }

  pub fn into_vehicle_type(self) -> Result<VehicleType> {
    Ok(VehicleType {
      vehicle_type_id: decode_uuid(&self.vehicle_type_id)?,
      name:            self.name,
    })
  }
}

pub const RECORD_COLUMNS: &str = "record_id, vehicle_id, driver_id, assigned_at, \
  assigned_by, start_odometer, status, is_primary, ended_at, ended_by, end_odometer, notes";

/// Raw values read directly from an `assignments` row.
pub struct RawRecord {
  pub record_id:      String,
  pub vehicle_id:     String,
  pub driver_id:      String,
  pub assigned_at:    String,
  pub assigned_by:    String,
  pub start_odometer: u32,
  pub status:         String,
  pub is_primary:     bool,
  pub ended_at:       Option<String>,
  pub ended_by:       Option<String>,
  pub end_odometer:   Option<u32>,
  pub notes:          Option<String>,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:      row.get(0)?,
      vehicle_id:     row.get(1)?,
      driver_id:      row.get(2)?,
      assigned_at:    row.get(3)?,
      assigned_by:    row.get(4)?,
      start_odometer: row.get(5)?,
      status:         row.get(6)?,
      is_primary:     row.get(7)?,
      ended_at:       row.get(8)?,
      ended_by:       row.get(9)?,
      end_odometer:   row.get(10)?,
      notes:          row.get(11)?,
    })
  }

  pub fn into_record(self) -> Result<AssignmentRecord> {
    Ok(AssignmentRecord {
      record_id:      decode_uuid(&self.record_id)?,
      vehicle_id:     decode_uuid(&self.vehicle_id)?,
      driver_id:      decode_uuid(&self.driver_id)?,
      assigned_at:    decode_dt(&self.assigned_at)?,
      assigned_by:    self.assigned_by,
      start_odometer: self.start_odometer,
      status:         decode_enum::<RecordStatus>("assignments.status", &self.status)?,
      is_primary:     self.is_primary,
      ended_at:       decode_opt_dt(self.ended_at)?,
      ended_by:       self.ended_by,
      end_odometer:   self.end_odometer,
      notes:          self.notes,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let whole = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let later = whole + chrono::Duration::milliseconds(1);

    let (a, b) = (encode_dt(whole), encode_dt(later));
    assert!(a < b);
    assert_eq!(decode_dt(&a).unwrap(), whole);
  }

  #[test]
  fn unknown_status_is_reported_with_column() {
    let err = decode_enum::<VehicleStatus>("vehicles.status", "parked").unwrap_err();
    assert!(matches!(
      err,
      Error::UnknownVariant { column: "vehicles.status", ref value } if value == "parked"
    ));
  }
}
