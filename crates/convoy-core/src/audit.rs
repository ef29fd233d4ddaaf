//! Consistency audit of the denormalised fields against the ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  assignment::AssignmentRecord,
  driver::Driver,
  projection,
  vehicle::{Vehicle, VehicleStatus},
};

/// A broken ledger invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
  /// More than one active primary record on a vehicle.
  VehiclePrimaries { vehicle_id: Uuid, records: Vec<Uuid> },
  /// More than one active primary record for a driver.
  DriverPrimaries { driver_id: Uuid, records: Vec<Uuid> },
  /// `Driver::assigned_vehicle_id` disagrees with the ledger.
  DriverPointer {
    driver_id: Uuid,
    expected:  Option<Uuid>,
    found:     Option<Uuid>,
  },
  /// `Vehicle::driver_id` or `driver_name` disagrees with the ledger.
  VehicleDriver {
    vehicle_id: Uuid,
    expected:   Option<Uuid>,
    found:      Option<Uuid>,
  },
  VehicleStatus {
    vehicle_id: Uuid,
    expected:   VehicleStatus,
    found:      VehicleStatus,
  },
}

/// Check every invariant over a consistent set of vehicles, drivers and
/// active records. Returns an empty list when the view is consistent.
pub fn audit(
  vehicles: &[Vehicle],
  drivers: &[Driver],
  active: &[AssignmentRecord],
) -> Vec<Violation> {
  let mut by_vehicle: BTreeMap<Uuid, Vec<AssignmentRecord>> = BTreeMap::new();
  let mut by_driver: BTreeMap<Uuid, Vec<AssignmentRecord>> = BTreeMap::new();
  for record in active.iter().filter(|r| r.is_active()) {
    by_vehicle.entry(record.vehicle_id).or_default().push(record.clone());
    by_driver.entry(record.driver_id).or_default().push(record.clone());
  }

  let names: BTreeMap<Uuid, &str> = drivers
    .iter()
    .map(|d| (d.driver_id, d.display_name.as_str()))
    .collect();

  let mut violations = Vec::new();

  for vehicle in vehicles {
    let records = by_vehicle
      .get(&vehicle.vehicle_id)
      .map(Vec::as_slice)
      .unwrap_or_default();

    let primaries = primary_ids(records);
    if primaries.len() > 1 {
      violations.push(Violation::VehiclePrimaries {
        vehicle_id: vehicle.vehicle_id,
        records:    primaries,
      });
    }

    let expected_driver = projection::primary_of(records).map(|r| r.driver_id);
    let expected_name = expected_driver.and_then(|id| names.get(&id).copied());
    if vehicle.driver_id != expected_driver
      || vehicle.driver_name.as_deref() != expected_name
    {
      violations.push(Violation::VehicleDriver {
        vehicle_id: vehicle.vehicle_id,
        expected:   expected_driver,
        found:      vehicle.driver_id,
      });
    }

    let expected_status = projection::vehicle_status(vehicle.status, records);
    if vehicle.status != expected_status {
      violations.push(Violation::VehicleStatus {
        vehicle_id: vehicle.vehicle_id,
        expected:   expected_status,
        found:      vehicle.status,
      });
    }
  }

  for driver in drivers {
    let records = by_driver
      .get(&driver.driver_id)
      .map(Vec::as_slice)
      .unwrap_or_default();

    let primaries = primary_ids(records);
    if primaries.len() > 1 {
      violations.push(Violation::DriverPrimaries {
        driver_id: driver.driver_id,
        records:   primaries,
      });
    }

    let expected = projection::assigned_vehicle(records);
    if driver.assigned_vehicle_id != expected {
      violations.push(Violation::DriverPointer {
        driver_id: driver.driver_id,
        expected,
        found: driver.assigned_vehicle_id,
      });
    }
  }

  violations
}

fn primary_ids(records: &[AssignmentRecord]) -> Vec<Uuid> {
  records
    .iter()
    .filter(|r| r.is_active_primary())
    .map(|r| r.record_id)
    .collect()
}
