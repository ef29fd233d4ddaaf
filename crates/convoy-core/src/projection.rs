//! Derivation of the denormalised vehicle and driver fields from active
//! ledger records.
//!
//! The engine never sets `Vehicle::status`, `Vehicle::driver_id` or
//! `Driver::assigned_vehicle_id` directly; it mutates records and re-derives
//! these fields for every vehicle and driver the transaction touched.

use uuid::Uuid;

use crate::{assignment::AssignmentRecord, vehicle::VehicleStatus};

/// The unique active primary record among `active`, if any.
pub fn primary_of(active: &[AssignmentRecord]) -> Option<&AssignmentRecord> {
  active.iter().find(|r| r.is_active_primary())
}

/// Status a vehicle must have given its active records.
///
/// Maintenance sticks while nothing is linked; otherwise links decide.
pub fn vehicle_status(
  current: VehicleStatus,
  active: &[AssignmentRecord],
) -> VehicleStatus {
  let linked: Vec<_> = active.iter().filter(|r| r.is_active()).collect();
  if linked.iter().any(|r| r.is_primary) {
    VehicleStatus::InUse
  } else if !linked.is_empty() {
    VehicleStatus::Ready
  } else if current == VehicleStatus::Maintenance {
    VehicleStatus::Maintenance
  } else {
    VehicleStatus::Available
  }
}

/// The vehicle a driver's `assigned_vehicle_id` must point at.
pub fn assigned_vehicle(active: &[AssignmentRecord]) -> Option<Uuid> {
  primary_of(active).map(|r| r.vehicle_id)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn record(primary: bool) -> AssignmentRecord {
    let mut r = AssignmentRecord::open(
      Uuid::new_v4(),
      Uuid::new_v4(),
      "ops".into(),
      0,
      None,
      Utc::now(),
    );
    r.is_primary = primary;
    r
  }

  #[test]
  fn status_follows_links() {
    use VehicleStatus::*;

    assert_eq!(vehicle_status(InUse, &[]), Available);
    assert_eq!(vehicle_status(Maintenance, &[]), Maintenance);
    assert_eq!(vehicle_status(Available, &[record(false)]), Ready);
    assert_eq!(
      vehicle_status(Ready, &[record(false), record(true)]),
      InUse
    );
  }

  #[test]
  fn ended_records_do_not_count() {
    let mut ended = record(true);
    ended.end("ops", None, Utc::now()).unwrap();

    assert_eq!(
      vehicle_status(VehicleStatus::InUse, std::slice::from_ref(&ended)),
      VehicleStatus::Available
    );
    assert_eq!(assigned_vehicle(&[ended]), None);
  }
}
