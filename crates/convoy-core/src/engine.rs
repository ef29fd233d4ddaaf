//! [`AssignmentEngine`]: the only writer of assignment state.
//!
//! Every operation runs as one [`AssignmentStore::transact`] call. Inside it
//! the engine reads the current ledger, applies record transitions, and then
//! re-derives the denormalised fields of every vehicle and driver it touched
//! (see [`crate::projection`]). An error anywhere discards all writes.

use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, ErrorKind, Result,
  assignment::{
    AssignRequest, AssignmentMode, AssignmentRecord, SetPrimaryRequest,
    UnassignRequest,
  },
  compliance::{ComplianceChecker, ComplianceReport},
  driver::{Driver, DriverStatus},
  projection,
  store::{AssignmentStore, Transaction},
  vehicle::{Vehicle, VehicleStatus},
};

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Cloning is cheap; the store and checker are reference-counted.
pub struct AssignmentEngine<S> {
  store:   Arc<S>,
  checker: Arc<ComplianceChecker>,
}

impl<S> Clone for AssignmentEngine<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      checker: Arc::clone(&self.checker),
    }
  }
}

impl<S: AssignmentStore> AssignmentEngine<S> {
  pub fn new(store: Arc<S>, checker: ComplianceChecker) -> Self {
    Self { store, checker: Arc::new(checker) }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn checker(&self) -> &ComplianceChecker { &self.checker }

  /// Run the compliance check for a stored driver and vehicle without
  /// writing anything. A failing check is reported, not returned as an error.
  pub async fn check(
    &self,
    driver_id: Uuid,
    vehicle_id: Uuid,
  ) -> Result<ComplianceReport> {
    let checker = Arc::clone(&self.checker);
    self
      .store
      .snapshot(move |tx| {
        let driver = load_driver(tx, driver_id)?;
        let vehicle = load_vehicle(tx, vehicle_id)?;
        let type_name = vehicle_type_name(tx, &vehicle)?;
        Ok(ComplianceReport::from(checker.check(
          &driver.license_classes,
          &type_name,
          vehicle.has_trailer(),
        )))
      })
      .await
  }

  /// Make `driver_id` the primary driver of `vehicle_id` with a new ledger
  /// record and return its id.
  pub async fn assign(&self, request: AssignRequest) -> Result<Uuid> {
    let checker = Arc::clone(&self.checker);
    let (driver_id, vehicle_id, mode) =
      (request.driver_id, request.vehicle_id, request.mode);

    let outcome = self
      .store
      .transact(move |tx| assign_in(tx, &checker, request, Utc::now()))
      .await;

    match &outcome {
      Ok(record_id) => tracing::info!(
        %record_id, %driver_id, %vehicle_id, ?mode, "driver assigned"
      ),
      Err(e) => log_failure("assign", driver_id, vehicle_id, e),
    }
    outcome
  }

  /// Switch which of the driver's existing links is operational.
  pub async fn set_primary_vehicle(&self, request: SetPrimaryRequest) -> Result<()> {
    let (driver_id, vehicle_id, force) =
      (request.driver_id, request.vehicle_id, request.force);

    let outcome = self
      .store
      .transact(move |tx| set_primary_in(tx, request))
      .await;

    match &outcome {
      Ok(()) => tracing::info!(%driver_id, %vehicle_id, force, "primary vehicle set"),
      Err(e) => log_failure("set_primary_vehicle", driver_id, vehicle_id, e),
    }
    outcome
  }

  /// End the driver's active link(s) to the vehicle. Returns the ended
  /// record ids.
  pub async fn unassign(&self, request: UnassignRequest) -> Result<Vec<Uuid>> {
    let (driver_id, vehicle_id) = (request.driver_id, request.vehicle_id);

    let outcome = self
      .store
      .transact(move |tx| unassign_in(tx, request, Utc::now()))
      .await;

    match &outcome {
      Ok(ended) => tracing::info!(
        %driver_id, %vehicle_id, ended = ended.len(), "driver unassigned"
      ),
      Err(e) => log_failure("unassign", driver_id, vehicle_id, e),
    }
    outcome
  }

  /// Move a vehicle into or out of maintenance.
  pub async fn set_maintenance(&self, vehicle_id: Uuid, on: bool) -> Result<Vehicle> {
    let outcome = self
      .store
      .transact(move |tx| set_maintenance_in(tx, vehicle_id, on))
      .await;

    match &outcome {
      Ok(vehicle) => {
        tracing::info!(%vehicle_id, status = ?vehicle.status, "maintenance toggled")
      }
      Err(e) => tracing::warn!(%vehicle_id, error = %e, "maintenance toggle failed"),
    }
    outcome
  }
}

fn log_failure(operation: &str, driver_id: Uuid, vehicle_id: Uuid, error: &Error) {
  match error.kind() {
    ErrorKind::Conflict => tracing::warn!(
      operation, %driver_id, %vehicle_id, error = %error, "assignment conflict"
    ),
    ErrorKind::Store => tracing::error!(
      operation, %driver_id, %vehicle_id, error = %error, "assignment store failure"
    ),
    ErrorKind::Validation | ErrorKind::NotFound => tracing::debug!(
      operation, %driver_id, %vehicle_id, error = %error, "assignment rejected"
    ),
  }
}

// ─── Transactional bodies ────────────────────────────────────────────────────

/// Vehicles and drivers whose denormalised fields must be re-derived before
/// the transaction commits.
#[derive(Default)]
struct Touched {
  vehicles: BTreeSet<Uuid>,
  drivers:  BTreeSet<Uuid>,
}

impl Touched {
  fn record(&mut self, record: &AssignmentRecord) {
    self.vehicles.insert(record.vehicle_id);
    self.drivers.insert(record.driver_id);
  }

  fn refresh(self, tx: &mut dyn Transaction) -> Result<()> {
    for vehicle_id in self.vehicles {
      refresh_vehicle(tx, vehicle_id)?;
    }
    for driver_id in self.drivers {
      refresh_driver(tx, driver_id)?;
    }
    Ok(())
  }
}

fn assign_in(
  tx: &mut dyn Transaction,
  checker: &ComplianceChecker,
  request: AssignRequest,
  now: DateTime<Utc>,
) -> Result<Uuid> {
  let vehicle = load_vehicle(tx, request.vehicle_id)?;
  let mut driver = load_driver(tx, request.driver_id)?;

  if vehicle.status == VehicleStatus::Maintenance {
    return Err(Error::VehicleInMaintenance(vehicle.vehicle_id));
  }
  let type_name = vehicle_type_name(tx, &vehicle)?;
  checker.check(&driver.license_classes, &type_name, vehicle.has_trailer())?;

  let on_vehicle = tx.active_for_vehicle(vehicle.vehicle_id)?;
  let current = projection::primary_of(&on_vehicle).cloned();
  request
    .takeover
    .verify(vehicle.vehicle_id, current.as_ref().map(|r| r.record_id))?;

  let mut touched = Touched::default();

  // The vehicle's operational driver steps down but keeps the link.
  if let Some(mut holder) = current
    && holder.driver_id != driver.driver_id
  {
    holder.demote()?;
    tx.update_record(&holder)?;
    touched.record(&holder);
  }

  // The driver's own links: ended or demoted by mode. A previous link to the
  // same vehicle is always ended so the pair has one active record.
  for mut record in tx.active_for_driver(driver.driver_id)? {
    let same_vehicle = record.vehicle_id == vehicle.vehicle_id;
    match request.mode {
      AssignmentMode::Exclusive => {
        record.end(&request.assigned_by, None, now)?
      }
      AssignmentMode::Shared if same_vehicle => {
        record.end(&request.assigned_by, None, now)?
      }
      AssignmentMode::Shared => record.demote()?,
    }
    tx.update_record(&record)?;
    touched.record(&record);
  }

  let start_odometer = request.start_odometer.unwrap_or(vehicle.odometer);
  if start_odometer > vehicle.odometer {
    let mut vehicle = vehicle.clone();
    vehicle.odometer = start_odometer;
    tx.put_vehicle(&vehicle)?;
  }

  let record = AssignmentRecord::open(
    driver.driver_id,
    vehicle.vehicle_id,
    request.assigned_by,
    start_odometer,
    request.notes,
    now,
  );
  tx.insert_record(&record)?;
  touched.record(&record);

  if driver.status != DriverStatus::Active {
    driver.status = DriverStatus::Active;
    tx.put_driver(&driver)?;
  }

  touched.refresh(tx)?;
  Ok(record.record_id)
}

fn set_primary_in(tx: &mut dyn Transaction, request: SetPrimaryRequest) -> Result<()> {
  let vehicle = load_vehicle(tx, request.vehicle_id)?;
  let driver = load_driver(tx, request.driver_id)?;

  let links = tx.active_for_driver(driver.driver_id)?;
  // Newest link wins if the pair somehow carries more than one.
  let target = links
    .iter()
    .position(|r| r.vehicle_id == vehicle.vehicle_id)
    .ok_or(Error::NotLinked {
      driver_id:  driver.driver_id,
      vehicle_id: vehicle.vehicle_id,
    })?;

  let mut touched = Touched::default();

  let on_vehicle = tx.active_for_vehicle(vehicle.vehicle_id)?;
  if let Some(holder) = projection::primary_of(&on_vehicle)
    && holder.driver_id != driver.driver_id
  {
    if !request.force {
      return Err(Error::PrimaryHeld {
        vehicle_id: vehicle.vehicle_id,
        driver_id:  holder.driver_id,
        record_id:  holder.record_id,
      });
    }
    let mut holder = holder.clone();
    holder.demote()?;
    tx.update_record(&holder)?;
    touched.record(&holder);
  }

  // Demotions go first so no write ever leaves two primaries for the driver.
  let mut promoted = None;
  for (index, mut record) in links.into_iter().enumerate() {
    touched.record(&record);
    if index == target {
      promoted = Some(record);
    } else if record.is_primary {
      record.demote()?;
      tx.update_record(&record)?;
    }
  }
  if let Some(mut record) = promoted
    && !record.is_primary
  {
    record.promote()?;
    tx.update_record(&record)?;
  }

  tracing::debug!(
    driver_id = %driver.driver_id,
    vehicle_id = %vehicle.vehicle_id,
    updated_by = %request.updated_by,
    "primacy re-flagged"
  );

  touched.refresh(tx)
}

fn unassign_in(
  tx: &mut dyn Transaction,
  request: UnassignRequest,
  now: DateTime<Utc>,
) -> Result<Vec<Uuid>> {
  let mut vehicle = load_vehicle(tx, request.vehicle_id)?;
  let driver = load_driver(tx, request.driver_id)?;

  let links: Vec<_> = tx
    .active_for_driver(driver.driver_id)?
    .into_iter()
    .filter(|r| r.vehicle_id == vehicle.vehicle_id)
    .collect();
  if links.is_empty() {
    return Err(Error::NotLinked {
      driver_id:  driver.driver_id,
      vehicle_id: vehicle.vehicle_id,
    });
  }

  let end_odometer = request.end_odometer.unwrap_or(vehicle.odometer);
  let mut touched = Touched::default();
  let mut ended = Vec::with_capacity(links.len());
  for mut record in links {
    record.end(&request.unassigned_by, Some(end_odometer), now)?;
    tx.update_record(&record)?;
    touched.record(&record);
    ended.push(record.record_id);
  }

  if end_odometer > vehicle.odometer {
    vehicle.odometer = end_odometer;
    tx.put_vehicle(&vehicle)?;
  }

  touched.refresh(tx)?;
  Ok(ended)
}

fn set_maintenance_in(
  tx: &mut dyn Transaction,
  vehicle_id: Uuid,
  on: bool,
) -> Result<Vehicle> {
  let mut vehicle = load_vehicle(tx, vehicle_id)?;
  let active = tx.active_for_vehicle(vehicle_id)?;
  if on && !active.is_empty() {
    return Err(Error::VehicleBusy(vehicle_id));
  }

  let status = if on {
    VehicleStatus::Maintenance
  } else {
    projection::vehicle_status(VehicleStatus::Available, &active)
  };
  if vehicle.status != status {
    vehicle.status = status;
    tx.put_vehicle(&vehicle)?;
  }
  Ok(vehicle)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn load_vehicle(tx: &dyn Transaction, id: Uuid) -> Result<Vehicle> {
  tx.vehicle(id)?.ok_or(Error::VehicleNotFound(id))
}

fn load_driver(tx: &dyn Transaction, id: Uuid) -> Result<Driver> {
  tx.driver(id)?.ok_or(Error::DriverNotFound(id))
}

/// Empty when the vehicle has no type; no category rule matches then.
fn vehicle_type_name(tx: &dyn Transaction, vehicle: &Vehicle) -> Result<String> {
  match vehicle.vehicle_type_id {
    Some(id) => Ok(
      tx.vehicle_type(id)?
        .ok_or(Error::VehicleTypeNotFound(id))?
        .name,
    ),
    None => Ok(String::new()),
  }
}

/// Re-derive status and operational driver of a vehicle from its links.
fn refresh_vehicle(tx: &mut dyn Transaction, vehicle_id: Uuid) -> Result<()> {
  let mut vehicle = load_vehicle(tx, vehicle_id)?;
  let active = tx.active_for_vehicle(vehicle_id)?;

  let (driver_id, driver_name) = match projection::primary_of(&active) {
    Some(primary) => {
      let driver = load_driver(tx, primary.driver_id)?;
      (Some(driver.driver_id), Some(driver.display_name))
    }
    None => (None, None),
  };
  let status = projection::vehicle_status(vehicle.status, &active);

  if vehicle.driver_id != driver_id
    || vehicle.driver_name != driver_name
    || vehicle.status != status
  {
    vehicle.driver_id = driver_id;
    vehicle.driver_name = driver_name;
    vehicle.status = status;
    tx.put_vehicle(&vehicle)?;
  }
  Ok(())
}

/// Re-derive a driver's primary vehicle from its links.
fn refresh_driver(tx: &mut dyn Transaction, driver_id: Uuid) -> Result<()> {
  let mut driver = load_driver(tx, driver_id)?;
  let assigned = projection::assigned_vehicle(&tx.active_for_driver(driver_id)?);
  if driver.assigned_vehicle_id != assigned {
    driver.assigned_vehicle_id = assigned;
    tx.put_driver(&driver)?;
  }
  Ok(())
}
