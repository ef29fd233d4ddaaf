//! The `AssignmentStore` and `Transaction` traits and supporting query types.
//!
//! A backend (e.g. `convoy-store-sqlite`) implements two things: a
//! [`Transaction`] handle with record-level reads and writes, and the two
//! entry points [`AssignmentStore::transact`] and
//! [`AssignmentStore::snapshot`] that run a closure inside one atomic unit.
//! Everything else on the store trait is provided on top of those.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  assignment::AssignmentRecord,
  audit::{self, Violation},
  driver::{Driver, NewDriver},
  vehicle::{NewVehicle, Vehicle, VehicleType},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for ledger queries. Results are ordered by `assigned_at`,
/// newest first.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
  pub vehicle_id:  Option<Uuid>,
  pub driver_id:   Option<Uuid>,
  /// Only records with `Active` status.
  pub active_only: bool,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl HistoryQuery {
  pub fn for_vehicle(vehicle_id: Uuid) -> Self {
    Self { vehicle_id: Some(vehicle_id), ..Default::default() }
  }

  pub fn for_driver(driver_id: Uuid) -> Self {
    Self { driver_id: Some(driver_id), ..Default::default() }
  }

  pub fn active() -> Self { Self { active_only: true, ..Default::default() } }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

/// Record-level access inside one atomic unit of work.
///
/// Nothing written through a transaction is visible to other callers until
/// the closure passed to [`AssignmentStore::transact`] returns `Ok`. Returning
/// `Err` discards every write.
pub trait Transaction {
  // ── Reads ─────────────────────────────────────────────────────────────

  fn vehicle(&self, id: Uuid) -> Result<Option<Vehicle>>;

  fn driver(&self, id: Uuid) -> Result<Option<Driver>>;

  fn vehicle_type(&self, id: Uuid) -> Result<Option<VehicleType>>;

  fn vehicles(&self) -> Result<Vec<Vehicle>>;

  fn drivers(&self) -> Result<Vec<Driver>>;

  fn vehicle_types(&self) -> Result<Vec<VehicleType>>;

  fn record(&self, id: Uuid) -> Result<Option<AssignmentRecord>>;

  /// Ledger entries matching `query`, newest first.
  fn history(&self, query: &HistoryQuery) -> Result<Vec<AssignmentRecord>>;

  /// Active records on a vehicle, newest first.
  fn active_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<AssignmentRecord>> {
    self.history(&HistoryQuery {
      vehicle_id: Some(vehicle_id),
      active_only: true,
      ..Default::default()
    })
  }

  /// Active records of a driver, newest first.
  fn active_for_driver(&self, driver_id: Uuid) -> Result<Vec<AssignmentRecord>> {
    self.history(&HistoryQuery {
      driver_id: Some(driver_id),
      active_only: true,
      ..Default::default()
    })
  }

  // ── Writes ────────────────────────────────────────────────────────────

  fn insert_vehicle_type(&mut self, vehicle_type: &VehicleType) -> Result<()>;

  /// Insert or replace a vehicle.
  fn put_vehicle(&mut self, vehicle: &Vehicle) -> Result<()>;

  /// Insert or replace a driver.
  fn put_driver(&mut self, driver: &Driver) -> Result<()>;

  /// Append a ledger entry.
  fn insert_record(&mut self, record: &AssignmentRecord) -> Result<()>;

  /// Persist the lifecycle fields (status, primacy, end data) of an active
  /// record. Fails with [`crate::Error::RecordEnded`] if the stored record is
  /// already ended.
  fn update_record(&mut self, record: &AssignmentRecord) -> Result<()>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Abstraction over a Convoy storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AssignmentStore: Send + Sync {
  /// Run `f` inside a write transaction and commit if it returns `Ok`.
  ///
  /// Reads made by `f` observe the same state its writes apply to, so
  /// read-then-write logic inside `f` cannot lose an update to a concurrent
  /// caller.
  fn transact<T, F>(&self, f: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Transaction) -> Result<T> + Send + 'static;

  /// Run `f` against a consistent read-only view.
  fn snapshot<T, F>(&self, f: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&dyn Transaction) -> Result<T> + Send + 'static;

  // ── Registration ──────────────────────────────────────────────────────

  fn add_vehicle_type(
    &self,
    name: String,
  ) -> impl Future<Output = Result<VehicleType>> + Send + '_ {
    self.transact(move |tx| {
      let name = name.trim().to_owned();
      if name.is_empty() {
        return Err(crate::Error::Invalid("vehicle type name is empty".into()));
      }
      let vehicle_type = VehicleType { vehicle_type_id: Uuid::new_v4(), name };
      tx.insert_vehicle_type(&vehicle_type)?;
      Ok(vehicle_type)
    })
  }

  fn add_vehicle(
    &self,
    input: NewVehicle,
  ) -> impl Future<Output = Result<Vehicle>> + Send + '_ {
    self.transact(move |tx| {
      if let Some(type_id) = input.vehicle_type_id
        && tx.vehicle_type(type_id)?.is_none()
      {
        return Err(crate::Error::VehicleTypeNotFound(type_id));
      }
      let vehicle = input.into_vehicle()?;
      tx.put_vehicle(&vehicle)?;
      Ok(vehicle)
    })
  }

  fn add_driver(
    &self,
    input: NewDriver,
  ) -> impl Future<Output = Result<Driver>> + Send + '_ {
    self.transact(move |tx| {
      let driver = input.into_driver()?;
      tx.put_driver(&driver)?;
      Ok(driver)
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_vehicle(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Vehicle>>> + Send + '_ {
    self.snapshot(move |tx| tx.vehicle(id))
  }

  fn get_driver(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Driver>>> + Send + '_ {
    self.snapshot(move |tx| tx.driver(id))
  }

  fn get_record(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AssignmentRecord>>> + Send + '_ {
    self.snapshot(move |tx| tx.record(id))
  }

  fn list_vehicles(&self) -> impl Future<Output = Result<Vec<Vehicle>>> + Send + '_ {
    self.snapshot(|tx| tx.vehicles())
  }

  fn list_drivers(&self) -> impl Future<Output = Result<Vec<Driver>>> + Send + '_ {
    self.snapshot(|tx| tx.drivers())
  }

  fn list_vehicle_types(
    &self,
  ) -> impl Future<Output = Result<Vec<VehicleType>>> + Send + '_ {
    self.snapshot(|tx| tx.vehicle_types())
  }

  fn history(
    &self,
    query: HistoryQuery,
  ) -> impl Future<Output = Result<Vec<AssignmentRecord>>> + Send + '_ {
    self.snapshot(move |tx| tx.history(&query))
  }

  /// Check the ledger invariants over one consistent snapshot.
  fn audit(&self) -> impl Future<Output = Result<Vec<Violation>>> + Send + '_ {
    self.snapshot(|tx| {
      let vehicles = tx.vehicles()?;
      let drivers = tx.drivers()?;
      let active = tx.history(&HistoryQuery::active())?;
      Ok(audit::audit(&vehicles, &drivers, &active))
    })
  }
}
