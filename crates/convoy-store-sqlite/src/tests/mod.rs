//! Integration tests for `SqliteStore` and the engine running on top of it,
//! against an in-memory database.

mod store;

use std::sync::Arc;

use convoy_core::{
  compliance::ComplianceChecker,
  driver::{Driver, NewDriver},
  engine::AssignmentEngine,
  store::AssignmentStore,
  vehicle::{NewVehicle, Vehicle},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn engine() -> AssignmentEngine<SqliteStore> {
  AssignmentEngine::new(Arc::new(store().await), ComplianceChecker::default())
}

async fn vehicle(s: &SqliteStore, plate: &str) -> Vehicle {
  s.add_vehicle(NewVehicle::new(plate)).await.unwrap()
}

async fn driver(s: &SqliteStore, name: &str, classes: &[&str]) -> Driver {
  s.add_driver(NewDriver::new(name, classes.iter().copied()))
    .await
    .unwrap()
}

/// Re-read a vehicle after an engine call.
async fn reload_vehicle(s: &SqliteStore, v: &Vehicle) -> Vehicle {
  s.get_vehicle(v.vehicle_id).await.unwrap().unwrap()
}

async fn reload_driver(s: &SqliteStore, d: &Driver) -> Driver {
  s.get_driver(d.driver_id).await.unwrap().unwrap()
}

async fn assert_consistent(s: &SqliteStore) {
  let violations = s.audit().await.unwrap();
  assert!(violations.is_empty(), "ledger violations: {violations:?}");
}
