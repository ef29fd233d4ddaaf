use convoy_core::{
  Error, ErrorKind,
  assignment::{AssignRequest, AssignmentMode, RecordStatus, UnassignRequest},
  store::{AssignmentStore, HistoryQuery},
  vehicle::{NewVehicle, Vehicle, VehicleStatus},
};
use uuid::Uuid;

use super::{driver, engine, store, vehicle};

// ─── Registration ────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_vehicle() {
  let s = store().await;

  let mut input = NewVehicle::new("  KA-1234 ");
  input.odometer = 1200;
  input.trailer_license_plate = Some("TR-9".into());
  let v = s.add_vehicle(input).await.unwrap();

  let fetched = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  assert_eq!(fetched, v);
  assert_eq!(fetched.license_plate, "KA-1234");
  assert_eq!(fetched.status, VehicleStatus::Available);
  assert_eq!(fetched.odometer, 1200);
  assert!(fetched.has_trailer());
}

#[tokio::test]
async fn get_vehicle_missing_returns_none() {
  let s = store().await;
  assert!(s.get_vehicle(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn add_vehicle_with_unknown_type_is_rejected() {
  let s = store().await;
  let missing = Uuid::new_v4();

  let mut input = NewVehicle::new("KA-1");
  input.vehicle_type_id = Some(missing);
  let err = s.add_vehicle(input).await.unwrap_err();

  assert!(matches!(err, Error::VehicleTypeNotFound(id) if id == missing));
  assert!(s.list_vehicles().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_vehicle_with_known_type() {
  let s = store().await;
  let truck = s.add_vehicle_type("Truck 18t".into()).await.unwrap();

  let mut input = NewVehicle::new("KA-1");
  input.vehicle_type_id = Some(truck.vehicle_type_id);
  let v = s.add_vehicle(input).await.unwrap();

  assert_eq!(v.vehicle_type_id, Some(truck.vehicle_type_id));
  assert_eq!(s.list_vehicle_types().await.unwrap(), vec![truck]);
}

#[tokio::test]
async fn duplicate_license_plate_is_a_conflict() {
  let s = store().await;
  vehicle(&s, "KA-1").await;

  let err = s.add_vehicle(NewVehicle::new("KA-1")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn blank_vehicle_type_name_is_invalid() {
  let s = store().await;
  let err = s.add_vehicle_type("   ".into()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn add_driver_normalises_classes() {
  let s = store().await;
  let d = driver(&s, "Ana", &[" c ", "e", "", "C"]).await;

  let fetched = s.get_driver(d.driver_id).await.unwrap().unwrap();
  assert_eq!(
    fetched.license_classes.iter().map(String::as_str).collect::<Vec<_>>(),
    vec!["C", "E"]
  );
  assert!(fetched.assigned_vehicle_id.is_none());
}

#[tokio::test]
async fn lists_are_sorted() {
  let s = store().await;
  vehicle(&s, "ZZ-9").await;
  vehicle(&s, "AA-1").await;
  driver(&s, "Zoe", &["B"]).await;
  driver(&s, "Adam", &["B"]).await;

  let plates: Vec<_> = s
    .list_vehicles()
    .await
    .unwrap()
    .into_iter()
    .map(|v| v.license_plate)
    .collect();
  assert_eq!(plates, vec!["AA-1", "ZZ-9"]);

  let names: Vec<_> = s
    .list_drivers()
    .await
    .unwrap()
    .into_iter()
    .map(|d| d.display_name)
    .collect();
  assert_eq!(names, vec!["Adam", "Zoe"]);
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_transaction_writes_nothing() {
  let s = store().await;

  let err = s
    .transact(|tx| {
      let v: Vehicle = NewVehicle::new("KA-1").into_vehicle()?;
      tx.put_vehicle(&v)?;
      Err::<(), _>(Error::Invalid("abort".into()))
    })
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Invalid(_)));
  assert!(s.list_vehicles().await.unwrap().is_empty());
}

#[tokio::test]
async fn ended_record_cannot_be_updated() {
  let e = engine().await;
  let s = e.store();
  let v = vehicle(s, "KA-1").await;
  let d = driver(s, "Ana", &["B"]).await;

  let record_id = e
    .assign(AssignRequest::new(d.driver_id, v.vehicle_id, "ops", AssignmentMode::Exclusive))
    .await
    .unwrap();
  e.unassign(UnassignRequest {
    driver_id:     d.driver_id,
    vehicle_id:    v.vehicle_id,
    unassigned_by: "ops".into(),
    end_odometer:  None,
  })
  .await
  .unwrap();

  let mut ended = s.get_record(record_id).await.unwrap().unwrap();
  assert_eq!(ended.status, RecordStatus::Ended);

  // Through the trait the stored status is checked first.
  ended.is_primary = false;
  let err = s
    .transact(move |tx| tx.update_record(&ended))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::RecordEnded(id) if id == record_id));

  // Raw SQL hits the schema triggers.
  assert!(
    s.execute_raw("UPDATE assignments SET notes = 'edited' WHERE status = 'ended'")
      .await
      .is_err()
  );
  assert!(s.execute_raw("DELETE FROM assignments").await.is_err());
  assert_eq!(s.history(HistoryQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn second_active_primary_on_a_vehicle_is_refused() {
  let e = engine().await;
  let s = e.store();
  let v = vehicle(s, "KA-1").await;
  let a = driver(s, "Ana", &["B"]).await;
  let b = driver(s, "Ben", &["B"]).await;

  e.assign(AssignRequest::new(a.driver_id, v.vehicle_id, "ops", AssignmentMode::Exclusive))
    .await
    .unwrap();

  // Bypass the engine and try to append a second primary link.
  let (driver_id, vehicle_id) = (b.driver_id, v.vehicle_id);
  let err = s
    .transact(move |tx| {
      let record = convoy_core::assignment::AssignmentRecord::open(
        driver_id,
        vehicle_id,
        "rogue".into(),
        0,
        None,
        chrono::Utc::now(),
      );
      tx.insert_record(&record)
    })
    .await
    .unwrap_err();

  assert!(matches!(err, Error::WriteConflict(_)));
  assert_eq!(s.history(HistoryQuery::for_vehicle(v.vehicle_id)).await.unwrap().len(), 1);
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn history_is_newest_first_and_paginates() {
  let e = engine().await;
  let s = e.store();
  let d = driver(s, "Ana", &["B"]).await;
  let mut vehicles = Vec::new();
  for plate in ["KA-1", "KA-2", "KA-3"] {
    let v = vehicle(s, plate).await;
    e.assign(AssignRequest::new(d.driver_id, v.vehicle_id, "ops", AssignmentMode::Exclusive))
      .await
      .unwrap();
    vehicles.push(v.vehicle_id);
  }

  let all = s.history(HistoryQuery::for_driver(d.driver_id)).await.unwrap();
  let order: Vec<_> = all.iter().map(|r| r.vehicle_id).collect();
  assert_eq!(order, vehicles.iter().rev().copied().collect::<Vec<_>>());
  assert_eq!(all.iter().filter(|r| r.is_active()).count(), 1);

  let page = s
    .history(HistoryQuery {
      limit: Some(1),
      offset: Some(1),
      ..HistoryQuery::for_driver(d.driver_id)
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].vehicle_id, vehicles[1]);

  let active = s
    .history(HistoryQuery { active_only: true, ..HistoryQuery::for_driver(d.driver_id) })
    .await
    .unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].vehicle_id, vehicles[2]);
}
