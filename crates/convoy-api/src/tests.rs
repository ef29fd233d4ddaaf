use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use convoy_core::{compliance::ComplianceChecker, engine::AssignmentEngine};
use convoy_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  api_router(AssignmentEngine::new(
    Arc::new(store),
    ComplianceChecker::default(),
  ))
}

async fn call(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  let resp = app
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create_vehicle(app: &Router, body: Value) -> String {
  let (status, v) = call(app, "POST", "/vehicles", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{v}");
  v["vehicle_id"].as_str().unwrap().to_owned()
}

async fn create_driver(app: &Router, name: &str, classes: &[&str]) -> String {
  let body = json!({ "display_name": name, "license_classes": classes });
  let (status, d) = call(app, "POST", "/drivers", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{d}");
  d["driver_id"].as_str().unwrap().to_owned()
}

async fn assert_consistent(app: &Router) {
  let (status, audit) = call(app, "GET", "/audit", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(audit["consistent"], json!(true), "{audit}");
}

// ── Registration ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_vehicle() {
  let app = app().await;
  let id = create_vehicle(&app, json!({ "license_plate": "KA-1", "odometer": 42 })).await;

  let (status, v) = call(&app, "GET", &format!("/vehicles/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(v["license_plate"], "KA-1");
  assert_eq!(v["status"], "available");
  assert_eq!(v["odometer"], 42);

  let (_, list) = call(&app, "GET", "/vehicles", None).await;
  assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_vehicle_is_404() {
  let app = app().await;
  let uri = format!("/vehicles/{}", uuid::Uuid::new_v4());
  let (status, body) = call(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn malformed_input_is_400() {
  let app = app().await;

  let (status, body) = call(&app, "GET", "/vehicles/not-a-uuid", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, _) = call(&app, "POST", "/drivers", Some(json!({ "name": "Ana" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_plate_is_422() {
  let app = app().await;
  let (status, _) =
    call(&app, "POST", "/vehicles", Some(json!({ "license_plate": "  " }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Assignment flow ──────────────────────────────────────────────────────────

#[tokio::test]
async fn assign_share_and_unassign() {
  let app = app().await;
  let v1 = create_vehicle(&app, json!({ "license_plate": "KA-1" })).await;
  let v2 = create_vehicle(&app, json!({ "license_plate": "KA-2" })).await;
  let d = create_driver(&app, "Ana", &["B"]).await;

  let (status, first) = call(
    &app,
    "POST",
    "/assignments",
    Some(json!({ "driver_id": d, "vehicle_id": v1, "assigned_by": "ops" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{first}");
  assert_eq!(first["status"], "active");
  assert_eq!(first["is_primary"], true);

  let (status, _) = call(
    &app,
    "POST",
    "/assignments",
    Some(json!({
      "driver_id": d, "vehicle_id": v2, "assigned_by": "ops", "mode": "shared"
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, vehicle) = call(&app, "GET", &format!("/vehicles/{v1}"), None).await;
  assert_eq!(vehicle["status"], "ready");
  let (_, driver) = call(&app, "GET", &format!("/drivers/{d}"), None).await;
  assert_eq!(driver["assigned_vehicle_id"], json!(v2));

  let (status, ended) = call(
    &app,
    "POST",
    "/assignments/unassign",
    Some(json!({ "driver_id": d, "vehicle_id": v2, "unassigned_by": "ops" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ended["ended"].as_array().unwrap().len(), 1);

  let (_, driver) = call(&app, "GET", &format!("/drivers/{d}"), None).await;
  assert_eq!(driver["assigned_vehicle_id"], Value::Null);

  let (_, active) = call(
    &app,
    "GET",
    &format!("/assignments?driver_id={d}&active_only=true"),
    None,
  )
  .await;
  let active = active.as_array().unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0]["record_id"], first["record_id"]);

  let (_, history) = call(&app, "GET", &format!("/vehicles/{v2}/history"), None).await;
  assert_eq!(history[0]["status"], "ended");
  assert_consistent(&app).await;
}

#[tokio::test]
async fn compliance_rejection_is_422() {
  let app = app().await;
  let (_, truck) =
    call(&app, "POST", "/vehicle-types", Some(json!({ "name": "Truck 18t" }))).await;
  let v = create_vehicle(
    &app,
    json!({ "license_plate": "KA-1", "vehicle_type_id": truck["vehicle_type_id"] }),
  )
  .await;
  let d = create_driver(&app, "Ana", &["B"]).await;

  let (status, report) = call(
    &app,
    "POST",
    "/compliance/check",
    Some(json!({ "driver_id": d, "vehicle_id": v })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["valid"], false);

  let (status, body) = call(
    &app,
    "POST",
    "/assignments",
    Some(json!({ "driver_id": d, "vehicle_id": v, "assigned_by": "ops" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("C or D"));
}

#[tokio::test]
async fn primary_conflict_is_409_until_forced() {
  let app = app().await;
  let v1 = create_vehicle(&app, json!({ "license_plate": "KA-1" })).await;
  let v2 = create_vehicle(&app, json!({ "license_plate": "KA-2" })).await;
  let ana = create_driver(&app, "Ana", &["B"]).await;
  let ben = create_driver(&app, "Ben", &["B"]).await;

  for body in [
    json!({ "driver_id": ana, "vehicle_id": v1, "assigned_by": "ops" }),
    json!({ "driver_id": ana, "vehicle_id": v2, "assigned_by": "ops", "mode": "shared" }),
    json!({ "driver_id": ben, "vehicle_id": v1, "assigned_by": "ops", "mode": "shared" }),
  ] {
    let (status, _) = call(&app, "POST", "/assignments", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (_, conflict) = call(
    &app,
    "GET",
    &format!("/vehicles/{v1}/conflict?driver_id={ana}"),
    None,
  )
  .await;
  assert_eq!(conflict["holder"]["driver_name"], "Ben");
  assert_eq!(
    conflict["warning"],
    "vehicle KA-1 is currently primary for driver Ben"
  );

  let uri = format!("/drivers/{ana}/primary");
  let (status, _) = call(
    &app,
    "POST",
    &uri,
    Some(json!({ "vehicle_id": v1, "updated_by": "ops" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(
    &app,
    "POST",
    &uri,
    Some(json!({ "vehicle_id": v1, "updated_by": "ops", "force": true })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, ben) = call(&app, "GET", &format!("/drivers/{ben}"), None).await;
  assert_eq!(ben["assigned_vehicle_id"], Value::Null);
  let (_, primary) = call(&app, "GET", &format!("/vehicles/{v1}/primary"), None).await;
  assert_eq!(primary["driver_id"], json!(ana));
  assert_consistent(&app).await;
}

#[tokio::test]
async fn stale_takeover_is_409() {
  let app = app().await;
  let v = create_vehicle(&app, json!({ "license_plate": "KA-1" })).await;
  let ana = create_driver(&app, "Ana", &["B"]).await;
  let ben = create_driver(&app, "Ben", &["B"]).await;

  let (_, primary) = call(&app, "GET", &format!("/vehicles/{v}/primary"), None).await;
  assert_eq!(primary, Value::Null);

  call(
    &app,
    "POST",
    "/assignments",
    Some(json!({ "driver_id": ana, "vehicle_id": v, "assigned_by": "ops" })),
  )
  .await;

  let (status, _) = call(
    &app,
    "POST",
    "/assignments",
    Some(json!({
      "driver_id": ben,
      "vehicle_id": v,
      "assigned_by": "ops",
      "takeover": { "policy": "expect", "record_id": null }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn maintenance_toggle() {
  let app = app().await;
  let v = create_vehicle(&app, json!({ "license_plate": "KA-1" })).await;
  let uri = format!("/vehicles/{v}/maintenance");

  let (status, vehicle) = call(&app, "POST", &uri, Some(json!({ "on": true }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(vehicle["status"], "maintenance");

  let (_, vehicle) = call(&app, "POST", &uri, Some(json!({ "on": false }))).await;
  assert_eq!(vehicle["status"], "available");
}
