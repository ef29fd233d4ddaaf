//! Advisory lookup of a vehicle's operational driver.
//!
//! Callers consult [`ConflictResolver`] before a takeover to decide whether to
//! ask for confirmation, then pass what they saw to `assign` as
//! [`crate::assignment::Takeover::Expect`]. The engine re-checks it inside the
//! write transaction, so a stale answer here surfaces as a conflict rather
//! than a silent overwrite.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, assignment::AssignmentRecord, projection, store::AssignmentStore};

/// The primary assignment a caller is about to displace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryHolder {
  pub record:        AssignmentRecord,
  pub driver_name:   String,
  pub license_plate: String,
}

impl PrimaryHolder {
  /// Human-readable warning for a confirmation prompt.
  pub fn warning(&self) -> String {
    format!(
      "vehicle {} is currently primary for driver {}",
      self.license_plate, self.driver_name
    )
  }
}

pub struct ConflictResolver<S> {
  store: Arc<S>,
}

impl<S> Clone for ConflictResolver<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: AssignmentStore> ConflictResolver<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// The vehicle's active primary record, if any.
  pub async fn primary_assignment(
    &self,
    vehicle_id: Uuid,
  ) -> Result<Option<AssignmentRecord>> {
    self
      .store
      .snapshot(move |tx| {
        let active = tx.active_for_vehicle(vehicle_id)?;
        Ok(projection::primary_of(&active).cloned())
      })
      .await
  }

  /// The vehicle's primary holder when it is someone other than `driver_id`.
  pub async fn conflict_for(
    &self,
    vehicle_id: Uuid,
    driver_id: Uuid,
  ) -> Result<Option<PrimaryHolder>> {
    self
      .store
      .snapshot(move |tx| {
        let active = tx.active_for_vehicle(vehicle_id)?;
        let Some(record) = projection::primary_of(&active).cloned() else {
          return Ok(None);
        };
        if record.driver_id == driver_id {
          return Ok(None);
        }

        let driver_name = tx
          .driver(record.driver_id)?
          .map(|d| d.display_name)
          .unwrap_or_default();
        let license_plate = tx
          .vehicle(vehicle_id)?
          .map(|v| v.license_plate)
          .unwrap_or_default();

        Ok(Some(PrimaryHolder { record, driver_name, license_plate }))
      })
      .await
  }
}
