//! The assignment ledger and the requests that drive it.
//!
//! An [`AssignmentRecord`] links one driver to one vehicle. Records are never
//! deleted. While active, a record may move between primary and non-primary;
//! once ended it is frozen, and any later link between the same pair is a new
//! record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Persisted status of a ledger entry.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordStatus {
  Active,
  Ended,
}

/// Lifecycle state of a record, combining status and primacy.
///
/// ```text
/// ActivePrimary <──> ActiveNonPrimary
///       │                  │
///       └──────> Ended <───┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
  ActivePrimary,
  ActiveNonPrimary,
  Ended,
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
  pub record_id:      Uuid,
  pub vehicle_id:     Uuid,
  pub driver_id:      Uuid,
  pub assigned_at:    DateTime<Utc>,
  pub assigned_by:    String,
  pub start_odometer: u32,
  pub status:         RecordStatus,
  pub is_primary:     bool,
  pub ended_at:       Option<DateTime<Utc>>,
  pub ended_by:       Option<String>,
  pub end_odometer:   Option<u32>,
  pub notes:          Option<String>,
}

impl AssignmentRecord {
  /// A fresh primary link, as created by `assign`.
  pub fn open(
    driver_id: Uuid,
    vehicle_id: Uuid,
    assigned_by: String,
    start_odometer: u32,
    notes: Option<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      record_id: Uuid::new_v4(),
      vehicle_id,
      driver_id,
      assigned_at: now,
      assigned_by,
      start_odometer,
      status: RecordStatus::Active,
      is_primary: true,
      ended_at: None,
      ended_by: None,
      end_odometer: None,
      notes,
    }
  }

  pub fn state(&self) -> RecordState {
    match (self.status, self.is_primary) {
      (RecordStatus::Ended, _) => RecordState::Ended,
      (RecordStatus::Active, true) => RecordState::ActivePrimary,
      (RecordStatus::Active, false) => RecordState::ActiveNonPrimary,
    }
  }

  pub fn is_active(&self) -> bool { self.status == RecordStatus::Active }

  pub fn is_active_primary(&self) -> bool {
    self.state() == RecordState::ActivePrimary
  }

  /// Keep the link but give up operational priority.
  pub fn demote(&mut self) -> Result<()> {
    self.ensure_active()?;
    self.is_primary = false;
    Ok(())
  }

  pub fn promote(&mut self) -> Result<()> {
    self.ensure_active()?;
    self.is_primary = true;
    Ok(())
  }

  /// Terminate the link. The primacy flag is left as it was so the ledger
  /// still shows whether the link was operational when it ended.
  pub fn end(
    &mut self,
    ended_by: &str,
    end_odometer: Option<u32>,
    now: DateTime<Utc>,
  ) -> Result<()> {
    self.ensure_active()?;
    if let Some(end) = end_odometer
      && end < self.start_odometer
    {
      return Err(Error::OdometerRegression {
        start: self.start_odometer,
        end,
      });
    }
    self.status = RecordStatus::Ended;
    self.ended_at = Some(now);
    self.ended_by = Some(ended_by.to_owned());
    self.end_odometer = end_odometer;
    Ok(())
  }

  fn ensure_active(&self) -> Result<()> {
    if self.is_active() {
      Ok(())
    } else {
      Err(Error::RecordEnded(self.record_id))
    }
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// What happens to the driver's existing links when it is assigned a new
/// vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
  /// End every other active link of the driver.
  #[default]
  Exclusive,
  /// Keep the driver's other links as non-primary.
  Shared,
}

/// How `assign` treats a primary assignment another driver already holds on
/// the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", content = "record_id", rename_all = "snake_case")]
pub enum Takeover {
  /// Demote whatever primary record the vehicle has.
  #[default]
  Force,
  /// Proceed only if the vehicle's primary record is still the one the caller
  /// observed (`None` meaning the vehicle had no primary).
  Expect(Option<Uuid>),
}

impl Takeover {
  /// Compare the caller's observation with the primary read inside the
  /// write transaction.
  pub fn verify(&self, vehicle_id: Uuid, current: Option<Uuid>) -> Result<()> {
    match *self {
      Self::Force => Ok(()),
      Self::Expect(expected) if expected == current => Ok(()),
      Self::Expect(expected) => Err(Error::PrimaryChanged {
        vehicle_id,
        expected,
        found: current,
      }),
    }
  }
}

/// Input to [`crate::engine::AssignmentEngine::assign`].
#[derive(Debug, Clone)]
pub struct AssignRequest {
  pub driver_id:      Uuid,
  pub vehicle_id:     Uuid,
  pub assigned_by:    String,
  /// Defaults to the vehicle's odometer.
  pub start_odometer: Option<u32>,
  pub notes:          Option<String>,
  pub mode:           AssignmentMode,
  pub takeover:       Takeover,
}

impl AssignRequest {
  pub fn new(
    driver_id: Uuid,
    vehicle_id: Uuid,
    assigned_by: impl Into<String>,
    mode: AssignmentMode,
  ) -> Self {
    Self {
      driver_id,
      vehicle_id,
      assigned_by: assigned_by.into(),
      start_odometer: None,
      notes: None,
      mode,
      takeover: Takeover::default(),
    }
  }
}

/// Input to [`crate::engine::AssignmentEngine::set_primary_vehicle`].
#[derive(Debug, Clone)]
pub struct SetPrimaryRequest {
  pub driver_id:  Uuid,
  pub vehicle_id: Uuid,
  pub updated_by: String,
  /// Demote another driver's primary record on the vehicle instead of
  /// failing.
  pub force:      bool,
}

/// Input to [`crate::engine::AssignmentEngine::unassign`].
#[derive(Debug, Clone)]
pub struct UnassignRequest {
  pub driver_id:     Uuid,
  pub vehicle_id:    Uuid,
  pub unassigned_by: String,
  /// Defaults to the vehicle's odometer.
  pub end_odometer:  Option<u32>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record() -> AssignmentRecord {
    AssignmentRecord::open(
      Uuid::new_v4(),
      Uuid::new_v4(),
      "dispatch".into(),
      1_000,
      None,
      Utc::now(),
    )
  }

  #[test]
  fn primary_demote_promote_cycle() {
    let mut r = record();
    assert_eq!(r.state(), RecordState::ActivePrimary);
    r.demote().unwrap();
    assert_eq!(r.state(), RecordState::ActiveNonPrimary);
    r.promote().unwrap();
    assert_eq!(r.state(), RecordState::ActivePrimary);
  }

  #[test]
  fn ended_record_is_terminal() {
    let mut r = record();
    r.end("dispatch", Some(1_200), Utc::now()).unwrap();
    assert_eq!(r.state(), RecordState::Ended);
    assert_eq!(r.end_odometer, Some(1_200));

    assert!(matches!(r.promote(), Err(Error::RecordEnded(_))));
    assert!(matches!(r.demote(), Err(Error::RecordEnded(_))));
    assert!(matches!(
      r.end("dispatch", None, Utc::now()),
      Err(Error::RecordEnded(_))
    ));
  }

  #[test]
  fn end_rejects_odometer_regression() {
    let mut r = record();
    let err = r.end("dispatch", Some(999), Utc::now()).unwrap_err();
    assert!(matches!(err, Error::OdometerRegression { start: 1_000, end: 999 }));
    assert!(r.is_active());
  }

  #[test]
  fn takeover_expectation() {
    let vehicle = Uuid::new_v4();
    let seen = Uuid::new_v4();

    assert!(Takeover::Force.verify(vehicle, Some(seen)).is_ok());
    assert!(Takeover::Expect(Some(seen)).verify(vehicle, Some(seen)).is_ok());
    assert!(Takeover::Expect(None).verify(vehicle, None).is_ok());
    assert!(matches!(
      Takeover::Expect(None).verify(vehicle, Some(seen)),
      Err(Error::PrimaryChanged { found: Some(f), .. }) if f == seen
    ));
  }
}
