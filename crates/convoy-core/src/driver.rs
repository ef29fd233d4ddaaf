//! Drivers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DriverStatus {
  #[default]
  Active,
  Inactive,
  OnLeave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
  pub driver_id:           Uuid,
  pub display_name:        String,
  /// Normalised license classes, e.g. `{"B", "C", "CE"}`.
  pub license_classes:     BTreeSet<String>,
  pub status:              DriverStatus,
  /// The vehicle of the driver's primary assignment, if any.
  pub assigned_vehicle_id: Option<Uuid>,
  pub created_at:          DateTime<Utc>,
}

/// Trim and upper-case license classes, dropping blanks.
pub fn normalize_classes<I, S>(classes: I) -> BTreeSet<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  classes
    .into_iter()
    .map(|class| class.as_ref().trim().to_uppercase())
    .filter(|class| !class.is_empty())
    .collect()
}

/// Input to [`crate::store::AssignmentStore::add_driver`].
#[derive(Debug, Clone)]
pub struct NewDriver {
  pub display_name:    String,
  pub license_classes: Vec<String>,
  pub status:          DriverStatus,
}

impl NewDriver {
  pub fn new<I, S>(display_name: impl Into<String>, license_classes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      display_name:    display_name.into(),
      license_classes: license_classes.into_iter().map(Into::into).collect(),
      status:          DriverStatus::default(),
    }
  }

  pub fn into_driver(self) -> crate::Result<Driver> {
    let display_name = self.display_name.trim().to_owned();
    if display_name.is_empty() {
      return Err(crate::Error::Invalid("driver name is empty".into()));
    }

    Ok(Driver {
      driver_id: Uuid::new_v4(),
      display_name,
      license_classes: normalize_classes(&self.license_classes),
      status: self.status,
      assigned_vehicle_id: None,
      created_at: Utc::now(),
    })
  }
}
