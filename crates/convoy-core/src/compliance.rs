//! License compliance between a driver and a vehicle.
//!
//! Rules are evaluated in order and the first failure wins:
//!
//! 1. the driver must hold at least one license class;
//! 2. an attached trailer requires a class containing the trailer letter
//!    (`E` by default, so `BE`, `CE` and `DE` all qualify);
//! 3. each vehicle category in the rule table whose keywords match the
//!    vehicle type name requires one of its listed classes.
//!
//! The category table is configuration, not code: new categories are added
//! without touching callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Rule table ──────────────────────────────────────────────────────────────

/// A vehicle category and the license classes that may drive it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
  /// Used in the failure message, e.g. "heavy".
  pub name:             String,
  /// Case-insensitive substrings of the vehicle type name.
  pub keywords:         Vec<String>,
  /// Any one of these satisfies the rule.
  pub required_classes: Vec<String>,
}

impl CategoryRule {
  fn matches(&self, vehicle_type_name: &str) -> bool {
    let name = vehicle_type_name.to_lowercase();
    self
      .keywords
      .iter()
      .any(|keyword| name.contains(&keyword.to_lowercase()))
  }
}

/// The category table used when configuration supplies none.
pub fn default_categories() -> Vec<CategoryRule> {
  vec![CategoryRule {
    name:             "heavy".into(),
    keywords:         ["truck", "lorry", "heavy", "hgv"]
      .map(String::from)
      .to_vec(),
    required_classes: vec!["C".into(), "D".into()],
  }]
}

fn default_trailer_class() -> String { "E".into() }

/// Deserialisable checker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceConfig {
  #[serde(default = "default_trailer_class")]
  pub trailer_class: String,
  #[serde(default = "default_categories")]
  pub categories:    Vec<CategoryRule>,
}

impl Default for ComplianceConfig {
  fn default() -> Self {
    Self {
      trailer_class: default_trailer_class(),
      categories:    default_categories(),
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplianceViolation {
  #[error("no license class on file.")]
  NoLicenseClass,

  #[error("trailer requires an {class}-class license.")]
  TrailerClassMissing { class: String },

  #[error("{category} vehicle requires {} class.", .required.join(" or "))]
  CategoryClassMissing {
    category: String,
    required: Vec<String>,
  },
}

/// Serialisable form of a check, for callers that render the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
  pub valid:  bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
}

impl From<Result<(), ComplianceViolation>> for ComplianceReport {
  fn from(result: Result<(), ComplianceViolation>) -> Self {
    match result {
      Ok(()) => Self { valid: true, reason: None },
      Err(violation) => Self {
        valid:  false,
        reason: Some(violation.to_string()),
      },
    }
  }
}

// ─── Checker ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComplianceChecker {
  config: ComplianceConfig,
}

impl ComplianceChecker {
  pub fn new(config: ComplianceConfig) -> Self { Self { config } }

  pub fn config(&self) -> &ComplianceConfig { &self.config }

  /// Validate `driver_classes` against a vehicle. Pure and deterministic.
  pub fn check<I, S>(
    &self,
    driver_classes: I,
    vehicle_type_name: &str,
    trailer_attached: bool,
  ) -> Result<(), ComplianceViolation>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let classes = crate::driver::normalize_classes(driver_classes);
    if classes.is_empty() {
      return Err(ComplianceViolation::NoLicenseClass);
    }

    let holds = |required: &str| {
      let required = required.trim().to_uppercase();
      classes.iter().any(|class| class.contains(&required))
    };

    if trailer_attached && !holds(self.config.trailer_class.as_str()) {
      return Err(ComplianceViolation::TrailerClassMissing {
        class: self.config.trailer_class.trim().to_uppercase(),
      });
    }

    for rule in &self.config.categories {
      if rule.matches(vehicle_type_name)
        && !rule.required_classes.iter().any(|class| holds(class.as_str()))
      {
        return Err(ComplianceViolation::CategoryClassMissing {
          category: rule.name.clone(),
          required: rule.required_classes.clone(),
        });
      }
    }

    Ok(())
  }
}
