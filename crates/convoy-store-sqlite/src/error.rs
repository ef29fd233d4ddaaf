//! Error type for `convoy-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] convoy_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownVariant { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Storage failures cross the `AssignmentStore` boundary as core errors.
/// Constraint and lock failures mean another writer won; callers may retry.
impl From<Error> for convoy_core::Error {
  fn from(e: Error) -> Self {
    if let Error::Core(core) = e {
      return core;
    }

    let code = match &e {
      Error::Sqlite(inner)
      | Error::Database(tokio_rusqlite::Error::Rusqlite(inner)) => {
        inner.sqlite_error_code()
      }
      _ => None,
    };

    match code {
      Some(
        ErrorCode::ConstraintViolation
        | ErrorCode::DatabaseBusy
        | ErrorCode::DatabaseLocked,
      ) => convoy_core::Error::WriteConflict(e.to_string()),
      _ => convoy_core::Error::Store(Box::new(e)),
    }
  }
}
