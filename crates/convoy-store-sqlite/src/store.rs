//! [`SqliteStore`]: the SQLite implementation of [`AssignmentStore`].

use std::path::Path;

use convoy_core::store::{AssignmentStore, Transaction};
use rusqlite::TransactionBehavior;

use crate::{Error, Result, schema::SCHEMA, tx::SqliteTx};

/// A Convoy assignment store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    tracing::debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the underlying connection. Test-only escape hatch
  /// for checking the schema's own guards.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }
}

impl AssignmentStore for SqliteStore {
  /// `BEGIN IMMEDIATE` takes the write lock up front, so the reads made by
  /// `f` cannot be invalidated by another writer before commit.
  async fn transact<T, F>(&self, f: F) -> convoy_core::Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn Transaction) -> convoy_core::Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&mut SqliteTx::new(&tx));
        match result {
          Ok(_) => tx.commit()?,
          Err(ref e) => {
            tracing::debug!(error = %e, "rolling back transaction");
            tx.rollback()?;
          }
        }
        Ok(result)
      })
      .await
      .map_err(Error::from)?
  }

  async fn snapshot<T, F>(&self, f: F) -> convoy_core::Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&dyn Transaction) -> convoy_core::Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        // Deferred and never committed: a read transaction only.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        Ok(f(&SqliteTx::new(&tx)))
      })
      .await
      .map_err(Error::from)?
  }
}
