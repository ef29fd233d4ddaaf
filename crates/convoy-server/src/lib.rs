//! Convoy HTTP server: configuration and router assembly.
//!
//! The binary in `main.rs` loads [`ServerConfig`], opens the SQLite store and
//! serves [`router`].

use std::path::{Path, PathBuf};

use axum::{Router, routing::get};
use convoy_core::{
  compliance::ComplianceConfig, engine::AssignmentEngine, store::AssignmentStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, layered from an optional TOML file and
/// `CONVOY_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// License rule table; the built-in table when absent.
  #[serde(default)]
  pub compliance: ComplianceConfig,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/convoy/convoy.db") }

impl ServerConfig {
  /// Layer `file` (if present) under `CONVOY_*` environment variables.
  pub fn load(file: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("CONVOY"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API under `/api`, a liveness probe at `/health`, and request tracing.
pub fn router<S>(engine: AssignmentEngine<S>) -> Router
where
  S: AssignmentStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", convoy_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use convoy_core::compliance::ComplianceChecker;
  use convoy_store_sqlite::SqliteStore;
  use tower::ServiceExt;

  use super::*;

  fn from_toml(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.compliance, ComplianceConfig::default());
  }

  #[test]
  fn compliance_table_is_configurable() {
    let cfg = from_toml(
      r#"
      port = 9000
      store_path = "/tmp/convoy.db"

      [compliance]
      trailer_class = "BE"

      [[compliance.categories]]
      name = "bus"
      keywords = ["bus", "coach"]
      required_classes = ["D"]
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/convoy.db"));
    assert_eq!(cfg.compliance.trailer_class, "BE");
    assert_eq!(cfg.compliance.categories.len(), 1);
    assert_eq!(cfg.compliance.categories[0].name, "bus");
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/convoy.db")),
      PathBuf::from(home).join("convoy.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = router(AssignmentEngine::new(
      Arc::new(store),
      ComplianceChecker::default(),
    ));

    let resp = app
      .clone()
      .oneshot(Request::get("/api/vehicles").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
