//! convoy-server binary.
//!
//! Reads `convoy.toml` (or the path specified with `--config`), layers
//! `CONVOY_*` environment variables on top, opens the SQLite store, and
//! serves the JSON API under `/api`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use convoy_core::{compliance::ComplianceChecker, engine::AssignmentEngine};
use convoy_server::{ServerConfig, expand_tilde};
use convoy_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Convoy vehicle assignment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "convoy.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let checker = ComplianceChecker::new(server_cfg.compliance.clone());
  tracing::info!(
    trailer_class = %checker.config().trailer_class,
    categories = checker.config().categories.len(),
    "compliance rules loaded"
  );

  let engine = AssignmentEngine::new(Arc::new(store), checker);
  let app = convoy_server::router(engine);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
