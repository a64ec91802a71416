//! ripoti server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) and `RIPOTI_*`
//! environment variables, opens the SQLite store, and serves the report board
//! over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use ripoti_core::store::BoardStore;
use ripoti_server::{AppState, ServerConfig, images::ImageHost};
use ripoti_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Parser)]
#[command(author, version, about = "Ripoti clinic report board")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("RIPOTI"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let images = ImageHost::from_config(&server_cfg).context("failed to set up image host")?;
  tracing::info!(backend = ?server_cfg.image_backend, "image host ready");

  // Build application state.
  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg.clone()),
    images: Arc::new(images),
  };

  tokio::spawn(purge_sessions(state.store.clone()));

  let app = ripoti_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Delete expired sessions on a fixed interval, forever.
async fn purge_sessions<S: BoardStore>(store: Arc<S>) {
  let mut tick = tokio::time::interval(SESSION_PURGE_INTERVAL);
  loop {
    tick.tick().await;
    match store.purge_expired_sessions(Utc::now()).await {
      Ok(0) => {}
      Ok(removed) => tracing::info!(removed, "purged expired sessions"),
      Err(e) => tracing::warn!(error = %e, "session purge failed"),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
