use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logmeta_core::{QueryEngine, SqliteStore};

mod api;

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(
    name = "logmeta-hub",
    version,
    about = "Log metadata query service for dashboards"
)]
struct Args {
    /// Path to the SQLite metadata index (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Server bind address (overrides the config file)
    #[arg(long)]
    bind: Option<String>,

    /// Path to config file
    #[arg(long, default_value = "logmeta-hub.toml")]
    config: PathBuf,
}

// =============================================================================
// Config
// =============================================================================

#[derive(Deserialize, Default, Clone, Debug)]
struct Config {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    storage: StorageConfig,
}

#[derive(Deserialize, Clone, Debug)]
struct ServerConfig {
    #[serde(default = "default_bind")]
    bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
struct StorageConfig {
    #[serde(default = "default_database")]
    database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".into()
}
fn default_database() -> PathBuf {
    PathBuf::from("logs.db")
}

/// A missing file means defaults; an unreadable or malformed one is fatal.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

impl Config {
    fn apply_overrides(mut self, args: &Args) -> Self {
        if let Some(bind) = &args.bind {
            self.server.bind = bind.clone();
        }
        if let Some(database) = &args.database {
            self.storage.database = database.clone();
        }
        self
    }
}

// =============================================================================
// Application State
// =============================================================================

pub struct AppState {
    pub engine: QueryEngine,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        // Simple JSON datasource
        .route("/search", post(api::search))
        .route("/query", post(api::query))
        // Metadata API
        .route("/api/servers", get(api::list_servers))
        .route("/api/logfiles", get(api::list_log_files))
        .route("/api/logs", get(api::list_logs))
        .route("/api/stats", get(api::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "logmeta_hub=info,logmeta_core=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?.apply_overrides(&args);

    if !config.storage.database.exists() {
        tracing::warn!(
            "Database {:?} does not exist yet; queries will fail until it is created",
            config.storage.database
        );
    }

    let store = Arc::new(SqliteStore::new(config.storage.database.clone()));
    let state = Arc::new(AppState {
        engine: QueryEngine::new(store),
    });

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind))?;

    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("  logmeta-hub v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("  API:       http://{}/api/logs", addr);
    tracing::info!("  Health:    http://{}/health", addr);
    tracing::info!("  Database:  {:?}", config.storage.database);
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert_eq!(config.storage.database, PathBuf::from("logs.db"));
    }

    #[test]
    fn test_config_file_values() {
        let config: Config = toml::from_str(
            r#"
            [server]
            bind = "127.0.0.1:8080"

            [storage]
            database = "/var/lib/logmeta/index.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(
            config.storage.database,
            PathBuf::from("/var/lib/logmeta/index.db")
        );
    }

    #[test]
    fn test_cli_overrides_file() {
        let args = Args::parse_from(["logmeta-hub", "--bind", "127.0.0.1:9000"]);
        let config = Config::default().apply_overrides(&args);
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.storage.database, PathBuf::from("logs.db"));
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.server.bind, default_bind());
    }

    #[test]
    fn test_malformed_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server\nbind = ").unwrap();
        assert!(load_config(&path).is_err());
    }
}
