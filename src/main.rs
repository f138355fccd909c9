//! Icon server - hot-reloading SVG icon server
//!
//! Entry point for the icon server.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use iconserver::cache::{group_thousands, CacheStore, SnapshotBuilder};
use iconserver::config::{ConfigOverrides, ConfigResolver, LayeredResolver, CONFIG_FILE};
use iconserver::server::{
    init_metrics, init_tracing, metrics, App, ServerConfig, TracingConfig, SESSION_LOG_DIR,
};
use iconserver::watcher::{ChangeWatcher, NotificationSource, NotifySource};
use iconserver::Result;
use tokio::sync::mpsc;

/// Capacity of the change event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Icon server - serve a directory of SVG icons with search and live reload
#[derive(Parser, Debug)]
#[command(name = "iconserver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the SVG icons
    #[arg(short = 'd', long, env = "ICONSERVER_ASSET_DIR")]
    asset_dir: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long, env = "ICONSERVER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "ICONSERVER_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ICONSERVER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "ICONSERVER_LOG_JSON")]
    log_json: bool,

    /// Directory for per-run session log files
    #[arg(long, env = "ICONSERVER_LOG_DIR", default_value = SESSION_LOG_DIR)]
    log_dir: PathBuf,

    /// Do not write a session log file
    #[arg(long, env = "ICONSERVER_NO_SESSION_LOG")]
    no_session_log: bool,

    /// Log every HTTP request
    #[arg(long, env = "ICONSERVER_DEBUG")]
    debug: bool,

    /// Debounce window for directory changes, in milliseconds
    #[arg(long, env = "ICONSERVER_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,

    /// Configuration file
    #[arg(short, long, env = "ICONSERVER_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Write the resolved port, directory, and debug flag back to the config file
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            asset_dir: self.asset_dir.clone(),
            host: self.host.clone(),
            port: self.port,
            log_level: Some(self.log_level.clone()),
            log_json: self.log_json,
            debug_requests: self.debug.then_some(true),
            debounce: self.debounce_ms.map(Duration::from_millis),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = init_tracing(&TracingConfig {
        level: cli.log_level.to_lowercase(),
        json: cli.log_json,
        session_dir: (!cli.no_session_log).then(|| cli.log_dir.clone()),
    })?;

    tracing::info!("Icon server v{} starting...", env!("CARGO_PKG_VERSION"));

    let resolver = LayeredResolver::new(cli.overrides(), Some(cli.config.clone()));
    let Some(config) = resolver.resolve()? else {
        tracing::warn!("Configuration cancelled, exiting");
        return Ok(());
    };
    tracing::debug!(?config, "Configuration loaded");

    if cli.save_config {
        resolver.save(&config)?;
    }

    if !config.has_assets() {
        tracing::warn!(
            path = %config.asset_dir.display(),
            "No SVG icons found in asset directory"
        );
    }

    tracing::info!(path = %config.asset_dir.display(), "Loading icons...");
    let started = Instant::now();
    let builder = SnapshotBuilder::new(&config.asset_dir);
    let initial = builder.build_async().await?;

    init_metrics();
    metrics::record_rebuild(true, initial.len());
    tracing::info!(
        icons = %group_thousands(initial.len()),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Loaded icons"
    );

    let store = Arc::new(CacheStore::new(initial));

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let mut source = NotifySource::new();
    if let Err(e) = source.subscribe(&config.asset_dir, event_tx) {
        tracing::error!(error = %e, "Error watching directory, live reload disabled");
    }
    let watcher = ChangeWatcher::new(builder, Arc::clone(&store), config.debounce);
    let _watch_task = watcher.spawn(event_rx);

    let app = App::new(ServerConfig::from(&config), store);
    let result = app.run().await;

    drop(source);
    drop(session);
    result
}
