//! # sportz
//!
//! Live-update server binary: loads settings, opens the database, resolves
//! the admission gate, and serves HTTP + WebSocket until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use sportz_core::logging::{LogFormat, init_subscriber};
use sportz_server::config::ServerConfig;
use sportz_server::gate::AdmissionGate;
use sportz_server::metrics::install_recorder;
use sportz_server::server::SportzServer;
use sportz_settings::SportzSettings;
use sportz_store::Database;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Sportz live-update server.
#[derive(Parser, Debug)]
#[command(name = "sportz", about = "Sportz live-update server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` database.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Settings file (defaults to `~/.sportz/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

impl Cli {
    fn load_settings(&self) -> Result<SportzSettings> {
        let mut settings = match &self.settings {
            Some(path) => sportz_settings::load_settings_from_path(path),
            None => sportz_settings::load_settings(),
        }
        .context("Failed to load settings")?;

        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        Ok(settings)
    }

    fn db_path(&self, settings: &SportzSettings) -> PathBuf {
        self.db_path
            .clone()
            .or_else(|| settings.server.db_path.as_ref().map(PathBuf::from))
            .unwrap_or_else(sportz_settings::default_db_path)
    }
}

/// Wire everything together. Returns the server and the listener task.
async fn start(
    settings: &SportzSettings,
    db_path: &std::path::Path,
    metrics: PrometheusHandle,
) -> Result<(SportzServer, std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let db = Database::open(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    let gate = AdmissionGate::resolve(&settings.shield).context("Failed to configure admission gate")?;

    let server = SportzServer::new(ServerConfig::from_settings(&settings.server), db, gate, metrics);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    Ok((server, addr, handle))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = args.load_settings()?;

    init_subscriber(
        &settings.logging.level,
        LogFormat::parse(&settings.logging.format),
    );

    let metrics = install_recorder().context("Failed to install metrics recorder")?;
    let db_path = args.db_path(&settings);
    let (server, addr, handle) = start(&settings, &db_path, metrics).await?;

    let config = server.config();
    tracing::info!(
        db = %db_path.display(),
        max_message_size = config.max_message_size,
        ping_interval_secs = config.ping_interval_secs,
        "Sportz listening on http://{addr}"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    let _ = server
        .shutdown()
        .graceful_shutdown(server.hub(), vec![handle], Some(SHUTDOWN_TIMEOUT))
        .await;
    tracing::info!("Shutdown complete");
    Ok(())
}
