//! lwgated - lwgate Server Daemon
//!
//! REST gateway for constrained-device management. Device operations are
//! answered asynchronously through `/notifications/pull` or a webhook.
//!
//! Usage:
//!   lwgated [OPTIONS] [config.toml]
//!
//! Without a config file the daemon starts with defaults and no devices.

mod config;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use lwgate_api::{create_router, spawn_push_worker, AppState, ReqwestSender};
use lwgate_core::mock::MockEngine;
use lwgate_core::{CredentialStore, Gateway, ResourceUri};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const DEFAULT_LOG_FILTER: &str = "lwgated=info,lwgate_api=info,lwgate_core=info,lwgate_creds=info";

#[derive(Parser)]
#[command(name = "lwgated")]
#[command(author, version, about = "REST gateway for constrained-device management")]
struct Args {
    /// Server config file (TOML)
    #[arg(env = "LWGATE_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Device credential database (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    tracing::info!("Starting lwgated (lwgate Server Daemon)");

    let mut config = match args.config {
        Some(ref path) => {
            tracing::info!("Loading config from: {}", path.display());
            Config::load(path)?
        }
        None => {
            tracing::info!("No config file provided, using defaults");
            Config::default()
        }
    };
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(database) = args.database {
        config.coap.database_file = Some(database);
    }

    let (devices, database_path) = load_devices(config.coap.database_file.as_deref());
    let engine = Arc::new(MockEngine::new());
    let gateway = Arc::new(Gateway::new(engine.clone(), devices, database_path));
    engine.attach(gateway.events());
    start_mock_clients(&engine, &config);

    let sender = Arc::new(ReqwestSender::new(config.callback_timeout())?);
    let _push_worker = config
        .notifications
        .push
        .then(|| spawn_push_worker(gateway.clone(), sender.clone(), config.push_interval()));

    let app = create_router(AppState::new(gateway, sender));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("lwgated stopped");
    Ok(())
}

/// Load the credential database and decide where changes are persisted.
///
/// A broken file leaves the daemon running with an empty set and persistence
/// disabled, so the file is never overwritten.
fn load_devices(path: Option<&Path>) -> (CredentialStore, Option<PathBuf>) {
    let Some(path) = path else {
        tracing::info!("No devices database configured, credentials are not persisted");
        return (CredentialStore::new(), None);
    };

    match CredentialStore::load(path) {
        Ok(store) => (store, Some(path.to_path_buf())),
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to load devices database, starting with an empty set and persistence disabled"
            );
            (CredentialStore::new(), None)
        }
    }
}

fn start_mock_clients(engine: &MockEngine, config: &Config) {
    engine.set_auto_complete(config.mock.auto_complete);

    for client in &config.mock.clients {
        engine.register(&client.name);

        for (path, value) in &client.resources {
            match path.parse::<ResourceUri>() {
                Ok(uri) => {
                    engine.set_resource(&client.name, &uri, value.clone());
                }
                Err(e) => {
                    tracing::warn!(device = %client.name, path = %path, error = %e, "Skipping invalid resource path");
                }
            }
        }
    }

    if !config.mock.clients.is_empty() {
        tracing::info!(
            count = config.mock.clients.len(),
            auto_complete = config.mock.auto_complete,
            "Registered mock clients"
        );
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
