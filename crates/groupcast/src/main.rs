//! Groupcast - fan-out proxy for sharded time-series query backends

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use groupcast_api::{AppState, create_router};
use groupcast_core::{GroupDispatcher, GroupRegistry, InMemoryRegistry};
use groupcast_proxy::{EndpointClient, EndpointClientConfig};

/// Groupcast - query every endpoint of a group as one target
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (.toml or .json)
    #[arg(short, long, default_value = "config/config.toml", env = "GROUPCAST_CONFIG")]
    config: String,

    /// Bind address
    #[arg(long, env = "GROUPCAST_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "GROUPCAST_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Groupcast v{}", env!("CARGO_PKG_VERSION"));

    // Install the Prometheus recorder
    let metrics_handle = Arc::new(PrometheusBuilder::new().install_recorder()?);

    // Initialize group registry
    let registry = Arc::new(InMemoryRegistry::new(config.groups.clone()));
    for name in registry.group_names() {
        info!("Group configured: {}", name);
    }

    // Initialize endpoint client
    let client = Arc::new(EndpointClient::new(EndpointClientConfig {
        default_timeout: config.dispatch.timeout(),
        skip_tls_verify: config.dispatch.skip_tls_verify,
    })?);

    let dispatcher = Arc::new(GroupDispatcher::new(
        registry.clone(),
        client,
        config.dispatch.clone(),
    ));

    #[cfg(unix)]
    spawn_reload_task(args.config.clone(), registry.clone());

    // Create router
    let docs_dir = config
        .docs
        .enabled
        .then(|| PathBuf::from(&config.docs.path));
    let app = create_router(AppState::new(dispatcher), Some(metrics_handle), docs_dir)
        .layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

/// Reload the group table from the config file on SIGHUP
#[cfg(unix)]
fn spawn_reload_task(path: String, registry: Arc<InMemoryRegistry>) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to install SIGHUP handler, reload disabled: {}", e);
                return;
            }
        };

        while hangup.recv().await.is_some() {
            info!("SIGHUP received, reloading groups from {}", path);
            if !std::path::Path::new(&path).exists() {
                warn!("Config file {} is gone, keeping current groups", path);
                continue;
            }
            match Config::load(&path) {
                Ok(config) => registry.replace(config.groups),
                Err(e) => warn!("Config reload failed, keeping current groups: {:#}", e),
            }
        }
    });
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
