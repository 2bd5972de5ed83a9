//! Grievance Express: complaint intake and role-scoped admin dashboard server.
//!
//! Main entry point that wires the components over one document store and
//! starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use grievance_core::config::AppConfig;
use grievance_core::document::DocumentStore;
use grievance_core::InMemoryDocumentStore;
use grievance_management::{management_router, ManagementState};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "grievance-express")]
#[command(about = "Campus grievance intake and admin dashboard")]
#[command(version)]
struct Cli {
    /// Config file path (TOML, optional)
    #[arg(long, env = "GRIEVANCE_EXPRESS_CONFIG")]
    config: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "GRIEVANCE_EXPRESS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "GRIEVANCE_EXPRESS__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Session lifetime in seconds (overrides config)
    #[arg(long)]
    session_ttl_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "grievance_express=info,grievance_core=info,grievance_platform=info,\
                     grievance_management=info,grievance_reporting=info,tower_http=info"
                        .into()
                }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Grievance Express starting up");

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(ttl) = cli.session_ttl_secs {
        config.session.ttl_secs = ttl;
    }

    info!(
        http_port = config.api.http_port,
        session_ttl_secs = config.session.ttl_secs,
        admins = config.admins.len(),
        "Configuration loaded"
    );
    if config.admins.is_empty() {
        warn!("No admin accounts configured; the dashboard will reject every login");
    }

    let docs: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let state = ManagementState::from_config(&config, docs)?;

    if let Err(e) = start_metrics(&config) {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Periodic session purge
    let sessions = state.sessions.clone();
    let purge_every = Duration::from_secs(config.session.purge_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            interval.tick().await;
            sessions.purge_expired();
        }
    });

    let addr = SocketAddr::new(config.api.host.parse()?, config.api.http_port);
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, management_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Grievance Express stopped");
    Ok(())
}

fn start_metrics(config: &AppConfig) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(SocketAddr::new(
            config.api.host.parse()?,
            config.metrics.port,
        ))
        .install()?;
    info!(port = config.metrics.port, "Metrics exporter started");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
