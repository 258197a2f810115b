//! commcalc-dash - commission report dashboard
//!
//! Serves the upload UI and the report/calculator API. Configuration comes
//! from an optional TOML file; with none present the dashboard starts with
//! compiled defaults and the password gate disabled.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use commcalc_common::config::{load_toml_config, resolve_config_path, TomlConfig};
use commcalc_dash::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for commcalc-dash
#[derive(Parser, Debug)]
#[command(name = "commcalc-dash")]
#[command(about = "Commission report dashboard")]
#[command(version)]
struct Args {
    /// Configuration file (TOML); falls back to COMMCALC_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "COMMCALC_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides [server] bind)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts so its log level applies;
    // the outcome is logged once the subscriber is up
    let config_path = resolve_config_path(args.config.as_deref());
    let loaded = config_path.as_deref().map(load_toml_config);
    let config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting CommCalc dashboard (commcalc-dash) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match (&config_path, loaded) {
        (Some(path), Some(Ok(_))) => info!("Loaded configuration from {:?}", path),
        (Some(_), Some(Err(e))) => warn!("{}; using defaults", e),
        _ => info!("No config file found, using defaults"),
    }

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = args.port.unwrap_or(config.server.port);

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Invalid [auth] configuration: {}", e);
            return Err(anyhow::anyhow!(e));
        }
    };
    if state.gate.is_enabled() {
        info!("✓ Password gate enabled");
    } else {
        warn!("Password gate disabled ([auth] password_sha256 is empty)");
    }

    let app = build_router(state);

    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("commcalc-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
