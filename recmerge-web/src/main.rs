//! recmerge-web - record reconciliation merge wizard
//!
//! Serves the upload form, the candidate review page and the merged download.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recmerge_web::config::{default_config_path, ConfigOverrides, TomlConfig, WizardConfig};
use recmerge_web::store::spawn_sweeper;
use recmerge_web::{build_router, AppState};

/// Command-line arguments for recmerge-web
#[derive(Parser, Debug)]
#[command(name = "recmerge-web")]
#[command(about = "Browser wizard for reconciling an incoming file against a master file")]
#[command(version)]
struct Args {
    /// TOML configuration file (default: <config dir>/recmerge/config.toml)
    #[arg(short, long, env = "RECMERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "RECMERGE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RECMERGE_PORT")]
    port: Option<u16>,

    /// Secret used to sign session cookies
    #[arg(long, env = "RECMERGE_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Directory holding in-flight operations
    #[arg(long, env = "RECMERGE_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Seconds before an unused operation is swept
    #[arg(long, env = "RECMERGE_OPERATION_TTL")]
    operation_ttl: Option<u64>,

    /// Seconds between sweeps
    #[arg(long, env = "RECMERGE_SWEEP_INTERVAL")]
    sweep_interval: Option<u64>,

    /// Maximum request body size in bytes
    #[arg(long, env = "RECMERGE_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            secret_key: self.secret_key.clone(),
            store_dir: self.store_dir.clone(),
            operation_ttl_secs: self.operation_ttl,
            sweep_interval_secs: self.sweep_interval,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recmerge_web=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting recmerge-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let file_config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration file")?;
    match (&file_config, &config_path) {
        (Some(_), Some(path)) => info!("Configuration file: {}", path.display()),
        _ => info!("No configuration file, using defaults"),
    }

    let config = WizardConfig::resolve(args.overrides(), file_config)
        .context("Invalid configuration")?;
    if config.ephemeral_secret {
        warn!("No secret key configured; sessions will not survive a restart");
    }

    let state = AppState::new(config);
    state
        .store
        .ensure_dir()
        .await
        .context("Failed to create operation store directory")?;
    info!("Operation store: {}", state.store.dir().display());

    let sweeper = spawn_sweeper(
        Arc::clone(&state.store),
        state.config.operation_ttl,
        state.config.sweep_interval,
    );

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("recmerge-web listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
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
