//! # Postboard Server
//!
//! Binary that wires configuration, the database, image storage, and the
//! REST API together and serves them on one port.

use clap::{Parser, Subcommand};
use postboard_api::{build_router, AppState};
use postboard_db::{storage::StorageClient, Database};
use std::net::SocketAddr;
use tokio::signal;

#[derive(Parser)]
#[command(name = "postboard", version, about = "Post-sharing REST backend")]
struct Cli {
    /// Override the configured listen port
    #[arg(long, env = "POSTBOARD_PORT")]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    postboard_common::config::init()?;
    let config = postboard_common::config::get();

    // Initialize tracing (structured logging)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "postboard=debug,tower_http=debug".into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!("Starting Postboard v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.jwt_secret.is_empty() {
        anyhow::bail!("auth.jwt_secret must be set (POSTBOARD__AUTH__JWT_SECRET)");
    }

    let db = Database::connect(&config.database).await?;
    db.migrate().await?;

    if matches!(cli.command, Some(Command::Migrate)) {
        return Ok(());
    }

    let storage = StorageClient::new(&config.storage);
    storage.ensure_bucket().await?;
    if storage.is_local() {
        tracing::info!(dir = %config.storage.data_dir, "Image storage ready (local)");
    } else {
        tracing::info!(bucket = %config.storage.bucket, "Image storage ready (object storage)");
    }

    let state = AppState {
        db,
        storage,
        auth: config.auth.clone(),
        limits: config.limits.clone(),
        public_url: config.server.public_url.clone(),
    };
    let router = build_router(state);

    let addr = SocketAddr::new(
        config.server.host.parse()?,
        cli.port.unwrap_or(config.server.port),
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST API listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
