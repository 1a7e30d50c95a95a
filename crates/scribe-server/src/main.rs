//! Scribe Server
//!
//! Blog backend: JWT-authenticated HTTP API over a SQLite store.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use scribe_core::config::{Config, default_database_path, load_config};
use scribe_core::tracing_init::init_tracing;
use scribe_server::auth::JwtManager;
use scribe_server::server::{AppState, build_router, cors_layer};
use scribe_server::storage::ScribeDatabase;

#[derive(Parser, Debug)]
#[command(name = "scribe-server")]
#[command(version, about = "Scribe blog server - JWT auth and post API")]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long, global = true, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Path to SQLite database file.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (the default).
    Serve {
        /// Address to listen on.
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Create an admin account and exit.
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "SCRIBE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing("scribe_server=info", cli.log_json)?;

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(path) = cli.db_path {
        config.server.database_path = Some(path);
    }
    if let Some(Command::Serve { addr: Some(addr) }) = &cli.command {
        config.server.addr = addr.to_string();
    }
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Starting scribe-server"
    );

    let db = open_database(&config).await?;
    let jwt = Arc::new(JwtManager::from_config(&config)?);
    let cors = cors_layer(&config.server.cors_origins).context("Invalid CORS origin")?;
    let state = AppState::new(db, jwt, config.pagination.clone())?.with_cors(cors);

    match cli.command.unwrap_or(Command::Serve { addr: None }) {
        Command::Serve { .. } => serve(state, &config.server.addr).await,
        Command::CreateAdmin {
            username,
            email,
            password,
        } => {
            let admin = state
                .sessions
                .create_admin(&username, &email, &password)
                .await?;
            info!(user_id = admin.id, username = %admin.username, "Admin account ready");
            Ok(())
        }
    }
}

async fn open_database(config: &Config) -> anyhow::Result<ScribeDatabase> {
    let path = config
        .server
        .database_path
        .clone()
        .or_else(default_database_path)
        .context("Could not determine a database path; pass --db-path")?;
    info!(path = %path.display(), "Opening scribe database");
    Ok(ScribeDatabase::open(&path).await?)
}

async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down gracefully..."),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
