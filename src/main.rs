//! Complaint Tracker - HTTP backend for filing and tracking complaints
//!
//! Users authenticate with bearer tokens, file complaints, tag and comment on
//! them, and administrators manage accounts.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;

use complaint_tracker::{api, db, logging, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    // Check for --help flag
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    // Check for --version flag
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("Complaint Tracker {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--migrate") {
        return migrate().await;
    }

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    let _log_guard = logging::init_logging(&config.logging);

    info!("Complaint Tracker starting up");

    ensure_data_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(config.clone(), db);
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Ensure the directory holding the SQLite file exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    if let Some(path) = sqlite_file_path(&config.database.url) {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).context("Failed to create data directory")?;
                info!("Created data directory: {:?}", parent);
            }
        }
    }
    Ok(())
}

/// File path part of a `sqlite://` URL, without query parameters
fn sqlite_file_path(url: &str) -> Option<&str> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    (!path.is_empty() && path != ":memory:").then_some(path)
}

fn print_help() {
    println!(
        r#"Complaint Tracker {}

USAGE:
    complaint-tracker [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --migrate               Apply database migrations, verify that every
                            required table exists, then exit.

ENVIRONMENT:
    COMPLAINTS_CONFIG   Path to configuration file (default: config.yaml)
    DATABASE_URL        SQLite connection string
    JWT_SECRET          Token signing secret (at least 32 characters)

CONFIGURATION:
    The application looks for configuration files in the following order:
    1. Path specified by COMPLAINTS_CONFIG environment variable
    2. ./config.yaml
    3. ./config/config.yaml
    4. /etc/complaint-tracker/config.yaml"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Run migrations and report on the resulting schema
async fn migrate() -> Result<()> {
    println!("Complaint Tracker Migration Tool v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = AppConfig::load().context("Failed to load configuration")?;
    ensure_data_directory(&config)?;

    println!("Database URL: {}", config.database.url);
    println!("Running database migrations...");

    let pool = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    println!("Migrations completed successfully.");
    println!();
    println!("Verifying database tables...");

    let missing = db::migrations::missing_tables(&pool).await?;
    if !missing.is_empty() {
        eprintln!("WARNING: {} missing table(s) after migrations:", missing.len());
        for table in &missing {
            eprintln!("  - {}", table);
        }
        return Err(anyhow::anyhow!(
            "Migration incomplete: {} missing tables",
            missing.len()
        ));
    }

    println!(
        "All {} required tables are present.",
        db::migrations::REQUIRED_TABLES.len()
    );
    Ok(())
}
