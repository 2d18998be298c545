//! CLI tool for bootstrapping administrator accounts
//!
//! Usage:
//!   create-admin [--config <path>] [--username <name>] [--password <pw>]
//!                [--reset-password] [--check]
//!
//! Options:
//!   --config          Path to configuration file
//!   --username        Account to create or inspect (default: admin)
//!   --password        Password to set, or to verify with --check
//!   --reset-password  Overwrite the password of an existing account
//!   --check           Report whether the account exists and the password verifies

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use complaint_tracker::{db, db::UserRepository, models::UserRole, services::AuthService, AppConfig};

const DEFAULT_USERNAME: &str = "admin";

#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    username: Option<String>,
    password: Option<String>,
    reset_password: bool,
    check: bool,
}

fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().context("--config requires a path")?;
                parsed.config_path = Some(PathBuf::from(value));
            }
            "--username" | "-u" => {
                let value = iter.next().context("--username requires a value")?;
                parsed.username = Some(value.clone());
            }
            "--password" | "-p" => {
                let value = iter.next().context("--password requires a value")?;
                parsed.password = Some(value.clone());
            }
            "--reset-password" => parsed.reset_password = true,
            "--check" => parsed.check = true,
            "--help" | "-h" => return Ok(None),
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(Some(parsed))
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw: Vec<String> = env::args().collect();
    let args = match parse_args(&raw) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_help();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}", e);
            print_help();
            std::process::exit(2);
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::load_from(args.config_path.clone())?;
    let pool = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Connected to database: {}", config.database.url);

    let username = args.username.as_deref().unwrap_or(DEFAULT_USERNAME);
    let users = UserRepository::new(&pool);
    let auth = AuthService::new(pool.clone());
    let existing = users.get_by_username(username).await?;

    if args.check {
        let Some(user) = existing else {
            println!("User '{}' does not exist", username);
            std::process::exit(1);
        };
        println!(
            "User '{}' exists (id {}, role {}, {})",
            user.username,
            user.id,
            user.role,
            if user.is_active { "active" } else { "inactive" }
        );
        if let Some(ref password) = args.password {
            if AuthService::verify_password(password, &user.password_hash)? {
                println!("Password verifies");
            } else {
                println!("Password does NOT verify");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let password = args
        .password
        .as_deref()
        .context("--password is required to create or reset an account")?;

    match existing {
        Some(user) if args.reset_password => {
            auth.reset_password(user.id, password).await?;
            info!(username = %user.username, "Password reset");
        }
        Some(user) => {
            warn!(
                "User '{}' already exists; pass --reset-password to overwrite its password",
                user.username
            );
        }
        None => {
            let user = auth.create_user(username, password, UserRole::Admin).await?;
            info!(user_id = user.id, username = %user.username, "Admin user created");
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"create-admin {}

USAGE:
    create-admin [OPTIONS]

OPTIONS:
    --config <path>       Path to configuration file
    --username <name>     Account name (default: {})
    --password <pw>       Password to set, or to verify with --check
    --reset-password      Overwrite the password of an existing account
    --check               Report whether the account exists and the password verifies
    -h, --help            Print this help message"#,
        env!("CARGO_PKG_VERSION"),
        DEFAULT_USERNAME
    );
}
