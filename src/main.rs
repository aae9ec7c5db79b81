use clap::{Parser, Subcommand};
use std::sync::Arc;

use hotel_backoffice::{
    auth::{accounts, AuthState, CredentialStore},
    logging::setup_logging,
    servers::{ApiServer, ApiServerConfig},
};

#[derive(Parser, Debug)]
#[command(name = "hotel_backoffice", version, about)]
struct Config {
    /// Host name or IP address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the HTTP API
    #[arg(short = 'p', long, default_value_t = 4060)]
    port: u16,

    /// Path to the SQLite database
    #[arg(long, default_value = "data/backoffice.db")]
    db_path: String,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write rotated log files here instead of stderr
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Make an existing account super admin
    GrantSuperAdmin {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> hotel_backoffice::Result<()> {
    let config = Config::parse();

    let _logger = setup_logging(&config.log_level, config.log_dir.as_deref())?;

    // Ensure data directory exists
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match config.command {
        Some(Command::GrantSuperAdmin { email }) => {
            let store = CredentialStore::open(&config.db_path)?;
            let account = accounts::grant_super_admin(&store, &email)?;
            log::info!("{} <{}> is now a super admin", account.full_name, account.email);
        }
        None => {
            let state = Arc::new(AuthState::from_env(&config.db_path)?);
            log::info!(
                "{} v{} (db: {})",
                hotel_backoffice::NAME,
                hotel_backoffice::VERSION,
                config.db_path
            );

            let server = ApiServer::new(
                ApiServerConfig {
                    port: config.port,
                    host: config.host,
                },
                state,
            );
            server.start().await?;
        }
    }
    Ok(())
}
