//! Snippetbox CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply the web crate's migrations
//! snippetbox-cli migrate
//!
//! # Insert demonstration snippets
//! snippetbox-cli seed
//!
//! # Lock an account out (existing sessions end on their next request)
//! snippetbox-cli user deactivate alice@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "snippetbox-cli")]
#[command(author, version, about = "Snippetbox operator tools")]
struct Cli {
    /// `PostgreSQL` connection string (defaults to `SNIPPETBOX_DATABASE_URL`,
    /// then `DATABASE_URL`)
    #[arg(short, long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert demonstration snippets
    Seed,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Allow the account to log in again
    Activate {
        /// Account email address
        email: String,
    },
    /// Block the account from logging in and end its sessions
    Deactivate {
        /// Account email address
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let pool = commands::connect(cli.database_url).await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Seed => commands::seed::run(pool).await?,
        Commands::User { action } => match action {
            UserAction::Activate { email } => commands::user::set_active(pool, &email, true).await?,
            UserAction::Deactivate { email } => {
                commands::user::set_active(pool, &email, false).await?;
            }
        },
    }
    Ok(())
}
