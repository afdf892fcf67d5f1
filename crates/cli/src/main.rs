//! Velluto CLI - Database migrations and site management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! velluto-cli migrate
//!
//! # Seed the remote store with the default site configuration
//! velluto-cli seed
//!
//! # Print the current site configuration document
//! velluto-cli show
//!
//! # Interactively run a gated bulk maintenance operation
//! velluto-cli purge rentals
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the configuration document
//! - `show` - Print the current configuration document
//! - `purge` - Run a gated bulk maintenance operation

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "velluto-cli")]
#[command(author, version, about = "Velluto Motors CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the remote store with the default site configuration
    Seed {
        /// Overwrite an existing document instead of refusing
        #[arg(long)]
        force: bool,
    },
    /// Print the current site configuration document as JSON
    Show,
    /// Run a gated bulk maintenance operation
    Purge {
        /// Operation slug: pricing-reset, rentals, payments, inventory, identities
        kind: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { force } => commands::seed::run(force).await?,
        Commands::Show => commands::show::run().await?,
        Commands::Purge { kind } => commands::purge::run(&kind).await?,
    }
    Ok(())
}
