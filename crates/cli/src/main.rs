//! Licorera CLI - Database migrations and seed data.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! licorera-cli migrate
//!
//! # Load demo users and the base catalog (destructive for catalog tables)
//! licorera-cli seed
//!
//! # Seed without the extra pagination-test products
//! licorera-cli seed --no-demo-items
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database with demo users and products

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "licorera-cli")]
#[command(author, version, about = "Licorera CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo users and the base catalog
    Seed {
        /// Skip the generated demo products used for pagination testing
        #[arg(long)]
        no_demo_items: bool,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Seed { no_demo_items } => commands::seed::run(!no_demo_items).await?,
    }
    Ok(())
}
