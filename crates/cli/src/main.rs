//! Spice Store CLI - document store setup and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the PostgreSQL schema, collection tables and indexes
//! spice-cli migrate
//!
//! # Insert the sample spice catalog if the products collection is empty
//! spice-cli seed
//! ```
//!
//! Both commands read `STOREFRONT_DATABASE_URL` and `STOREFRONT_DB_NAME` the same way the
//! storefront does.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "spice-cli")]
#[command(author, version, about = "Spice Store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create collection tables and indexes
    Migrate,
    /// Seed the catalog with sample spices
    Seed,
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

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
        Commands::Migrate => commands::migrate::collections().await?,
        Commands::Seed => commands::seed::sample_products().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_subcommands() {
        assert!(matches!(
            Cli::try_parse_from(["spice-cli", "migrate"]).map(|cli| cli.command),
            Ok(Commands::Migrate)
        ));
        assert!(matches!(
            Cli::try_parse_from(["spice-cli", "seed"]).map(|cli| cli.command),
            Ok(Commands::Seed)
        ));
        assert!(Cli::try_parse_from(["spice-cli", "admin"]).is_err());
        assert!(Cli::try_parse_from(["spice-cli"]).is_err());
    }
}
