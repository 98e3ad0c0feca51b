//! Ration TDS CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ration-cli migrate
//!
//! # Create an admin user
//! ration-cli user create -e admin@example.com -n "Admin Name" -r admin
//!
//! # Create a shopkeeper for a shop
//! ration-cli user create -e keeper@example.com -n "Shop Keeper" -r shopkeeper -s SHOP001
//!
//! # Seed shops and stock from a YAML file
//! ration-cli seed shops -f shops.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create staff users
//! - `seed shops` - Seed shops and stock items from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ration-cli")]
#[command(author, version, about = "Ration TDS CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed database content
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin`, `shopkeeper`, `cardholder`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Shop code (required for shopkeepers)
        #[arg(short, long)]
        shop: Option<String>,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed shops and their stock items from a YAML file
    Shops {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,
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
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                shop,
            } => {
                let id = commands::user::create(&email, &name, &role, shop.as_deref()).await?;
                tracing::info!("Created user {id}");
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Shops { file } => commands::seed::shops(&file).await?,
        },
    }
    Ok(())
}
