//! GoMarket CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Add a product (a second add of the same id bumps its quantity)
//! gomarket add --id p1 --title Apple --image-url https://cdn.example.com/apple.png --price 1.50
//!
//! # Change quantities
//! gomarket increment p1
//! gomarket decrement p1
//!
//! # Show the cart
//! gomarket list
//! ```
//!
//! # Commands
//!
//! - `add` - Add one unit of a product
//! - `increment` - Add one unit to an existing line
//! - `decrement` - Remove one unit, dropping the line at zero
//! - `list` - Print the cart contents and subtotal

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "gomarket")]
#[command(author, version, about = "GoMarket cart tools")]
struct Cli {
    /// Storage file (overrides `GOMARKET_STORAGE_PATH`)
    #[arg(long, global = true)]
    storage_path: Option<PathBuf>,

    /// Storage key (overrides `GOMARKET_CART_KEY`)
    #[arg(long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add one unit of a product to the cart
    Add {
        /// Product id
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long, default_value = "")]
        image_url: String,

        /// Unit price (e.g. 1.50)
        #[arg(long)]
        price: String,
    },
    /// Add one unit to an existing cart line
    Increment {
        /// Product id
        id: String,
    },
    /// Remove one unit from a cart line
    Decrement {
        /// Product id
        id: String,
    },
    /// Show the cart
    List,
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gomarket_cli=info,gomarket_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let session = commands::CartSession::open(cli.storage_path, cli.key).await?;

    match cli.command {
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::add(&session, &id, &title, &image_url, &price)?,
        Commands::Increment { id } => commands::cart::increment(&session, &id)?,
        Commands::Decrement { id } => commands::cart::decrement(&session, &id)?,
        Commands::List => {}
    }

    commands::cart::show(&session)?;
    session.close().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_add_with_global_flags() {
        let cli = Cli::try_parse_from([
            "gomarket",
            "add",
            "--id",
            "p1",
            "--title",
            "Apple",
            "--price",
            "1.50",
            "--storage-path",
            "/tmp/cart.json",
        ])
        .unwrap();

        assert_eq!(cli.storage_path, Some(PathBuf::from("/tmp/cart.json")));
        assert!(matches!(
            cli.command,
            Commands::Add { ref id, ref image_url, .. } if id == "p1" && image_url.is_empty()
        ));
    }

    #[test]
    fn test_add_requires_price() {
        assert!(Cli::try_parse_from(["gomarket", "add", "--id", "p1", "--title", "Apple"]).is_err());
    }

    #[test]
    fn test_parses_quantity_commands() {
        let cli = Cli::try_parse_from(["gomarket", "--key", "@Test:cart", "decrement", "p1"]).unwrap();
        assert_eq!(cli.key.as_deref(), Some("@Test:cart"));
        assert!(matches!(cli.command, Commands::Decrement { ref id } if id == "p1"));
    }
}
