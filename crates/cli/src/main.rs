//! Campo Fresco CLI - Cart inspection and quoting tools.
//!
//! # Usage
//!
//! ```bash
//! # Price a cart file against a shipping policy
//! cf-cli quote --cart cart.json --shipping shipping.json
//!
//! # Print the server-held cart
//! cf-cli cart show
//!
//! # Add two units of a variant
//! cf-cli cart add -p aceite-oliva -v 500ml -q 2
//!
//! # Set an absolute quantity
//! cf-cli cart set-quantity -p aceite-oliva -v 500ml -q 4
//!
//! # Remove a line / clear the cart
//! cf-cli cart remove -p aceite-oliva -v 500ml
//! cf-cli cart clear
//! ```
//!
//! # Commands
//!
//! - `quote` - Compute a cost breakdown from JSON inputs
//! - `cart` - Inspect or mutate the backend cart record

#![cfg_attr(not(test), forbid(unsafe_code))]
// Command output belongs on stdout
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(author, version, about = "Campo Fresco CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a cart against shipping and payment policies
    Quote {
        /// Path to a JSON array of cart lines
        #[arg(short, long)]
        cart: PathBuf,

        /// Path to a shipping policy JSON file
        #[arg(short, long)]
        shipping: Option<PathBuf>,

        /// Path to a payment policy JSON file
        #[arg(short, long)]
        payment: Option<PathBuf>,
    },
    /// Inspect or mutate the backend cart record
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the server-held cart
    Show,
    /// Add units of a variant
    Add {
        /// Product ID
        #[arg(short, long)]
        product: String,

        /// Variant ID, for multi-variant products
        #[arg(short, long)]
        variant: Option<String>,

        /// Unit count to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's absolute quantity
    SetQuantity {
        /// Product ID
        #[arg(short, long)]
        product: String,

        /// Variant ID, for multi-variant products
        #[arg(short, long)]
        variant: Option<String>,

        /// Absolute unit count
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Product ID
        #[arg(short, long)]
        product: String,

        /// Variant ID, for multi-variant products
        #[arg(short, long)]
        variant: Option<String>,
    },
    /// Remove every line
    Clear,
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
        Commands::Quote {
            cart,
            shipping,
            payment,
        } => commands::quote::run(&cart, shipping.as_deref(), payment.as_deref())?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await?,
            CartAction::Add {
                product,
                variant,
                quantity,
            } => commands::cart::add(&product, variant.as_deref(), quantity).await?,
            CartAction::SetQuantity {
                product,
                variant,
                quantity,
            } => commands::cart::set_quantity(&product, variant.as_deref(), quantity).await?,
            CartAction::Remove { product, variant } => {
                commands::cart::remove(&product, variant.as_deref()).await?;
            }
            CartAction::Clear => commands::cart::clear().await?,
        },
    }
    Ok(())
}
