//! Bazaar CLI - Browse the shop, manage the cart, and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! bazaar catalog list --search kettle
//! bazaar catalog show 7
//!
//! # Fill the cart
//! bazaar cart add 7 -q 2
//! bazaar cart show
//!
//! # Sign in and check out
//! bazaar login -u anna -p 's3cret-pass'
//! bazaar checkout --city Kazan
//! bazaar orders list
//! ```
//!
//! # Commands
//!
//! - `catalog` - List products and categories, show a product
//! - `cart` - Show and change the persisted cart
//! - `login` / `logout` / `register` / `whoami` / `profile` - Account
//! - `checkout` - Turn the cart into an order
//! - `orders` - List, show and cancel orders
//!
//! Configuration comes from `BAZAAR_*` environment variables (or `.env`);
//! see `bazaar_storefront::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use bazaar_core::{CategoryId, OrderId, ProductId};
use bazaar_storefront::AppError;
use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::state::AppState;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::CliError;
use commands::account::{ProfileArgs, RegisterArgs};
use commands::checkout::CheckoutArgs;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products and categories
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Create an account
    Register(RegisterArgs),
    /// Show the signed-in user
    Whoami,
    /// Update profile fields
    Profile(ProfileArgs),
    /// Place an order for the cart's contents
    Checkout(CheckoutArgs),
    /// List, show and cancel orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List in-stock products, one page at a time
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<CategoryId>,

        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// List categories
    Categories,
    /// Show one product
    Show { id: ProductId },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and totals
    Show,
    /// Add a product
    Add {
        id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove { id: ProductId },
    /// Set a product's quantity (0 removes it)
    Set { id: ProductId, quantity: u32 },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show { id: OrderId },
    /// Cancel a pending order
    Cancel { id: OrderId },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bazaar_storefront=info,bazaar_core=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::debug!(error = %e, "Command failed");
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Error: {}", e.user_message());
            if e.requires_login() {
                eprintln!("Run `bazaar login -u <username>` to sign in.");
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = StorefrontConfig::from_env().map_err(AppError::from)?;
    let mut state = AppState::open(config)?;
    let mut out = std::io::stdout().lock();

    let result = dispatch(cli.command, &mut state, &mut out).await;
    if let Err(CliError::App(e)) = &result {
        state.forget_rejected_token(e);
    }
    result?;

    out.flush()?;
    Ok(())
}

async fn dispatch(
    command: Commands,
    state: &mut AppState,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                category,
                search,
                page,
            } => {
                commands::catalog::list(state, out, category, search, page).await?;
            }
            CatalogAction::Categories => commands::catalog::categories(state, out).await?,
            CatalogAction::Show { id } => commands::catalog::show(state, out, id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state, out)?,
            CartAction::Add { id, quantity } => {
                commands::cart::add(state, out, id, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(state, out, id)?,
            CartAction::Set { id, quantity } => {
                commands::cart::set(state, out, id, quantity)?;
            }
            CartAction::Clear => commands::cart::clear(state, out)?,
        },
        Commands::Login { username, password } => {
            commands::account::login(state, out, username, password).await?;
        }
        Commands::Logout => commands::account::logout(state, out)?,
        Commands::Register(args) => commands::account::register(state, out, args).await?,
        Commands::Whoami => commands::account::whoami(state, out).await?,
        Commands::Profile(args) => commands::account::profile(state, out, args).await?,
        Commands::Checkout(args) => commands::checkout::run(state, out, args).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(state, out).await?,
            OrdersAction::Show { id } => commands::orders::show(state, out, id).await?,
            OrdersAction::Cancel { id } => commands::orders::cancel(state, out, id).await?,
        },
    }

    Ok(())
}
