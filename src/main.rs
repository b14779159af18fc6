//! Discortize CLI - terminal client for crypto-monetized Discord communities
//!
//! A thin HTTP client of the Discortize backend, which owns all business
//! logic (payments, Discord integration, subscriptions).

mod api;
mod auth;
mod cache;
mod config;
mod content;
mod dashboard;
mod models;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "discortize-cli")]
#[command(about = "Lightweight CLI client for the Discortize API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },

    /// Create an account
    Register {
        /// Account email
        email: String,

        /// Public username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show current session status
    Status,

    /// Show the signed-in user profile
    Whoami,

    /// Live revenue dashboard with background session renewal
    Dashboard {
        /// Seconds between summary refreshes
        #[arg(short, long, default_value = "30")]
        refresh: u64,
    },

    /// Manage crypto invoices
    Invoices {
        #[command(subcommand)]
        action: InvoiceAction,
    },

    /// Show payment details for an invoice (no login required)
    Pay {
        /// Invoice ID from the pay link
        invoice_id: String,
    },

    /// List subscription tiers
    Subscriptions,

    /// Manage payouts
    Payouts {
        #[command(subcommand)]
        action: PayoutAction,
    },

    /// Show the revenue summary
    Stats,

    /// Show Discord link status and managed servers
    Servers,

    /// List notifications
    Notifications {
        /// Mark everything read after listing
        #[arg(long)]
        mark_read: bool,
    },

    /// Read the Discortize blog
    Blog {
        /// Post slug; omit to list posts
        slug: Option<String>,
    },
}

#[derive(Subcommand)]
enum InvoiceAction {
    /// List invoices
    List {
        /// Maximum number of invoices to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Create an invoice
    Create {
        /// Amount in the given currency, e.g. "0.05"
        amount: String,

        /// Currency code, e.g. BTC, ETH, USDC
        #[arg(short, long, default_value = "USDC")]
        currency: String,

        /// Optional note shown on the pay page
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show one invoice
    Show {
        /// Invoice ID
        invoice_id: String,
    },
}

#[derive(Subcommand)]
enum PayoutAction {
    /// Show the withdrawable balance
    Balance,

    /// List past payouts
    List {
        /// Maximum number of payouts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Request a withdrawal to an on-chain address
    Request {
        /// Amount to withdraw
        amount: String,

        /// Destination address
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Login { email, password } => {
            auth::login(&email, &password).await?;
        }
        Commands::Register {
            email,
            username,
            password,
        } => {
            auth::register(&email, &username, &password).await?;
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            auth::logout().await?;
        }
        Commands::Status => {
            auth::status().await?;
        }
        Commands::Whoami => {
            auth::whoami().await?;
        }
        Commands::Dashboard { refresh } => {
            dashboard::run(refresh).await?;
        }
        Commands::Invoices { action } => match action {
            InvoiceAction::List { limit } => {
                api::list_invoices(limit).await?;
            }
            InvoiceAction::Create {
                amount,
                currency,
                description,
            } => {
                api::create_invoice(&amount, &currency, description.as_deref()).await?;
            }
            InvoiceAction::Show { invoice_id } => {
                api::show_invoice(&invoice_id).await?;
            }
        },
        Commands::Pay { invoice_id } => {
            api::pay_invoice(&invoice_id).await?;
        }
        Commands::Subscriptions => {
            api::list_subscriptions().await?;
        }
        Commands::Payouts { action } => match action {
            PayoutAction::Balance => {
                api::balance().await?;
            }
            PayoutAction::List { limit } => {
                api::list_payouts(limit).await?;
            }
            PayoutAction::Request { amount, address } => {
                api::request_payout(&amount, &address).await?;
            }
        },
        Commands::Stats => {
            api::stats_summary().await?;
        }
        Commands::Servers => {
            api::discord_servers().await?;
        }
        Commands::Notifications { mark_read } => {
            api::list_notifications(mark_read).await?;
        }
        Commands::Blog { slug } => match slug {
            Some(slug) => api::show_post(&slug).await?,
            None => api::list_posts().await?,
        },
    }

    Ok(())
}
