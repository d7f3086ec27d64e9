//! Yemeni Market CLI - database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply the storefront migrations
//! ym-cli migrate
//!
//! # Create an admin account
//! ym-cli admin create -e admin@example.com -n "Admin Name" -r SUPER_ADMIN
//!
//! # Seed the default catalog and the welcome coupon
//! ym-cli seed catalog
//! ym-cli seed coupon
//!
//! # Restock everything, then list stock levels
//! ym-cli stock reset --quantity 100
//! ym-cli stock report
//!
//! # Verify the configured Stripe key
//! ym-cli stripe check
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ym-cli")]
#[command(author, version, about = "Yemeni Market CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert starter data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Inspect or reset product stock
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    /// Payment provider tools
    Stripe {
        #[command(subcommand)]
        action: StripeAction,
    },
    /// Edit store settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`SUPER_ADMIN` or `ADMIN`)
        #[arg(short, long, default_value = "ADMIN")]
        role: String,

        /// Password; read from `ADMIN_PASSWORD` when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Default admin, categories and sample products
    Catalog {
        /// YAML catalog to load instead of the built-in one
        #[arg(short, long)]
        file: Option<String>,
    },
    /// The WELCOME10 coupon
    Coupon,
}

#[derive(Subcommand)]
enum StockAction {
    /// Set every product's stock and activate it
    Reset {
        #[arg(short, long, default_value_t = 100)]
        quantity: i32,
    },
    /// Log every product's stock level
    Report,
}

#[derive(Subcommand)]
enum StripeAction {
    /// Retrieve the account the configured secret key belongs to
    Check,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Store new Stripe keys in `store_config`
    SetStripeKeys {
        /// Publishable key (`pk_...`)
        #[arg(long)]
        public: String,

        /// Secret key (`sk_...`)
        #[arg(long)]
        secret: String,
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
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&email, &name, &role, password).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(file.as_deref()).await?,
            SeedTarget::Coupon => commands::seed::welcome_coupon().await?,
        },
        Commands::Stock { action } => match action {
            StockAction::Reset { quantity } => commands::stock::reset(quantity).await?,
            StockAction::Report => commands::stock::report().await?,
        },
        Commands::Stripe { action } => match action {
            StripeAction::Check => commands::stripe::check().await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::SetStripeKeys { public, secret } => {
                commands::config::set_stripe_keys(&public, &secret).await?;
            }
        },
    }
    Ok(())
}
