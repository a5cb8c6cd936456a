use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cryptofolio::app::{self, AddTransactionArgs, AppContext};
use cryptofolio::config::{default_config_path, ResolvedConfig};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cryptofolio")]
#[command(about = "Track crypto market prices and the value of your purchases")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Never contact the price feed; use the cached snapshot
    #[arg(long, global = true)]
    offline: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,

    /// Refresh and list the market snapshot
    Market {
        /// Only assets whose name or symbol contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Manage recorded purchases
    Portfolio {
        #[command(subcommand)]
        command: PortfolioCommand,
    },
}

#[derive(Subcommand)]
enum PortfolioCommand {
    /// Record a purchase
    Add {
        /// Asset id as listed by `market` (e.g. "bitcoin")
        #[arg(long)]
        asset: String,

        #[arg(long)]
        quantity: Decimal,

        /// Unit price paid
        #[arg(long)]
        price: Decimal,

        /// Purchase date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Delete a purchase by id
    Remove { id: String },

    /// List purchases with per-purchase profit/loss
    Transactions,

    /// Per-asset holdings
    Holdings,

    /// Whole-portfolio totals
    Summary,

    /// Fetch prices and update stored purchases
    Refresh,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    match cli.command {
        Command::Config => print_json(&app::config_output(&cli.config, &config)),
        Command::Market { search } => {
            let ctx = AppContext::open(config, cli.offline)?;
            print_json(&app::list_market(&ctx, search.as_deref()).await?)
        }
        Command::Portfolio { command } => {
            let ctx = AppContext::open(config, cli.offline)?;
            run_portfolio(&ctx, command).await
        }
    }
}

async fn run_portfolio(ctx: &AppContext, command: PortfolioCommand) -> Result<()> {
    match command {
        PortfolioCommand::Add {
            asset,
            quantity,
            price,
            date,
        } => {
            let args = AddTransactionArgs {
                asset_id: asset,
                quantity,
                purchase_unit_price: price,
                purchase_date: date,
            };
            print_json(&app::add_transaction(ctx, args).await?)
        }
        PortfolioCommand::Remove { id } => print_json(&app::remove_transaction(ctx, &id).await?),
        PortfolioCommand::Transactions => print_json(&app::list_transactions(ctx).await?),
        PortfolioCommand::Holdings => print_json(&app::portfolio_holdings(ctx).await?),
        PortfolioCommand::Summary => print_json(&app::portfolio_summary(ctx).await?),
        PortfolioCommand::Refresh => print_json(&app::refresh_portfolio(ctx).await?),
    }
}
