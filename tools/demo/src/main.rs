use anyhow::Context;
use clap::Parser;
use contracts::config::EngineConfig;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trade_demo::{DemoOptions, Settlement};
use types::ids::Identity;
use types::numeric::{Money, Quantity};

/// Walk one energy trade through escrow and print the resulting trades.
#[derive(Parser, Debug)]
#[command(name = "trade-demo", version, about)]
struct Cli {
    /// JSON engine config, e.g. {"arbitrator": "owner"}. Falls back to
    /// ENERGY_TRADE_ARBITRATOR, then to "owner".
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "seller")]
    seller: String,

    #[arg(long, default_value = "buyer")]
    buyer: String,

    /// Energy offered
    #[arg(long, default_value = "10")]
    quantity: Decimal,

    /// Price the buyer escrows
    #[arg(long, default_value = "2")]
    price: Decimal,

    /// Opening balance for every demo account
    #[arg(long, default_value = "100")]
    starting_balance: Decimal,

    /// Dispute the trade instead of completing it
    #[arg(long)]
    with_dispute: bool,

    /// When disputing, rule for the buyer instead of the seller
    #[arg(long, requires = "with_dispute")]
    favor_buyer: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(EngineConfig::from_env().unwrap_or_else(|_| EngineConfig::new("owner"))),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    tracing::info!(arbitrator = %config.arbitrator, "Starting trade demo");

    let settlement = if cli.with_dispute {
        Settlement::Dispute {
            favor_seller: !cli.favor_buyer,
        }
    } else {
        Settlement::Complete
    };

    let options = DemoOptions {
        seller: Identity::new(cli.seller),
        buyer: Identity::new(cli.buyer),
        quantity: Quantity::new(cli.quantity),
        price: Money::new(cli.price),
        starting_balance: Money::new(cli.starting_balance),
        settlement,
        ..DemoOptions::with_defaults(config)
    };

    let report = trade_demo::run(&options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
