//! Escrowed energy trade walkthrough
//!
//! Drives one trade through the engine the way a wallet client would:
//! the seller offers energy, the buyer escrows the price, and the trade is
//! either confirmed by the buyer or disputed by the seller and settled by
//! the arbitrator. Returns every trade, the event log and final balances.

use anyhow::{Context, Result};
use contracts::config::EngineConfig;
use contracts::events::ContractEvent;
use contracts::ledger::InMemoryLedger;
use contracts::TradeEscrowEngine;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use types::ids::Identity;
use types::numeric::{Money, Quantity};
use types::trade::Trade;

/// How the trade ends once funds are escrowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Buyer confirms delivery
    Complete,
    /// Seller disputes, arbitrator rules
    Dispute { favor_seller: bool },
}

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub config: EngineConfig,
    pub seller: Identity,
    pub buyer: Identity,
    pub quantity: Quantity,
    pub price: Money,
    pub starting_balance: Money,
    pub settlement: Settlement,
}

impl DemoOptions {
    /// Seller, buyer and owner accounts funded with `starting_balance`,
    /// selling 10 units for 2.
    pub fn with_defaults(config: EngineConfig) -> Self {
        Self {
            config,
            seller: Identity::new("seller"),
            buyer: Identity::new("buyer"),
            quantity: Quantity::from(10),
            price: Money::from(2),
            starting_balance: Money::from(100),
            settlement: Settlement::Complete,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountBalance {
    pub account: Identity,
    pub balance: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub trades: Vec<Trade>,
    pub events: Vec<ContractEvent>,
    pub balances: Vec<AccountBalance>,
}

pub fn run(options: &DemoOptions) -> Result<DemoReport> {
    let arbitrator = options.config.arbitrator.clone();
    // One account per distinct identity: the arbitrator may also trade.
    let mut parties: Vec<Identity> = Vec::with_capacity(3);
    for account in [&options.seller, &options.buyer, &arbitrator] {
        if !parties.contains(account) {
            parties.push(account.clone());
        }
    }

    let ledger = InMemoryLedger::new();
    for account in &parties {
        ledger
            .deposit(account, options.starting_balance)
            .with_context(|| format!("funding {account}"))?;
    }
    let engine = TradeEscrowEngine::from_config(&options.config, Arc::new(ledger));

    let trade_id = engine
        .create_trade(options.quantity, options.price, &options.seller)
        .context("seller creates trade")?;
    info!(%trade_id, seller = %options.seller, "Trade created by seller");

    engine
        .accept_trade(trade_id, options.price, &options.buyer)
        .context("buyer accepts trade")?;
    info!(%trade_id, buyer = %options.buyer, "Trade accepted by buyer");

    match options.settlement {
        Settlement::Complete => {
            engine
                .complete_trade(trade_id, &options.buyer)
                .context("buyer completes trade")?;
            info!(%trade_id, "Trade completed by buyer");
        }
        Settlement::Dispute { favor_seller } => {
            engine
                .raise_dispute(trade_id, &options.seller)
                .context("seller raises dispute")?;
            info!(%trade_id, "Dispute raised by seller");

            engine
                .resolve_dispute(trade_id, favor_seller, &arbitrator)
                .context("arbitrator resolves dispute")?;
            info!(%trade_id, favor_seller, "Dispute resolved by arbitrator");
        }
    }

    let balances = parties
        .iter()
        .map(|account| AccountBalance {
            account: account.clone(),
            balance: engine.ledger().balance_of(account),
        })
        .collect();

    Ok(DemoReport {
        trades: engine.get_all_trades(),
        events: engine.events(),
        balances,
    })
}
