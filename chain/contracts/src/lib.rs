//! Escrow Contract Logic for Peer-to-Peer Energy Trades
//!
//! A seller offers energy at a price, a buyer accepts by escrowing the
//! payment, and funds are released to the seller once the buyer confirms
//! delivery, or to whichever party the arbitrator rules for after a dispute.
//!
//! # Modules
//! - `errors`: Engine and value-transfer error types
//! - `events`: Events emitted on every committed state transition
//! - `security`: Role checks (seller, buyer, fixed arbitrator)
//! - `ledger`: Value Transfer Service trait and an in-memory ledger
//! - `escrow`: Trade registry and per-trade state machine
//! - `config`: Engine configuration loading
//!
//! # Version
//! v0.1.0

pub mod config;
pub mod errors;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod security;

pub use escrow::TradeEscrowEngine;
pub use ledger::{EscrowHandle, InMemoryLedger, ValueTransferService};
