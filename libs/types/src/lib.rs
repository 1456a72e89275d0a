//! Types library for peer-to-peer energy trading
//!
//! Core type definitions shared by the escrow contracts and the demo
//! driver. All amounts are fixed-point decimals so settlement is exact.
//!
//! # Modules
//! - `ids`: Identifiers (TradeId, Identity)
//! - `numeric`: Fixed-point decimal types (Quantity, Money)
//! - `trade`: Trade record and lifecycle state

// Public modules
pub mod ids;
pub mod numeric;
pub mod trade;
