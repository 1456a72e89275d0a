//! Identifier types for trades and the parties acting on them
//!
//! Trade IDs are dense, zero-based sequence numbers assigned by the escrow
//! engine in creation order. Party identities are opaque strings supplied by
//! whatever authenticates the caller (wallet address, session subject, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a trade
///
/// Assigned sequentially starting at 0 and never reused, so the ID doubles
/// as the trade's index in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(u64);

impl TradeId {
    /// Create a TradeId from its sequence number
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Get the sequence number
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TradeId {
    fn from(sequence: u64) -> Self {
        Self(sequence)
    }
}

/// Identity of a party invoking an operation
///
/// Sellers, buyers and the arbitrator are all identified this way. How the
/// identity was authenticated is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}
