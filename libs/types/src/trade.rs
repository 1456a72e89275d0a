//! Trade record and lifecycle types
//!
//! A trade moves through:
//!
//! ```text
//! Created ──accept──▶ Accepted ──complete──▶ Completed
//!                        │
//!                  raise_dispute
//!                        ▼
//!                     Disputed ──resolve──▶ ResolvedForSeller | ResolvedForBuyer
//! ```
//!
//! `Completed`, `ResolvedForSeller` and `ResolvedForBuyer` are terminal.

use crate::ids::{Identity, TradeId};
use crate::numeric::{Money, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeState {
    /// Offered by the seller, awaiting a buyer
    Created,
    /// Buyer has escrowed the price
    Accepted,
    /// Buyer confirmed delivery, funds paid to seller (terminal)
    Completed,
    /// A party contested the trade, funds frozen in escrow
    Disputed,
    /// Arbitrator released funds to the seller (terminal)
    ResolvedForSeller,
    /// Arbitrator refunded the buyer (terminal)
    ResolvedForBuyer,
}

impl TradeState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::ResolvedForSeller | Self::ResolvedForBuyer
        )
    }

    /// Whether funds are held in escrow while in this state.
    pub fn holds_escrow(&self) -> bool {
        matches!(self, Self::Accepted | Self::Disputed)
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Accepted => "Accepted",
            Self::Completed => "Completed",
            Self::Disputed => "Disputed",
            Self::ResolvedForSeller => "ResolvedForSeller",
            Self::ResolvedForBuyer => "ResolvedForBuyer",
        };
        f.write_str(name)
    }
}

/// A single energy trade between a seller and (eventually) a buyer
///
/// Invariants (see [`Trade::check_invariant`]):
/// - `escrowed_amount == price` while Accepted or Disputed, zero otherwise
/// - `buyer` is set iff the trade has left Created
/// - `buyer != seller`
/// - `dispute_raised_by` is set only while Disputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub seller: Identity,
    pub buyer: Option<Identity>,
    pub quantity: Quantity,
    pub price: Money,
    pub escrowed_amount: Money,
    pub state: TradeState,
    pub dispute_raised_by: Option<Identity>,

    // Timestamps
    pub created_at: i64, // Unix millis
    pub updated_at: i64,
}

impl Trade {
    /// Create a new trade offer in `Created` state
    pub fn new(
        trade_id: TradeId,
        seller: Identity,
        quantity: Quantity,
        price: Money,
        created_at: i64,
    ) -> Self {
        Self {
            trade_id,
            seller,
            buyer: None,
            quantity,
            price,
            escrowed_amount: Money::ZERO,
            state: TradeState::Created,
            dispute_raised_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Whether the trade has reached a final state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check the record's structural invariants
    pub fn check_invariant(&self) -> bool {
        let escrow_ok = if self.state.holds_escrow() {
            self.escrowed_amount == self.price
        } else {
            self.escrowed_amount.is_zero()
        };
        let buyer_ok = match (&self.buyer, self.state) {
            (None, TradeState::Created) => true,
            (Some(buyer), state) => state != TradeState::Created && *buyer != self.seller,
            (None, _) => false,
        };
        let dispute_ok =
            self.dispute_raised_by.is_some() == (self.state == TradeState::Disputed);

        escrow_ok && buyer_ok && dispute_ok
    }
}
