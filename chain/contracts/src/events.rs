//! Contract events
//!
//! Events are immutable records emitted by committed escrow transitions.
//! A rejected operation never emits an event.

use serde::{Deserialize, Serialize};
use types::ids::{Identity, TradeId};
use types::numeric::{Money, Quantity};

/// Seller offered energy for sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCreated {
    pub trade_id: TradeId,
    pub seller: Identity,
    pub quantity: Quantity,
    pub price: Money,
}

/// Buyer accepted and escrowed the payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeAccepted {
    pub trade_id: TradeId,
    pub buyer: Identity,
    pub amount: Money,
}

/// Buyer confirmed delivery, escrow paid to the seller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCompleted {
    pub trade_id: TradeId,
    pub seller: Identity,
    pub amount: Money,
}

/// A trade party contested the trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeRaised {
    pub trade_id: TradeId,
    pub raised_by: Identity,
}

/// Arbitrator released the escrow to one party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeResolved {
    pub trade_id: TradeId,
    pub favor_seller: bool,
    pub recipient: Identity,
    pub amount: Money,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContractEvent {
    TradeCreated(TradeCreated),
    TradeAccepted(TradeAccepted),
    TradeCompleted(TradeCompleted),
    DisputeRaised(DisputeRaised),
    DisputeResolved(DisputeResolved),
}

impl ContractEvent {
    /// The trade this event belongs to.
    pub fn trade_id(&self) -> TradeId {
        match self {
            Self::TradeCreated(e) => e.trade_id,
            Self::TradeAccepted(e) => e.trade_id,
            Self::TradeCompleted(e) => e.trade_id,
            Self::DisputeRaised(e) => e.trade_id,
            Self::DisputeResolved(e) => e.trade_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_created_serialization() {
        let event = ContractEvent::TradeCreated(TradeCreated {
            trade_id: TradeId::new(0),
            seller: Identity::new("0xseller"),
            quantity: Quantity::from(10),
            price: Money::from(2),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"TradeCreated\""));
        let deser: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_event_trade_id() {
        let event = ContractEvent::DisputeResolved(DisputeResolved {
            trade_id: TradeId::new(5),
            favor_seller: false,
            recipient: Identity::new("0xbuyer"),
            amount: Money::from(2),
        });
        assert_eq!(event.trade_id(), TradeId::new(5));
    }
}
