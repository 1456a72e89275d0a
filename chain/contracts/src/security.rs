//! Access control for escrow operations
//!
//! Roles are derived per trade from the record itself (seller, buyer) plus
//! one engine-wide arbitrator fixed at construction.

use serde::{Deserialize, Serialize};
use types::ids::Identity;
use types::trade::Trade;

/// Roles a caller can hold with respect to a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Created the offer and receives payment
    Seller,
    /// Escrowed the payment and confirms delivery
    Buyer,
    /// Sole authority allowed to resolve disputes
    Arbitrator,
}

/// Role checks for a single engine.
///
/// The arbitrator has no setter: it is chosen once when the engine is built.
#[derive(Debug, Clone)]
pub struct AccessControl {
    arbitrator: Identity,
}

impl AccessControl {
    pub fn new(arbitrator: impl Into<Identity>) -> Self {
        Self {
            arbitrator: arbitrator.into(),
        }
    }

    /// Check if a caller holds `role` on `trade`.
    pub fn has_role(&self, trade: &Trade, caller: &Identity, role: Role) -> bool {
        match role {
            Role::Seller => trade.seller == *caller,
            Role::Buyer => trade.buyer.as_ref() == Some(caller),
            Role::Arbitrator => self.is_arbitrator(caller),
        }
    }

    /// Check if a caller holds any of `roles` on `trade`.
    pub fn has_any_role(&self, trade: &Trade, caller: &Identity, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(trade, caller, *role))
    }

    pub fn is_arbitrator(&self, caller: &Identity) -> bool {
        self.arbitrator == *caller
    }

    /// Get the arbitrator identifier.
    pub fn arbitrator(&self) -> &Identity {
        &self.arbitrator
    }
}
