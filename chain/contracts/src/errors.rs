//! Contract-specific error types
//!
//! Error taxonomy for escrow operations, the value-transfer collaborator,
//! and configuration loading.

use thiserror::Error;
use types::ids::{Identity, TradeId};
use types::numeric::Money;
use types::trade::TradeState;

/// Value Transfer Service errors
///
/// A transfer either moves funds in full or fails with one of these and
/// moves nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("Insufficient funds for {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: Identity,
        required: Money,
        available: Money,
    },

    #[error("Unknown escrow handle: {handle}")]
    UnknownHandle { handle: String },

    #[error("Transfer amount must be positive")]
    InvalidAmount,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Transfer declined: {reason}")]
    Declined { reason: String },
}

/// Discriminant of [`EscrowError`], for callers that only branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    InvalidState,
    Unauthorized,
    WrongAmount,
    TransferFailure,
}

/// Escrow engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EscrowError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Trade not found: {trade_id}")]
    NotFound { trade_id: TradeId },

    #[error("Trade {trade_id} is {actual}, operation requires {expected}")]
    InvalidState {
        trade_id: TradeId,
        expected: TradeState,
        actual: TradeState,
    },

    #[error("Unauthorized: {caller} may not {action} trade {trade_id}")]
    Unauthorized {
        trade_id: TradeId,
        caller: Identity,
        action: &'static str,
    },

    #[error("Wrong payment for trade {trade_id}: expected {expected}, received {received}")]
    WrongAmount {
        trade_id: TradeId,
        expected: Money,
        received: Money,
    },

    #[error("Transfer failed for trade {trade_id}: {source}")]
    TransferFailure {
        trade_id: TradeId,
        #[source]
        source: TransferError,
    },
}

impl EscrowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::WrongAmount { .. } => ErrorKind::WrongAmount,
            Self::TransferFailure { .. } => ErrorKind::TransferFailure,
        }
    }

    /// The trade the failure refers to. `None` only for rejected creations,
    /// which never got an ID.
    pub fn trade_id(&self) -> Option<TradeId> {
        match self {
            Self::InvalidArgument { .. } => None,
            Self::NotFound { trade_id }
            | Self::InvalidState { trade_id, .. }
            | Self::Unauthorized { trade_id, .. }
            | Self::WrongAmount { trade_id, .. }
            | Self::TransferFailure { trade_id, .. } => Some(*trade_id),
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = EscrowError::NotFound {
            trade_id: TradeId::new(7),
        };
        assert_eq!(err.to_string(), "Trade not found: 7");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = EscrowError::InvalidState {
            trade_id: TradeId::new(0),
            expected: TradeState::Created,
            actual: TradeState::Accepted,
        };
        assert_eq!(
            err.to_string(),
            "Trade 0 is Accepted, operation requires Created"
        );
    }

    #[test]
    fn test_kind_and_trade_id() {
        let err = EscrowError::WrongAmount {
            trade_id: TradeId::new(3),
            expected: Money::from(2),
            received: Money::from(1),
        };
        assert_eq!(err.kind(), ErrorKind::WrongAmount);
        assert_eq!(err.trade_id(), Some(TradeId::new(3)));

        let err = EscrowError::InvalidArgument {
            reason: "quantity must be positive".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.trade_id(), None);
    }

    #[test]
    fn test_transfer_failure_carries_source() {
        use std::error::Error as _;

        let err = EscrowError::TransferFailure {
            trade_id: TradeId::new(1),
            source: TransferError::Declined {
                reason: "ledger offline".to_string(),
            },
        };
        assert!(err.to_string().contains("ledger offline"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_insufficient_funds_display() {
        let err = TransferError::InsufficientFunds {
            account: Identity::new("buyer"),
            required: Money::from(2),
            available: Money::from(1),
        };
        assert!(err.to_string().contains("buyer"));
        assert!(err.to_string().contains("required 2"));
    }
}
