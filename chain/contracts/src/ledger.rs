//! Value Transfer Service — moving funds between party accounts
//!
//! The escrow engine never touches balances itself. It asks a
//! [`ValueTransferService`] to hold a payment and later to release it to
//! exactly one party. [`InMemoryLedger`] is a balance-table implementation
//! used by the demo and the tests; a chain or database backed service can be
//! swapped in as long as both calls stay all-or-nothing.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;
use types::ids::Identity;
use types::numeric::Money;
use uuid::Uuid;

use crate::errors::TransferError;

/// Reference to funds held by the transfer service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EscrowHandle(Uuid);

impl EscrowHandle {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EscrowHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EscrowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collaborator that moves value on behalf of the escrow engine.
///
/// Both operations are atomic: on `Ok` the funds moved in full, on `Err`
/// nothing moved.
pub trait ValueTransferService: Send + Sync {
    /// Take `amount` from `from` and hold it until released.
    fn escrow(&self, from: &Identity, amount: Money) -> Result<EscrowHandle, TransferError>;

    /// Pay the held funds behind `handle` to `to`, returning the amount paid.
    /// A handle can be released once.
    fn release(&self, handle: &EscrowHandle, to: &Identity) -> Result<Money, TransferError>;
}

#[derive(Debug, Clone)]
struct Hold {
    payer: Identity,
    amount: Money,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Identity, Money>,
    holds: HashMap<EscrowHandle, Hold>,
}

impl LedgerState {
    /// Credit with overflow protection, returning the new balance.
    fn safe_credit(&mut self, account: &Identity, amount: Money) -> Result<Money, TransferError> {
        let current = self.balances.get(account).copied().unwrap_or(Money::ZERO);
        let new_balance = current
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        self.balances.insert(account.clone(), new_balance);
        Ok(new_balance)
    }

    /// Debit with underflow protection.
    fn safe_debit(&mut self, account: &Identity, amount: Money) -> Result<(), TransferError> {
        let current = self.balances.get(account).copied().unwrap_or(Money::ZERO);
        if current < amount {
            return Err(TransferError::InsufficientFunds {
                account: account.clone(),
                required: amount,
                available: current,
            });
        }
        let new_balance = current
            .checked_sub(amount)
            .ok_or(TransferError::Overflow)?;
        self.balances.insert(account.clone(), new_balance);
        Ok(())
    }
}

/// Balance table with an escrow holding area.
///
/// All mutations happen under one lock and validate before applying, so a
/// failed call leaves every balance untouched.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger with opening balances.
    pub fn with_balances<I>(balances: I) -> Result<Self, TransferError>
    where
        I: IntoIterator<Item = (Identity, Money)>,
    {
        let ledger = Self::new();
        for (account, amount) in balances {
            ledger.deposit(&account, amount)?;
        }
        Ok(ledger)
    }

    /// Fund an account from outside the system.
    pub fn deposit(&self, account: &Identity, amount: Money) -> Result<Money, TransferError> {
        if !amount.is_positive() {
            return Err(TransferError::InvalidAmount);
        }
        let mut state = self.state.lock();
        let balance = state.safe_credit(account, amount)?;
        debug!(%account, %amount, %balance, "Deposit credited");
        Ok(balance)
    }

    /// Spendable balance of an account (excludes funds held in escrow).
    pub fn balance_of(&self, account: &Identity) -> Money {
        self.state
            .lock()
            .balances
            .get(account)
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// Total currently held across all open escrows, or `None` if the sum
    /// does not fit in a `Money`.
    pub fn held_total(&self) -> Option<Money> {
        self.state
            .lock()
            .holds
            .values()
            .try_fold(Money::ZERO, |acc, hold| acc.checked_add(hold.amount))
    }

    /// Number of open escrows.
    pub fn open_holds(&self) -> usize {
        self.state.lock().holds.len()
    }
}

impl ValueTransferService for InMemoryLedger {
    fn escrow(&self, from: &Identity, amount: Money) -> Result<EscrowHandle, TransferError> {
        if !amount.is_positive() {
            return Err(TransferError::InvalidAmount);
        }
        let mut state = self.state.lock();
        state.safe_debit(from, amount)?;

        let handle = EscrowHandle::new();
        state.holds.insert(
            handle,
            Hold {
                payer: from.clone(),
                amount,
            },
        );
        debug!(%handle, payer = %from, %amount, "Funds escrowed");
        Ok(handle)
    }

    fn release(&self, handle: &EscrowHandle, to: &Identity) -> Result<Money, TransferError> {
        let mut state = self.state.lock();
        let hold = state
            .holds
            .get(handle)
            .cloned()
            .ok_or_else(|| TransferError::UnknownHandle {
                handle: handle.to_string(),
            })?;

        // Credit first: on overflow the hold must survive untouched.
        state.safe_credit(to, hold.amount)?;
        state.holds.remove(handle);
        debug!(%handle, payer = %hold.payer, recipient = %to, amount = %hold.amount, "Escrow released");
        Ok(hold.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn funded() -> InMemoryLedger {
        InMemoryLedger::with_balances([
            (Identity::new("buyer"), Money::from(10)),
            (Identity::new("seller"), Money::from(1)),
        ])
        .unwrap()
    }

    #[test]
    fn test_deposit_accumulates() {
        let ledger = InMemoryLedger::new();
        let acc = Identity::new("alice");
        ledger.deposit(&acc, Money::from(5)).unwrap();
        let balance = ledger.deposit(&acc, Money::from(3)).unwrap();
        assert_eq!(balance, Money::from(8));
        assert_eq!(ledger.balance_of(&acc), Money::from(8));
    }

    #[test]
    fn test_deposit_rejects_non_positive() {
        let ledger = InMemoryLedger::new();
        let acc = Identity::new("alice");
        assert_eq!(
            ledger.deposit(&acc, Money::ZERO),
            Err(TransferError::InvalidAmount)
        );
        assert_eq!(
            ledger.deposit(&acc, Money::new(Decimal::from(-1))),
            Err(TransferError::InvalidAmount)
        );
    }

    #[test]
    fn test_balance_of_unknown_account_is_zero() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance_of(&Identity::new("ghost")), Money::ZERO);
    }

    #[test]
    fn test_escrow_moves_funds_into_hold() {
        let ledger = funded();
        let buyer = Identity::new("buyer");
        ledger.escrow(&buyer, Money::from(2)).unwrap();

        assert_eq!(ledger.balance_of(&buyer), Money::from(8));
        assert_eq!(ledger.held_total(), Some(Money::from(2)));
        assert_eq!(ledger.open_holds(), 1);
    }

    #[test]
    fn test_escrow_insufficient_funds_moves_nothing() {
        let ledger = funded();
        let seller = Identity::new("seller");
        let result = ledger.escrow(&seller, Money::from(5));
        assert!(matches!(
            result,
            Err(TransferError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.balance_of(&seller), Money::from(1));
        assert_eq!(ledger.open_holds(), 0);
    }

    #[test]
    fn test_release_pays_recipient_once() {
        let ledger = funded();
        let buyer = Identity::new("buyer");
        let seller = Identity::new("seller");
        let handle = ledger.escrow(&buyer, Money::from(2)).unwrap();

        let paid = ledger.release(&handle, &seller).unwrap();
        assert_eq!(paid, Money::from(2));
        assert_eq!(ledger.balance_of(&seller), Money::from(3));
        assert_eq!(ledger.held_total(), Some(Money::ZERO));

        let again = ledger.release(&handle, &seller);
        assert!(matches!(again, Err(TransferError::UnknownHandle { .. })));
        assert_eq!(ledger.balance_of(&seller), Money::from(3));
    }

    #[test]
    fn test_release_overflow_keeps_hold() {
        let ledger = funded();
        let buyer = Identity::new("buyer");
        let whale = Identity::new("whale");
        ledger.deposit(&whale, Money::new(Decimal::MAX)).unwrap();
        let handle = ledger.escrow(&buyer, Money::from(2)).unwrap();

        let result = ledger.release(&handle, &whale);
        assert_eq!(result, Err(TransferError::Overflow));
        assert_eq!(ledger.open_holds(), 1);
        assert_eq!(ledger.balance_of(&whale), Money::new(Decimal::MAX));
    }

    #[test]
    fn test_held_total_overflow_is_none() {
        let ledger = InMemoryLedger::new();
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");
        ledger.deposit(&alice, Money::new(Decimal::MAX)).unwrap();
        ledger.deposit(&bob, Money::new(Decimal::MAX)).unwrap();
        ledger.escrow(&alice, Money::new(Decimal::MAX)).unwrap();
        assert_eq!(ledger.held_total(), Some(Money::new(Decimal::MAX)));

        ledger.escrow(&bob, Money::new(Decimal::MAX)).unwrap();
        assert_eq!(ledger.open_holds(), 2);
        assert_eq!(ledger.held_total(), None);
    }
}
