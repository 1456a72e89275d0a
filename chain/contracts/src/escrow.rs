//! Trade Escrow Engine — trade registry and per-trade state machine
//!
//! Every mutating operation follows the same shape, under the trade's own
//! lock:
//! 1. State check (exactly one expected state)
//! 2. Authorization check (seller, buyer or arbitrator)
//! 3. At most one call to the Value Transfer Service
//! 4. Commit the transition and emit its event
//!
//! A failure at any step returns before the commit, so the record is left
//! exactly as it was. Operations on different trades never contend on the
//! same lock; the registry lock is only held to append a trade or to clone
//! a record handle.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};
use types::ids::{Identity, TradeId};
use types::numeric::{Money, Quantity};
use types::trade::{Trade, TradeState};

use crate::config::EngineConfig;
use crate::errors::{EscrowError, TransferError};
use crate::events::{
    ContractEvent, DisputeRaised, DisputeResolved, TradeAccepted, TradeCompleted, TradeCreated,
};
use crate::ledger::{EscrowHandle, InMemoryLedger, ValueTransferService};
use crate::security::{AccessControl, Role};

/// A trade plus the handle to the funds it holds.
#[derive(Debug)]
struct TradeRecord {
    trade: Trade,
    handle: Option<EscrowHandle>,
}

type TradeSlot = Arc<Mutex<TradeRecord>>;

/// Registry of trades and the authority over their escrowed funds.
pub struct TradeEscrowEngine<L: ValueTransferService = InMemoryLedger> {
    /// Index == trade ID. Append-only.
    trades: RwLock<Vec<TradeSlot>>,
    access_control: AccessControl,
    ledger: Arc<L>,
    /// Emitted events log (append-only)
    events: Mutex<Vec<ContractEvent>>,
}

impl<L: ValueTransferService> TradeEscrowEngine<L> {
    /// Create an empty engine. The arbitrator cannot be changed afterwards.
    pub fn new(arbitrator: impl Into<Identity>, ledger: Arc<L>) -> Self {
        Self {
            trades: RwLock::new(Vec::new()),
            access_control: AccessControl::new(arbitrator),
            ledger,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(config: &EngineConfig, ledger: Arc<L>) -> Self {
        Self::new(config.arbitrator.clone(), ledger)
    }

    // ───────────────────────── Create ─────────────────────────

    /// Offer `quantity` of energy for `price`. The caller becomes the seller.
    pub fn create_trade(
        &self,
        quantity: Quantity,
        price: Money,
        caller: &Identity,
    ) -> Result<TradeId, EscrowError> {
        if !quantity.is_positive() {
            return Err(rejected(
                "create_trade",
                EscrowError::InvalidArgument {
                    reason: format!("quantity must be positive, got {quantity}"),
                },
            ));
        }
        if !price.is_positive() {
            return Err(rejected(
                "create_trade",
                EscrowError::InvalidArgument {
                    reason: format!("price must be positive, got {price}"),
                },
            ));
        }

        let mut trades = self.trades.write();
        let trade_id = TradeId::new(trades.len() as u64);
        let trade = Trade::new(trade_id, caller.clone(), quantity, price, now_millis());
        trades.push(Arc::new(Mutex::new(TradeRecord {
            trade,
            handle: None,
        })));

        self.emit(ContractEvent::TradeCreated(TradeCreated {
            trade_id,
            seller: caller.clone(),
            quantity,
            price,
        }));
        drop(trades);

        info!(%trade_id, seller = %caller, %quantity, %price, "Trade created");
        Ok(trade_id)
    }

    // ───────────────────────── Accept ─────────────────────────

    /// Accept a trade by escrowing exactly its price. The caller becomes the buyer.
    pub fn accept_trade(
        &self,
        trade_id: TradeId,
        payment: Money,
        caller: &Identity,
    ) -> Result<(), EscrowError> {
        self.try_accept(trade_id, payment, caller)
            .map_err(|err| rejected("accept_trade", err))
    }

    fn try_accept(
        &self,
        trade_id: TradeId,
        payment: Money,
        caller: &Identity,
    ) -> Result<(), EscrowError> {
        let slot = self.slot(trade_id)?;
        let mut record = slot.lock();

        require_state(&record.trade, TradeState::Created)?;
        if self
            .access_control
            .has_role(&record.trade, caller, Role::Seller)
        {
            return Err(unauthorized(trade_id, caller, "accept"));
        }
        if payment != record.trade.price {
            return Err(EscrowError::WrongAmount {
                trade_id,
                expected: record.trade.price,
                received: payment,
            });
        }

        let handle = self
            .ledger
            .escrow(caller, payment)
            .map_err(|source| EscrowError::TransferFailure { trade_id, source })?;

        let trade = &mut record.trade;
        trade.buyer = Some(caller.clone());
        trade.escrowed_amount = payment;
        trade.state = TradeState::Accepted;
        trade.updated_at = now_millis();
        record.handle = Some(handle);

        self.emit(ContractEvent::TradeAccepted(TradeAccepted {
            trade_id,
            buyer: caller.clone(),
            amount: payment,
        }));
        info!(%trade_id, buyer = %caller, amount = %payment, "Trade accepted");
        Ok(())
    }

    // ───────────────────────── Complete ─────────────────────────

    /// Buyer confirms delivery; the escrow is paid to the seller.
    pub fn complete_trade(&self, trade_id: TradeId, caller: &Identity) -> Result<(), EscrowError> {
        self.try_complete(trade_id, caller)
            .map_err(|err| rejected("complete_trade", err))
    }

    fn try_complete(&self, trade_id: TradeId, caller: &Identity) -> Result<(), EscrowError> {
        let slot = self.slot(trade_id)?;
        let mut record = slot.lock();

        require_state(&record.trade, TradeState::Accepted)?;
        if !self
            .access_control
            .has_role(&record.trade, caller, Role::Buyer)
        {
            return Err(unauthorized(trade_id, caller, "complete"));
        }

        let seller = record.trade.seller.clone();
        let amount = self.release_escrow(&record, &seller)?;

        record.handle = None;
        let trade = &mut record.trade;
        trade.escrowed_amount = Money::ZERO;
        trade.state = TradeState::Completed;
        trade.updated_at = now_millis();

        self.emit(ContractEvent::TradeCompleted(TradeCompleted {
            trade_id,
            seller: seller.clone(),
            amount,
        }));
        info!(%trade_id, %seller, %amount, "Trade completed");
        Ok(())
    }

    // ───────────────────────── Dispute ─────────────────────────

    /// Either party freezes an accepted trade pending arbitration.
    pub fn raise_dispute(&self, trade_id: TradeId, caller: &Identity) -> Result<(), EscrowError> {
        self.try_raise_dispute(trade_id, caller)
            .map_err(|err| rejected("raise_dispute", err))
    }

    fn try_raise_dispute(&self, trade_id: TradeId, caller: &Identity) -> Result<(), EscrowError> {
        let slot = self.slot(trade_id)?;
        let mut record = slot.lock();

        require_state(&record.trade, TradeState::Accepted)?;
        if !self
            .access_control
            .has_any_role(&record.trade, caller, &[Role::Seller, Role::Buyer])
        {
            return Err(unauthorized(trade_id, caller, "dispute"));
        }

        let trade = &mut record.trade;
        trade.dispute_raised_by = Some(caller.clone());
        trade.state = TradeState::Disputed;
        trade.updated_at = now_millis();

        self.emit(ContractEvent::DisputeRaised(DisputeRaised {
            trade_id,
            raised_by: caller.clone(),
        }));
        info!(%trade_id, raised_by = %caller, "Dispute raised");
        Ok(())
    }

    /// Arbitrator releases a disputed escrow in full to one party.
    pub fn resolve_dispute(
        &self,
        trade_id: TradeId,
        favor_seller: bool,
        caller: &Identity,
    ) -> Result<(), EscrowError> {
        self.try_resolve_dispute(trade_id, favor_seller, caller)
            .map_err(|err| rejected("resolve_dispute", err))
    }

    fn try_resolve_dispute(
        &self,
        trade_id: TradeId,
        favor_seller: bool,
        caller: &Identity,
    ) -> Result<(), EscrowError> {
        let slot = self.slot(trade_id)?;
        let mut record = slot.lock();

        if !self.access_control.is_arbitrator(caller) {
            return Err(unauthorized(trade_id, caller, "resolve"));
        }
        require_state(&record.trade, TradeState::Disputed)?;

        let (recipient, outcome) = if favor_seller {
            (record.trade.seller.clone(), TradeState::ResolvedForSeller)
        } else {
            let buyer = record.trade.buyer.clone().ok_or(EscrowError::InvalidState {
                trade_id,
                expected: TradeState::Disputed,
                actual: record.trade.state,
            })?;
            (buyer, TradeState::ResolvedForBuyer)
        };
        let amount = self.release_escrow(&record, &recipient)?;

        record.handle = None;
        let trade = &mut record.trade;
        trade.escrowed_amount = Money::ZERO;
        trade.dispute_raised_by = None;
        trade.state = outcome;
        trade.updated_at = now_millis();

        self.emit(ContractEvent::DisputeResolved(DisputeResolved {
            trade_id,
            favor_seller,
            recipient: recipient.clone(),
            amount,
        }));
        info!(%trade_id, favor_seller, %recipient, %amount, "Dispute resolved");
        Ok(())
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Snapshot of one trade.
    pub fn get_trade(&self, trade_id: TradeId) -> Result<Trade, EscrowError> {
        let slot = self.slot(trade_id)?;
        let record = slot.lock();
        Ok(record.trade.clone())
    }

    /// Snapshot of every trade in ascending ID order.
    ///
    /// Each record is copied under its own lock, released before the next
    /// one is taken, so a slow transition on one trade never holds up
    /// writers on the others.
    pub fn get_all_trades(&self) -> Vec<Trade> {
        let slots: Vec<TradeSlot> = self.trades.read().clone();
        slots.iter().map(|slot| slot.lock().trade.clone()).collect()
    }

    /// Number of trades ever created.
    pub fn trade_count(&self) -> u64 {
        self.trades.read().len() as u64
    }

    pub fn arbitrator(&self) -> &Identity {
        self.access_control.arbitrator()
    }

    /// The Value Transfer Service backing this engine.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    // ───────────────────────── Events ─────────────────────────

    /// Copy of all emitted events, in emission order.
    pub fn events(&self) -> Vec<ContractEvent> {
        self.events.lock().clone()
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&self) -> Vec<ContractEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    // ───────────────────────── Internal ─────────────────────────

    fn slot(&self, trade_id: TradeId) -> Result<TradeSlot, EscrowError> {
        let not_found = EscrowError::NotFound { trade_id };
        let index = usize::try_from(trade_id.as_u64()).map_err(|_| not_found.clone())?;
        self.trades.read().get(index).cloned().ok_or(not_found)
    }

    fn release_escrow(&self, record: &TradeRecord, to: &Identity) -> Result<Money, EscrowError> {
        let trade_id = record.trade.trade_id;
        let handle = record.handle.ok_or_else(|| EscrowError::TransferFailure {
            trade_id,
            source: TransferError::UnknownHandle {
                handle: format!("trade {trade_id} holds no escrow"),
            },
        })?;
        self.ledger
            .release(&handle, to)
            .map_err(|source| EscrowError::TransferFailure { trade_id, source })
    }

    fn emit(&self, event: ContractEvent) {
        self.events.lock().push(event);
    }
}

fn require_state(trade: &Trade, expected: TradeState) -> Result<(), EscrowError> {
    if trade.state != expected {
        return Err(EscrowError::InvalidState {
            trade_id: trade.trade_id,
            expected,
            actual: trade.state,
        });
    }
    Ok(())
}

fn unauthorized(trade_id: TradeId, caller: &Identity, action: &'static str) -> EscrowError {
    EscrowError::Unauthorized {
        trade_id,
        caller: caller.clone(),
        action,
    }
}

fn rejected(operation: &'static str, err: EscrowError) -> EscrowError {
    warn!(
        operation,
        trade_id = ?err.trade_id(),
        kind = ?err.kind(),
        error = %err,
        "Operation rejected"
    );
    err
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
