// 8.0 engine/core.rs: main engine. owns the market state and its collaborators.
// every mutating operation runs inside `transact`, which reads the oracle once,
// journals the market state and only touches collateral after the operation succeeded.

use super::config::EngineConfig;
use super::results::EngineError;
use super::transaction::Transaction;
use crate::collateral::CollateralLedger;
use crate::config::MarketParams;
use crate::events::{Event, EventId, EventPayload};
use crate::market::MarketState;
use crate::oracle::{PriceOracle, PriceSnapshot};
use crate::types::{AccountId, Quote, Timestamp};
use tracing::{debug, info, warn};

/// The three external collaborators, handed over once at construction.
#[derive(Debug)]
pub struct Collaborators<O, C> {
    pub oracle: O,
    pub collateral: C,
    // receives order fees
    pub fee_sink: AccountId,
}

/** 8.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine<O: PriceOracle, C: CollateralLedger> {
    pub(super) config: EngineConfig,
    pub(super) params: MarketParams,
    pub(super) owner: AccountId,
    pub(super) fee_sink: AccountId,
    pub(super) oracle: O,
    pub(super) collateral: C,
    pub(super) state: MarketState,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl<O: PriceOracle, C: CollateralLedger> Engine<O, C> {
    pub fn new(
        config: EngineConfig,
        params: MarketParams,
        owner: AccountId,
        collaborators: Collaborators<O, C>,
    ) -> Result<Self, EngineError> {
        params.validate()?;

        let current_time = Timestamp::from_millis(0);
        Ok(Self {
            config,
            params,
            owner,
            fee_sink: collaborators.fee_sink,
            oracle: collaborators.oracle,
            collateral: collaborators.collateral,
            state: MarketState::new(current_time),
            events: Vec::new(),
            next_event_id: 1,
            current_time,
        })
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    pub fn params(&self) -> &MarketParams {
        &self.params
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn fee_sink(&self) -> AccountId {
        self.fee_sink
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    // price updates arrive through the oracle handle
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn collateral(&self) -> &C {
        &self.collateral
    }

    pub fn collateral_mut(&mut self) -> &mut C {
        &mut self.collateral
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    // hands retained events to a consumer and forgets them
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub(super) fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot::capture(&self.oracle, &self.params.base_asset)
    }

    pub(super) fn require_owner(&self, caller: AccountId) -> Result<(), EngineError> {
        if caller != self.owner {
            warn!(caller = %caller, "rejected privileged call");
            return Err(EngineError::AccessDenied(caller));
        }
        Ok(())
    }

    // 8.2: all-or-nothing wrapper. on error the market state and params are put back,
    // staged transfers and events are dropped, and the ledger was never touched.
    pub(super) fn transact<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Self, &mut Transaction) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut tx = Transaction::new(self.snapshot(), self.current_time);
        let params_before = self.params.clone();
        self.state.begin();

        let result = f(self, &mut tx).and_then(|value| {
            self.settle(&tx)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                self.state.commit();
                for payload in tx.into_events() {
                    self.emit_event(payload);
                }
                Ok(value)
            }
            Err(err) => {
                self.state.rollback();
                self.params = params_before;
                debug!(operation, error = %err, "operation aborted, state rolled back");
                Err(err)
            }
        }
    }

    // 8.3: apply staged transfers netted per account. debits first so a failing
    // debit can be undone before any credit has landed.
    fn settle(&mut self, tx: &Transaction) -> Result<(), EngineError> {
        let net = tx.net_transfers();

        for (account, amount) in net.iter().filter(|(_, amount)| amount.is_negative()) {
            let required = amount.abs();
            let available = self.collateral.balance_of(*account);
            if required > available {
                return Err(EngineError::InsufficientBalance { required, available });
            }
        }

        let mut debited: Vec<(AccountId, Quote)> = Vec::new();
        for (account, amount) in net.iter().filter(|(_, amount)| amount.is_negative()) {
            if let Err(err) = self.collateral.debit(*account, amount.abs()) {
                for (account, amount) in debited {
                    self.collateral.credit(account, amount);
                }
                return Err(err.into());
            }
            debited.push((*account, amount.abs()));
        }

        for (account, amount) in net
            .iter()
            .filter(|(_, amount)| !amount.is_negative() && !amount.is_zero())
        {
            self.collateral.credit(*account, *amount);
        }

        Ok(())
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            info!(event_id = event.id.0, at = %event.timestamp, payload = ?event.payload, "event");
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
