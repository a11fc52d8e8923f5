//! Market state and the incrementally maintained aggregates.
//!
//! Every position and order write goes through `MarketState::put_position` /
//! `MarketState::put_order`, which adjust the aggregates by exactly the delta
//! of the write. That keeps market debt an O(1) read:
//!
//! `debt = max(0, price * skew + Σ(|margin| - size * entry) + pending order value)`
//!
//! Writes made while a journal is open can be rolled back, which is how the
//! engine makes each operation all-or-nothing.

use crate::funding::{proportional_skew, FundingSequence};
use crate::order::Order;
use crate::position::Position;
use crate::types::{AccountId, FundingIndex, Price, Quote, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Market-wide accumulators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAggregates {
    /// Σ |size|
    pub market_size: Decimal,
    /// Σ size
    pub market_skew: Decimal,
    /// Σ (|margin| - size * entry price)
    pub entry_margin_sum_minus_notional_skew: Decimal,
    /// Σ escrow of pending orders
    pub pending_order_value: Decimal,
}

impl MarketAggregates {
    pub fn long_size(&self) -> Decimal {
        (self.market_size + self.market_skew) / Decimal::TWO
    }

    pub fn short_size(&self) -> Decimal {
        (self.market_size - self.market_skew) / Decimal::TWO
    }

    pub fn proportional_skew(&self) -> Decimal {
        proportional_skew(self.market_skew, self.market_size)
    }

    /// Never negative. Saturates at `Decimal::MAX` past the decimal range.
    pub fn market_debt(&self, price: Price) -> Quote {
        self.checked_market_debt(price)
            .unwrap_or_else(|| Quote::new(Decimal::MAX))
    }

    /// None when `price * skew` or the sum leaves the decimal range.
    pub fn checked_market_debt(&self, price: Price) -> Option<Quote> {
        let debt = price
            .value()
            .checked_mul(self.market_skew)?
            .checked_add(self.entry_margin_sum_minus_notional_skew)?
            .checked_add(self.pending_order_value)?;
        Some(Quote::new(debt.max(Decimal::ZERO)))
    }

    fn apply_position_delta(&mut self, old: Option<&Position>, new: Option<&Position>) {
        let (old_size, old_contribution) = old.map_or((Decimal::ZERO, Decimal::ZERO), |p| {
            (p.size.value(), p.debt_contribution())
        });
        let (new_size, new_contribution) = new.map_or((Decimal::ZERO, Decimal::ZERO), |p| {
            (p.size.value(), p.debt_contribution())
        });

        self.market_skew += new_size - old_size;
        self.market_size += new_size.abs() - old_size.abs();
        self.entry_margin_sum_minus_notional_skew += new_contribution - old_contribution;
    }

    fn apply_order_delta(&mut self, old: Option<&Order>, new: Option<&Order>) {
        let old_escrow = old.map_or(Decimal::ZERO, |o| o.escrow().value());
        let new_escrow = new.map_or(Decimal::ZERO, |o| o.escrow().value());
        self.pending_order_value += new_escrow - old_escrow;
    }
}

/// Totals recomputed by scanning every position and order. Only for audits and tests:
/// the engine itself never needs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketAudit {
    pub market_size: Decimal,
    pub market_skew: Decimal,
    pub entry_margin_sum_minus_notional_skew: Decimal,
    pub pending_order_value: Decimal,
}

impl MarketAudit {
    pub fn matches(&self, aggregates: &MarketAggregates) -> bool {
        self.market_size == aggregates.market_size
            && self.market_skew == aggregates.market_skew
            && self.entry_margin_sum_minus_notional_skew == aggregates.entry_margin_sum_minus_notional_skew
            && self.pending_order_value == aggregates.pending_order_value
    }
}

#[derive(Debug, Clone)]
struct Journal {
    aggregates: MarketAggregates,
    funding_len: usize,
    funding_last_recomputed: Timestamp,
    positions: HashMap<AccountId, Option<Position>>,
    orders: HashMap<AccountId, Option<Order>>,
}

#[derive(Debug, Clone)]
pub struct MarketState {
    positions: HashMap<AccountId, Position>,
    orders: HashMap<AccountId, Order>,
    aggregates: MarketAggregates,
    funding: FundingSequence,
    journal: Option<Journal>,
}

impl MarketState {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            positions: HashMap::new(),
            orders: HashMap::new(),
            aggregates: MarketAggregates::default(),
            funding: FundingSequence::new(timestamp),
            journal: None,
        }
    }

    pub fn position(&self, account: AccountId) -> Option<&Position> {
        self.positions.get(&account)
    }

    pub fn order(&self, account: AccountId) -> Option<&Order> {
        self.orders.get(&account)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&AccountId, &Position)> {
        self.positions.iter()
    }

    pub fn orders(&self) -> impl Iterator<Item = (&AccountId, &Order)> {
        self.orders.iter()
    }

    pub fn aggregates(&self) -> &MarketAggregates {
        &self.aggregates
    }

    pub fn funding(&self) -> &FundingSequence {
        &self.funding
    }

    pub fn audit(&self) -> MarketAudit {
        let mut audit = MarketAudit {
            market_size: Decimal::ZERO,
            market_skew: Decimal::ZERO,
            entry_margin_sum_minus_notional_skew: Decimal::ZERO,
            pending_order_value: Decimal::ZERO,
        };
        for position in self.positions.values() {
            audit.market_size += position.size.abs();
            audit.market_skew += position.size.value();
            audit.entry_margin_sum_minus_notional_skew += position.debt_contribution();
        }
        for order in self.orders.values() {
            audit.pending_order_value += order.escrow().value();
        }
        audit
    }

    /// Replace (or delete, with `None`) an account's position. Returns the prior one.
    /// A zero-size position is stored as a deletion.
    pub(crate) fn put_position(&mut self, account: AccountId, position: Option<Position>) -> Option<Position> {
        let position = position.filter(|p| !p.is_empty());

        if let Some(journal) = self.journal.as_mut() {
            journal
                .positions
                .entry(account)
                .or_insert_with(|| self.positions.get(&account).cloned());
        }

        match position {
            Some(position) => {
                let prior = self.positions.insert(account, position);
                let current = self.positions.get(&account);
                self.aggregates.apply_position_delta(prior.as_ref(), current);
                prior
            }
            None => {
                let prior = self.positions.remove(&account);
                self.aggregates.apply_position_delta(prior.as_ref(), None);
                prior
            }
        }
    }

    /// Replace (or delete, with `None`) an account's pending order. Returns the prior one.
    pub(crate) fn put_order(&mut self, account: AccountId, order: Option<Order>) -> Option<Order> {
        if let Some(journal) = self.journal.as_mut() {
            journal
                .orders
                .entry(account)
                .or_insert_with(|| self.orders.get(&account).cloned());
        }

        match order {
            Some(order) => {
                let prior = self.orders.insert(account, order);
                let current = self.orders.get(&account);
                self.aggregates.apply_order_delta(prior.as_ref(), current);
                prior
            }
            None => {
                let prior = self.orders.remove(&account);
                self.aggregates.apply_order_delta(prior.as_ref(), None);
                prior
            }
        }
    }

    pub(crate) fn record_funding(&mut self, unrecorded: Decimal, now: Timestamp) -> FundingIndex {
        self.funding.record(unrecorded, now)
    }

    pub(crate) fn begin(&mut self) {
        debug_assert!(self.journal.is_none(), "nested market journal");
        self.journal = Some(Journal {
            aggregates: self.aggregates,
            funding_len: self.funding.len(),
            funding_last_recomputed: self.funding.last_recomputed(),
            positions: HashMap::new(),
            orders: HashMap::new(),
        });
    }

    pub(crate) fn commit(&mut self) {
        self.journal = None;
    }

    pub(crate) fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };

        for (account, prior) in journal.positions {
            match prior {
                Some(position) => self.positions.insert(account, position),
                None => self.positions.remove(&account),
            };
        }
        for (account, prior) in journal.orders {
            match prior {
                Some(order) => self.orders.insert(account, order),
                None => self.orders.remove(&account),
            };
        }
        self.aggregates = journal.aggregates;
        self.funding.restore(journal.funding_len, journal.funding_last_recomputed);
    }
}
