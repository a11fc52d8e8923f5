//! Read-only views. Each call reads the oracle once; price-dependent answers come
//! with the oracle's invalid flag instead of failing.

use super::core::Engine;
use crate::collateral::CollateralLedger;
use crate::funding::FundingSequence;
use crate::margin::{accrued_funding, can_liquidate, liquidation_price, remaining_margin};
use crate::market::MarketAudit;
use crate::oracle::{PriceOracle, PriceSnapshot};
use crate::order::{calculate_order_fee, normalize_order, Order};
use crate::position::Position;
use crate::types::{AccountId, FundingIndex, Leverage, Price, Quote, RoundId};
use rust_decimal::Decimal;

impl<O: PriceOracle, C: CollateralLedger> Engine<O, C> {
    pub fn price_and_validity(&self) -> (Price, bool) {
        let snapshot = self.snapshot();
        (snapshot.price, snapshot.invalid)
    }

    pub fn current_round_id(&self) -> RoundId {
        self.snapshot().round_id
    }

    /// (long size, short size)
    pub fn market_sizes(&self) -> (Decimal, Decimal) {
        let aggregates = self.state.aggregates();
        (aggregates.long_size(), aggregates.short_size())
    }

    pub fn market_size(&self) -> Decimal {
        self.state.aggregates().market_size
    }

    pub fn market_skew(&self) -> Decimal {
        self.state.aggregates().market_skew
    }

    pub fn market_debt(&self) -> (Quote, bool) {
        let snapshot = self.snapshot();
        (self.state.aggregates().market_debt(snapshot.price), snapshot.invalid)
    }

    pub fn proportional_skew(&self) -> Decimal {
        self.state.aggregates().proportional_skew()
    }

    pub fn current_funding_rate(&self) -> Decimal {
        self.funding_rate_now()
    }

    pub fn unrecorded_funding(&self) -> (Decimal, bool) {
        let snapshot = self.snapshot();
        (self.live_unrecorded(&snapshot), snapshot.invalid)
    }

    /// None if either index is past the live index.
    pub fn net_funding_per_unit(&self, start: FundingIndex, end: FundingIndex) -> Option<(Decimal, bool)> {
        let snapshot = self.snapshot();
        let net = self
            .state
            .funding()
            .net_per_unit(start, end, self.live_unrecorded(&snapshot))?;
        Some((net, snapshot.invalid))
    }

    pub fn funding_sequence(&self) -> &FundingSequence {
        self.state.funding()
    }

    pub fn funding_sequence_length(&self) -> usize {
        self.state.funding().len()
    }

    pub fn market_audit(&self) -> MarketAudit {
        self.state.audit()
    }

    pub fn position(&self, account: AccountId) -> Option<&Position> {
        self.state.position(account)
    }

    pub fn order(&self, account: AccountId) -> Option<&Order> {
        self.state.order(account)
    }

    pub fn notional_value(&self, account: AccountId) -> (Quote, bool) {
        let snapshot = self.snapshot();
        let value = self
            .position(account)
            .map_or_else(Quote::zero, |position| position.notional_value(snapshot.price));
        (value, snapshot.invalid)
    }

    pub fn profit_loss(&self, account: AccountId) -> (Quote, bool) {
        let snapshot = self.snapshot();
        let pnl = self
            .position(account)
            .map_or_else(Quote::zero, |position| position.profit_loss(snapshot.price));
        (pnl, snapshot.invalid)
    }

    /// Funding accrued up to now, including what has not been recorded yet.
    pub fn accrued_funding(&self, account: AccountId) -> (Quote, bool) {
        let snapshot = self.snapshot();
        let funding = self
            .position(account)
            .map_or_else(Quote::zero, |position| self.live_funding(position, &snapshot));
        (funding, snapshot.invalid)
    }

    pub fn remaining_margin(&self, account: AccountId) -> (Quote, bool) {
        let snapshot = self.snapshot();
        let remaining = self.position(account).map_or_else(Quote::zero, |position| {
            remaining_margin(position, snapshot.price, self.live_funding(position, &snapshot))
        });
        (remaining, snapshot.invalid)
    }

    pub fn liquidation_price(&self, account: AccountId, include_funding: bool) -> (Price, bool) {
        let snapshot = self.snapshot();
        let price = self.position(account).map_or_else(Price::zero, |position| {
            let funding = if include_funding {
                self.live_funding(position, &snapshot)
            } else {
                Quote::zero()
            };
            liquidation_price(position, self.params.liquidation_fee, funding)
        });
        (price, snapshot.invalid)
    }

    pub fn can_liquidate(&self, account: AccountId) -> bool {
        let snapshot = self.snapshot();
        let Some(position) = self.position(account) else {
            return false;
        };
        let remaining = remaining_margin(position, snapshot.price, self.live_funding(position, &snapshot));
        can_liquidate(position, remaining, self.params.liquidation_fee, snapshot.invalid)
    }

    /// True when `confirm_order` would get past the order checks right now.
    pub fn can_confirm_order(&self, account: AccountId) -> bool {
        let snapshot = self.snapshot();
        let Some(order) = self.order(account) else {
            return false;
        };
        !snapshot.invalid
            && !snapshot.price.is_zero()
            && order.is_confirmable(snapshot.round_id)
            && !order.is_expired(snapshot.round_id, self.params.max_order_age_rounds)
    }

    /// Fee a new order would be charged at the current price and skew.
    /// None if the order's notional is out of range.
    pub fn order_fee(&self, margin: Quote, leverage: Leverage) -> Option<(Quote, bool)> {
        let snapshot = self.snapshot();
        let (margin, leverage) = normalize_order(margin, leverage);
        let fee = calculate_order_fee(
            margin,
            leverage,
            self.state.aggregates().market_skew,
            snapshot.price,
            self.params.exchange_fee_rate,
        )?;
        Some((fee, snapshot.invalid))
    }

    fn live_unrecorded(&self, snapshot: &PriceSnapshot) -> Decimal {
        self.unrecorded_at(self.funding_rate_now(), snapshot.price, self.current_time)
    }

    fn live_funding(&self, position: &Position, snapshot: &PriceSnapshot) -> Quote {
        let sequence = self.state.funding();
        accrued_funding(position, sequence, sequence.live_index(), self.live_unrecorded(snapshot))
    }
}
