//! Funding recomputation.

use super::core::Engine;
use super::results::EngineError;
use super::transaction::Transaction;
use crate::collateral::CollateralLedger;
use crate::events::{EventPayload, FundingRecomputedEvent};
use crate::funding::{current_funding_rate, unrecorded_funding};
use crate::oracle::PriceOracle;
use crate::types::{FundingIndex, Price, Timestamp};
use rust_decimal::Decimal;
use tracing::debug;

impl<O: PriceOracle, C: CollateralLedger> Engine<O, C> {
    /// Record the funding accrued since the last recomputation. Anyone may call this.
    pub fn recompute_funding(&mut self) -> Result<FundingIndex, EngineError> {
        self.transact("recompute_funding", |engine, tx| engine.recompute_funding_in(tx))
    }

    // appends one entry and returns its index. positions entering now start there.
    pub(super) fn recompute_funding_in(&mut self, tx: &mut Transaction) -> Result<FundingIndex, EngineError> {
        let price = tx.valid_price()?;
        let funding_rate = self.funding_rate_now();
        let unrecorded = self.unrecorded_at(funding_rate, price, tx.now);

        let index = self.state.record_funding(unrecorded, tx.now);
        let cumulative_funding = self.state.funding().last();

        debug!(index = index.0, at = %tx.now, %funding_rate, %unrecorded, "funding recomputed");

        tx.emit(EventPayload::FundingRecomputed(FundingRecomputedEvent {
            index,
            cumulative_funding,
            funding_rate,
            price,
        }));

        Ok(index)
    }

    pub(super) fn funding_rate_now(&self) -> Decimal {
        current_funding_rate(self.state.aggregates().proportional_skew(), &self.params.funding)
    }

    pub(super) fn unrecorded_at(&self, funding_rate: Decimal, price: Price, now: Timestamp) -> Decimal {
        unrecorded_funding(funding_rate, price, self.state.funding().last_recomputed(), now)
    }
}
