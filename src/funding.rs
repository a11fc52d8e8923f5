// 5.0: funding. the rate follows market skew: clamp(skew / size / max_skew, -1, 1) * max_rate.
// accrued funding is tracked as an append-only sequence of cumulative per-unit values so a
// position only needs the index it entered at. 5.0 has the params/sequence, 5.1+ the math.

use crate::types::{div_fixed, mul_fixed, FundingIndex, Price, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingParams {
    // per second, as a fraction of notional
    pub max_funding_rate: Decimal,
    // proportional skew at which the rate saturates
    pub max_funding_rate_skew: Decimal,
    // carried with the other funding params; the rate itself is not smoothed
    pub max_funding_rate_delta: Decimal,
}

impl Default for FundingParams {
    fn default() -> Self {
        Self {
            // roughly 10% per day
            max_funding_rate: dec!(0.000001157407407407),
            max_funding_rate_skew: dec!(1),
            max_funding_rate_delta: dec!(0.000000115740740740),
        }
    }
}

/// Cumulative funding per unit of size. Entry 0 is always zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSequence {
    entries: Vec<Decimal>,
    last_recomputed: Timestamp,
}

impl FundingSequence {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            entries: vec![Decimal::ZERO],
            last_recomputed: timestamp,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Decimal {
        self.entries.last().copied().unwrap_or(Decimal::ZERO)
    }

    pub fn last_recomputed(&self) -> Timestamp {
        self.last_recomputed
    }

    pub fn get(&self, index: FundingIndex) -> Option<Decimal> {
        self.entries.get(index.0).copied()
    }

    // the index "now" refers to before anything is recorded
    pub fn live_index(&self) -> FundingIndex {
        FundingIndex(self.entries.len())
    }

    pub fn entries(&self) -> &[Decimal] {
        &self.entries
    }

    // 5.1: append last + unrecorded. returns the slot the new entry landed in,
    // which is the sequence length before the append.
    pub fn record(&mut self, unrecorded: Decimal, now: Timestamp) -> FundingIndex {
        let index = FundingIndex(self.entries.len());
        let next = self.last() + unrecorded;
        self.entries.push(next);
        self.last_recomputed = now;
        index
    }

    // 5.2: seq[end] - seq[start]. end == len means "now": the live unrecorded
    // value stands in for the entry that has not been written yet.
    pub fn net_per_unit(
        &self,
        start: FundingIndex,
        end: FundingIndex,
        live_unrecorded: Decimal,
    ) -> Option<Decimal> {
        let start_value = self.get(start)?;
        let end_value = if end.0 == self.entries.len() {
            self.last() + live_unrecorded
        } else {
            self.get(end)?
        };
        Some(end_value - start_value)
    }

    // rollback only: drops entries appended by an aborted operation
    pub(crate) fn restore(&mut self, len: usize, last_recomputed: Timestamp) {
        debug_assert!(len >= 1 && len <= self.entries.len());
        self.entries.truncate(len);
        self.last_recomputed = last_recomputed;
    }
}

// 5.3: skew relative to open interest. zero with no open interest
pub fn proportional_skew(market_skew: Decimal, market_size: Decimal) -> Decimal {
    if market_size.is_zero() {
        return Decimal::ZERO;
    }
    div_fixed(market_skew, market_size)
}

// 5.4: bounded by +/- max_funding_rate. a zero max skew means "always max rate".
/// Per-second funding rate, signed like the skew.
///
/// Accrued funding is `size * net funding per unit` and is added to a position's
/// gains, so a positive rate (long skew) credits longs and debits shorts, and a
/// negative rate (short skew) credits shorts. Funding flows toward the dominant side.
pub fn current_funding_rate(proportional_skew: Decimal, params: &FundingParams) -> Decimal {
    if params.max_funding_rate_skew.is_zero() {
        return params.max_funding_rate;
    }

    let fraction = div_fixed(proportional_skew, params.max_funding_rate_skew)
        .max(-Decimal::ONE)
        .min(Decimal::ONE);

    mul_fixed(fraction, params.max_funding_rate)
}

// 5.5: rate * price * elapsed seconds
pub fn unrecorded_funding(
    funding_rate: Decimal,
    price: Price,
    last_recomputed: Timestamp,
    now: Timestamp,
) -> Decimal {
    mul_fixed(funding_rate * price.value(), last_recomputed.elapsed_seconds(&now))
}
