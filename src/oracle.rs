// Price oracle integration
//
// The engine does not care where prices come from. Anything that can report a price,
// a validity flag, and a strictly increasing round id for the market's asset can be
// plugged in through `PriceOracle`. Each engine operation reads the oracle exactly once
// into a `PriceSnapshot` and uses that snapshot for every step of the operation.

use crate::types::{Price, RoundId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Oracle adapter for a single underlying asset per call.
pub trait PriceOracle {
    /// Latest price and whether it is invalid (stale, flagged, missing).
    fn price_and_validity(&self, asset: &str) -> (Price, bool);

    /// Round id of the latest price. Strictly increases with each price update.
    fn current_round_id(&self, asset: &str) -> RoundId;
}

/// Everything an operation needs from the oracle, read once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub price: Price,
    pub invalid: bool,
    pub round_id: RoundId,
}

impl PriceSnapshot {
    pub fn capture<O: PriceOracle + ?Sized>(oracle: &O, asset: &str) -> Self {
        let (price, invalid) = oracle.price_and_validity(asset);
        let round_id = oracle.current_round_id(asset);
        Self {
            price,
            invalid,
            round_id,
        }
    }

    pub fn valid_price(&self) -> Option<Price> {
        if self.invalid {
            None
        } else {
            Some(self.price)
        }
    }
}

/// A single round as the manual oracle stores it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRound {
    pub price: Price,
    pub round_id: RoundId,
    pub invalid: bool,
}

/// Oracle driven by hand. Used by the simulation binary and tests.
/// Unknown assets report a zero, invalid price at round 0.
#[derive(Debug, Clone, Default)]
pub struct ManualOracle {
    rounds: HashMap<String, PriceRound>,
}

impl ManualOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an asset at a specific round.
    pub fn with_round(mut self, asset: &str, price: Decimal, round_id: RoundId) -> Self {
        self.set_round(asset, price, round_id);
        self
    }

    pub fn set_round(&mut self, asset: &str, price: Decimal, round_id: RoundId) {
        let (price, invalid) = match Price::new(price) {
            Some(price) => (price, false),
            None => (Price::zero(), true),
        };
        self.rounds.insert(
            asset.to_string(),
            PriceRound {
                price,
                round_id,
                invalid,
            },
        );
    }

    /// Publish a new price in the next round. Returns that round.
    pub fn push_price(&mut self, asset: &str, price: Decimal) -> RoundId {
        let next = self
            .rounds
            .get(asset)
            .map(|round| round.round_id.next())
            .unwrap_or(RoundId(1));
        self.set_round(asset, price, next);
        next
    }

    /// Flag (or clear) the current price as invalid without starting a new round.
    pub fn set_invalid(&mut self, asset: &str, invalid: bool) {
        if let Some(round) = self.rounds.get_mut(asset) {
            round.invalid = invalid;
        }
    }

    pub fn latest(&self, asset: &str) -> Option<&PriceRound> {
        self.rounds.get(asset)
    }
}

impl PriceOracle for ManualOracle {
    fn price_and_validity(&self, asset: &str) -> (Price, bool) {
        match self.rounds.get(asset) {
            Some(round) => (round.price, round.invalid),
            None => (Price::zero(), true),
        }
    }

    fn current_round_id(&self, asset: &str) -> RoundId {
        self.rounds
            .get(asset)
            .map(|round| round.round_id)
            .unwrap_or(RoundId(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn unknown_asset_is_invalid() {
        let oracle = ManualOracle::new();
        let snapshot = PriceSnapshot::capture(&oracle, "ETH");
        assert!(snapshot.invalid);
        assert!(snapshot.price.is_zero());
        assert_eq!(snapshot.round_id, RoundId(0));
        assert!(snapshot.valid_price().is_none());
    }

    #[test]
    fn push_price_advances_round() {
        let mut oracle = ManualOracle::new().with_round("ETH", dec!(100), RoundId(10));
        assert_eq!(oracle.current_round_id("ETH"), RoundId(10));

        let round = oracle.push_price("ETH", dec!(110));
        assert_eq!(round, RoundId(11));

        let snapshot = PriceSnapshot::capture(&oracle, "ETH");
        assert_eq!(snapshot.price.value(), dec!(110));
        assert_eq!(snapshot.round_id, RoundId(11));
        assert!(!snapshot.invalid);
    }

    #[test]
    fn invalid_flag_keeps_round() {
        let mut oracle = ManualOracle::new().with_round("ETH", dec!(100), RoundId(3));
        oracle.set_invalid("ETH", true);

        let (price, invalid) = oracle.price_and_validity("ETH");
        assert!(invalid);
        assert_eq!(price.value(), dec!(100));
        assert_eq!(oracle.current_round_id("ETH"), RoundId(3));
    }

    #[test]
    fn negative_price_reported_invalid() {
        let oracle = ManualOracle::new().with_round("ETH", dec!(-5), RoundId(1));
        let (_, invalid) = oracle.price_and_validity("ETH");
        assert!(invalid);
    }
}
