// 2.0: next-price orders. an order escrows |margin| + fee at submission and is tagged with
// the oracle round it was submitted in. it can only be confirmed in a later round, so
// the submitter never trades at a price they already knew.
// 2.1 has the skew-aware fee schedule.

use crate::types::{Leverage, Price, Quote, RoundId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub margin: Quote,
    pub leverage: Leverage,
    pub fee: Quote,
    pub round_id: RoundId,
    pub submitted_at: Timestamp,
}

impl Order {
    pub fn new(margin: Quote, leverage: Leverage, fee: Quote, round_id: RoundId, submitted_at: Timestamp) -> Self {
        Self {
            margin,
            leverage,
            fee,
            round_id,
            submitted_at,
        }
    }

    // closing (or flat) order: no exposure, no fee
    pub fn is_close(&self) -> bool {
        self.margin.is_zero() || self.leverage.is_zero()
    }

    // what the account has locked up while the order is pending
    pub fn escrow(&self) -> Quote {
        self.margin.abs().add(self.fee)
    }

    // signed notional the order asks for: margin * leverage
    pub fn chargeable_value(&self) -> Quote {
        self.margin.mul(self.leverage.value())
    }

    // at least one fresh round since submission
    pub fn is_confirmable(&self, current_round: RoundId) -> bool {
        current_round > self.round_id
    }

    pub fn is_expired(&self, current_round: RoundId, max_age_rounds: Option<u64>) -> bool {
        match max_age_rounds {
            Some(max_age) => current_round.0 > self.round_id.0.saturating_add(max_age),
            None => false,
        }
    }
}

// if either side of the order is zero it is a close order: force both to zero
pub fn normalize_order(margin: Quote, leverage: Leverage) -> (Quote, Leverage) {
    if margin.is_zero() || leverage.is_zero() {
        (Quote::zero(), Leverage::zero())
    } else {
        (margin, leverage)
    }
}

fn same_side(a: Decimal, b: Decimal) -> bool {
    (a >= Decimal::ZERO) == (b >= Decimal::ZERO)
}

// 2.1: fee = |charged| * rate. orders adding to the skew pay on everything.
// orders against the skew pay only on the part that pushes it past zero.
// None when a notional leaves the decimal range.
pub fn calculate_order_fee(
    margin: Quote,
    leverage: Leverage,
    market_skew: Decimal,
    price: Price,
    exchange_fee_rate: Decimal,
) -> Option<Quote> {
    if margin.is_zero() || leverage.is_zero() {
        return Some(Quote::zero());
    }

    let chargeable = margin.value().checked_mul(leverage.value())?;
    let notional_skew = market_skew.checked_mul(price.value())?;

    let charged = if same_side(notional_skew, chargeable) {
        chargeable
    } else {
        let post_skew = notional_skew.checked_add(chargeable)?;
        if same_side(notional_skew, post_skew) {
            // only reduces the skew
            return Some(Quote::zero());
        }
        post_skew
    };

    charged.abs().checked_mul(exchange_fee_rate).map(Quote::new)
}
