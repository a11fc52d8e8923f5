//! Liquidation reward policy.
//!
//! A position is liquidatable once its remaining margin is at or below the flat
//! liquidation fee (see `margin::can_liquidate`). The reward paid to whoever
//! triggers it comes from protocol funds, not from the position. Whether that
//! reward may exceed what the position had left is a policy choice.

use crate::types::Quote;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationFeePolicy {
    /// Always pay the configured fee. The protocol subsidises any shortfall.
    #[default]
    Flat,
    /// Pay the fee, but never more than the remaining margin magnitude.
    CappedAtRemainingMargin,
}

/// Reward credited to the liquidator.
pub fn liquidation_reward(liquidation_fee: Quote, remaining: Quote, policy: LiquidationFeePolicy) -> Quote {
    match policy {
        LiquidationFeePolicy::Flat => liquidation_fee,
        LiquidationFeePolicy::CappedAtRemainingMargin => liquidation_fee.min(remaining.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn flat_policy_pays_full_fee() {
        let reward = liquidation_reward(Quote::new(dec!(20)), Quote::zero(), LiquidationFeePolicy::Flat);
        assert_eq!(reward.value(), dec!(20));
    }

    #[test]
    fn capped_policy_limits_to_remaining() {
        let policy = LiquidationFeePolicy::CappedAtRemainingMargin;
        assert_eq!(liquidation_reward(Quote::new(dec!(20)), Quote::new(dec!(-7)), policy).value(), dec!(7));
        assert_eq!(liquidation_reward(Quote::new(dec!(20)), Quote::new(dec!(35)), policy).value(), dec!(20));
        assert!(liquidation_reward(Quote::new(dec!(20)), Quote::zero(), policy).is_zero());
    }

    #[test]
    fn default_is_flat() {
        assert_eq!(LiquidationFeePolicy::default(), LiquidationFeePolicy::Flat);
    }
}
