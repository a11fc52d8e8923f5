// 7.0 config.rs: owner-configured market parameters in one place. fees, leverage cap,
// debt cap, minimum margin, liquidation fee, funding.
// 7.1 has the environment presets and validation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::funding::FundingParams;
use crate::liquidation::LiquidationFeePolicy;
use crate::types::{Leverage, Quote};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    // asset key the oracle is queried with
    pub base_asset: String,
    // fraction of chargeable notional, e.g. 0.003 = 30 bps
    pub exchange_fee_rate: Decimal,
    pub max_leverage: Leverage,
    // cap on what the market may owe across positions and pending orders
    pub max_market_debt: Quote,
    // minimum |margin| for an order that opens exposure
    pub min_initial_margin: Quote,
    // flat reward for liquidating, also the liquidation threshold
    pub liquidation_fee: Quote,
    pub liquidation_fee_policy: LiquidationFeePolicy,
    // None = pending orders stay confirmable forever
    pub max_order_age_rounds: Option<u64>,
    pub funding: FundingParams,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            base_asset: "ETH".to_string(),
            exchange_fee_rate: dec!(0.003),
            max_leverage: Leverage::new(dec!(10)).unwrap_or_else(Leverage::zero),
            max_market_debt: Quote::new(dec!(10_000_000)),
            min_initial_margin: Quote::new(dec!(100)),
            liquidation_fee: Quote::new(dec!(20)),
            liquidation_fee_policy: LiquidationFeePolicy::Flat,
            max_order_age_rounds: None,
            funding: FundingParams::default(),
        }
    }
}

impl MarketParams {
    // looser limits for test deployments
    pub fn testnet() -> Self {
        Self {
            exchange_fee_rate: dec!(0.001),
            max_leverage: Leverage::new(dec!(20)).unwrap_or_else(Leverage::zero),
            min_initial_margin: Quote::new(dec!(10)),
            liquidation_fee: Quote::new(dec!(5)),
            ..Self::default()
        }
    }

    // conservative production settings: tighter leverage, capped rewards, bounded order age
    pub fn mainnet_conservative() -> Self {
        Self {
            max_leverage: Leverage::new(dec!(5)).unwrap_or_else(Leverage::zero),
            max_market_debt: Quote::new(dec!(2_000_000)),
            min_initial_margin: Quote::new(dec!(250)),
            liquidation_fee: Quote::new(dec!(40)),
            liquidation_fee_policy: LiquidationFeePolicy::CappedAtRemainingMargin,
            max_order_age_rounds: Some(10),
            ..Self::default()
        }
    }

    // 7.1: internal consistency checks. run at construction and after every setter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_asset.trim().is_empty() {
            return Err(ConfigError::InvalidMarket {
                reason: "base asset must be named".to_string(),
            });
        }

        if self.exchange_fee_rate < Decimal::ZERO || self.exchange_fee_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidFees {
                reason: "exchange fee rate must be in [0, 1)".to_string(),
            });
        }

        if self.liquidation_fee.is_negative() {
            return Err(ConfigError::InvalidFees {
                reason: "liquidation fee must not be negative".to_string(),
            });
        }

        if self.max_leverage.is_zero() {
            return Err(ConfigError::InvalidLeverage {
                reason: "max leverage must be positive".to_string(),
            });
        }

        if self.max_market_debt.is_negative() || self.min_initial_margin.is_negative() {
            return Err(ConfigError::InvalidMargin {
                reason: "debt cap and minimum margin must not be negative".to_string(),
            });
        }

        let funding = &self.funding;
        if funding.max_funding_rate < Decimal::ZERO
            || funding.max_funding_rate_skew < Decimal::ZERO
            || funding.max_funding_rate_delta < Decimal::ZERO
        {
            return Err(ConfigError::InvalidFunding {
                reason: "funding parameters must not be negative".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid market config: {reason}")]
    InvalidMarket { reason: String },

    #[error("Invalid fee config: {reason}")]
    InvalidFees { reason: String },

    #[error("Invalid leverage config: {reason}")]
    InvalidLeverage { reason: String },

    #[error("Invalid margin config: {reason}")]
    InvalidMargin { reason: String },

    #[error("Invalid funding config: {reason}")]
    InvalidFunding { reason: String },
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn params(&self) -> MarketParams {
        match self {
            Environment::Development => MarketParams::default(),
            Environment::Testnet => MarketParams::testnet(),
            Environment::Mainnet => MarketParams::mainnet_conservative(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(MarketParams::default().validate().is_ok());
    }

    #[test]
    fn test_environment_presets() {
        assert!(Environment::Development.params().validate().is_ok());
        assert!(Environment::Testnet.params().validate().is_ok());
        assert!(Environment::Mainnet.params().validate().is_ok());

        assert_eq!(Environment::Testnet.params().max_leverage.value(), dec!(20));
        assert_eq!(Environment::Mainnet.params().max_order_age_rounds, Some(10));
    }

    #[test]
    fn test_invalid_fee_rate() {
        let mut params = MarketParams::default();
        params.exchange_fee_rate = dec!(1.5);
        assert!(matches!(params.validate(), Err(ConfigError::InvalidFees { .. })));
    }

    #[test]
    fn test_zero_max_leverage_rejected() {
        let mut params = MarketParams::default();
        params.max_leverage = Leverage::zero();
        assert!(matches!(params.validate(), Err(ConfigError::InvalidLeverage { .. })));
    }

    #[test]
    fn test_negative_funding_rejected() {
        let mut params = MarketParams::default();
        params.funding.max_funding_rate = dec!(-0.1);
        assert!(matches!(params.validate(), Err(ConfigError::InvalidFunding { .. })));
    }

    #[test]
    fn test_params_serialization() {
        let params = MarketParams::mainnet_conservative();
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("capped_at_remaining_margin"));

        let back: MarketParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_environment_serialization() {
        let env: Environment = serde_json::from_str("\"testnet\"").unwrap();
        assert_eq!(env, Environment::Testnet);
    }
}
