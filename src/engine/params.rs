//! Owner-gated parameter setters.

use super::core::Engine;
use super::results::EngineError;
use crate::collateral::CollateralLedger;
use crate::events::{EventPayload, ParameterChange, ParameterUpdatedEvent};
use crate::funding::FundingParams;
use crate::liquidation::LiquidationFeePolicy;
use crate::oracle::PriceOracle;
use crate::types::{AccountId, Leverage, Quote};
use rust_decimal::Decimal;
use tracing::info;

impl<O: PriceOracle, C: CollateralLedger> Engine<O, C> {
    pub fn set_exchange_fee(&mut self, caller: AccountId, rate: Decimal) -> Result<(), EngineError> {
        self.update_parameter(caller, ParameterChange::ExchangeFee(rate))
    }

    pub fn set_max_leverage(&mut self, caller: AccountId, leverage: Leverage) -> Result<(), EngineError> {
        self.update_parameter(caller, ParameterChange::MaxLeverage(leverage))
    }

    pub fn set_max_market_debt(&mut self, caller: AccountId, debt: Quote) -> Result<(), EngineError> {
        self.update_parameter(caller, ParameterChange::MaxMarketDebt(debt))
    }

    pub fn set_min_initial_margin(&mut self, caller: AccountId, margin: Quote) -> Result<(), EngineError> {
        self.update_parameter(caller, ParameterChange::MinInitialMargin(margin))
    }

    pub fn set_liquidation_fee(&mut self, caller: AccountId, fee: Quote) -> Result<(), EngineError> {
        self.update_parameter(caller, ParameterChange::LiquidationFee(fee))
    }

    pub fn set_liquidation_fee_policy(
        &mut self,
        caller: AccountId,
        policy: LiquidationFeePolicy,
    ) -> Result<(), EngineError> {
        self.update_parameter(caller, ParameterChange::LiquidationFeePolicy(policy))
    }

    /// Funding accrued up to now is recorded under the old parameters first.
    pub fn set_funding_parameters(&mut self, caller: AccountId, funding: FundingParams) -> Result<(), EngineError> {
        self.update_parameter(caller, ParameterChange::FundingParameters(funding))
    }

    fn update_parameter(&mut self, caller: AccountId, change: ParameterChange) -> Result<(), EngineError> {
        self.require_owner(caller)?;

        self.transact("update_parameter", |engine, tx| {
            if matches!(change, ParameterChange::FundingParameters(_)) {
                engine.recompute_funding_in(tx)?;
            }

            change.apply(&mut engine.params);
            engine.params.validate()?;

            info!(caller = %caller, change = ?change, "parameter updated");

            tx.emit(EventPayload::ParameterUpdated(ParameterUpdatedEvent {
                changed_by: caller,
                change,
            }));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::collateral::InMemoryLedger;
    use crate::config::MarketParams;
    use crate::engine::{Collaborators, Engine, EngineConfig, EngineError};
    use crate::events::{EventPayload, ParameterChange};
    use crate::funding::FundingParams;
    use crate::oracle::ManualOracle;
    use crate::types::{AccountId, Leverage, Quote, RoundId};
    use rust_decimal_macros::dec;

    const OWNER: AccountId = AccountId(1);
    const MALLORY: AccountId = AccountId(66);

    fn setup_engine() -> Engine<ManualOracle, InMemoryLedger> {
        let collaborators = Collaborators {
            oracle: ManualOracle::new().with_round("ETH", dec!(100), RoundId(1)),
            collateral: InMemoryLedger::new(),
            fee_sink: AccountId(2),
        };
        Engine::new(EngineConfig::default(), MarketParams::default(), OWNER, collaborators).unwrap()
    }

    #[test]
    fn owner_updates_parameters() {
        let mut engine = setup_engine();

        engine.set_exchange_fee(OWNER, dec!(0.005)).unwrap();
        engine.set_max_leverage(OWNER, Leverage::new(dec!(3)).unwrap()).unwrap();
        engine.set_max_market_debt(OWNER, Quote::new(dec!(1000))).unwrap();
        engine.set_min_initial_margin(OWNER, Quote::new(dec!(50))).unwrap();
        engine.set_liquidation_fee(OWNER, Quote::new(dec!(10))).unwrap();

        let params = engine.params();
        assert_eq!(params.exchange_fee_rate, dec!(0.005));
        assert_eq!(params.max_leverage.value(), dec!(3));
        assert_eq!(params.max_market_debt.value(), dec!(1000));
        assert_eq!(params.min_initial_margin.value(), dec!(50));
        assert_eq!(params.liquidation_fee.value(), dec!(10));
        assert_eq!(engine.events().len(), 5);
    }

    #[test]
    fn non_owner_is_denied() {
        let mut engine = setup_engine();
        let result = engine.set_exchange_fee(MALLORY, dec!(0.5));
        assert_eq!(result, Err(EngineError::AccessDenied(MALLORY)));
        assert_eq!(engine.params().exchange_fee_rate, dec!(0.003));
    }

    #[test]
    fn invalid_value_is_rolled_back() {
        let mut engine = setup_engine();
        let result = engine.set_max_leverage(OWNER, Leverage::zero());
        assert!(matches!(result, Err(EngineError::Config(_))));
        assert_eq!(engine.params().max_leverage.value(), dec!(10));
        assert!(engine.events().is_empty());
    }

    #[test]
    fn funding_parameters_recompute_first() {
        let mut engine = setup_engine();
        let len = engine.state().funding().len();

        let funding = FundingParams {
            max_funding_rate: dec!(0.0001),
            max_funding_rate_skew: dec!(0.5),
            max_funding_rate_delta: dec!(0.00001),
        };
        engine.set_funding_parameters(OWNER, funding.clone()).unwrap();

        assert_eq!(engine.state().funding().len(), len + 1);
        assert_eq!(engine.params().funding, funding);

        let last = &engine.events().last().unwrap().payload;
        assert!(matches!(
            last,
            EventPayload::ParameterUpdated(update) if update.change == ParameterChange::FundingParameters(funding.clone())
        ));
    }
}
