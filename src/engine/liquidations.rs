//! Liquidation execution.

use super::core::Engine;
use super::results::{EngineError, LiquidationResult};
use super::transaction::Transaction;
use crate::collateral::CollateralLedger;
use crate::events::{CancelReason, EventPayload, PositionLiquidatedEvent};
use crate::liquidation::liquidation_reward;
use crate::margin::{can_liquidate, liquidation_price};
use crate::oracle::PriceOracle;
use crate::types::{AccountId, FundingIndex};
use tracing::warn;

impl<O: PriceOracle, C: CollateralLedger> Engine<O, C> {
    /// Liquidate `account`'s position and pay the reward to `liquidator`.
    pub fn liquidate_position(
        &mut self,
        account: AccountId,
        liquidator: AccountId,
    ) -> Result<LiquidationResult, EngineError> {
        self.transact("liquidate_position", |engine, tx| {
            let index = engine.recompute_funding_in(tx)?;

            let position = engine
                .state
                .position(account)
                .cloned()
                .ok_or(EngineError::PositionCannotBeLiquidated(account))?;

            let health = engine.position_health(&position, tx.price(), index);
            let liquidation_fee = engine.params.liquidation_fee;
            if !can_liquidate(&position, health.remaining, liquidation_fee, tx.snapshot.invalid) {
                return Err(EngineError::PositionCannotBeLiquidated(account));
            }

            engine.liquidate_inner(tx, account, liquidator, index)
        })
    }

    // shared by the explicit entry point and realization. caller already checked eligibility.
    pub(super) fn liquidate_inner(
        &mut self,
        tx: &mut Transaction,
        account: AccountId,
        liquidator: AccountId,
        index: FundingIndex,
    ) -> Result<LiquidationResult, EngineError> {
        let price = tx.valid_price()?;
        let position = self
            .state
            .position(account)
            .cloned()
            .ok_or(EngineError::PositionCannotBeLiquidated(account))?;

        let health = self.position_health(&position, price, index);

        // pending order goes first, its escrow is refunded in full
        self.cancel_pending(tx, account, CancelReason::Liquidation);

        let liquidation_price = liquidation_price(&position, self.params.liquidation_fee, health.funding);

        self.state.put_position(account, None);

        let reward = liquidation_reward(
            self.params.liquidation_fee,
            health.remaining,
            self.params.liquidation_fee_policy,
        );
        tx.credit(liquidator, reward);

        warn!(
            account = %account,
            liquidator = %liquidator,
            size = %position.size,
            %price,
            %liquidation_price,
            %reward,
            "position liquidated"
        );

        tx.emit(EventPayload::PositionLiquidated(PositionLiquidatedEvent {
            account_id: account,
            liquidator,
            size: position.size,
            margin: position.margin,
            price,
            liquidation_price,
            remaining_margin: health.remaining,
            reward,
            funding_index: index,
        }));

        Ok(LiquidationResult {
            account_id: account,
            liquidator,
            size: position.size,
            margin: position.margin,
            price,
            liquidation_price,
            remaining_margin: health.remaining,
            reward,
            funding_index: index,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::collateral::{CollateralLedger, InMemoryLedger};
    use crate::config::MarketParams;
    use crate::engine::{Collaborators, Engine, EngineConfig, EngineError};
    use crate::events::{CancelReason, EventPayload};
    use crate::liquidation::LiquidationFeePolicy;
    use crate::oracle::ManualOracle;
    use crate::types::{AccountId, Leverage, Quote, RoundId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const ALICE: AccountId = AccountId(10);
    const KEEPER: AccountId = AccountId(20);

    fn setup_engine(policy: LiquidationFeePolicy) -> Engine<ManualOracle, InMemoryLedger> {
        let mut params = MarketParams::default();
        params.exchange_fee_rate = dec!(0);
        params.liquidation_fee_policy = policy;

        let mut collateral = InMemoryLedger::new();
        collateral.deposit(ALICE, Quote::new(dec!(10000)));

        let collaborators = Collaborators {
            oracle: ManualOracle::new().with_round("ETH", dec!(100), RoundId(1)),
            collateral,
            fee_sink: AccountId(2),
        };
        Engine::new(EngineConfig::default(), params, AccountId(1), collaborators).unwrap()
    }

    // long 50 @ 100 with 1000 margin
    fn open_long(engine: &mut Engine<ManualOracle, InMemoryLedger>) {
        engine
            .submit_order(ALICE, Quote::new(dec!(1000)), Leverage::new(dec!(5)).unwrap())
            .unwrap();
        engine.oracle_mut().push_price("ETH", dec!(100));
        engine.confirm_order(ALICE).unwrap();
    }

    #[test]
    fn healthy_position_cannot_be_liquidated() {
        let mut engine = setup_engine(LiquidationFeePolicy::Flat);
        open_long(&mut engine);

        engine.oracle_mut().push_price("ETH", dec!(95));
        let result = engine.liquidate_position(ALICE, KEEPER);
        assert_eq!(result, Err(EngineError::PositionCannotBeLiquidated(ALICE)));
        assert!(engine.position(ALICE).is_some());
    }

    #[test]
    fn empty_position_cannot_be_liquidated() {
        let mut engine = setup_engine(LiquidationFeePolicy::Flat);
        let result = engine.liquidate_position(ALICE, KEEPER);
        assert_eq!(result, Err(EngineError::PositionCannotBeLiquidated(ALICE)));
    }

    #[test]
    fn liquidation_removes_position_and_pays_keeper() {
        let mut engine = setup_engine(LiquidationFeePolicy::Flat);
        open_long(&mut engine);

        // liquidation price is 80.4
        engine.oracle_mut().push_price("ETH", dec!(80));
        assert!(engine.can_liquidate(ALICE));

        let result = engine.liquidate_position(ALICE, KEEPER).unwrap();
        assert_eq!(result.size.value(), dec!(50));
        assert_eq!(result.liquidation_price.value(), dec!(80.4));
        assert_eq!(result.remaining_margin, Quote::zero());
        assert_eq!(result.reward.value(), dec!(20));

        assert!(engine.position(ALICE).is_none());
        assert_eq!(engine.state().aggregates().market_size, Decimal::ZERO);
        assert_eq!(engine.state().aggregates().market_skew, Decimal::ZERO);
        assert_eq!(engine.collateral().balance_of(KEEPER).value(), dec!(20));
    }

    #[test]
    fn liquidation_refunds_pending_order() {
        let mut engine = setup_engine(LiquidationFeePolicy::Flat);
        open_long(&mut engine);

        // a second order sits pending while the price collapses
        engine
            .submit_order(ALICE, Quote::new(dec!(500)), Leverage::new(dec!(1)).unwrap())
            .unwrap();
        let balance = engine.collateral().balance_of(ALICE);

        engine.oracle_mut().push_price("ETH", dec!(80));
        engine.liquidate_position(ALICE, KEEPER).unwrap();

        assert!(engine.order(ALICE).is_none());
        assert_eq!(engine.collateral().balance_of(ALICE).value(), balance.value() + dec!(500));
        assert_eq!(engine.state().aggregates().pending_order_value, Decimal::ZERO);

        let cancelled = engine.events().iter().any(|event| {
            matches!(
                &event.payload,
                EventPayload::OrderCancelled(cancel) if cancel.reason == CancelReason::Liquidation
            )
        });
        assert!(cancelled);
    }

    #[test]
    fn capped_policy_pays_at_most_remaining() {
        let mut engine = setup_engine(LiquidationFeePolicy::CappedAtRemainingMargin);
        open_long(&mut engine);

        // at 80.3 remaining margin is 15
        engine.oracle_mut().push_price("ETH", dec!(80.3));
        let result = engine.liquidate_position(ALICE, KEEPER).unwrap();
        assert_eq!(result.remaining_margin.value(), dec!(15));
        assert_eq!(result.reward.value(), dec!(15));
    }

    #[test]
    fn invalid_price_blocks_liquidation() {
        let mut engine = setup_engine(LiquidationFeePolicy::Flat);
        open_long(&mut engine);

        engine.oracle_mut().push_price("ETH", dec!(50));
        engine.oracle_mut().set_invalid("ETH", true);
        assert!(!engine.can_liquidate(ALICE));
        assert_eq!(engine.liquidate_position(ALICE, KEEPER), Err(EngineError::InvalidPrice));
    }
}
