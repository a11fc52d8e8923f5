//! Margin realization.
//!
//! Before an operation changes anything for an account, the account's position is
//! marked to the current price and funding index: remaining margin becomes the new
//! margin, the current price the new entry price. A position that turns out to be
//! liquidatable is liquidated on the spot, with the account as its own liquidator.

use super::core::Engine;
use super::results::{EngineError, Realization};
use super::transaction::Transaction;
use crate::collateral::CollateralLedger;
use crate::margin::{accrued_funding, can_liquidate, remaining_margin};
use crate::oracle::PriceOracle;
use crate::position::Position;
use crate::types::{AccountId, FundingIndex, Price, Quote};
use rust_decimal::Decimal;
use tracing::debug;

/// Funding and remaining margin of a position at a recorded funding index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PositionHealth {
    pub funding: Quote,
    pub remaining: Quote,
}

impl<O: PriceOracle, C: CollateralLedger> Engine<O, C> {
    pub(super) fn position_health(&self, position: &Position, price: Price, index: FundingIndex) -> PositionHealth {
        let funding = accrued_funding(position, self.state.funding(), index, Decimal::ZERO);
        let remaining = remaining_margin(position, price, funding);
        PositionHealth { funding, remaining }
    }

    // `index` must come from the recompute that opened this operation
    pub(super) fn realize_margin(
        &mut self,
        tx: &mut Transaction,
        account: AccountId,
        index: FundingIndex,
    ) -> Result<Realization, EngineError> {
        let Some(position) = self.state.position(account).cloned() else {
            return Ok(Realization::NoPosition);
        };

        let price = tx.valid_price()?;
        let health = self.position_health(&position, price, index);

        if can_liquidate(&position, health.remaining, self.params.liquidation_fee, false) {
            let result = self.liquidate_inner(tx, account, account, index)?;
            return Ok(Realization::Liquidated(result));
        }

        debug!(
            account = %account,
            margin = %position.margin,
            remaining = %health.remaining,
            "margin realized"
        );

        let realized = Position::new(health.remaining, position.size, price, index);
        self.state.put_position(account, Some(realized));
        Ok(Realization::Realized(health.remaining))
    }
}

#[cfg(test)]
mod tests {
    use crate::collateral::{CollateralLedger, InMemoryLedger};
    use crate::config::MarketParams;
    use crate::engine::{Collaborators, ConfirmOutcome, Engine, EngineConfig};
    use crate::oracle::ManualOracle;
    use crate::types::{AccountId, Leverage, Quote, RoundId};
    use rust_decimal_macros::dec;

    const ALICE: AccountId = AccountId(10);

    fn setup_engine() -> Engine<ManualOracle, InMemoryLedger> {
        let mut params = MarketParams::default();
        params.exchange_fee_rate = dec!(0);

        let mut collateral = InMemoryLedger::new();
        collateral.deposit(ALICE, Quote::new(dec!(10000)));

        let collaborators = Collaborators {
            oracle: ManualOracle::new().with_round("ETH", dec!(100), RoundId(1)),
            collateral,
            fee_sink: AccountId(2),
        };
        Engine::new(EngineConfig::default(), params, AccountId(1), collaborators).unwrap()
    }

    fn open_long(engine: &mut Engine<ManualOracle, InMemoryLedger>, margin: rust_decimal::Decimal) {
        engine
            .submit_order(ALICE, Quote::new(margin), Leverage::new(dec!(5)).unwrap())
            .unwrap();
        engine.oracle_mut().push_price("ETH", dec!(100));
        assert!(matches!(engine.confirm_order(ALICE).unwrap(), ConfirmOutcome::Confirmed(_)));
    }

    #[test]
    fn realization_marks_position_to_price() {
        let mut engine = setup_engine();
        open_long(&mut engine, dec!(1000));

        // size 50 at 100; at 110 the long is up 500
        engine.oracle_mut().push_price("ETH", dec!(110));
        engine
            .submit_order(ALICE, Quote::new(dec!(200)), Leverage::new(dec!(1)).unwrap())
            .unwrap();

        let position = engine.position(ALICE).unwrap();
        assert_eq!(position.margin.value(), dec!(1500));
        assert_eq!(position.entry_price.value(), dec!(110));
        assert_eq!(position.size.value(), dec!(50));
        assert!(engine.market_audit().matches(engine.state().aggregates()));
    }

    #[test]
    fn realization_liquidates_underwater_position() {
        let mut engine = setup_engine();
        open_long(&mut engine, dec!(1000));
        let balance = engine.collateral().balance_of(ALICE);

        // size 50: at 80.3 remaining margin is 1000 - 985 = 15, under the fee of 20
        engine.oracle_mut().push_price("ETH", dec!(80.3));
        engine
            .submit_order(ALICE, Quote::new(dec!(200)), Leverage::new(dec!(1)).unwrap())
            .unwrap();

        assert!(engine.position(ALICE).is_none());
        // self-liquidation pays the flat fee back to the account, then escrows the new order
        assert_eq!(
            engine.collateral().balance_of(ALICE).value(),
            balance.value() + dec!(20) - dec!(200)
        );
        assert_eq!(engine.state().aggregates().market_size, dec!(0));
    }
}
