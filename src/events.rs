// 11.0: every state change produces an event. used for audit trails, state reconstruction,
// and notifying off-chain consumers. each payload carries enough to replay its delta.

use crate::config::MarketParams;
use crate::funding::FundingParams;
use crate::liquidation::LiquidationFeePolicy;
use crate::types::{AccountId, FundingIndex, Leverage, Price, Quote, RoundId, SignedSize, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Parameter events
    ParameterUpdated(ParameterUpdatedEvent),

    // Funding events
    FundingRecomputed(FundingRecomputedEvent),

    // Order events
    OrderSubmitted(OrderSubmittedEvent),
    OrderConfirmed(OrderConfirmedEvent),
    OrderCancelled(OrderCancelledEvent),

    // Risk events
    PositionLiquidated(PositionLiquidatedEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterChange {
    ExchangeFee(Decimal),
    MaxLeverage(Leverage),
    MaxMarketDebt(Quote),
    MinInitialMargin(Quote),
    LiquidationFee(Quote),
    LiquidationFeePolicy(LiquidationFeePolicy),
    FundingParameters(FundingParams),
}

impl ParameterChange {
    pub(crate) fn apply(&self, params: &mut MarketParams) {
        match self {
            ParameterChange::ExchangeFee(rate) => params.exchange_fee_rate = *rate,
            ParameterChange::MaxLeverage(leverage) => params.max_leverage = *leverage,
            ParameterChange::MaxMarketDebt(debt) => params.max_market_debt = *debt,
            ParameterChange::MinInitialMargin(margin) => params.min_initial_margin = *margin,
            ParameterChange::LiquidationFee(fee) => params.liquidation_fee = *fee,
            ParameterChange::LiquidationFeePolicy(policy) => params.liquidation_fee_policy = *policy,
            ParameterChange::FundingParameters(funding) => params.funding = funding.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterUpdatedEvent {
    pub changed_by: AccountId,
    pub change: ParameterChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRecomputedEvent {
    pub index: FundingIndex,
    pub cumulative_funding: Decimal,
    pub funding_rate: Decimal,
    pub price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSubmittedEvent {
    pub account_id: AccountId,
    pub margin: Quote,
    pub leverage: Leverage,
    pub fee: Quote,
    pub escrow: Quote,
    pub round_id: RoundId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmedEvent {
    pub account_id: AccountId,
    pub margin: Quote,
    pub size: SignedSize,
    pub entry_price: Price,
    pub fee: Quote,
    pub submitted_round: RoundId,
    pub confirmed_round: RoundId,
    pub funding_index: FundingIndex,
    // prior position margin handed back to the account
    pub released_margin: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub account_id: AccountId,
    pub margin: Quote,
    pub fee: Quote,
    pub refunded: Quote,
    pub round_id: RoundId,
    pub reason: CancelReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    UserRequested,
    Replaced,
    Liquidation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLiquidatedEvent {
    pub account_id: AccountId,
    pub liquidator: AccountId,
    pub size: SignedSize,
    pub margin: Quote,
    pub price: Price,
    pub liquidation_price: Price,
    pub remaining_margin: Quote,
    pub reward: Quote,
    pub funding_index: FundingIndex,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parameter_change_applies() {
        let mut params = MarketParams::default();

        ParameterChange::ExchangeFee(dec!(0.005)).apply(&mut params);
        ParameterChange::LiquidationFee(Quote::new(dec!(35))).apply(&mut params);
        ParameterChange::LiquidationFeePolicy(LiquidationFeePolicy::CappedAtRemainingMargin).apply(&mut params);

        assert_eq!(params.exchange_fee_rate, dec!(0.005));
        assert_eq!(params.liquidation_fee.value(), dec!(35));
        assert_eq!(params.liquidation_fee_policy, LiquidationFeePolicy::CappedAtRemainingMargin);
    }

    #[test]
    fn liquidation_event_serializes() {
        let event = Event::new(
            EventId(7),
            Timestamp::from_secs(60),
            EventPayload::PositionLiquidated(PositionLiquidatedEvent {
                account_id: AccountId(1),
                liquidator: AccountId(9),
                size: SignedSize::new(dec!(50)),
                margin: Quote::new(dec!(1000)),
                price: Price::new_unchecked(dec!(80)),
                liquidation_price: Price::new_unchecked(dec!(80.4)),
                remaining_margin: Quote::zero(),
                reward: Quote::new(dec!(20)),
                funding_index: FundingIndex(3),
            }),
        );

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, EventId(7));
        match back.payload {
            EventPayload::PositionLiquidated(liq) => {
                assert_eq!(liq.liquidator, AccountId(9));
                assert_eq!(liq.reward.value(), dec!(20));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
