//! Two-phase order protocol: submit, then confirm in a later oracle round or cancel.

use super::core::Engine;
use super::results::{CancelOutcome, ConfirmOutcome, ConfirmedOrder, EngineError, OrderReceipt, Realization};
use super::transaction::Transaction;
use crate::collateral::CollateralLedger;
use crate::events::{CancelReason, EventPayload, OrderCancelledEvent, OrderConfirmedEvent, OrderSubmittedEvent};
use crate::oracle::PriceOracle;
use crate::order::{calculate_order_fee, normalize_order, Order};
use crate::position::Position;
use crate::types::{div_fixed, AccountId, Leverage, Quote, SignedSize};
use tracing::{debug, info};

impl<O: PriceOracle, C: CollateralLedger> Engine<O, C> {
    /// Submit an order for confirmation in a later round. Replaces any pending order.
    /// A zero margin or zero leverage submits a close order.
    pub fn submit_order(
        &mut self,
        account: AccountId,
        margin: Quote,
        leverage: Leverage,
    ) -> Result<OrderReceipt, EngineError> {
        let max_leverage = self.params.max_leverage;
        if leverage > max_leverage {
            return Err(EngineError::MaxLeverageExceeded {
                requested: leverage,
                max: max_leverage,
            });
        }

        let is_close = margin.is_zero() || leverage.is_zero();
        let minimum = self.params.min_initial_margin;
        if !is_close && margin.abs() < minimum {
            return Err(EngineError::InsufficientMargin {
                margin: margin.abs(),
                minimum,
            });
        }

        self.transact("submit_order", |engine, tx| {
            let index = engine.recompute_funding_in(tx)?;
            if let Realization::Realized(remaining) = engine.realize_margin(tx, account, index)? {
                debug!(account = %account, %remaining, "position re-marked before new order");
            }
            engine.cancel_pending(tx, account, CancelReason::Replaced);

            let (margin, leverage) = normalize_order(margin, leverage);
            let price = tx.valid_price()?;
            let fee = calculate_order_fee(
                margin,
                leverage,
                engine.state.aggregates().market_skew,
                price,
                engine.params.exchange_fee_rate,
            )
            .ok_or(EngineError::Overflow("order fee"))?;
            margin
                .abs()
                .value()
                .checked_add(fee.value())
                .ok_or(EngineError::Overflow("order escrow"))?;

            let order = Order::new(margin, leverage, fee, tx.round_id(), tx.now);
            let escrow = order.escrow();

            let available = tx.available_balance(&engine.collateral, account);
            if escrow > available {
                return Err(EngineError::InsufficientBalance {
                    required: escrow,
                    available,
                });
            }
            tx.debit(account, escrow);
            engine.state.put_order(account, Some(order));

            if !escrow.is_zero() {
                let debt = engine
                    .state
                    .aggregates()
                    .checked_market_debt(price)
                    .ok_or(EngineError::Overflow("market debt"))?;
                let max = engine.params.max_market_debt;
                if debt > max {
                    return Err(EngineError::MaxMarketDebtExceeded { debt, max });
                }
            }

            info!(
                account = %account,
                %margin,
                %leverage,
                %fee,
                round = %tx.round_id(),
                "order submitted"
            );

            let receipt = OrderReceipt {
                account_id: account,
                margin,
                leverage,
                fee,
                escrow,
                round_id: tx.round_id(),
            };

            tx.emit(EventPayload::OrderSubmitted(OrderSubmittedEvent {
                account_id: account,
                margin,
                leverage,
                fee,
                escrow,
                round_id: receipt.round_id,
            }));

            Ok(receipt)
        })
    }

    /// Cancel the pending order and release its escrow.
    pub fn cancel_order(&mut self, account: AccountId) -> Result<CancelOutcome, EngineError> {
        self.transact("cancel_order", |engine, tx| {
            if engine.state.order(account).is_none() {
                return Err(EngineError::NoPendingOrder(account));
            }

            let index = engine.recompute_funding_in(tx)?;
            if let Realization::Liquidated(result) = engine.realize_margin(tx, account, index)? {
                return Ok(CancelOutcome::Liquidated(result));
            }

            let refunded = engine
                .cancel_pending(tx, account, CancelReason::UserRequested)
                .unwrap_or_else(Quote::zero);

            info!(account = %account, %refunded, "order cancelled");
            Ok(CancelOutcome::Cancelled { refunded })
        })
    }

    /// Turn the pending order into the account's position at the current price.
    /// Only possible once the oracle has moved past the submission round.
    pub fn confirm_order(&mut self, account: AccountId) -> Result<ConfirmOutcome, EngineError> {
        self.transact("confirm_order", |engine, tx| {
            let index = engine.recompute_funding_in(tx)?;
            if let Realization::Liquidated(result) = engine.realize_margin(tx, account, index)? {
                return Ok(ConfirmOutcome::Liquidated(result));
            }

            let order = engine
                .state
                .order(account)
                .cloned()
                .ok_or(EngineError::NoPendingOrder(account))?;

            let price = tx.valid_price()?;
            let current = tx.round_id();
            if !order.is_confirmable(current) {
                return Err(EngineError::AwaitingNextPriceRound {
                    submitted: order.round_id,
                    current,
                });
            }
            if order.is_expired(current, engine.params.max_order_age_rounds) {
                return Err(EngineError::OrderExpired {
                    submitted: order.round_id,
                    current,
                });
            }
            if price.is_zero() {
                return Err(EngineError::ZeroEntryPrice);
            }

            let size = if order.is_close() {
                SignedSize::zero()
            } else {
                SignedSize::new(div_fixed(order.chargeable_value().value(), price.value()))
            };

            engine.state.put_order(account, None);
            let prior = engine
                .state
                .put_position(account, Some(Position::new(order.margin, size, price, index)));

            // the realized prior margin goes back to the account
            let released_margin = prior.map(|p| p.margin.abs()).unwrap_or_else(Quote::zero);
            tx.credit(account, released_margin);
            // nothing opened, so the escrowed margin is not held either
            if size.is_zero() {
                tx.credit(account, order.margin.abs());
            }
            tx.credit(engine.fee_sink, order.fee);

            info!(
                account = %account,
                %size,
                %price,
                fee = %order.fee,
                round = %current,
                "order confirmed"
            );

            tx.emit(EventPayload::OrderConfirmed(OrderConfirmedEvent {
                account_id: account,
                margin: order.margin,
                size,
                entry_price: price,
                fee: order.fee,
                submitted_round: order.round_id,
                confirmed_round: current,
                funding_index: index,
                released_margin,
            }));

            Ok(ConfirmOutcome::Confirmed(ConfirmedOrder {
                account_id: account,
                size,
                entry_price: price,
                margin: order.margin,
                fee: order.fee,
                funding_index: index,
                released_margin,
            }))
        })
    }

    // removes the pending order, if any, and refunds its escrow in full
    pub(super) fn cancel_pending(
        &mut self,
        tx: &mut Transaction,
        account: AccountId,
        reason: CancelReason,
    ) -> Option<Quote> {
        let order = self.state.put_order(account, None)?;
        let refunded = order.escrow();
        tx.credit(account, refunded);

        tx.emit(EventPayload::OrderCancelled(OrderCancelledEvent {
            account_id: account,
            margin: order.margin,
            fee: order.fee,
            refunded,
            round_id: order.round_id,
            reason,
        }));

        Some(refunded)
    }
}
