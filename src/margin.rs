// 3.0: margin ledger. remaining margin = margin + pnl + accrued funding, with the
// margin's sign carrying direction. once the gains eat through the margin the
// position is wiped out and reports zero, which is what flags it for liquidation.

use crate::funding::FundingSequence;
use crate::position::Position;
use crate::types::{div_fixed, mul_fixed, FundingIndex, Price, Quote, Side};
use rust_decimal::Decimal;

// 3.1: size * net funding per unit since entry. a position at index 0 never entered.
pub fn accrued_funding(
    position: &Position,
    sequence: &FundingSequence,
    index_now: FundingIndex,
    live_unrecorded: Decimal,
) -> Quote {
    if position.entry_index.is_origin() {
        return Quote::zero();
    }

    debug_assert!(position.entry_index.0 < sequence.len(), "entry index outside funding sequence");
    let net = sequence
        .net_per_unit(position.entry_index, index_now, live_unrecorded)
        .unwrap_or_default();

    Quote::new(mul_fixed(position.size.value(), net))
}

// 3.2: gains (pnl + funding) grow the margin magnitude for either side.
// a result on the other side of zero from the margin is a wipeout.
pub fn remaining_margin(position: &Position, price: Price, funding: Quote) -> Quote {
    let Some(side) = position.margin.side() else {
        return Quote::zero();
    };

    let gain = position.profit_loss(price).add(funding);
    let remaining = match side {
        Side::Long => position.margin.add(gain),
        Side::Short => position.margin.sub(gain),
    };

    if remaining.side() == Some(side) {
        remaining
    } else {
        Quote::zero()
    }
}

// 3.3: price at which |remaining margin| == liquidation fee. solved from 3.2:
//   long:  entry + (fee - |margin| - funding) / |size|
//   short: entry - (fee - |margin| - funding) / |size|
// floored at zero, zero for a flat position
pub fn liquidation_price(position: &Position, liquidation_fee: Quote, funding: Quote) -> Price {
    let Some(side) = position.size.side() else {
        return Price::zero();
    };

    let cushion = position.margin.abs().add(funding);
    let buffer = div_fixed(liquidation_fee.sub(cushion).value(), position.size.abs());

    let price = match side {
        Side::Long => position.entry_price.value() + buffer,
        Side::Short => position.entry_price.value() - buffer,
    };

    Price::new_unchecked(price.max(Decimal::ZERO))
}

// 3.4: never on an empty position or an invalid price
pub fn can_liquidate(
    position: &Position,
    remaining: Quote,
    liquidation_fee: Quote,
    price_invalid: bool,
) -> bool {
    if position.is_empty() || price_invalid {
        return false;
    }
    remaining.abs() <= liquidation_fee
}
