// 4.0: open position tracking. pnl = size * (price - entry).
// margin and size share a sign: both positive for longs, both negative for shorts.

use crate::types::{FundingIndex, Price, Quote, Side, SignedSize};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub margin: Quote,
    pub size: SignedSize,
    pub entry_price: Price,
    pub entry_index: FundingIndex,
}

impl Position {
    pub fn new(margin: Quote, size: SignedSize, entry_price: Price, entry_index: FundingIndex) -> Self {
        Self {
            margin,
            size,
            entry_price,
            entry_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_zero()
    }

    pub fn side(&self) -> Option<Side> {
        self.size.side().or_else(|| self.margin.side())
    }

    // 4.1: signed exposure at a price
    pub fn notional_value(&self, price: Price) -> Quote {
        Quote::new(self.size.value() * price.value())
    }

    pub fn profit_loss(&self, price: Price) -> Quote {
        calculate_profit_loss(self.size, self.entry_price, price)
    }

    // 4.2: what this position adds to the debt accumulator: |margin| - size * entry.
    // summed over positions and added to price * skew it gives the margin the market owes.
    pub fn debt_contribution(&self) -> Decimal {
        self.margin.value().abs() - self.size.value() * self.entry_price.value()
    }
}

// 4.3: the pnl formula. size * (price - entry)
pub fn calculate_profit_loss(size: SignedSize, entry_price: Price, price: Price) -> Quote {
    Quote::new(size.value() * (price.value() - entry_price.value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long_position() -> Position {
        Position::new(
            Quote::new(dec!(1000)),
            SignedSize::new(dec!(50)),
            Price::new_unchecked(dec!(100)),
            FundingIndex(1),
        )
    }

    fn short_position() -> Position {
        Position::new(
            Quote::new(dec!(-1000)),
            SignedSize::new(dec!(-50)),
            Price::new_unchecked(dec!(100)),
            FundingIndex(1),
        )
    }

    #[test]
    fn long_profits_when_price_rises() {
        let pos = long_position();
        assert_eq!(pos.profit_loss(Price::new_unchecked(dec!(110))).value(), dec!(500));
        assert_eq!(pos.profit_loss(Price::new_unchecked(dec!(90))).value(), dec!(-500));
    }

    #[test]
    fn short_profits_when_price_falls() {
        let pos = short_position();
        assert_eq!(pos.profit_loss(Price::new_unchecked(dec!(90))).value(), dec!(500));
        assert_eq!(pos.profit_loss(Price::new_unchecked(dec!(110))).value(), dec!(-500));
    }

    #[test]
    fn notional_is_signed() {
        let price = Price::new_unchecked(dec!(120));
        assert_eq!(long_position().notional_value(price).value(), dec!(6000));
        assert_eq!(short_position().notional_value(price).value(), dec!(-6000));
    }

    #[test]
    fn debt_contribution_uses_margin_magnitude() {
        // 1000 - 50 * 100
        assert_eq!(long_position().debt_contribution(), dec!(-4000));
        // 1000 - (-50 * 100)
        assert_eq!(short_position().debt_contribution(), dec!(6000));
    }

    #[test]
    fn side_follows_size() {
        assert_eq!(long_position().side(), Some(Side::Long));
        assert_eq!(short_position().side(), Some(Side::Short));
    }
}
