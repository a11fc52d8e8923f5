// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, prices, sizes, margins, leverage, rounds, funding indices, timestamps.
// each is a newtype so the compiler catches type mixups.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

// quantities follow an 18 digit fixed point contract. products are exact in Decimal,
// quotients get truncated toward zero at this scale.
pub const FIXED_POINT_DP: u32 = 18;

/// Divide and truncate to the fixed point scale. caller guarantees a non-zero denominator.
pub fn div_fixed(numerator: Decimal, denominator: Decimal) -> Decimal {
    debug_assert!(!denominator.is_zero());
    (numerator / denominator).round_dp_with_strategy(FIXED_POINT_DP, RoundingStrategy::ToZero)
}

/// Multiply and truncate to the fixed point scale.
pub fn mul_fixed(a: Decimal, b: Decimal) -> Decimal {
    (a * b).round_dp_with_strategy(FIXED_POINT_DP, RoundingStrategy::ToZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    // zero has no side
    pub fn of(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Side::Long)
        } else if value < Decimal::ZERO {
            Some(Side::Short)
        } else {
            None
        }
    }
}

// 1.1: signed size: positive = long, negative = short. core to all position math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedSize(Decimal);

impl SignedSize {
    pub fn new(size: Decimal) -> Self {
        Self(size)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn abs(&self) -> Decimal {
        self.0.abs()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn side(&self) -> Option<Side> {
        Side::of(self.0)
    }
}

impl fmt::Display for SignedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.2: price in quote currency per unit of base. unsigned: zero is representable
// (the oracle may report it) but never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value >= Decimal::ZERO);
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: quote currency amount. margin, pnl, fees, debt all use this.
// margins are signed: the sign carries the position direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote(Decimal);

impl Quote {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn side(&self) -> Option<Side> {
        Side::of(self.0)
    }

    pub fn add(&self, other: Quote) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Quote) -> Self {
        Self(self.0 - other.0)
    }

    pub fn mul(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }

    pub fn negate(&self) -> Self {
        Self(-self.0)
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Quote {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quote {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Sum for Quote {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, q| acc.add(q))
    }
}

impl<'a> Sum<&'a Quote> for Quote {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, q| acc.add(*q))
    }
}

// 1.4: leverage multiplier. unsigned. zero leverage marks a close order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Leverage(Decimal);

impl Leverage {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

// 1.5: oracle round identifier. strictly increasing per price update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundId(pub u64);

impl RoundId {
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

// 1.6: index into the cumulative funding sequence. 0 means "never entered".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FundingIndex(pub usize);

impl FundingIndex {
    pub fn is_origin(&self) -> bool {
        self.0 == 0
    }
}

// 1.7: millisecond timestamp on the engine clock. displays as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn from_secs(secs: i64) -> Self {
        Self(secs * 1000)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    // clamped at zero: a clock moved backwards accrues nothing
    pub fn elapsed_seconds(&self, later: &Timestamp) -> Decimal {
        let diff_ms = (later.0 - self.0).max(0);
        Decimal::new(diff_ms, 3)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match chrono::DateTime::from_timestamp_millis(self.0) {
            Some(at) => write!(f, "{}", at.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn signed_size_side() {
        assert_eq!(SignedSize::new(dec!(10)).side(), Some(Side::Long));

        let short = SignedSize::new(dec!(-10));
        assert_eq!(short.abs(), dec!(10));
        assert_eq!(short.side(), Some(Side::Short));
        assert_eq!(SignedSize::zero().side(), None);
    }

    #[test]
    fn price_rejects_negative_only() {
        assert!(Price::new(dec!(-1)).is_none());
        assert!(Price::new(dec!(0)).unwrap().is_zero());
        assert_eq!(Price::new(dec!(110)).unwrap().value(), dec!(110));
    }

    #[test]
    fn leverage_allows_zero_for_close_orders() {
        assert!(Leverage::new(dec!(0)).unwrap().is_zero());
        assert!(Leverage::new(dec!(-2)).is_none());
        assert_eq!(Leverage::new(dec!(5)).unwrap().to_string(), "5x");
    }

    #[test]
    fn div_fixed_truncates_at_eighteen_digits() {
        let size = div_fixed(dec!(5000), dec!(110));
        assert_eq!(size, dec!(45.454545454545454545));
        let negative = div_fixed(dec!(-5000), dec!(110));
        assert_eq!(negative, dec!(-45.454545454545454545));
    }

    #[test]
    fn mul_fixed_truncates_products() {
        let rate = dec!(0.000001157407407407);
        assert_eq!(mul_fixed(rate, dec!(0.333333333333333333)), dec!(0.000000385802469135));
        assert_eq!(mul_fixed(dec!(1.5), dec!(2)), dec!(3));
    }

    #[test]
    fn elapsed_seconds_from_millis() {
        let t0 = Timestamp::from_secs(10);
        let t1 = Timestamp::from_millis(12_500);
        assert_eq!(t0.elapsed_seconds(&t1), dec!(2.5));
        assert_eq!(t1.elapsed_seconds(&t0), Decimal::ZERO);
    }

    #[test]
    fn timestamp_displays_as_utc() {
        assert_eq!(Timestamp::from_millis(1_500).to_string(), "1970-01-01T00:00:01.500Z");
        assert_eq!(Timestamp::from_secs(86_400).to_string(), "1970-01-02T00:00:00.000Z");
    }

    #[test]
    fn quote_side_follows_sign() {
        assert_eq!(Quote::new(dec!(-3)).side(), Some(Side::Short));
        assert_eq!(Quote::new(dec!(3)).abs().value(), dec!(3));
        assert_eq!(Quote::zero().side(), None);
    }
}
