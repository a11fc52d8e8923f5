// 8.0.2: result types and errors for engine operations.

use crate::collateral::CollateralError;
use crate::config::ConfigError;
use crate::types::{AccountId, FundingIndex, Leverage, Price, Quote, RoundId, SignedSize};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub account_id: AccountId,
    pub margin: Quote,
    pub leverage: Leverage,
    pub fee: Quote,
    pub escrow: Quote,
    pub round_id: RoundId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedOrder {
    pub account_id: AccountId,
    pub size: SignedSize,
    pub entry_price: Price,
    pub margin: Quote,
    pub fee: Quote,
    pub funding_index: FundingIndex,
    pub released_margin: Quote,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidationResult {
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

// realization can liquidate the account instead of confirming
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Confirmed(ConfirmedOrder),
    Liquidated(LiquidationResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Cancelled { refunded: Quote },
    Liquidated(LiquidationResult),
}

// what a margin realization pass did to the account's position
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Realization {
    NoPosition,
    Realized(Quote),
    Liquidated(LiquidationResult),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Oracle price is invalid")]
    InvalidPrice,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Quote, available: Quote },

    #[error("Leverage {requested} exceeds maximum {max}")]
    MaxLeverageExceeded { requested: Leverage, max: Leverage },

    #[error("Margin {margin} below minimum {minimum}")]
    InsufficientMargin { margin: Quote, minimum: Quote },

    #[error("Market debt {debt} would exceed maximum {max}")]
    MaxMarketDebtExceeded { debt: Quote, max: Quote },

    #[error("Account {0} has no pending order")]
    NoPendingOrder(AccountId),

    #[error("Order submitted in {submitted}, still round {current}")]
    AwaitingNextPriceRound { submitted: RoundId, current: RoundId },

    #[error("Entry price is zero")]
    ZeroEntryPrice,

    #[error("Position of {0} cannot be liquidated")]
    PositionCannotBeLiquidated(AccountId),

    #[error("Access denied for {0}")]
    AccessDenied(AccountId),

    #[error("Order submitted in {submitted} expired by round {current}")]
    OrderExpired { submitted: RoundId, current: RoundId },

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Collateral error: {0}")]
    Collateral(#[from] CollateralError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
