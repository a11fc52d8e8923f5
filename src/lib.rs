// perps-nextprice: accounting core for a single-asset perpetual futures market.
// orders are submitted in one oracle round and confirmed in a later one, so nobody
// trades at a price they already knew. market debt is an O(1) read off running aggregates.
// all computation is deterministic: time comes from the engine clock.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AccountId, Side, Price, Quote, Leverage, RoundId, FundingIndex
//   2.x  order.rs: pending next-price orders, skew-aware fee schedule
//   3.x  margin.rs: remaining margin, accrued funding, liquidation price
//   4.x  position.rs: position struct, pnl, debt contribution
//   5.x  funding.rs: skew-driven funding rate, cumulative funding sequence
//   6.x  liquidation.rs: liquidation reward policy
//   7.x  config.rs: market params, env presets, validation
//   8.x  engine/: submit/confirm/cancel, funding, realization, liquidations, setters, queries
//   9.x  oracle.rs: price oracle adapter, per-operation price snapshot
//   10.x collateral.rs: collateral ledger interface + in-memory ledger
//   11.x events.rs: state transition events for audit
//   12.x market.rs: market state, aggregates, rollback journal

pub mod collateral;
pub mod config;
pub mod engine;
pub mod events;
pub mod funding;
pub mod liquidation;
pub mod margin;
pub mod market;
pub mod oracle;
pub mod order;
pub mod position;
pub mod types;

// re exports for convenience
pub use collateral::{CollateralError, CollateralLedger, InMemoryLedger};
pub use config::{ConfigError, Environment, MarketParams};
pub use engine::*;
pub use events::*;
pub use funding::{FundingParams, FundingSequence};
pub use liquidation::LiquidationFeePolicy;
pub use market::{MarketAggregates, MarketAudit, MarketState};
pub use oracle::{ManualOracle, PriceOracle, PriceSnapshot};
pub use order::Order;
pub use position::Position;
pub use types::*;
