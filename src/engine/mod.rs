// 8.0: core accounting engine. runs the two-phase order protocol, funding recomputation,
// margin realization and liquidations against one market.
// deterministic: time comes from the engine clock, prices from the injected oracle.

mod config;
mod core;
mod funding;
mod liquidations;
mod orders;
mod params;
mod positions;
mod queries;
mod results;
mod transaction;

pub use config::EngineConfig;
pub use self::core::{Collaborators, Engine};
pub use results::{CancelOutcome, ConfirmOutcome, ConfirmedOrder, EngineError, LiquidationResult, OrderReceipt};
