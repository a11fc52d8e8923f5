//! Engine configuration options.

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of audit events kept in memory. Oldest go first.
    pub max_events: usize,
    /// Log every event through `tracing` at info level.
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            verbose: false,
        }
    }
}
