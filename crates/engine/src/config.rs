//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SCALE, DEFAULT_YIELD_BATCH};

/// Runtime configuration chosen when an [`Engine`](crate::Engine) is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run the scoring machinery. When off only hit/miss counters are kept.
    pub scoring: bool,
    /// Fixed-point scale `K` for rewards, penalties and the exploration bonus.
    pub scale: u64,
    /// Visited entries between cooperative yields during a scan.
    pub yield_batch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: true,
            scale: DEFAULT_SCALE,
            yield_batch: DEFAULT_YIELD_BATCH,
        }
    }
}

impl EngineConfig {
    /// Counters-only configuration.
    pub fn counters_only() -> Self {
        Self {
            scoring: false,
            ..Self::default()
        }
    }

    pub fn with_yield_batch(mut self, yield_batch: usize) -> Self {
        self.yield_batch = yield_batch;
        self
    }

    pub fn with_scale(mut self, scale: u64) -> Self {
        self.scale = scale;
        self
    }
}
