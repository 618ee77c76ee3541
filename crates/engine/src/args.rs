//! CLI arguments for the scoring engine.

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::constants::{DEFAULT_SCALE, DEFAULT_YIELD_BATCH};

/// Scoring engine CLI arguments.
#[derive(Debug, Args, Clone, Serialize, Deserialize)]
#[command(next_help_heading = "Scoring Engine")]
#[serde(default)]
pub struct EngineArgs {
    /// Enable scoring (hit/miss counters are kept either way)
    #[arg(long = "mlcache.scoring", default_value_t = true, action = clap::ArgAction::Set)]
    pub scoring: bool,

    /// Fixed-point scale for rewards, penalties and the exploration bonus
    #[arg(long = "mlcache.scale", default_value_t = DEFAULT_SCALE)]
    pub scale: u64,

    /// Visited entries between cooperative yields while scanning
    #[arg(long = "mlcache.yield-batch", default_value_t = DEFAULT_YIELD_BATCH)]
    pub yield_batch: usize,
}

impl Default for EngineArgs {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            scoring: config.scoring,
            scale: config.scale,
            yield_batch: config.yield_batch,
        }
    }
}

impl EngineArgs {
    /// Validate argument combinations.
    pub fn validate(&self) -> Result<(), String> {
        if self.scale == 0 {
            return Err("mlcache.scale must be greater than zero".to_string());
        }
        if self.yield_batch == 0 {
            return Err("mlcache.yield-batch must be greater than zero".to_string());
        }
        if !self.scoring {
            let default = Self::default();
            if self.scale != default.scale {
                return Err("mlcache.scale has no effect when scoring is disabled".to_string());
            }
        }
        Ok(())
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            scoring: self.scoring,
            scale: self.scale,
            yield_batch: self.yield_batch,
        }
    }
}
