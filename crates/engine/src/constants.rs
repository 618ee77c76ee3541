//! Default constants for the scoring engine.

pub use mlcache_score::constants::SCALE as DEFAULT_SCALE;

/// Default number of visited entries between cooperative yields during a scan.
pub const DEFAULT_YIELD_BATCH: usize = 4096;

/// Name the status surface is registered under.
pub const STATUS_ENTRY: &str = "mlcache_stats";
