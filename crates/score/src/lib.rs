//! Upper-confidence-bound scoring for cache retention.
//!
//! Items are ranked by a multi-armed-bandit style score instead of a fixed
//! recency policy. This crate holds the pure scoring pieces; scanning a live
//! collection and dispatching lookup events live in `mlcache-engine`.
//!
//! # Components
//!
//! - [`BoundEstimator`] - Integer UCB exploration bonus
//! - [`ScoreUpdater`] - Hit reward, miss seeding and sibling penalties
//! - [`AverageTracker`] - Approximate running mean used to seed misses
//! - [`CachedItem`] - Lock-free per-item scoring state

mod average;
mod bound;
pub mod constants;
mod item;
mod updater;

pub use average::AverageTracker;
pub use bound::{BoundEstimator, bound};
pub use item::{CachedItem, ItemKey, ItemSnapshot, Residency};
pub use updater::{ScanId, ScoreUpdater};
