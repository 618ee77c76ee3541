//! Lock-free per-item scoring state.
//!
//! A `CachedItem` is owned by the host cache and shared with the engine as
//! `Arc<CachedItem>`. The engine only reads and writes the scoring fields; the
//! host drives residency transitions.

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU8, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic ordering used for all item operations.
///
/// Scores are approximate statistics and never publish other memory, so
/// Relaxed is sufficient.
const ORDERING: Ordering = Ordering::Relaxed;

/// Stable identity of an item within its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(pub u64);

impl ItemKey {
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemKey {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an item currently lives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::FromRepr, strum::Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Residency {
    /// Live in the cache and owned by its mapping.
    #[default]
    Resident = 0,
    /// Evicted, but identity and score survive as a placeholder.
    Shadow = 1,
    /// No live mapping; never scored.
    Detached = 2,
}

/// Scoring state of a single cached item.
#[derive(Debug)]
pub struct CachedItem {
    key: ItemKey,
    /// Fixed-point score in units of `1 / SCALE`.
    score: AtomicI64,
    plays: AtomicU64,
    residency: AtomicU8,
    /// Scan that last marked this item down as a sibling.
    penalty_scan: AtomicU64,
}

impl CachedItem {
    /// A fresh resident item with no history.
    pub fn new(key: ItemKey) -> Self {
        Self::with_state(key, Residency::Resident, 0)
    }

    /// A shadow entry carrying a remembered score.
    pub fn shadow(key: ItemKey, score: i64) -> Self {
        Self::with_state(key, Residency::Shadow, score)
    }

    pub fn with_state(key: ItemKey, residency: Residency, score: i64) -> Self {
        Self {
            key,
            score: AtomicI64::new(score),
            plays: AtomicU64::new(0),
            residency: AtomicU8::new(residency as u8),
            penalty_scan: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> ItemKey {
        self.key
    }

    pub fn score(&self) -> i64 {
        self.score.load(ORDERING)
    }

    pub fn set_score(&self, score: i64) {
        self.score.store(score, ORDERING);
    }

    /// Add to the score, saturating at the `i64` bounds.
    pub fn add_score(&self, delta: i64) {
        self.update_score(|score| score.saturating_add(delta));
    }

    /// Atomically replace the score with `f(score)`.
    pub fn update_score(&self, mut f: impl FnMut(i64) -> i64) {
        // The closure always returns Some, so this never fails.
        let _ = self
            .score
            .fetch_update(ORDERING, ORDERING, |score| Some(f(score)));
    }

    pub fn plays(&self) -> u64 {
        self.plays.load(ORDERING)
    }

    /// Record one more play and return the new play count.
    pub fn record_play(&self) -> u64 {
        let previous = self
            .plays
            .fetch_update(ORDERING, ORDERING, |plays| Some(plays.saturating_add(1)))
            .unwrap_or_else(|plays| plays);
        previous.saturating_add(1)
    }

    pub fn residency(&self) -> Residency {
        Residency::from_repr(self.residency.load(ORDERING)).unwrap_or(Residency::Detached)
    }

    pub fn set_residency(&self, residency: Residency) {
        self.residency.store(residency as u8, ORDERING);
    }

    pub fn is_shadow(&self) -> bool {
        self.residency() == Residency::Shadow
    }

    pub fn is_detached(&self) -> bool {
        self.residency() == Residency::Detached
    }

    /// Stamp this item as penalized by scan `scan`.
    ///
    /// Returns `false` if that scan already penalized it.
    pub fn mark_penalized(&self, scan: u64) -> bool {
        self.penalty_scan.swap(scan, ORDERING) != scan
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            key: self.key,
            score: self.score(),
            plays: self.plays(),
            residency: self.residency(),
        }
    }
}

/// Serializable point-in-time view of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub key: ItemKey,
    pub score: i64,
    pub plays: u64,
    pub residency: Residency,
}
