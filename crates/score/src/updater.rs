//! Reward, penalty and seeding rules for a single item.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::average::AverageTracker;
use crate::bound::BoundEstimator;
use crate::constants::SCALE;
use crate::item::CachedItem;

/// Source of scan ids, shared by every engine in the process.
static NEXT_SCAN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one miss scan, used to penalize each sibling at most once.
///
/// Ids are unique across engines and survive engine resets, unlike round
/// numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanId(u64);

impl ScanId {
    pub fn next() -> Self {
        Self(NEXT_SCAN_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Applies hit/miss outcomes to item scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdater {
    bound: BoundEstimator,
    reward: i64,
    penalty: i64,
}

impl Default for ScoreUpdater {
    fn default() -> Self {
        Self::new(SCALE)
    }
}

impl ScoreUpdater {
    /// Create an updater whose reward, penalty and bound all use `scale`.
    pub fn new(scale: u64) -> Self {
        let unit = i64::try_from(scale).unwrap_or(i64::MAX);
        Self {
            bound: BoundEstimator::new(scale),
            reward: unit,
            penalty: unit,
        }
    }

    pub fn bound(&self) -> &BoundEstimator {
        &self.bound
    }

    pub fn reward(&self) -> i64 {
        self.reward
    }

    pub fn penalty(&self) -> i64 {
        self.penalty
    }

    /// Reward a hit in `round`.
    ///
    /// Nets out the bonus contributed at `round - 1` and replaces it with the
    /// bonus for `round`, weighted by the item's play count.
    pub fn apply_hit(&self, item: &CachedItem, round: u64) {
        self.apply_bonus(item, round, self.reward);
    }

    /// Recompute only the bonus term for a miss whose shadow carried no
    /// history (or whose remembered score is kept as is).
    pub fn apply_miss_neutral(&self, item: &CachedItem, round: u64) {
        self.apply_bonus(item, round, 0);
    }

    /// Seed a missed item from the running average.
    pub fn apply_miss_seed(&self, item: &CachedItem, average: &AverageTracker) {
        if item.is_detached() {
            return;
        }
        item.record_play();
        item.set_score(average.seed());
    }

    /// Mark down a sibling shadow, at most once per scan.
    ///
    /// Returns `true` if the penalty was applied.
    pub fn penalize(&self, item: &CachedItem, scan: ScanId) -> bool {
        if !item.mark_penalized(scan.get()) {
            return false;
        }
        item.add_score(-self.penalty);
        true
    }

    fn apply_bonus(&self, item: &CachedItem, round: u64, reward: i64) {
        if item.is_detached() {
            return;
        }

        let plays = item.record_play();
        let previous = to_signed(self.bound.bound(round.saturating_sub(1), plays));
        let current = to_signed(self.bound.bound(round, plays));
        let delta = previous.saturating_sub(current.saturating_mul(to_signed(plays)));

        item.update_score(|score| score.saturating_sub(reward).saturating_add(delta));
    }
}

fn to_signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
