//! Miss-path scan over a live collection.
//!
//! On a miss the scanner walks the missed item's namespace looking for the
//! item's own shadow entry, marking down every other shadow it passes. What it
//! does once the walk ends depends on the shadow it found:
//!
//! | Shadow of the missed item | Action |
//! |---|---|
//! | none | seed the item from the running average |
//! | score `0` (no history) | recompute the bonus only, stop penalizing |
//! | nonzero score | full second pass penalizing every other shadow |
//!
//! The walk holds no lock between slots and yields the processor every
//! `yield_batch` visited entries, so it can run on a hot lookup path alongside
//! writers to the same collection.

use std::thread;

use mlcache_collection::{ItemCollection, ScanCursor};
use mlcache_score::{AverageTracker, CachedItem, ItemKey, ScanId, ScoreUpdater};
use serde::Serialize;
use tracing::{debug, trace};

/// How a miss scan resolved the missed item's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOutcome {
    /// No shadow found: the item was seeded from the running average.
    #[default]
    Seeded,
    /// A shadow without history was found: bonus recomputed, nothing penalized
    /// past it.
    Neutral,
    /// A valuable shadow was found: every other shadow was penalized.
    Corrected,
}

/// Result of one miss scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    /// Occupied entries visited across all passes.
    pub visited: u64,
    /// Sibling shadows marked down.
    pub penalized: u64,
    /// Slots re-read because a writer was mid-mutation.
    pub retries: u64,
    /// Times the scan yielded the processor.
    pub yields: u64,
}

/// Counts visited entries and yields the processor every `batch` of them.
#[derive(Debug)]
struct Pacer {
    batch: u64,
    visited: u64,
    yields: u64,
}

impl Pacer {
    fn new(batch: usize) -> Self {
        Self {
            batch: u64::try_from(batch).unwrap_or(u64::MAX),
            visited: 0,
            yields: 0,
        }
    }

    fn tick(&mut self) {
        self.visited += 1;
        if self.batch != 0 && self.visited % self.batch == 0 {
            trace!(visited = self.visited, "scan batch done, yielding");
            self.yields += 1;
            thread::yield_now();
        }
    }
}

/// Miss-path collection scanner.
#[derive(Debug, Clone, Copy)]
pub struct CollectionScanner {
    updater: ScoreUpdater,
    yield_batch: usize,
}

impl CollectionScanner {
    pub fn new(updater: ScoreUpdater, yield_batch: usize) -> Self {
        Self {
            updater,
            yield_batch,
        }
    }

    pub fn yield_batch(&self) -> usize {
        self.yield_batch
    }

    /// Resolve a miss on `item` in `round`.
    ///
    /// An absent collection (untracked namespace) goes straight to seeding.
    pub fn scan<C>(
        &self,
        item: &CachedItem,
        collection: Option<&C>,
        round: u64,
        average: &AverageTracker,
    ) -> ScanReport
    where
        C: ItemCollection + ?Sized,
    {
        let Some(collection) = collection else {
            self.updater.apply_miss_seed(item, average);
            return ScanReport::default();
        };

        let key = item.key();
        let scan = ScanId::next();
        let mut pacer = Pacer::new(self.yield_batch);
        let mut report = ScanReport::default();
        let mut cursor = ScanCursor::new(collection);
        let mut found = None;

        for (_, entry) in cursor.by_ref() {
            pacer.tick();
            // Resident entries belong to the live cache and are not comparable.
            if !entry.is_shadow() {
                continue;
            }
            if entry.key() == key {
                found = Some(entry);
                break;
            }
            if self.updater.penalize(&entry, scan) {
                report.penalized += 1;
            }
        }
        report.retries = cursor.retries();

        report.outcome = match found {
            None => {
                self.updater.apply_miss_seed(item, average);
                ScanOutcome::Seeded
            }
            Some(shadow) if shadow.score() == 0 => {
                self.updater.apply_miss_neutral(&shadow, round);
                inherit(item, &shadow);
                ScanOutcome::Neutral
            }
            Some(shadow) => {
                self.penalize_all(key, collection, scan, &mut pacer, &mut report);
                self.updater.apply_miss_neutral(&shadow, round);
                inherit(item, &shadow);
                ScanOutcome::Corrected
            }
        };
        report.visited = pacer.visited;
        report.yields = pacer.yields;

        debug!(
            item = %key,
            round,
            outcome = ?report.outcome,
            visited = report.visited,
            penalized = report.penalized,
            "miss scan complete"
        );
        report
    }

    /// Second full pass: mark down every shadow other than `missed`.
    ///
    /// Siblings already penalized by the first pass of the same scan are left
    /// alone.
    fn penalize_all<C>(
        &self,
        missed: ItemKey,
        collection: &C,
        scan: ScanId,
        pacer: &mut Pacer,
        report: &mut ScanReport,
    ) where
        C: ItemCollection + ?Sized,
    {
        let mut cursor = ScanCursor::new(collection);
        for (_, entry) in cursor.by_ref() {
            pacer.tick();
            if !entry.is_shadow() || entry.key() == missed {
                continue;
            }
            if self.updater.penalize(&entry, scan) {
                report.penalized += 1;
            }
        }
        report.retries += cursor.retries();
    }
}

/// Carry a shadow's score over to the looked-up item when the host handed us a
/// different object for the same key.
fn inherit(item: &CachedItem, shadow: &CachedItem) {
    if !std::ptr::eq(item, shadow) && !item.is_detached() {
        item.set_score(shadow.score());
    }
}
