//! Per-lookup entry point and process-wide scoring state.

use std::sync::atomic::{AtomicU64, Ordering};

use mlcache_collection::ItemCollection;
use mlcache_score::{AverageTracker, CachedItem, ScoreUpdater};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::EngineConfig;
use crate::hook::{LookupEvent, LookupHook};
use crate::metrics::EngineMetrics;
use crate::scanner::{CollectionScanner, ScanReport};

/// Atomic ordering used for all engine counters.
///
/// Counters are approximate statistics shared by every lookup path; races
/// between them are tolerated, so Relaxed is enough.
const ORDERING: Ordering = Ordering::Relaxed;

/// What the engine did for one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Scoring is disabled; only counters moved.
    Counted,
    /// The item was rewarded.
    Hit,
    /// The miss was scanned.
    Miss(ScanReport),
}

/// Scoring engine shared by every lookup path.
///
/// All state lives here rather than in globals, so several engines can coexist
/// (one per test, one per host cache).
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    updater: ScoreUpdater,
    scanner: CollectionScanner,
    average: AverageTracker,
    round: AtomicU64,
    /// Items observed by the facade, kept apart from the tracker's own count.
    observed: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    metrics: EngineMetrics,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let updater = ScoreUpdater::new(config.scale);
        Self {
            config,
            updater,
            scanner: CollectionScanner::new(updater, config.yield_batch),
            average: AverageTracker::new(),
            round: AtomicU64::new(0),
            observed: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            metrics: EngineMetrics::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scoring_enabled(&self) -> bool {
        self.config.scoring
    }

    /// Score one lookup of `item` in `collection`.
    ///
    /// `collection` is `None` when the item's namespace is not tracked.
    pub fn on_lookup<C>(&self, item: &CachedItem, collection: Option<&C>, hit: bool) -> LookupOutcome
    where
        C: ItemCollection + ?Sized,
    {
        if hit {
            self.hits.fetch_add(1, ORDERING);
        } else {
            self.misses.fetch_add(1, ORDERING);
        }
        self.metrics.record_lookup(hit);

        if !self.config.scoring {
            return LookupOutcome::Counted;
        }

        let round = self.next_round();
        let outcome = if hit {
            self.updater.apply_hit(item, round);
            LookupOutcome::Hit
        } else {
            let report = self.scanner.scan(item, collection, round, &self.average);
            self.metrics.record_scan(&report);
            LookupOutcome::Miss(report)
        };

        let observed = self
            .observed
            .fetch_update(ORDERING, ORDERING, |observed| Some(observed.saturating_add(1)))
            .unwrap_or_else(|observed| observed)
            .saturating_add(1);
        self.average.fold(item, observed);
        self.metrics.set_weighted_average(self.average.average());

        trace!(item = %item.key(), round, hit, score = item.score(), "lookup scored");
        outcome
    }

    /// Running average score, or 0 when scoring is disabled.
    pub fn weighted_average(&self) -> i64 {
        if !self.config.scoring {
            return 0;
        }
        self.average.average()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(ORDERING)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(ORDERING)
    }

    pub fn round(&self) -> u64 {
        self.round.load(ORDERING)
    }

    pub fn observed_items(&self) -> u64 {
        self.observed.load(ORDERING)
    }

    pub fn tracked_items(&self) -> u64 {
        self.average.tracked()
    }

    /// Zero every counter and the running average.
    pub fn reset(&self) {
        self.hits.store(0, ORDERING);
        self.misses.store(0, ORDERING);
        self.round.store(0, ORDERING);
        self.observed.store(0, ORDERING);
        self.average.reset();
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            scoring: self.config.scoring,
            hits: self.hits(),
            misses: self.misses(),
            round: self.round(),
            observed_items: self.observed_items(),
            tracked_items: self.tracked_items(),
            weighted_average: self.weighted_average(),
        }
    }

    fn next_round(&self) -> u64 {
        let previous = self
            .round
            .fetch_update(ORDERING, ORDERING, |round| Some(round.saturating_add(1)))
            .unwrap_or_else(|round| round);
        previous.saturating_add(1)
    }
}

impl LookupHook for Engine {
    fn handle(&self, event: &LookupEvent<'_>) {
        self.on_lookup(event.item, event.collection, event.hit);
    }
}

/// Serializable snapshot of engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub scoring: bool,
    pub hits: u64,
    pub misses: u64,
    pub round: u64,
    pub observed_items: u64,
    pub tracked_items: u64,
    pub weighted_average: i64,
}
