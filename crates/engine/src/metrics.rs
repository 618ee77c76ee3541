//! Scoring engine metrics

use metrics::{Counter, Gauge};

use crate::scanner::{ScanOutcome, ScanReport};

/// Scoring engine metrics.
///
/// Handles are no-ops until a recorder is installed.
#[derive(Clone, Debug)]
pub struct EngineMetrics {
    /// Lookups that hit
    pub(crate) hits_total: Counter,
    /// Lookups that missed
    pub(crate) misses_total: Counter,
    /// Entries visited by miss scans
    pub(crate) scan_visited_total: Counter,
    /// Sibling shadows marked down
    pub(crate) scan_penalized_total: Counter,
    /// Misses whose shadow proved a wrongful eviction
    pub(crate) scan_corrections_total: Counter,
    /// Slots re-read because a writer was mid-mutation
    pub(crate) scan_retries_total: Counter,
    /// Cooperative yields taken by miss scans
    pub(crate) scan_yields_total: Counter,
    /// Current running average score
    pub(crate) weighted_average: Gauge,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self {
            hits_total: metrics::counter!("mlcache.lookups.hits_total"),
            misses_total: metrics::counter!("mlcache.lookups.misses_total"),
            scan_visited_total: metrics::counter!("mlcache.scan.visited_total"),
            scan_penalized_total: metrics::counter!("mlcache.scan.penalized_total"),
            scan_corrections_total: metrics::counter!("mlcache.scan.corrections_total"),
            scan_retries_total: metrics::counter!("mlcache.scan.retries_total"),
            scan_yields_total: metrics::counter!("mlcache.scan.yields_total"),
            weighted_average: metrics::gauge!("mlcache.weighted_average"),
        }
    }
}

impl EngineMetrics {
    pub(crate) fn record_lookup(&self, hit: bool) {
        if hit {
            self.hits_total.increment(1);
        } else {
            self.misses_total.increment(1);
        }
    }

    pub(crate) fn record_scan(&self, report: &ScanReport) {
        self.scan_visited_total.increment(report.visited);
        self.scan_penalized_total.increment(report.penalized);
        self.scan_retries_total.increment(report.retries);
        self.scan_yields_total.increment(report.yields);
        if report.outcome == ScanOutcome::Corrected {
            self.scan_corrections_total.increment(1);
        }
    }

    pub(crate) fn set_weighted_average(&self, average: i64) {
        self.weighted_average.set(average as f64);
    }
}
