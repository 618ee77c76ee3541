//! Streaming approximation of the mean item score.
//!
//! Each fold divides the item's score by the number of items observed so far,
//! counting the one being folded, and adds the quotient to the average. Stale
//! contributions are never retired. A zero count saturates to `u64::MAX`
//! before dividing, and the tracker's own count saturates instead of wrapping.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::item::CachedItem;

const ORDERING: Ordering = Ordering::Relaxed;

/// Running weighted average of item scores.
#[derive(Debug, Default)]
pub struct AverageTracker {
    average: AtomicI64,
    tracked: AtomicU64,
}

impl AverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit average and item count.
    pub fn with_state(average: i64, tracked: u64) -> Self {
        Self {
            average: AtomicI64::new(average),
            tracked: AtomicU64::new(tracked),
        }
    }

    /// Current running average.
    pub fn average(&self) -> i64 {
        self.average.load(ORDERING)
    }

    /// Number of items folded so far, as seen by the divisor.
    pub fn tracked(&self) -> u64 {
        self.tracked.load(ORDERING)
    }

    /// Fold an item's current score into the running average.
    ///
    /// `observed` is the number of items observed including this one; the
    /// engine counts it before folding.
    pub fn fold(&self, item: &CachedItem, observed: u64) {
        let count = if observed == 0 { u64::MAX } else { observed };
        let divisor = i64::try_from(count).unwrap_or(i64::MAX);
        let contribution = item.score() / divisor;
        let _ = self.average.fetch_update(ORDERING, ORDERING, |average| {
            Some(average.saturating_add(contribution))
        });

        let _ = self
            .tracked
            .fetch_update(ORDERING, ORDERING, |tracked| Some(tracked.saturating_add(1)));
    }

    /// The average to seed a newly missed item with.
    ///
    /// An average pinned at `i64::MAX` is reset to zero first.
    pub fn seed(&self) -> i64 {
        let average = self.average.load(ORDERING);
        if average == i64::MAX {
            let _ = self
                .average
                .compare_exchange(i64::MAX, 0, ORDERING, ORDERING);
            return 0;
        }
        average
    }

    pub fn reset(&self) {
        self.average.store(0, ORDERING);
        self.tracked.store(0, ORDERING);
    }
}
