//! Retry-tolerant forward cursor over an [`ItemCollection`].

use std::hint;
use std::sync::Arc;
use std::thread;

use mlcache_score::CachedItem;

use crate::traits::{ItemCollection, Slot};

/// Consecutive retries on one slot before the cursor yields the processor.
const RETRY_SPINS_BEFORE_YIELD: u32 = 64;

/// Forward cursor that re-reads slots under mutation and skips empty ones.
///
/// The cursor holds nothing between steps; every step is a fresh
/// `slot_at_or_after` read, so the scan can be resumed at any point.
///
/// A `Retry` slot is re-read until the collection reports something else, so
/// collections must only report `Retry` for mutations that are guaranteed to
/// finish.
#[derive(Debug)]
pub struct ScanCursor<'a, C: ?Sized> {
    collection: &'a C,
    next: u64,
    finished: bool,
    retries: u64,
    skipped: u64,
}

impl<'a, C: ItemCollection + ?Sized> ScanCursor<'a, C> {
    pub fn new(collection: &'a C) -> Self {
        Self::starting_at(collection, 0)
    }

    pub fn starting_at(collection: &'a C, position: u64) -> Self {
        Self {
            collection,
            next: position,
            finished: false,
            retries: 0,
            skipped: 0,
        }
    }

    /// Position the next read starts from.
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Slots that had to be re-read because a writer was mid-mutation.
    pub fn retries(&self) -> u64 {
        self.retries
    }

    /// Empty slots skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn advance_past(&mut self, position: u64) {
        match position.checked_add(1) {
            Some(next) => self.next = next,
            None => self.finished = true,
        }
    }
}

impl<C: ItemCollection + ?Sized> Iterator for ScanCursor<'_, C> {
    type Item = (u64, Arc<CachedItem>);

    fn next(&mut self) -> Option<Self::Item> {
        let mut spins = 0u32;
        while !self.finished {
            let Some((position, slot)) = self.collection.slot_at_or_after(self.next) else {
                self.finished = true;
                break;
            };

            match slot {
                Slot::Occupied(item) => {
                    self.advance_past(position);
                    return Some((position, item));
                }
                Slot::Empty => {
                    self.skipped += 1;
                    self.advance_past(position);
                }
                Slot::Retry => {
                    self.retries += 1;
                    self.next = position;
                    spins += 1;
                    if spins % RETRY_SPINS_BEFORE_YIELD == 0 {
                        thread::yield_now();
                    } else {
                        hint::spin_loop();
                    }
                }
            }
        }
        None
    }
}
