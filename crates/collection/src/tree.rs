//! Ordered slot map used as the reference host collection.
//!
//! Writers take the write guard only for the duration of a single slot change.
//! Readers take the shared guard for a single slot lookup and release it
//! before returning, so a full traversal never pins the map.

use std::collections::BTreeMap;
use std::sync::Arc;

use mlcache_score::{CachedItem, ItemKey, Residency};
use parking_lot::RwLock;

use crate::traits::{ItemCollection, Slot};

#[derive(Debug, Clone)]
enum SlotEntry {
    Item(Arc<CachedItem>),
    /// An install is in progress for this slot.
    Pending,
    /// The entry was cleared but the slot has not been compacted yet.
    Vacant,
}

impl SlotEntry {
    fn to_slot(&self) -> Slot {
        match self {
            Self::Item(item) => Slot::Occupied(Arc::clone(item)),
            Self::Pending => Slot::Retry,
            Self::Vacant => Slot::Empty,
        }
    }
}

/// Position-ordered collection of items keyed by [`ItemKey`].
#[derive(Debug, Default)]
pub struct ShadowTree {
    slots: RwLock<BTreeMap<u64, SlotEntry>>,
}

impl ShadowTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an item at its key's slot.
    pub fn insert(&self, item: Arc<CachedItem>) -> Option<Arc<CachedItem>> {
        let previous = self
            .slots
            .write()
            .insert(item.key().index(), SlotEntry::Item(item));
        match previous {
            Some(SlotEntry::Item(old)) => Some(old),
            _ => None,
        }
    }

    /// Mark a slot as mid-install.
    ///
    /// Readers that reach the slot spin on it until the install ends, so every
    /// call must be followed promptly by [`complete_install`](Self::complete_install)
    /// or [`abort_install`](Self::abort_install), including on error paths. A
    /// slot left pending stalls every scan of this collection.
    pub fn begin_install(&self, key: ItemKey) {
        self.slots.write().insert(key.index(), SlotEntry::Pending);
    }

    /// Abandon an install started with [`begin_install`](Self::begin_install).
    ///
    /// The slot becomes vacant. Returns `false` if the slot was not pending.
    pub fn abort_install(&self, key: ItemKey) -> bool {
        let mut slots = self.slots.write();
        match slots.get_mut(&key.index()) {
            Some(entry) if matches!(entry, SlotEntry::Pending) => {
                *entry = SlotEntry::Vacant;
                true
            }
            _ => false,
        }
    }

    /// Finish an install started with [`begin_install`](Self::begin_install).
    pub fn complete_install(&self, item: Arc<CachedItem>) {
        self.insert(item);
    }

    pub fn get(&self, key: ItemKey) -> Option<Arc<CachedItem>> {
        match self.slots.read().get(&key.index()) {
            Some(SlotEntry::Item(item)) => Some(Arc::clone(item)),
            _ => None,
        }
    }

    /// Turn a resident entry into a shadow that keeps its score.
    ///
    /// Returns the entry, or `None` if the slot holds no item.
    pub fn evict_to_shadow(&self, key: ItemKey) -> Option<Arc<CachedItem>> {
        let item = self.get(key)?;
        item.set_residency(Residency::Shadow);
        Some(item)
    }

    /// Bring a shadow back to residency.
    pub fn reinstate(&self, key: ItemKey) -> Option<Arc<CachedItem>> {
        let item = self.get(key)?;
        item.set_residency(Residency::Resident);
        Some(item)
    }

    /// Clear a slot but leave it in place; readers see it as empty.
    ///
    /// The removed item is detached.
    pub fn clear(&self, key: ItemKey) -> Option<Arc<CachedItem>> {
        let mut slots = self.slots.write();
        let entry = slots.get_mut(&key.index())?;
        match std::mem::replace(entry, SlotEntry::Vacant) {
            SlotEntry::Item(item) => {
                item.set_residency(Residency::Detached);
                Some(item)
            }
            _ => None,
        }
    }

    /// Remove a slot entirely. The removed item is detached.
    pub fn remove(&self, key: ItemKey) -> Option<Arc<CachedItem>> {
        match self.slots.write().remove(&key.index())? {
            SlotEntry::Item(item) => {
                item.set_residency(Residency::Detached);
                Some(item)
            }
            _ => None,
        }
    }

    /// Drop vacant slots.
    pub fn compact(&self) -> usize {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|_, entry| !matches!(entry, SlotEntry::Vacant));
        before - slots.len()
    }

    /// Number of slots, including pending and vacant ones.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Point-in-time copy of every item, in slot order.
    pub fn items(&self) -> Vec<Arc<CachedItem>> {
        self.slots
            .read()
            .values()
            .filter_map(|entry| match entry {
                SlotEntry::Item(item) => Some(Arc::clone(item)),
                _ => None,
            })
            .collect()
    }

    /// Items currently in the given residency, in slot order.
    pub fn items_in(&self, residency: Residency) -> Vec<Arc<CachedItem>> {
        self.items()
            .into_iter()
            .filter(|item| item.residency() == residency)
            .collect()
    }
}

impl ItemCollection for ShadowTree {
    fn slot_at_or_after(&self, position: u64) -> Option<(u64, Slot)> {
        let slots = self.slots.read();
        slots
            .range(position..)
            .next()
            .map(|(position, entry)| (*position, entry.to_slot()))
    }
}
