//! Read-side contract between the engine and a host-owned collection.

use std::sync::Arc;

use auto_impl::auto_impl;
use mlcache_score::CachedItem;

/// What a traversal finds at a slot position.
#[derive(Debug, Clone)]
pub enum Slot {
    /// A live entry (resident or shadow).
    Occupied(Arc<CachedItem>),
    /// The slot exists but holds nothing; skip it.
    Empty,
    /// A writer is mid-mutation on this slot; read it again.
    Retry,
}

/// A concurrently mutated, position-ordered collection of items in one
/// namespace.
///
/// Implementations must never block writers for longer than a single slot
/// read, and must tolerate inserts and removals between any two reads.
#[auto_impl(&, Box, Arc)]
pub trait ItemCollection: Send + Sync {
    /// Read the first slot at or after `position`.
    ///
    /// Returns the slot's own position alongside its contents, or `None` when
    /// no slot remains.
    fn slot_at_or_after(&self, position: u64) -> Option<(u64, Slot)>;
}
