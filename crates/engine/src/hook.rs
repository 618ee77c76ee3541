//! Lookup event hook and the registry the host fires it through.
//!
//! Hooks are invoked under a shared guard and removed under the exclusive one,
//! so [`HookRegistry::unregister`] only returns after every invocation that
//! was already running has finished, and no invocation starts afterwards.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use auto_impl::auto_impl;
use mlcache_collection::ItemCollection;
use mlcache_score::CachedItem;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

/// One cache lookup, as reported by the host after it decided hit or miss.
#[derive(Clone, Copy)]
pub struct LookupEvent<'a> {
    pub item: &'a CachedItem,
    /// The item's namespace collection, `None` if the namespace is untracked.
    pub collection: Option<&'a dyn ItemCollection>,
    pub hit: bool,
}

impl<'a> LookupEvent<'a> {
    pub fn hit(item: &'a CachedItem, collection: Option<&'a dyn ItemCollection>) -> Self {
        Self {
            item,
            collection,
            hit: true,
        }
    }

    pub fn miss(item: &'a CachedItem, collection: Option<&'a dyn ItemCollection>) -> Self {
        Self {
            item,
            collection,
            hit: false,
        }
    }
}

impl fmt::Debug for LookupEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupEvent")
            .field("item", &self.item.key())
            .field("tracked", &self.collection.is_some())
            .field("hit", &self.hit)
            .finish()
    }
}

/// Receiver of lookup events.
#[auto_impl(&, Box, Arc)]
pub trait LookupHook: Send + Sync {
    fn handle(&self, event: &LookupEvent<'_>);
}

/// Handle returned by [`HookRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("hook {0:?} is not registered")]
    NotRegistered(HookId),
}

/// Host-side registry of lookup hooks.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<(HookId, Arc<dyn LookupHook>)>>,
    next_id: AtomicU64,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, hook: Arc<dyn LookupHook>) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks.write().push((id, hook));
        debug!(?id, "lookup hook registered");
        id
    }

    /// Remove a hook, waiting for in-flight invocations to drain.
    pub fn unregister(&self, id: HookId) -> Result<(), HookError> {
        let mut hooks = self.hooks.write();
        let index = hooks
            .iter()
            .position(|(hook_id, _)| *hook_id == id)
            .ok_or(HookError::NotRegistered(id))?;
        hooks.remove(index);
        debug!(?id, "lookup hook unregistered");
        Ok(())
    }

    /// Deliver a lookup event to every registered hook.
    pub fn fire(&self, event: &LookupEvent<'_>) {
        for (_, hook) in self.hooks.read().iter() {
            hook.handle(event);
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlcache_score::ItemKey;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct Counting {
        hits: AtomicU64,
        misses: AtomicU64,
    }

    impl LookupHook for Counting {
        fn handle(&self, event: &LookupEvent<'_>) {
            if event.hit {
                self.hits.fetch_add(1, Ordering::Relaxed);
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn test_fire_reaches_every_hook() {
        let registry = HookRegistry::new();
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());
        registry.register(first.clone());
        registry.register(second.clone());

        let item = CachedItem::new(ItemKey(1));
        registry.fire(&LookupEvent::hit(&item, None));
        registry.fire(&LookupEvent::miss(&item, None));

        for hook in [&first, &second] {
            assert_eq!(hook.hits.load(Ordering::Relaxed), 1);
            assert_eq!(hook.misses.load(Ordering::Relaxed), 1);
        }
    }

    #[test]
    fn test_unregister() {
        let registry = HookRegistry::new();
        let hook = Arc::new(Counting::default());
        let id = registry.register(hook.clone());

        registry.unregister(id).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.unregister(id), Err(HookError::NotRegistered(id)));

        let item = CachedItem::new(ItemKey(1));
        registry.fire(&LookupEvent::hit(&item, None));
        assert_eq!(hook.hits.load(Ordering::Relaxed), 0);
    }

    struct Slow {
        entered: AtomicBool,
        finished: AtomicBool,
    }

    impl LookupHook for Slow {
        fn handle(&self, _event: &LookupEvent<'_>) {
            self.entered.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            self.finished.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_unregister_waits_for_in_flight() {
        let registry = Arc::new(HookRegistry::new());
        let hook = Arc::new(Slow {
            entered: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        });
        let id = registry.register(hook.clone());

        let firing = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let item = CachedItem::new(ItemKey(1));
                registry.fire(&LookupEvent::hit(&item, None));
            })
        };

        while !hook.entered.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        registry.unregister(id).unwrap();
        assert!(hook.finished.load(Ordering::SeqCst));

        firing.join().unwrap();
    }
}
