//! End-to-end tests: an engine attached to host registries, fed lookups for
//! items living in namespace collections.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use mlcache_collection::{ItemCollection, NamespaceId, Namespaces};
use mlcache_engine::{
    Engine, EngineConfig, HookRegistry, LookupEvent, MlCacheService, ServiceError, StatusError,
    StatusRegistry, constants::STATUS_ENTRY,
};
use mlcache_score::{CachedItem, ItemKey, Residency, bound};

struct Host {
    hooks: Arc<HookRegistry>,
    status: Arc<StatusRegistry>,
    namespaces: Namespaces,
}

impl Host {
    fn new() -> Self {
        Self {
            hooks: Arc::new(HookRegistry::new()),
            status: Arc::new(StatusRegistry::new()),
            namespaces: Namespaces::new(),
        }
    }

    fn start(&self, config: EngineConfig) -> MlCacheService {
        MlCacheService::start(
            Arc::new(Engine::new(config)),
            Arc::clone(&self.hooks),
            Arc::clone(&self.status),
        )
        .unwrap()
    }

    fn lookup(&self, namespace: NamespaceId, item: &CachedItem, hit: bool) {
        let tree = self.namespaces.get(namespace);
        let collection = tree.as_deref().map(|tree| tree as &dyn ItemCollection);
        self.hooks.fire(&LookupEvent {
            item,
            collection,
            hit,
        });
    }
}

#[test]
fn test_hits_and_misses_through_host() {
    let host = Host::new();
    let service = host.start(EngineConfig::default());
    let ns = NamespaceId(1);
    let tree = host.namespaces.get_or_create(ns);

    let hot = Arc::new(CachedItem::new(ItemKey(1)));
    tree.insert(Arc::clone(&hot));
    host.lookup(ns, &hot, true);
    assert_eq!(hot.score(), -100 + bound(0, 1) as i64 - bound(1, 1) as i64);

    // The item is evicted while still valuable, then missed.
    let evicted = Arc::new(CachedItem::new(ItemKey(2)));
    tree.insert(Arc::clone(&evicted));
    evicted.set_score(900);
    tree.evict_to_shadow(ItemKey(2));
    let cold = Arc::new(CachedItem::shadow(ItemKey(3), 50));
    tree.insert(Arc::clone(&cold));

    let fresh = CachedItem::new(ItemKey(2));
    host.lookup(ns, &fresh, false);

    assert_eq!(cold.score(), 50 - 100);
    // The resident item is not a shadow and is left alone.
    assert_eq!(hot.score(), -629);
    assert_eq!(fresh.score(), evicted.score());
    assert_eq!(evicted.plays(), 1);

    assert_eq!(
        host.status.read(STATUS_ENTRY).unwrap(),
        "Hits: 1 | Misses: 1\n"
    );
    assert_eq!(service.engine().round(), 2);

    service.stop().unwrap();
    assert!(host.hooks.is_empty());
    assert!(host.status.read(STATUS_ENTRY).is_err());
}

#[test]
fn test_untracked_namespace_is_seeded() {
    let host = Host::new();
    let service = host.start(EngineConfig::default());

    let item = CachedItem::new(ItemKey(5));
    item.set_score(321);
    host.lookup(NamespaceId(42), &item, false);

    assert_eq!(item.score(), service.engine().weighted_average());
    assert_eq!(item.plays(), 1);
    service.stop().unwrap();
}

#[test]
fn test_detached_item_is_never_scored() {
    let host = Host::new();
    let service = host.start(EngineConfig::default());
    let ns = NamespaceId(1);
    let tree = host.namespaces.get_or_create(ns);

    let item = Arc::new(CachedItem::new(ItemKey(1)));
    tree.insert(Arc::clone(&item));
    item.set_score(17);
    tree.remove(ItemKey(1));
    assert_eq!(item.residency(), Residency::Detached);

    host.lookup(ns, &item, true);
    host.lookup(ns, &item, false);

    assert_eq!(item.score(), 17);
    assert_eq!(item.plays(), 0);
    // Counters still move.
    assert_eq!(service.engine().hits(), 1);
    assert_eq!(service.engine().misses(), 1);
    service.stop().unwrap();
}

#[test]
fn test_counters_only_engine() {
    let host = Host::new();
    let service = host.start(EngineConfig::counters_only());
    let item = CachedItem::new(ItemKey(1));

    host.lookup(NamespaceId(0), &item, true);
    host.lookup(NamespaceId(0), &item, false);

    assert_eq!(item.score(), 0);
    assert_eq!(
        host.status.read(STATUS_ENTRY).unwrap(),
        "Hits: 1 | Misses: 1\n"
    );
    service.stop().unwrap();
}

#[test]
fn test_double_start_leaves_one_hook() {
    let host = Host::new();
    let first = host.start(EngineConfig::default());

    let err = MlCacheService::start(
        Arc::new(Engine::default()),
        Arc::clone(&host.hooks),
        Arc::clone(&host.status),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Status(StatusError::AlreadyExists(_))
    ));
    assert_eq!(host.hooks.len(), 1);

    let item = CachedItem::new(ItemKey(1));
    host.lookup(NamespaceId(0), &item, true);
    assert_eq!(first.engine().hits(), 1);

    first.stop().unwrap();
}

#[test]
fn test_restart_after_stop() {
    let host = Host::new();
    host.start(EngineConfig::default()).stop().unwrap();

    let service = host.start(EngineConfig::default());
    assert_eq!(host.hooks.len(), 1);
    assert_eq!(
        host.status.read(STATUS_ENTRY).unwrap(),
        "Hits: 0 | Misses: 0\n"
    );
    service.stop().unwrap();
}

#[test]
fn test_sibling_penalized_again_after_restart() {
    let host = Host::new();
    let ns = NamespaceId(3);
    let tree = host.namespaces.get_or_create(ns);
    let sibling = Arc::new(CachedItem::shadow(ItemKey(0), 10));
    tree.insert(Arc::clone(&sibling));

    let service = host.start(EngineConfig::default());
    host.lookup(ns, &CachedItem::new(ItemKey(50)), false);
    assert_eq!(service.engine().round(), 1);
    assert_eq!(sibling.score(), 10 - 100);
    service.stop().unwrap();

    // The restarted engine numbers its first round 1 again.
    let service = host.start(EngineConfig::default());
    host.lookup(ns, &CachedItem::new(ItemKey(51)), false);
    assert_eq!(service.engine().round(), 1);
    assert_eq!(sibling.score(), 10 - 200);
    service.stop().unwrap();
}

#[test]
fn test_engines_sharing_a_collection_both_penalize() {
    let ns = NamespaceId(4);
    let namespaces: Namespaces = Namespaces::new();
    let tree = namespaces.get_or_create(ns);
    let sibling = Arc::new(CachedItem::shadow(ItemKey(0), 10));
    tree.insert(Arc::clone(&sibling));

    for engine in [Engine::default(), Engine::default()] {
        engine.on_lookup(&CachedItem::new(ItemKey(9)), Some(tree.as_ref()), false);
        assert_eq!(engine.round(), 1);
    }
    assert_eq!(sibling.score(), 10 - 200);
}

#[test]
fn test_scans_complete_under_concurrent_mutation() {
    let host = Arc::new(Host::new());
    let service = host.start(EngineConfig::default().with_yield_batch(16));
    let ns = NamespaceId(7);
    let tree = host.namespaces.get_or_create(ns);
    for key in 0..256 {
        tree.insert(Arc::new(CachedItem::shadow(ItemKey(key), 10)));
    }

    let running = Arc::new(AtomicBool::new(true));
    let mut writers = vec![];
    for w in 0..2u64 {
        let tree = Arc::clone(&tree);
        let running = Arc::clone(&running);
        writers.push(thread::spawn(move || {
            let mut key = w;
            while running.load(Ordering::Relaxed) {
                let slot = ItemKey(key % 256);
                tree.begin_install(slot);
                thread::yield_now();
                tree.complete_install(Arc::new(CachedItem::shadow(slot, 5)));
                if key % 3 == 0 {
                    tree.clear(ItemKey((key + 7) % 256));
                    tree.compact();
                }
                key += 2;
            }
        }));
    }

    let mut readers = vec![];
    for r in 0..4u64 {
        let host = Arc::clone(&host);
        readers.push(thread::spawn(move || {
            for i in 0..50u64 {
                let item = CachedItem::new(ItemKey((r * 50 + i) % 300));
                host.lookup(ns, &item, i % 4 == 0);
            }
        }));
    }

    for reader in readers {
        reader.join().unwrap();
    }
    running.store(false, Ordering::Relaxed);
    for writer in writers {
        writer.join().unwrap();
    }

    let engine = service.engine();
    assert_eq!(engine.hits() + engine.misses(), 200);
    assert_eq!(engine.round(), 200);
    service.stop().unwrap();
}
