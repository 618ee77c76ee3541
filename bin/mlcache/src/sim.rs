//! Simulated host: per-namespace resident sets with shadow eviction.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use eyre::{Result, WrapErr};
use mlcache_collection::{ItemCollection, NamespaceId, Namespaces, ShadowTree};
use mlcache_engine::{
    Engine, EngineConfig, EngineStats, HookRegistry, LookupEvent, MlCacheService, StatusRegistry,
    constants::STATUS_ENTRY,
};
use mlcache_score::{CachedItem, ItemKey, Residency};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, trace};

/// Workload shape for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Workload {
    pub(crate) items: u64,
    pub(crate) capacity: usize,
    pub(crate) lookups: u64,
    pub(crate) threads: usize,
    pub(crate) skew: f64,
    pub(crate) namespaces: u64,
    pub(crate) seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SimReport {
    pub(crate) lookups: u64,
    pub(crate) evictions: u64,
    pub(crate) hit_ratio: f64,
    pub(crate) engine: EngineStats,
    pub(crate) status: String,
}

/// A cache host that reports every lookup through its hook registry.
///
/// Resident items live in their namespace's [`ShadowTree`]. When a namespace
/// goes over capacity the resident with the highest score is turned into a
/// shadow; rewards subtract, so that is the least useful item.
pub(crate) struct SimHost {
    namespaces: Namespaces,
    hooks: Arc<HookRegistry>,
    status: Arc<StatusRegistry>,
    capacity: usize,
    // Installs and evictions are serialized; lookups are not.
    installs: Mutex<()>,
    evictions: AtomicU64,
}

impl SimHost {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            namespaces: Namespaces::new(),
            hooks: Arc::new(HookRegistry::new()),
            status: Arc::new(StatusRegistry::new()),
            capacity,
            installs: Mutex::new(()),
            evictions: AtomicU64::new(0),
        }
    }

    pub(crate) fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    pub(crate) fn status(&self) -> &Arc<StatusRegistry> {
        &self.status
    }

    pub(crate) fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Look `key` up in `namespace`, installing it on a miss. Returns whether
    /// it hit.
    pub(crate) fn lookup(&self, namespace: NamespaceId, key: ItemKey) -> bool {
        let tree = self.namespaces.get_or_create(namespace);
        let collection: &dyn ItemCollection = tree.as_ref();

        if let Some(item) = tree
            .get(key)
            .filter(|item| item.residency() == Residency::Resident)
        {
            self.hooks.fire(&LookupEvent::hit(&item, Some(collection)));
            return true;
        }

        let item = Arc::new(CachedItem::new(key));
        self.hooks.fire(&LookupEvent::miss(&item, Some(collection)));
        self.install(&tree, item);
        false
    }

    fn install(&self, tree: &ShadowTree, item: Arc<CachedItem>) {
        let _guard = self.installs.lock();
        let key = item.key();
        tree.begin_install(key);
        tree.complete_install(item);

        let residents = tree.items_in(Residency::Resident);
        if residents.len() <= self.capacity {
            return;
        }
        let victim = residents
            .iter()
            .filter(|resident| resident.key() != key)
            .max_by_key(|resident| resident.score());
        if let Some(victim) = victim {
            tree.evict_to_shadow(victim.key());
            self.evictions.fetch_add(1, Ordering::Relaxed);
            trace!(item = %victim.key(), score = victim.score(), "evicted to shadow");
        }
    }
}

/// Draw a key in `0..items`, biased towards low keys as `skew` grows.
fn sample_key(rng: &mut impl Rng, items: u64, skew: f64) -> u64 {
    let u: f64 = rng.random();
    let key = (items as f64 * u.powf(skew)) as u64;
    key.min(items.saturating_sub(1))
}

/// Run a workload against a fresh engine.
pub(crate) fn simulate(workload: Workload, config: EngineConfig) -> Result<SimReport> {
    let host = SimHost::new(workload.capacity);
    let engine = Arc::new(Engine::new(config));
    let service = MlCacheService::start(
        Arc::clone(&engine),
        Arc::clone(host.hooks()),
        Arc::clone(host.status()),
    )
    .wrap_err("failed to start scoring service")?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workload.threads)
        .build()
        .wrap_err("failed to build worker pool")?;

    info!(
        items = workload.items,
        capacity = workload.capacity,
        lookups = workload.lookups,
        threads = workload.threads,
        "starting simulation"
    );

    let threads = workload.threads as u64;
    pool.install(|| {
        (0..threads).into_par_iter().for_each(|worker| {
            let mut rng = StdRng::seed_from_u64(workload.seed.wrapping_add(worker));
            let quota = workload.lookups / threads + u64::from(worker < workload.lookups % threads);
            for _ in 0..quota {
                let key = sample_key(&mut rng, workload.items, workload.skew);
                let namespace = NamespaceId(key % workload.namespaces);
                host.lookup(namespace, ItemKey(key));
            }
            debug!(worker, quota, "worker done");
        });
    });

    let status = host
        .status()
        .read(STATUS_ENTRY)
        .wrap_err("failed to read status entry")?;
    let stats = engine.stats();
    let lookups = stats.hits + stats.misses;
    let report = SimReport {
        lookups,
        evictions: host.evictions(),
        hit_ratio: if lookups == 0 {
            0.0
        } else {
            stats.hits as f64 / lookups as f64
        },
        engine: stats,
        status,
    };

    service.stop().wrap_err("failed to stop scoring service")?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Workload {
        Workload {
            items: 64,
            capacity: 8,
            lookups: 2_000,
            threads: 2,
            skew: 2.0,
            namespaces: 2,
            seed: 7,
        }
    }

    #[test]
    fn test_second_lookup_hits() {
        let host = SimHost::new(4);
        let engine = Arc::new(Engine::default());
        let _service = MlCacheService::start(
            Arc::clone(&engine),
            Arc::clone(host.hooks()),
            Arc::clone(host.status()),
        )
        .unwrap();

        assert!(!host.lookup(NamespaceId(0), ItemKey(1)));
        assert!(host.lookup(NamespaceId(0), ItemKey(1)));
        assert_eq!(engine.hits(), 1);
        assert_eq!(engine.misses(), 1);
    }

    #[test]
    fn test_eviction_keeps_capacity_and_shadow() {
        let host = SimHost::new(1);
        let engine = Arc::new(Engine::default());
        let _service = MlCacheService::start(
            Arc::clone(&engine),
            Arc::clone(host.hooks()),
            Arc::clone(host.status()),
        )
        .unwrap();
        let ns = NamespaceId(0);

        host.lookup(ns, ItemKey(1));
        host.lookup(ns, ItemKey(2));

        let tree = host.namespaces.get(ns).unwrap();
        assert_eq!(tree.items_in(Residency::Resident).len(), 1);
        let shadows = tree.items_in(Residency::Shadow);
        assert_eq!(shadows.len(), 1);
        assert_eq!(shadows[0].key(), ItemKey(1));
        assert_eq!(host.evictions(), 1);

        // Missing the evicted key brings it back as resident.
        assert!(!host.lookup(ns, ItemKey(1)));
        let item = tree.get(ItemKey(1)).unwrap();
        assert_eq!(item.residency(), Residency::Resident);
    }

    #[test]
    fn test_simulate_counts_every_lookup() {
        let report = simulate(workload(), EngineConfig::default()).unwrap();

        assert_eq!(report.lookups, 2_000);
        assert_eq!(report.engine.round, 2_000);
        assert!(report.hit_ratio > 0.0 && report.hit_ratio < 1.0);
        assert_eq!(
            report.status,
            format!(
                "Hits: {} | Misses: {}\n",
                report.engine.hits, report.engine.misses
            )
        );
    }

    #[test]
    fn test_simulate_counters_only() {
        let report = simulate(workload(), EngineConfig::counters_only()).unwrap();
        assert_eq!(report.lookups, 2_000);
        assert_eq!(report.engine.round, 0);
        assert_eq!(report.engine.weighted_average, 0);
    }

    #[test]
    fn test_sample_key_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            assert!(sample_key(&mut rng, 10, 3.0) < 10);
        }
        assert_eq!(sample_key(&mut rng, 1, 1.0), 0);
    }
}
