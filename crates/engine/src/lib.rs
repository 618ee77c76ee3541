//! Feedback-driven cache scoring engine.
//!
//! The host reports every lookup to an [`Engine`] through a [`LookupHook`].
//! Hits reward the item; misses scan the item's namespace for its shadow entry
//! and either seed the item from the running average, recompute its bonus, or
//! penalize every sibling shadow when the eviction proved wrong.
//!
//! [`MlCacheService`] attaches an engine to a host's [`HookRegistry`] and
//! [`StatusRegistry`], exposing hit/miss counters as the `mlcache_stats` entry.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use mlcache_engine::{Engine, HookRegistry, LookupEvent, MlCacheService, StatusRegistry};
//! use mlcache_score::{CachedItem, ItemKey};
//!
//! let hooks = Arc::new(HookRegistry::new());
//! let status = Arc::new(StatusRegistry::new());
//! let service =
//!     MlCacheService::start(Arc::new(Engine::default()), hooks.clone(), status.clone()).unwrap();
//!
//! let item = CachedItem::new(ItemKey(7));
//! hooks.fire(&LookupEvent::hit(&item, None));
//! assert_eq!(status.read("mlcache_stats").unwrap(), "Hits: 1 | Misses: 0\n");
//!
//! service.stop().unwrap();
//! ```

mod args;
mod config;
pub mod constants;
mod engine;
mod hook;
mod metrics;
mod scanner;
mod service;
mod status;

pub use args::EngineArgs;
pub use config::EngineConfig;
pub use engine::{Engine, EngineStats, LookupOutcome};
pub use hook::{HookError, HookId, HookRegistry, LookupEvent, LookupHook};
pub use metrics::EngineMetrics;
pub use scanner::{CollectionScanner, ScanOutcome, ScanReport};
pub use service::{MlCacheService, ServiceError};
pub use status::{EngineStatus, StatusError, StatusRegistry, StatusSurface};
