//! Registry of per-namespace collections.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tree::ShadowTree;

/// Identifies one logical namespace (e.g. one file or object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceId(pub u64);

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns{}", self.0)
    }
}

/// Namespaces tracked by the host, each with its own collection.
///
/// Lookups use double-checked locking: a read guard on the fast path, the
/// write guard only the first time a namespace is seen.
#[derive(Debug)]
pub struct Namespaces<C = ShadowTree> {
    collections: RwLock<HashMap<NamespaceId, Arc<C>>>,
}

impl<C> Default for Namespaces<C> {
    fn default() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl<C: Default> Namespaces<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the collection for a namespace.
    pub fn get_or_create(&self, namespace: NamespaceId) -> Arc<C> {
        if let Some(collection) = self.collections.read().get(&namespace) {
            return Arc::clone(collection);
        }

        self.collections
            .write()
            .entry(namespace)
            .or_insert_with(|| {
                debug!(%namespace, "tracking new namespace");
                Arc::new(C::default())
            })
            .clone()
    }
}

impl<C> Namespaces<C> {
    /// The collection for a namespace, if it is tracked.
    pub fn get(&self, namespace: NamespaceId) -> Option<Arc<C>> {
        self.collections.read().get(&namespace).cloned()
    }

    /// Stop tracking a namespace.
    pub fn remove(&self, namespace: NamespaceId) -> Option<Arc<C>> {
        self.collections.write().remove(&namespace)
    }

    pub fn namespaces(&self) -> Vec<NamespaceId> {
        let mut ids: Vec<_> = self.collections.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.collections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.read().is_empty()
    }
}
