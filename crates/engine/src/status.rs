//! Named, read-mostly status entries exposed by the host.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use auto_impl::auto_impl;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::engine::Engine;

/// A readable status entry.
///
/// Writes are accepted and ignored unless an implementation says otherwise.
#[auto_impl(&, Box, Arc)]
pub trait StatusSurface: Send + Sync {
    fn read(&self) -> String;

    /// Consume a write, returning the number of bytes accepted.
    fn write(&self, buf: &[u8]) -> usize {
        buf.len()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("status entry `{0}` already exists")]
    AlreadyExists(String),
    #[error("status entry `{0}` not found")]
    NotFound(String),
    #[error("invalid status entry name")]
    InvalidName,
}

/// Host-side table of status entries.
#[derive(Default)]
pub struct StatusRegistry {
    entries: RwLock<HashMap<String, Arc<dyn StatusSurface>>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, name: &str, surface: Arc<dyn StatusSurface>) -> Result<(), StatusError> {
        if name.is_empty() || name.contains('/') {
            return Err(StatusError::InvalidName);
        }

        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            return Err(StatusError::AlreadyExists(name.to_string()));
        }
        entries.insert(name.to_string(), surface);
        debug!(name, "status entry created");
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<(), StatusError> {
        if self.entries.write().remove(name).is_none() {
            return Err(StatusError::NotFound(name.to_string()));
        }
        debug!(name, "status entry removed");
        Ok(())
    }

    pub fn read(&self, name: &str) -> Result<String, StatusError> {
        let surface = self.get(name)?;
        Ok(surface.read())
    }

    pub fn write(&self, name: &str, buf: &[u8]) -> Result<usize, StatusError> {
        let surface = self.get(name)?;
        Ok(surface.write(buf))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Entry names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    // The surface is cloned out so reads never run under the table lock.
    fn get(&self, name: &str) -> Result<Arc<dyn StatusSurface>, StatusError> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StatusError::NotFound(name.to_string()))
    }
}

impl fmt::Debug for StatusRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusRegistry")
            .field("entries", &self.names())
            .finish()
    }
}

/// Hit/miss status text for an engine.
#[derive(Debug, Clone)]
pub struct EngineStatus(Arc<Engine>);

impl EngineStatus {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self(engine)
    }
}

impl StatusSurface for EngineStatus {
    fn read(&self) -> String {
        format!("Hits: {} | Misses: {}\n", self.0.hits(), self.0.misses())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlcache_collection::ShadowTree;
    use mlcache_score::{CachedItem, ItemKey};

    struct Fixed(&'static str);

    impl StatusSurface for Fixed {
        fn read(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_create_read_remove() {
        let registry = StatusRegistry::new();
        registry.create("fixed", Arc::new(Fixed("ok"))).unwrap();

        assert!(registry.contains("fixed"));
        assert_eq!(registry.read("fixed").unwrap(), "ok");
        assert_eq!(registry.names(), vec!["fixed".to_string()]);

        registry.remove("fixed").unwrap();
        assert_eq!(
            registry.read("fixed"),
            Err(StatusError::NotFound("fixed".to_string()))
        );
        assert_eq!(
            registry.remove("fixed"),
            Err(StatusError::NotFound("fixed".to_string()))
        );
    }

    #[test]
    fn test_create_duplicate() {
        let registry = StatusRegistry::new();
        registry.create("fixed", Arc::new(Fixed("a"))).unwrap();

        let err = registry.create("fixed", Arc::new(Fixed("b"))).unwrap_err();
        assert_eq!(err, StatusError::AlreadyExists("fixed".to_string()));
        assert_eq!(registry.read("fixed").unwrap(), "a");
    }

    #[test]
    fn test_invalid_names() {
        let registry = StatusRegistry::new();
        assert_eq!(
            registry.create("", Arc::new(Fixed("a"))),
            Err(StatusError::InvalidName)
        );
        assert_eq!(
            registry.create("a/b", Arc::new(Fixed("a"))),
            Err(StatusError::InvalidName)
        );
    }

    #[test]
    fn test_write_is_ignored() {
        let registry = StatusRegistry::new();
        registry.create("fixed", Arc::new(Fixed("a"))).unwrap();

        assert_eq!(registry.write("fixed", b"reset").unwrap(), 5);
        assert_eq!(registry.read("fixed").unwrap(), "a");
    }

    #[test]
    fn test_engine_status_text() {
        let engine = Arc::new(Engine::default());
        let status = EngineStatus::new(Arc::clone(&engine));
        assert_eq!(status.read(), "Hits: 0 | Misses: 0\n");

        let item = CachedItem::new(ItemKey(1));
        engine.on_lookup::<ShadowTree>(&item, None, true);
        engine.on_lookup::<ShadowTree>(&item, None, true);
        engine.on_lookup::<ShadowTree>(&item, None, false);

        assert_eq!(status.read(), "Hits: 2 | Misses: 1\n");
        assert_eq!(status.write(b"anything"), 8);
        assert_eq!(status.read(), "Hits: 2 | Misses: 1\n");
    }
}
