//! Engine lifecycle against a host's hook and status registries.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::STATUS_ENTRY;
use crate::engine::Engine;
use crate::hook::{HookError, HookId, HookRegistry};
use crate::status::{EngineStatus, StatusError, StatusRegistry};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("status entry: {0}")]
    Status(#[from] StatusError),
    #[error("lookup hook: {0}")]
    Hook(#[from] HookError),
}

/// A running engine, attached to a host.
///
/// Dropping the service detaches it the same way [`MlCacheService::stop`] does,
/// ignoring errors.
#[derive(Debug)]
pub struct MlCacheService {
    engine: Arc<Engine>,
    hooks: Arc<HookRegistry>,
    status: Arc<StatusRegistry>,
    hook_id: Option<HookId>,
}

impl MlCacheService {
    /// Publish the engine's status entry, zero it and start receiving lookups.
    ///
    /// Fails without registering or resetting anything if the status entry
    /// cannot be created.
    pub fn start(
        engine: Arc<Engine>,
        hooks: Arc<HookRegistry>,
        status: Arc<StatusRegistry>,
    ) -> Result<Self, ServiceError> {
        let surface = Arc::new(EngineStatus::new(Arc::clone(&engine)));
        if let Err(err) = status.create(STATUS_ENTRY, surface) {
            warn!(entry = STATUS_ENTRY, %err, "failed to create status entry");
            return Err(err.into());
        }
        engine.reset();

        let hook_id = hooks.register(engine.clone());
        debug!(scoring = engine.scoring_enabled(), "mlcache service started");

        Ok(Self {
            engine,
            hooks,
            status,
            hook_id: Some(hook_id),
        })
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.hook_id.is_some()
    }

    /// Remove the status entry and the hook, waiting for in-flight lookups.
    pub fn stop(mut self) -> Result<(), ServiceError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), ServiceError> {
        let Some(hook_id) = self.hook_id.take() else {
            return Ok(());
        };

        let status = self.status.remove(STATUS_ENTRY);
        let hook = self.hooks.unregister(hook_id);
        debug!(
            hits = self.engine.hits(),
            misses = self.engine.misses(),
            "mlcache service stopped"
        );

        status?;
        hook?;
        Ok(())
    }
}

impl Drop for MlCacheService {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(%err, "mlcache service shutdown failed");
        }
    }
}
