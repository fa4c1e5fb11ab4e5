//! Process-wide predictor cache

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::config::ServingConfig;
use super::service::Predictor;
use crate::error::Result;

/// Lazily loaded predictor slot.
///
/// The first successful load is shared by every later caller until
/// [`ServingState::reset`] empties the slot; configuration, expected features
/// and pipeline are always replaced together.
#[derive(Debug)]
pub struct ServingState {
    slot: RwLock<Option<Arc<Predictor>>>,
}

impl Default for ServingState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServingState {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    // the slot holds no invariant a panicking reader could break
    fn read_slot(&self) -> RwLockReadGuard<'_, Option<Arc<Predictor>>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<Arc<Predictor>>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached predictor, loading it with `load` on first use.
    ///
    /// A failed load leaves the slot empty so the next call retries.
    pub fn get_or_load_with<F>(&self, load: F) -> Result<Arc<Predictor>>
    where
        F: FnOnce() -> Result<Predictor>,
    {
        {
            let slot = self.read_slot();
            if let Some(predictor) = slot.as_ref() {
                return Ok(Arc::clone(predictor));
            }
        }

        let mut slot = self.write_slot();
        if let Some(predictor) = slot.as_ref() {
            return Ok(Arc::clone(predictor));
        }
        let predictor = Arc::new(load()?);
        *slot = Some(Arc::clone(&predictor));
        Ok(predictor)
    }

    /// Return the cached predictor, loading it from the environment on first use.
    pub fn get_or_load(&self) -> Result<Arc<Predictor>> {
        self.get_or_load_with(|| Predictor::load(ServingConfig::from_env()?))
    }

    pub fn is_loaded(&self) -> bool {
        self.read_slot().is_some()
    }

    /// Drop the cached predictor; the next call reloads everything.
    pub fn reset(&self) {
        *self.write_slot() = None;
        tracing::debug!("serving cache reset");
    }
}

/// Cache behind the crate-level serving functions
pub static SERVING: ServingState = ServingState::new();
