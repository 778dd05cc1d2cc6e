use crate::{Registry, RegistryError, Snapshot};
use std::sync::{Arc, Mutex};

///
/// SharedRegistry
///
/// Mutex-guarded handle for builds that compose entities on several threads.
/// Each operation holds the lock for one check-append-apply cycle, so
/// concurrent callers observe a single total order of assignments.
///

#[derive(Clone, Debug)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SharedRegistry {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Run `f` with exclusive access to the registry.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut Registry) -> Result<R, RegistryError>,
    ) -> Result<R, RegistryError> {
        let mut guard = self.inner.lock().map_err(|_| RegistryError::Poisoned)?;

        f(&mut guard)
    }

    pub fn lookup(&self, name: &str) -> Result<Option<u32>, RegistryError> {
        self.with(|reg| Ok(reg.lookup(name)))
    }

    pub fn lookup_or_assign(&self, name: &str) -> Result<u32, RegistryError> {
        self.with(|reg| reg.lookup_or_assign(name))
    }

    pub fn retire(&self, name: &str) -> Result<u32, RegistryError> {
        self.with(|reg| reg.retire(name))
    }

    pub fn record_layout(&self, name: &str, hash: u64) -> Result<u32, RegistryError> {
        self.with(|reg| reg.record_layout(name, hash))
    }

    pub fn snapshot(&self) -> Result<Snapshot, RegistryError> {
        self.with(|reg| Ok(reg.snapshot()))
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

///
/// TESTS
///
