use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::InterfaceId;

/// Returned when a registry with a fixed capacity has no free slot for a new interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no free instance slot for {iface} (capacity {capacity})")]
pub struct RegistryFull {
    pub iface: InterfaceId,
    pub capacity: usize,
}

/// Per-interface instances, each behind its own mutex.
///
/// The map lock is only held long enough to clone the instance [`Arc`], so operations on
/// different interfaces never serialize on each other. All work on one instance is serialized by
/// that instance's [`Mutex`].
#[derive(Debug)]
pub struct InstanceRegistry<T> {
    instances: RwLock<FxHashMap<InterfaceId, Arc<Mutex<T>>>>,
    /// Maximum number of registered interfaces, if bounded.
    capacity: Option<usize>,
}

impl<T> Default for InstanceRegistry<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> InstanceRegistry<T> {
    /// Creates an empty registry, optionally bounded to `capacity` interfaces.
    pub fn new(capacity: Option<usize>) -> Self {
        Self { instances: RwLock::new(FxHashMap::default()), capacity }
    }

    /// Returns the instance registered for `iface`, if any.
    #[inline]
    pub fn get(&self, iface: InterfaceId) -> Option<Arc<Mutex<T>>> {
        self.instances.read().get(&iface).cloned()
    }

    /// Returns the instance for `iface`, creating it with `make` if it doesn't exist yet.
    ///
    /// The boolean is `true` if the instance was created by this call. Fails if the interface is
    /// new and the registry is at capacity.
    pub fn get_or_insert_with(
        &self,
        iface: InterfaceId,
        make: impl FnOnce() -> T,
    ) -> Result<(Arc<Mutex<T>>, bool), RegistryFull> {
        if let Some(instance) = self.get(iface) {
            return Ok((instance, false));
        }

        let mut instances = self.instances.write();

        // Someone else may have registered it between the two locks.
        if let Some(instance) = instances.get(&iface) {
            return Ok((Arc::clone(instance), false));
        }

        if let Some(capacity) = self.capacity {
            if instances.len() >= capacity {
                return Err(RegistryFull { iface, capacity });
            }
        }

        let instance = Arc::new(Mutex::new(make()));
        instances.insert(iface, Arc::clone(&instance));

        Ok((instance, true))
    }

    /// Unregisters the instance of `iface` and returns it.
    pub fn remove(&self, iface: InterfaceId) -> Option<Arc<Mutex<T>>> {
        self.instances.write().remove(&iface)
    }

    /// Returns the registered interfaces in ascending order.
    pub fn interfaces(&self) -> Vec<InterfaceId> {
        let mut ifaces: Vec<_> = self.instances.read().keys().copied().collect();
        ifaces.sort_unstable();
        ifaces
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
