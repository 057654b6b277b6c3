use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A shared, lock-protected value that can be handed to several owners.
///
/// The engine itself keeps its world state single-owner, so this container is
/// only used where state is legitimately observed from outside the engine,
/// such as the bookkeeping of the headless scene backend that tests inspect
/// while the engine drives it.
///
/// A poisoned lock is recovered rather than propagated.
///
/// # Type Parameters
/// - `T`: The contained value, must be `Send + Sync`
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Wraps `resource` in a new shared container.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard; several readers may hold one at a time.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an exclusive write guard.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync + Default + 'static> Default for MtResource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_the_value() {
        let counter = MtResource::new(0u32);
        let remote = counter.clone();

        thread::spawn(move || {
            *remote.get_mut() += 1;
        })
        .join()
        .unwrap();

        assert_eq!(*counter.get(), 1);
    }
}
