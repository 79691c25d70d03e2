use std::sync::{
    Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError,
};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is the handle through which chunks are shared between the
/// control thread, the worker pools, the cache cleaner and external listeners.
/// It wraps an `Arc<RwLock<T>>`; clones share the same value.
///
/// A panic while a guard is held poisons a plain `RwLock`. Chunk data stays
/// structurally valid across such a panic, so the guards returned here
/// recover the inner value instead of propagating the poison.
///
/// # Examples
///
/// ```
/// use voxel_chunks::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let counter_clone = counter.clone();
///
/// std::thread::spawn(move || {
///     *counter_clone.get_mut() += 1;
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(*counter.get(), 1);
/// ```
#[derive(Debug)]
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard, blocking while a writer holds the lock.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a write guard, blocking until every other guard is released.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a write guard only if the lock is free right now.
    ///
    /// The control thread uses this so it never waits on a worker that is
    /// still reading the same value.
    pub fn try_get_mut(&self) -> Option<RwLockWriteGuard<'_, T>> {
        match self.resource.try_write() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
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

    #[test]
    fn try_get_mut_fails_while_read_guard_is_held() {
        let resource = MtResource::new(5);
        let guard = resource.get();
        assert!(resource.try_get_mut().is_none());
        drop(guard);
        *resource.try_get_mut().unwrap() = 6;
        assert_eq!(*resource.get(), 6);
    }

    #[test]
    fn clones_share_identity() {
        let a = MtResource::new(String::from("chunk"));
        let b = a.clone();
        let c = MtResource::new(String::from("chunk"));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let resource = MtResource::new(1);
        let clone = resource.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.get_mut();
            panic!("poison the lock");
        })
        .join();
        *resource.get_mut() += 1;
        assert_eq!(*resource.get(), 2);
    }
}
