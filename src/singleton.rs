//! A single lazily constructed instance, usable as a `static`.

use std::any::type_name;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::slot::{InitError, KeyState, Outcome, Slot};
use crate::{CreateError, RegistryError};

/// One lazily constructed `Arc<T>` with the same guarantees as a registry
/// key: at most one successful construction, lock-free reads once set,
/// retry after a failed factory, and re-entrancy reported as an error.
///
/// # Examples
///
/// ```
/// use lazy_singleton_registry::Singleton;
/// use std::sync::Arc;
///
/// struct Pool { size: usize }
///
/// static POOL: Singleton<Pool> = Singleton::new();
///
/// let a = POOL.get_or_init(|| Pool { size: 8 }).unwrap();
/// let b = POOL.get_or_init(|| Pool { size: 1 }).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(b.size, 8);
/// ```
pub struct Singleton<T> {
    slot: Slot<T>,
}

impl<T> Singleton<T> {
    pub const fn new() -> Self {
        Self { slot: Slot::new() }
    }

    pub fn get_or_init(&self, factory: impl FnOnce() -> T) -> Result<Arc<T>, RegistryError> {
        self.try_get_or_init(|| Ok::<_, Infallible>(factory()))
            .map_err(|err| match err {
                CreateError::Construction(never) => match never {},
                CreateError::Registry(err) => err,
            })
    }

    /// Fallible form of [`get_or_init`](Self::get_or_init).
    pub fn try_get_or_init<E>(
        &self,
        factory: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, CreateError<E>> {
        let result = self.slot.get_or_try_init(None, || factory().map(Arc::new));

        match result {
            Ok((value, outcome)) => {
                if outcome == Outcome::Constructed {
                    debug!(target: "lazy_singleton_registry", singleton = type_name::<T>(), "instance published");
                }
                Ok(value)
            }
            Err(InitError::Factory(err)) => {
                warn!(target: "lazy_singleton_registry", singleton = type_name::<T>(), "factory failed, left unset");
                Err(CreateError::Construction(err))
            }
            Err(InitError::Reentrant) => Err(RegistryError::Reentrant {
                key: type_name::<T>().to_string(),
            }
            .into()),
            // No bounded wait is configured for a bare singleton.
            Err(InitError::Timeout(waited)) => Err(RegistryError::Timeout {
                key: type_name::<T>().to_string(),
                waited,
            }
            .into()),
        }
    }

    /// The published instance, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.get().cloned()
    }

    pub fn state(&self) -> KeyState {
        self.slot.state()
    }
}

impl<T> Default for Singleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("value", &self.slot.get())
            .finish()
    }
}
