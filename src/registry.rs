//! Keyed lazy singletons.
//!
//! [`LazyRegistry`] maps each key to at most one lazily constructed instance.
//! The factory for a key runs at most once successfully over the registry's
//! lifetime, even when many threads hit a cold key at the same moment.
//!
//! # Examples
//!
//! ```
//! use lazy_singleton_registry::LazyRegistry;
//! use std::sync::Arc;
//!
//! let registry: LazyRegistry<&str, String> = LazyRegistry::new();
//!
//! let a = registry.get_or_create(&"A", || "first".to_string()).unwrap();
//! let b = registry.get_or_create(&"A", || "second".to_string()).unwrap();
//!
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(&*b, "first");
//! ```
//!
//! # Layout
//!
//! The key map is a persistent hash trie (`rpds::HashTrieMapSync`) behind an
//! `ArcSwap`, so lookups never lock. Adding a key takes a registry-wide
//! mutex, re-checks, and publishes a new trie that shares all but one path
//! with the old one: O(log n) per insert, and the mutex is never held
//! across a factory call. Construction itself is serialized per key by the
//! slot, so two cold keys build in parallel.

use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::Mutex;
use rpds::HashTrieMapSync;
use tracing::{debug, trace, warn};

use crate::slot::{InitError, KeyState, Outcome, Slot};
use crate::{CreateError, RegistryError, RegistryEvent, RegistryOptions};

/// Anything usable as a registry key.
///
/// Equality and hashing must stay stable while the key is in a registry.
/// Keys that are not hashable or comparable are rejected by the compiler.
pub trait RegistryKey: Eq + Hash + Clone + fmt::Debug {}

impl<T: Eq + Hash + Clone + fmt::Debug> RegistryKey for T {}

/// The user-supplied tracing callback.
///
/// It runs on the calling thread, with no registry lock held except the
/// construction guard of the key during a `Construct` event.
pub type TraceCallback = dyn Fn(&RegistryEvent<'_>) + Send + Sync + 'static;

struct Tracer(Box<TraceCallback>);

type SlotMap<K, V> = HashTrieMapSync<K, Arc<Slot<V>>>;

/// A registry of lazily constructed, never replaced, per-key instances.
///
/// Create one at startup and share it by reference, or put it in a
/// `static` via [`define_registry!`](crate::define_registry) for the
/// type-keyed flavour.
pub struct LazyRegistry<K, V: ?Sized> {
    slots: ArcSwap<SlotMap<K, V>>,
    insert_lock: Mutex<()>,
    trace: ArcSwapOption<Tracer>,
    options: RegistryOptions,
}

impl<K: Eq + Hash, V: ?Sized> LazyRegistry<K, V> {
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            slots: ArcSwap::from_pointee(HashTrieMapSync::new_sync()),
            insert_lock: Mutex::new(()),
            trace: ArcSwapOption::empty(),
            options,
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Set a callback invoked for every registry event.
    ///
    /// Replaces any previous callback. Emitting never takes a lock, so the
    /// callback may itself use the registry.
    pub fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent<'_>) + Send + Sync + 'static) {
        self.trace.store(Some(Arc::new(Tracer(Box::new(callback)))));
    }

    pub fn clear_trace_callback(&self) {
        self.trace.store(None);
    }

    fn emit(&self, event: RegistryEvent<'_>) {
        let guard = self.trace.load();
        if let Some(tracer) = &*guard {
            (tracer.0)(&event);
        }
    }
}

impl<K: RegistryKey, V: ?Sized> LazyRegistry<K, V> {
    /// Return the instance for `key`, constructing it with `factory` if no
    /// instance has been published yet.
    ///
    /// `factory` returns an `Arc` so unsized values (`dyn Trait`) can be stored.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Reentrant`] if called from inside the factory of `key`
    /// - [`RegistryError::Timeout`] if a bounded wait was configured and expired
    pub fn get_or_create_arc(
        &self,
        key: &K,
        factory: impl FnOnce() -> Arc<V>,
    ) -> Result<Arc<V>, RegistryError> {
        self.try_get_or_create_arc(key, || Ok::<_, Infallible>(factory()))
            .map_err(|err| match err {
                CreateError::Construction(never) => match never {},
                CreateError::Registry(err) => err,
            })
    }

    /// Fallible form of [`get_or_create_arc`](Self::get_or_create_arc).
    ///
    /// A factory error is returned verbatim to this caller only. The key goes
    /// back to unset and the next caller, on any thread, runs its own factory.
    /// Callers that were queued behind the failed attempt each retry in turn;
    /// at most one attempt per key is in flight at any instant.
    pub fn try_get_or_create_arc<E>(
        &self,
        key: &K,
        factory: impl FnOnce() -> Result<Arc<V>, E>,
    ) -> Result<Arc<V>, CreateError<E>> {
        let slot = self.slot(key);

        let result = slot.get_or_try_init(self.options.wait_timeout, || {
            debug!(target: "lazy_singleton_registry", key = ?key, "constructing instance");
            self.emit(RegistryEvent::Construct { key });
            factory()
        });

        match result {
            Ok((value, Outcome::Cached)) => {
                trace!(target: "lazy_singleton_registry", key = ?key, "cache hit");
                self.emit(RegistryEvent::Hit { key });
                Ok(value)
            }
            Ok((value, Outcome::Joined)) => {
                trace!(target: "lazy_singleton_registry", key = ?key, "joined concurrent construction");
                self.emit(RegistryEvent::Joined { key });
                Ok(value)
            }
            Ok((value, Outcome::Constructed)) => {
                debug!(target: "lazy_singleton_registry", key = ?key, "instance published");
                self.emit(RegistryEvent::Publish { key });
                Ok(value)
            }
            Err(InitError::Factory(err)) => {
                warn!(target: "lazy_singleton_registry", key = ?key, "factory failed, key left unset");
                self.emit(RegistryEvent::Fail { key });
                Err(CreateError::Construction(err))
            }
            Err(InitError::Reentrant) => {
                warn!(target: "lazy_singleton_registry", key = ?key, "factory requested its own key");
                self.emit(RegistryEvent::Fail { key });
                Err(RegistryError::Reentrant {
                    key: format!("{key:?}"),
                }
                .into())
            }
            Err(InitError::Timeout(waited)) => {
                warn!(target: "lazy_singleton_registry", key = ?key, ?waited, "timed out waiting for construction");
                self.emit(RegistryEvent::Fail { key });
                Err(RegistryError::Timeout {
                    key: format!("{key:?}"),
                    waited,
                }
                .into())
            }
        }
    }

    /// The published instance for `key`, if any. Never constructs, never blocks.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let found = self
            .slots
            .load()
            .get(key)
            .and_then(|slot| slot.get().cloned());

        self.emit(RegistryEvent::Peek {
            key,
            found: found.is_some(),
        });

        found
    }

    pub fn contains(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// Current lifecycle state of `key`.
    pub fn state(&self, key: &K) -> KeyState {
        self.slots
            .load()
            .get(key)
            .map_or(KeyState::Unset, |slot| slot.state())
    }

    /// Number of published instances.
    pub fn len(&self) -> usize {
        self.slots
            .load()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find or insert the slot for `key`.
    fn slot(&self, key: &K) -> Arc<Slot<V>> {
        if let Some(slot) = self.slots.load().get(key) {
            return Arc::clone(slot);
        }

        let _insert = self.insert_lock.lock();
        let current = self.slots.load_full();
        if let Some(slot) = current.get(key) {
            return Arc::clone(slot);
        }

        let slot = Arc::new(Slot::new());
        let next = current.insert(key.clone(), Arc::clone(&slot));
        self.slots.store(Arc::new(next));
        slot
    }
}

impl<K: RegistryKey, V> LazyRegistry<K, V> {
    /// Return the instance for `key`, constructing it with `factory` on first use.
    ///
    /// # Errors
    ///
    /// See [`get_or_create_arc`](Self::get_or_create_arc).
    pub fn get_or_create(
        &self,
        key: &K,
        factory: impl FnOnce() -> V,
    ) -> Result<Arc<V>, RegistryError> {
        self.get_or_create_arc(key, || Arc::new(factory()))
    }

    /// Fallible form of [`get_or_create`](Self::get_or_create).
    pub fn try_get_or_create<E>(
        &self,
        key: &K,
        factory: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, CreateError<E>> {
        self.try_get_or_create_arc(key, || factory().map(Arc::new))
    }
}

impl<K: Eq + Hash, V: ?Sized> Default for LazyRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RegistryKey, V: ?Sized> fmt::Debug for LazyRegistry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRegistry")
            .field("len", &self.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
