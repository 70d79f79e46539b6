//! Per-key construction state.
//!
//! A slot moves `Unset -> Constructing -> Set`. `Set` is terminal: the
//! published `Arc` is never replaced. `Constructing` falls back to `Unset`
//! when the factory returns an error or panics, so the next caller retries.
//!
//! # Concurrency
//!
//! * The published value lives in a `OnceLock`, so the fast path is a single
//!   acquire load with no lock taken.
//! * Construction is serialized by a per-slot `parking_lot::Mutex<()>`. A
//!   caller that loses the race blocks there, then re-checks the cell before
//!   running its own factory. That second check is what makes at most one
//!   factory succeed per slot.
//! * The thread holding the construction lock records itself in `owner`.
//!   A factory that asks for its own slot sees its own id there and gets
//!   `Reentrant` instead of deadlocking on a mutex it already holds.
//! * `parking_lot` mutexes are released on unwind and never poisoned, so a
//!   panicking factory leaves the slot `Unset` and usable.

use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::{const_mutex, Mutex, MutexGuard};

/// Observable lifecycle of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// No instance, nobody constructing.
    Unset,
    /// Some thread holds the guard and is running the factory.
    Constructing,
    /// Published. Terminal.
    Set,
}

/// How a successful lookup obtained its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Found on the lock-free path.
    Cached,
    /// Found after waiting on the guard behind another constructor.
    Joined,
    /// This caller ran the factory.
    Constructed,
}

#[derive(Debug)]
pub(crate) enum InitError<E> {
    Reentrant,
    Timeout(Duration),
    Factory(E),
}

pub(crate) struct Slot<V: ?Sized> {
    value: OnceLock<Arc<V>>,
    construction: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

impl<V: ?Sized> Slot<V> {
    pub(crate) const fn new() -> Self {
        Self {
            value: OnceLock::new(),
            construction: const_mutex(()),
            owner: const_mutex(None),
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&Arc<V>> {
        self.value.get()
    }

    /// Snapshot of the slot's state. Anything other than `Set` may be stale
    /// by the time the caller looks at it.
    pub(crate) fn state(&self) -> KeyState {
        if self.value.get().is_some() {
            KeyState::Set
        } else if self.construction.is_locked() {
            KeyState::Constructing
        } else {
            KeyState::Unset
        }
    }

    /// Double-checked lazy construction.
    ///
    /// `wait` bounds the time spent blocked behind another constructor; on
    /// expiry the slot is left exactly as the current holder has it.
    pub(crate) fn get_or_try_init<E>(
        &self,
        wait: Option<Duration>,
        init: impl FnOnce() -> Result<Arc<V>, E>,
    ) -> Result<(Arc<V>, Outcome), InitError<E>> {
        if let Some(value) = self.value.get() {
            return Ok((Arc::clone(value), Outcome::Cached));
        }

        let me = thread::current().id();
        if *self.owner.lock() == Some(me) {
            return Err(InitError::Reentrant);
        }

        let _construction = self.acquire(wait)?;

        // Someone else may have published while we were queued.
        if let Some(value) = self.value.get() {
            return Ok((Arc::clone(value), Outcome::Joined));
        }

        let _owner = OwnerGuard::claim(&self.owner, me);
        let value = init().map_err(InitError::Factory)?;

        // We hold the construction guard and saw the cell empty, so this
        // always stores `value`.
        let published = self.value.get_or_init(|| value);
        Ok((Arc::clone(published), Outcome::Constructed))
    }

    fn acquire<E>(&self, wait: Option<Duration>) -> Result<MutexGuard<'_, ()>, InitError<E>> {
        match wait {
            None => Ok(self.construction.lock()),
            Some(limit) => self
                .construction
                .try_lock_for(limit)
                .ok_or(InitError::Timeout(limit)),
        }
    }
}

/// Marks the current thread as the constructor for the lifetime of the guard.
struct OwnerGuard<'a> {
    owner: &'a Mutex<Option<ThreadId>>,
}

impl<'a> OwnerGuard<'a> {
    fn claim(owner: &'a Mutex<Option<ThreadId>>, me: ThreadId) -> Self {
        *owner.lock() = Some(me);
        Self { owner }
    }
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        *self.owner.lock() = None;
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Barrier};

    fn ok<V>(v: V) -> Result<Arc<V>, ()> {
        Ok(Arc::new(v))
    }

    #[test]
    fn test_first_call_constructs_second_is_cached() {
        let slot: Slot<u32> = Slot::new();
        assert_eq!(slot.state(), KeyState::Unset);

        let (first, outcome) = slot.get_or_try_init(None, || ok(1)).unwrap();
        assert_eq!(outcome, Outcome::Constructed);
        assert_eq!(slot.state(), KeyState::Set);

        let (second, outcome) = slot.get_or_try_init(None, || ok(2)).unwrap();
        assert_eq!(outcome, Outcome::Cached);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 1);
    }

    #[test]
    fn test_factory_error_leaves_slot_unset() {
        let slot: Slot<u32> = Slot::new();

        let err = slot
            .get_or_try_init(None, || Err::<Arc<u32>, _>("boom"))
            .unwrap_err();
        assert!(matches!(err, InitError::Factory("boom")));
        assert_eq!(slot.state(), KeyState::Unset);
        assert!(slot.get().is_none());

        let (value, outcome) = slot.get_or_try_init(None, || ok(9)).unwrap();
        assert_eq!(outcome, Outcome::Constructed);
        assert_eq!(*value, 9);
    }

    #[test]
    fn test_factory_panic_leaves_slot_unset() {
        let slot: Slot<String> = Slot::new();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = slot.get_or_try_init(None, || -> Result<Arc<String>, ()> {
                panic!("factory exploded")
            });
        }));
        assert!(result.is_err());
        assert_eq!(slot.state(), KeyState::Unset);

        let (value, _) = slot
            .get_or_try_init(None, || ok("recovered".to_string()))
            .unwrap();
        assert_eq!(&*value, "recovered");
    }

    #[test]
    fn test_reentrant_request_is_refused() {
        let slot: Slot<u32> = Slot::new();

        let outer = slot.get_or_try_init(None, || {
            let inner = slot.get_or_try_init(None, || ok(2));
            assert!(matches!(inner, Err(InitError::Reentrant)));
            Err::<Arc<u32>, _>("inner refused")
        });

        assert!(matches!(outer, Err(InitError::Factory("inner refused"))));
        assert_eq!(slot.state(), KeyState::Unset);
    }

    #[test]
    fn test_bounded_wait_times_out_without_touching_state() {
        let slot: Arc<Slot<u32>> = Arc::new(Slot::new());
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                slot.get_or_try_init(None, || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    ok(5)
                })
                .map(|(v, _)| *v)
                .map_err(|_| ())
            })
        };

        started_rx.recv().unwrap();
        assert_eq!(slot.state(), KeyState::Constructing);

        let limit = Duration::from_millis(20);
        let err = slot.get_or_try_init(Some(limit), || ok(6)).unwrap_err();
        assert!(matches!(err, InitError::Timeout(d) if d == limit));
        assert_eq!(slot.state(), KeyState::Constructing);

        release_tx.send(()).unwrap();
        assert_eq!(holder.join().unwrap(), Ok(5));
        assert_eq!(slot.state(), KeyState::Set);
        assert_eq!(**slot.get().unwrap(), 5);
    }

    #[test]
    fn test_waiter_behind_constructor_does_not_construct() {
        let slot: Arc<Slot<u32>> = Arc::new(Slot::new());
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                let (v, _) = slot
                    .get_or_try_init(None, || {
                        started_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                        ok(1)
                    })
                    .unwrap();
                v
            })
        };
        started_rx.recv().unwrap();

        let waiter = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.get_or_try_init(None, || ok(2)).unwrap())
        };

        thread::sleep(Duration::from_millis(20));
        release_tx.send(()).unwrap();

        let constructed = holder.join().unwrap();
        let (joined, outcome) = waiter.join().unwrap();
        assert_ne!(outcome, Outcome::Constructed);
        assert!(Arc::ptr_eq(&constructed, &joined));
        assert_eq!(*joined, 1);
    }

    #[test]
    fn test_concurrent_first_access_runs_one_factory() {
        const THREADS: usize = 32;
        let slot: Slot<usize> = Slot::new();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);

        let values: Vec<Arc<usize>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let (slot, calls, barrier) = (&slot, &calls, &barrier);
                    s.spawn(move || {
                        barrier.wait();
                        let (v, _) = slot
                            .get_or_try_init(None, || {
                                calls.fetch_add(1, Ordering::SeqCst);
                                ok(i)
                            })
                            .unwrap();
                        v
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }
}
