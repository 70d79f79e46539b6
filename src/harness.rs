//! Thread-safety verification for [`LazyRegistry`].
//!
//! Every trial builds a fresh registry, parks `threads` callers per key on a
//! barrier, releases them together against the cold keys, and then checks:
//!
//! * every caller of a key got the same `Arc` (pointer identity),
//! * each key's factory ran exactly once,
//! * no two keys share an instance.

use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use tracing::{debug, info};

use crate::{LazyRegistry, RegistryError, RegistryKey};

/// How hard to hammer the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Concurrent callers per key in each trial. Values below 1 count as 1.
    pub threads: usize,
    /// Independent repetitions, each with a fresh registry.
    pub trials: usize,
}

impl HarnessConfig {
    pub const fn new(threads: usize, trials: usize) -> Self {
        Self { threads, trials }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(100, 100)
    }
}

/// One violated property in one trial.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrialFailure {
    #[error("trial {trial}: callers of key {key} received distinct instances")]
    DistinctInstances { trial: usize, key: String },

    #[error("trial {trial}: factory for key {key} ran {calls} times")]
    FactoryCalls {
        trial: usize,
        key: String,
        calls: usize,
    },

    #[error("trial {trial}: keys {first} and {second} share an instance")]
    SharedAcrossKeys {
        trial: usize,
        first: String,
        second: String,
    },

    #[error("trial {trial}: key {key}: {error}")]
    Registry {
        trial: usize,
        key: String,
        error: RegistryError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessReport {
    pub trials: usize,
    pub passed: usize,
    pub failures: Vec<TrialFailure>,
}

impl HarnessReport {
    pub fn is_success(&self) -> bool {
        self.passed == self.trials && self.failures.is_empty()
    }
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} trials passed", self.passed, self.trials)
    }
}

/// Race `config.threads` callers on key `"A"` in each trial.
///
/// ```
/// use lazy_singleton_registry::harness::{verify_single_instance, HarnessConfig};
///
/// let report = verify_single_instance(&HarnessConfig::new(8, 3), || vec![0u8; 16]);
/// assert!(report.is_success(), "{report}");
/// ```
pub fn verify_single_instance<V, F>(config: &HarnessConfig, factory: F) -> HarnessReport
where
    V: Send + Sync,
    F: Fn() -> V + Sync,
{
    verify_keys(config, &["A"], |_| factory())
}

/// Race `config.threads` callers on each of `keys` in each trial.
pub fn verify_keys<K, V, F>(config: &HarnessConfig, keys: &[K], factory: F) -> HarnessReport
where
    K: RegistryKey + Send + Sync,
    V: Send + Sync,
    F: Fn(&K) -> V + Sync,
{
    let threads = config.threads.max(1);
    let mut report = HarnessReport::default();

    for trial in 0..config.trials {
        let failures = run_trial(trial, threads, keys, &factory);
        report.trials += 1;
        if failures.is_empty() {
            report.passed += 1;
        } else {
            for failure in &failures {
                debug!(target: "lazy_singleton_registry::harness", %failure, "trial failed");
            }
            report.failures.extend(failures);
        }
    }

    info!(
        target: "lazy_singleton_registry::harness",
        threads,
        keys = keys.len(),
        passed = report.passed,
        trials = report.trials,
        "thread-safety verification finished"
    );
    report
}

fn run_trial<K, V, F>(trial: usize, threads: usize, keys: &[K], factory: &F) -> Vec<TrialFailure>
where
    K: RegistryKey + Send + Sync,
    V: Send + Sync,
    F: Fn(&K) -> V + Sync,
{
    let registry: LazyRegistry<K, V> = LazyRegistry::new();
    let calls: Vec<AtomicUsize> = keys.iter().map(|_| AtomicUsize::new(0)).collect();
    let barrier = Barrier::new(threads * keys.len());

    let results: Vec<(usize, Result<Arc<V>, RegistryError>)> = thread::scope(|s| {
        let handles: Vec<_> = keys
            .iter()
            .enumerate()
            .flat_map(|(index, key)| (0..threads).map(move |_| (index, key)))
            .map(|(index, key)| {
                let (registry, calls, barrier) = (&registry, &calls, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    let result = registry.get_or_create(key, || {
                        calls[index].fetch_add(1, Ordering::SeqCst);
                        factory(key)
                    });
                    (index, result)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|p| panic::resume_unwind(p)))
            .collect()
    });

    let mut failures = Vec::new();
    let mut firsts: Vec<Option<Arc<V>>> = keys.iter().map(|_| None).collect();
    let mut diverged = vec![false; keys.len()];

    for (index, result) in results {
        match result {
            Ok(value) => {
                let first = firsts[index].get_or_insert_with(|| Arc::clone(&value));
                if !Arc::ptr_eq(first, &value) && !diverged[index] {
                    diverged[index] = true;
                    failures.push(TrialFailure::DistinctInstances {
                        trial,
                        key: format!("{:?}", keys[index]),
                    });
                }
            }
            Err(error) => failures.push(TrialFailure::Registry {
                trial,
                key: format!("{:?}", keys[index]),
                error,
            }),
        }
    }

    for (index, count) in calls.iter().enumerate() {
        let calls = count.load(Ordering::SeqCst);
        if calls != 1 {
            failures.push(TrialFailure::FactoryCalls {
                trial,
                key: format!("{:?}", keys[index]),
                calls,
            });
        }
    }

    for i in 0..keys.len() {
        for j in (i + 1)..keys.len() {
            if let (Some(a), Some(b)) = (&firsts[i], &firsts[j]) {
                if Arc::ptr_eq(a, b) {
                    failures.push(TrialFailure::SharedAcrossKeys {
                        trial,
                        first: format!("{:?}", keys[i]),
                        second: format!("{:?}", keys[j]),
                    });
                }
            }
        }
    }

    failures
}
