//! Integration tests demonstrating how to use a global registry WITHOUT the macro.
//!
//! This shows the manual implementation approach, which gives you full control
//! over the registry setup (for example, custom options). This is useful when
//! you need custom behavior or want to understand how the macro works under the hood.
//!
//! NOTE: All tests use #[serial] because they share the same static registry (MY_REGISTRY).
//! Running them in parallel would cause interference and non-deterministic failures.

use lazy_singleton_registry::{
    KeyState, RegistryApi, RegistryError, RegistryOptions, TypeRegistry,
};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, LazyLock};
use std::thread;
use std::time::Duration;

// ============================================================================
// Manual Registry Implementation (Without Macro)
// ============================================================================

const WAIT: Duration = Duration::from_millis(50);

/// Define the static storage for our registry
static MY_STORAGE: LazyLock<TypeRegistry> =
    LazyLock::new(|| TypeRegistry::with_options(RegistryOptions::new().wait_timeout(WAIT)));

/// Our custom registry API implementation
struct MyRegistry;

impl RegistryApi for MyRegistry {
    fn registry() -> &'static TypeRegistry {
        &MY_STORAGE
    }
}

/// Constant instance of our registry
const MY_REGISTRY: MyRegistry = MyRegistry;

// ============================================================================
// Tests Using Manual Implementation
// ============================================================================

#[test]
#[serial]
fn test_basic_get_or_create() {
    struct Answer(i32);

    let value = MY_REGISTRY.get_or_create(|| Answer(42)).unwrap();
    assert_eq!(value.0, 42);

    let again = MY_REGISTRY.get_or_create(|| Answer(0)).unwrap();
    assert!(Arc::ptr_eq(&value, &again));
}

#[test]
#[serial]
fn test_options_reach_the_registry() {
    assert_eq!(MyRegistry::registry().options().wait_timeout, Some(WAIT));
}

#[test]
#[serial]
fn test_bounded_wait_through_the_trait() {
    struct SlowPool(u8);

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let builder = thread::spawn(move || {
        MY_REGISTRY
            .get_or_create(|| {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                SlowPool(4)
            })
            .map(|pool| pool.0)
    });
    started_rx.recv().unwrap();

    let err = MY_REGISTRY.get_or_create(|| SlowPool(9)).map(|pool| pool.0);
    assert!(matches!(err, Err(RegistryError::Timeout { waited, .. }) if waited == WAIT));
    assert_eq!(MY_REGISTRY.state::<SlowPool>(), KeyState::Constructing);

    release_tx.send(()).unwrap();
    assert_eq!(builder.join().unwrap(), Ok(4));
    assert_eq!(MY_REGISTRY.peek::<SlowPool>().unwrap().0, 4);
}

#[test]
#[serial]
fn test_lazy_construction_happens_on_first_request_only() {
    struct Expensive;
    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    assert!(!MY_REGISTRY.contains::<Expensive>());
    assert_eq!(BUILDS.load(Ordering::SeqCst), 0);

    for _ in 0..5 {
        MY_REGISTRY
            .get_or_create(|| {
                BUILDS.fetch_add(1, Ordering::SeqCst);
                Expensive
            })
            .unwrap();
    }

    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    assert!(MY_REGISTRY.contains::<Expensive>());
}

#[test]
#[serial]
fn test_multiple_implementations() {
    // You can create multiple manual registries with different storage
    static OTHER_STORAGE: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

    struct OtherRegistry;

    impl RegistryApi for OtherRegistry {
        fn registry() -> &'static TypeRegistry {
            &OTHER_STORAGE
        }
    }

    const OTHER_REGISTRY: OtherRegistry = OtherRegistry;

    struct Marker(&'static str);

    MY_REGISTRY.get_or_create(|| Marker("mine")).unwrap();
    OTHER_REGISTRY.get_or_create(|| Marker("other")).unwrap();

    assert_eq!(MY_REGISTRY.peek::<Marker>().unwrap().0, "mine");
    assert_eq!(OTHER_REGISTRY.peek::<Marker>().unwrap().0, "other");
    assert_eq!(OtherRegistry::registry().options().wait_timeout, None);
}
