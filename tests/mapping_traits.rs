//! Integration tests for trait-object singletons.
//!
//! A `LazyRegistry<K, dyn Trait>` stores unsized instances directly via the
//! `*_arc` operations. A type registry stores them behind `Arc<dyn Trait>`.
//!
//! NOTE: The macro-based tests use #[serial] because they share the same registry (traits).

use lazy_singleton_registry::{define_registry, LazyRegistry};
use serial_test::serial;
use std::sync::Arc;

define_registry!(traits);

trait Calculator: Send + Sync {
    fn calculate(&self, a: i32, b: i32) -> i32;
}

trait Logger: Send + Sync {
    fn get_name(&self) -> &str;
}

struct AddCalculator;

impl Calculator for AddCalculator {
    fn calculate(&self, a: i32, b: i32) -> i32 {
        a + b
    }
}

struct MulCalculator;

impl Calculator for MulCalculator {
    fn calculate(&self, a: i32, b: i32) -> i32 {
        a * b
    }
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn get_name(&self) -> &str {
        "ConsoleLogger"
    }
}

#[test]
fn test_keyed_trait_objects() {
    let calculators: LazyRegistry<&str, dyn Calculator> = LazyRegistry::new();

    let add = calculators
        .get_or_create_arc(&"add", || Arc::new(AddCalculator) as Arc<dyn Calculator>)
        .unwrap();
    let mul = calculators
        .get_or_create_arc(&"mul", || Arc::new(MulCalculator) as Arc<dyn Calculator>)
        .unwrap();

    assert_eq!(add.calculate(40, 2), 42);
    assert_eq!(mul.calculate(6, 7), 42);

    let add_again = calculators
        .get_or_create_arc(&"add", || Arc::new(MulCalculator) as Arc<dyn Calculator>)
        .unwrap();
    assert!(Arc::ptr_eq(&add, &add_again));
    assert_eq!(add_again.calculate(1, 1), 2);
}

#[test]
fn test_keyed_trait_objects_fallible() {
    let loggers: LazyRegistry<&str, dyn Logger> = LazyRegistry::new();

    let err = loggers
        .try_get_or_create_arc(&"file", || Err::<Arc<dyn Logger>, _>("no such file"))
        .err()
        .and_then(|e| e.into_construction());
    assert_eq!(err, Some("no such file"));
    assert!(loggers.peek(&"file").is_none());

    let logger = loggers
        .try_get_or_create_arc(&"file", || Ok::<_, &str>(Arc::new(ConsoleLogger) as Arc<dyn Logger>))
        .unwrap();
    assert_eq!(logger.get_name(), "ConsoleLogger");
}

#[test]
#[serial]
fn test_trait_objects_in_type_registry() {
    let calc = traits::get_or_create(|| Arc::new(AddCalculator) as Arc<dyn Calculator>).unwrap();
    assert_eq!(calc.calculate(40, 2), 42);

    // The first construction wins; later factories are ignored.
    let calc_again =
        traits::get_or_create(|| Arc::new(MulCalculator) as Arc<dyn Calculator>).unwrap();
    assert!(Arc::ptr_eq(&calc, &calc_again));
    assert_eq!(calc_again.calculate(40, 2), 42);
}

#[test]
#[serial]
fn test_dependency_injection_pattern() {
    // A component resolves its dependency lazily on first use.
    struct Component;
    impl Component {
        fn process(&self) -> i32 {
            let calc = traits::get_or_create(|| Arc::new(AddCalculator) as Arc<dyn Calculator>)
                .unwrap();
            calc.calculate(20, 22)
        }
    }

    assert_eq!(Component.process(), 42);
}

#[test]
#[serial]
fn test_concrete_and_trait_types_are_separate_keys() {
    struct MultiLogger {
        prefix: String,
    }

    impl Logger for MultiLogger {
        fn get_name(&self) -> &str {
            &self.prefix
        }
    }

    impl MultiLogger {
        fn get_prefix(&self) -> &str {
            &self.prefix
        }
    }

    let concrete = traits::get_or_create(|| MultiLogger {
        prefix: "[CONCRETE]".to_string(),
    })
    .unwrap();
    assert_eq!(concrete.get_prefix(), "[CONCRETE]");
    assert_eq!(concrete.get_name(), "[CONCRETE]");

    let trait_obj = traits::get_or_create(|| {
        Arc::new(MultiLogger {
            prefix: "[TRAIT]".to_string(),
        }) as Arc<dyn Logger>
    })
    .unwrap();
    assert_eq!(trait_obj.get_name(), "[TRAIT]");

    assert!(traits::contains::<MultiLogger>());
    assert!(traits::contains::<Arc<dyn Logger>>());
}
