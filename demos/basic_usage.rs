//! Basic usage example for lazy-singleton-registry.
//!
//! Demonstrates:
//! - Lazily creating singletons with `get_or_create()` (returns `Arc<T>`)
//! - Querying without constructing via `peek()` and `state()`
//! - Retrying after a failed factory with `try_get_or_create()`
//! - Watching the lifecycle through a trace callback
//!
//! Run with: `cargo run --example basic_usage`

use lazy_singleton_registry::{define_registry, LazyRegistry};
use std::sync::Arc;

// Create an isolated type registry for this example
define_registry!(app);

#[derive(Debug)]
struct AppConfig {
    name: String,
    version: u32,
    debug_mode: bool,
}

fn main() {
    println!("=== lazy-singleton-registry: Basic Usage ===\n");

    // -------------------------------------------------------------------------
    // 1. Create a singleton on first use
    // -------------------------------------------------------------------------
    println!("1. Creating AppConfig on first request...");

    app::set_trace_callback(|event| println!("   [trace] {event}"));

    let config = app::get_or_create(|| AppConfig {
        name: "MyApp".to_string(),
        version: 1,
        debug_mode: true,
    })
    .unwrap();
    println!("   Got: {:?}", *config);

    // -------------------------------------------------------------------------
    // 2. Later requests return the same instance
    // -------------------------------------------------------------------------
    println!("\n2. Requesting AppConfig again (factory is ignored)...");

    let again = app::get_or_create(|| AppConfig {
        name: "Other".to_string(),
        version: 2,
        debug_mode: false,
    })
    .unwrap();
    println!("   Same instance: {}", Arc::ptr_eq(&config, &again));

    // -------------------------------------------------------------------------
    // 3. Query without constructing
    // -------------------------------------------------------------------------
    println!("\n3. Peeking at types...");

    println!("   state::<AppConfig>() = {:?}", app::state::<AppConfig>());
    println!("   state::<Vec<u8>>()   = {:?}", app::state::<Vec<u8>>());
    println!("   peek::<Vec<u8>>()    = {:?}", app::peek::<Vec<u8>>());

    app::clear_trace_callback();

    // -------------------------------------------------------------------------
    // 4. A failed factory leaves the key unset for a retry
    // -------------------------------------------------------------------------
    println!("\n4. Fallible construction...");

    let mut online = false;
    for attempt in 1..=2 {
        let result = app::try_get_or_create(|| {
            if online {
                Ok("connected".to_string())
            } else {
                Err("database unreachable")
            }
        });
        match result {
            Ok(value) => println!("   attempt {attempt}: ok ({value})"),
            Err(e) => println!("   attempt {attempt}: {e}"),
        }
        online = true;
    }

    // -------------------------------------------------------------------------
    // 5. Keyed registries
    // -------------------------------------------------------------------------
    println!("\n5. One instance per key...");

    let pools: LazyRegistry<&str, Vec<String>> = LazyRegistry::new();
    for key in ["primary", "replica", "primary"] {
        let pool = pools
            .get_or_create(&key, || vec![format!("{key}-conn-0"), format!("{key}-conn-1")])
            .unwrap();
        println!("   {key}: {:?}", pool);
    }
    println!("   distinct pools: {}", pools.len());

    println!("\n=== Example Complete ===");
    println!(
        "{} v{} (debug: {})",
        config.name, config.version, config.debug_mode
    );
}
