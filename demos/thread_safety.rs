//! Thread-safety experiment for lazy-singleton-registry.
//!
//! Spawns 100 threads per trial against one cold key, repeats 100 times,
//! and checks that every thread in every trial got the identical instance
//! from a single factory call. Then repeats with two keys.
//!
//! Run with: `RUST_LOG=lazy_singleton_registry=info cargo run --example thread_safety`

use lazy_singleton_registry::harness::{verify_keys, verify_single_instance};
use lazy_singleton_registry::HarnessConfig;
use tracing_subscriber::EnvFilter;

struct Object {
    _id: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== lazy-singleton-registry: Thread Safety ===\n");

    let config = HarnessConfig::default();

    let single = verify_single_instance(&config, || Object { _id: 0 });
    println!(
        "single key, {} threads x {} trials: {}",
        config.threads, config.trials, single
    );
    for failure in &single.failures {
        println!("   {failure}");
    }

    let two_keys = HarnessConfig::new(50, config.trials);
    let keyed = verify_keys(&two_keys, &["A", "B"], |_| Object { _id: 0 });
    println!(
        "keys A and B, {} threads each x {} trials: {}",
        two_keys.threads, two_keys.trials, keyed
    );
    for failure in &keyed.failures {
        println!("   {failure}");
    }

    println!(
        "\nis thread safe? {}",
        single.is_success() && keyed.is_success()
    );
}
