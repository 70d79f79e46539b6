//! # Lazy Singleton Registry
//!
//! A thread-safe registry that maps each key to exactly one lazily
//! constructed instance, with at most one successful construction per key
//! even when many threads race on a cold key.
//!
//! ## Quick Start
//!
//! ```rust
//! use lazy_singleton_registry::LazyRegistry;
//! use std::sync::Arc;
//!
//! let registry: LazyRegistry<&str, String> = LazyRegistry::new();
//!
//! let first = registry.get_or_create(&"greeting", || "Hello, World!".to_string()).unwrap();
//! let again = registry.get_or_create(&"greeting", || unreachable!()).unwrap();
//!
//! assert!(Arc::ptr_eq(&first, &again));
//! assert!(registry.peek(&"missing").is_none());
//! ```
//!
//! ## Features
//!
//! - **Double-checked locking**: published instances are read without a lock;
//!   cold keys serialize construction on a per-key guard
//! - **Retry on failure**: a failed factory leaves its key unset for the next caller
//! - **Re-entrancy detection**: a factory asking for its own key gets an error, not a deadlock
//! - **Bounded waits**: optional timeout on the per-key guard
//! - **Tracing**: `tracing` events plus an optional per-registry event callback
//!
//! ## Main Types
//!
//! - [`LazyRegistry`] - keyed registry, any `Eq + Hash + Clone + Debug` key
//! - [`TypeRegistry`] - one singleton per Rust type
//! - [`Singleton`] - a single lazily constructed instance for `static` items
//! - [`define_registry!`] - a global type registry module
//! - [`harness`] - concurrent verification of the single-instance property

#[macro_use]
mod macros;

pub mod harness;
mod registry;
mod registry_error;
mod registry_event;
mod registry_options;
mod registry_trait;
mod singleton;
mod slot;
mod type_registry;

// Re-export the main public API
pub use harness::{HarnessConfig, HarnessReport, TrialFailure};
pub use registry::{LazyRegistry, RegistryKey, TraceCallback};
pub use registry_error::{CreateError, RegistryError};
pub use registry_event::RegistryEvent;
pub use registry_options::RegistryOptions;
pub use registry_trait::RegistryApi;
pub use singleton::Singleton;
pub use slot::KeyState;
pub use type_registry::{TypeKey, TypeRegistry};
