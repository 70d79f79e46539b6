//! Core trait for globally reachable type registries.
//!
//! This module provides the `RegistryApi` trait with default implementations
//! that forward to a `'static` [`TypeRegistry`]. Implementors only say where
//! that registry lives; [`define_registry!`](crate::define_registry) writes
//! the implementation for you.

use std::sync::Arc;

use crate::{CreateError, KeyState, RegistryError, RegistryEvent, TypeRegistry};

/// Core trait defining global registry behavior.
///
/// Provides default implementations for all operations, requiring only the
/// `registry` accessor to be implemented.
pub trait RegistryApi {
    /// Access the registry static.
    fn registry() -> &'static TypeRegistry;

    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Set a tracing callback for registry operations.
    ///
    /// The callback is stored behind an atomic pointer, not a lock, so it may
    /// call back into the registry for other types. During a `Construct`
    /// event the key's guard is held: asking for that same type returns
    /// [`RegistryError::Reentrant`].
    fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent<'_>) + Send + Sync + 'static) {
        Self::registry().set_trace_callback(callback);
    }

    /// Clear the tracing callback. Published values are untouched.
    fn clear_trace_callback(&self) {
        Self::registry().clear_trace_callback();
    }

    // -------------------------------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------------------------------

    /// Return the `T` singleton, constructing it on first use.
    ///
    /// # Errors
    ///
    /// - `factory` requested `T` itself (re-entrant construction)
    /// - A bounded wait was configured and expired
    fn get_or_create<T: Send + Sync + 'static>(
        &self,
        factory: impl FnOnce() -> T,
    ) -> Result<Arc<T>, RegistryError> {
        Self::registry().get_or_create(factory)
    }

    /// Return the `T` singleton, constructing it with a fallible factory.
    ///
    /// # Errors
    ///
    /// - The factory's own error, verbatim; `T` stays unset
    /// - Any [`RegistryError`]
    fn try_get_or_create<T: Send + Sync + 'static, E>(
        &self,
        factory: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, CreateError<E>> {
        Self::registry().try_get_or_create(factory)
    }

    /// The published `T`, without constructing.
    fn peek<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Self::registry().peek()
    }

    fn contains<T: Send + Sync + 'static>(&self) -> bool {
        Self::registry().contains::<T>()
    }

    fn state<T: Send + Sync + 'static>(&self) -> KeyState {
        Self::registry().state::<T>()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
