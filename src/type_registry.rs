//! Lazy singletons keyed by Rust type.
//!
//! Each type `T` maps to at most one `Arc<T>`, constructed on first request.
//! Values are stored type-erased as `Arc<dyn Any + Send + Sync>` on top of a
//! [`LazyRegistry`] and downcast on the way out.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{
    CreateError, KeyState, LazyRegistry, RegistryError, RegistryEvent, RegistryOptions,
};

type Erased = dyn Any + Send + Sync;

/// Registry key for a Rust type.
///
/// Compares and hashes by `TypeId`; formats as the type's name, so trace
/// events read `construct { key: i32 }`.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A lazy singleton registry keyed by type.
///
/// # Examples
///
/// ```
/// use lazy_singleton_registry::TypeRegistry;
/// use std::sync::Arc;
///
/// struct Config { name: String }
///
/// let registry = TypeRegistry::new();
/// let a = registry.get_or_create(|| Config { name: "app".into() }).unwrap();
/// let b: Arc<Config> = registry.get_or_create(|| Config { name: "other".into() }).unwrap();
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(b.name, "app");
/// ```
#[derive(Debug, Default)]
pub struct TypeRegistry {
    inner: LazyRegistry<TypeKey, Erased>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            inner: LazyRegistry::with_options(options),
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        self.inner.options()
    }

    /// Return the `T` singleton, constructing it with `factory` on first use.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Reentrant`] if `factory` itself asks for `T`
    /// - [`RegistryError::Timeout`] if a bounded wait was configured and expired
    /// - [`RegistryError::TypeMismatch`] if the stored value is not a `T`
    pub fn get_or_create<T: Send + Sync + 'static>(
        &self,
        factory: impl FnOnce() -> T,
    ) -> Result<Arc<T>, RegistryError> {
        let any = self
            .inner
            .get_or_create_arc(&TypeKey::of::<T>(), || Arc::new(factory()) as Arc<Erased>)?;
        downcast(any)
    }

    /// Fallible form of [`get_or_create`](Self::get_or_create). A factory
    /// error leaves `T` unset for the next caller.
    pub fn try_get_or_create<T: Send + Sync + 'static, E>(
        &self,
        factory: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, CreateError<E>> {
        let any = self.inner.try_get_or_create_arc(&TypeKey::of::<T>(), || {
            factory().map(|value| Arc::new(value) as Arc<Erased>)
        })?;
        Ok(downcast(any)?)
    }

    /// The published `T`, if any. Never constructs, never blocks.
    pub fn peek<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.inner
            .peek(&TypeKey::of::<T>())
            .and_then(|any| any.downcast::<T>().ok())
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.inner.contains(&TypeKey::of::<T>())
    }

    pub fn state<T: Send + Sync + 'static>(&self) -> KeyState {
        self.inner.state(&TypeKey::of::<T>())
    }

    /// Number of published singletons.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent<'_>) + Send + Sync + 'static) {
        self.inner.set_trace_callback(callback);
    }

    pub fn clear_trace_callback(&self) {
        self.inner.clear_trace_callback();
    }
}

fn downcast<T: Send + Sync + 'static>(any: Arc<Erased>) -> Result<Arc<T>, RegistryError> {
    any.downcast::<T>().map_err(|_| RegistryError::TypeMismatch {
        type_name: type_name::<T>(),
    })
}
