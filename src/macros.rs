//! Macros for declaring global type registries.

/// Creates a global, type-keyed lazy singleton registry in one invocation.
///
/// The macro generates a module containing:
/// - a `LazyLock<TypeRegistry>` static (hidden)
/// - an `Api` struct that implements `RegistryApi`, and an `API` constant
/// - free functions forwarding to `API`
///
/// An optional second argument supplies the [`RegistryOptions`](crate::RegistryOptions);
/// it is evaluated inside the generated module, which glob-imports its parent.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton_registry::define_registry;
/// use std::sync::Arc;
///
/// define_registry!(global);
///
/// struct Settings { verbose: bool }
///
/// let a = global::get_or_create(|| Settings { verbose: true }).unwrap();
/// let b: Arc<Settings> = global::get_or_create(|| Settings { verbose: false }).unwrap();
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(b.verbose);
/// ```
///
/// # Bounded waits
///
/// ```rust
/// use lazy_singleton_registry::define_registry;
/// use std::time::Duration;
///
/// define_registry!(
///     pools,
///     lazy_singleton_registry::RegistryOptions::new()
///         .wait_timeout(std::time::Duration::from_secs(5))
/// );
///
/// assert_eq!(pools::options().wait_timeout, Some(Duration::from_secs(5)));
/// ```
///
/// # Trait-Based Usage
///
/// ```rust
/// use lazy_singleton_registry::{define_registry, RegistryApi};
/// use std::sync::Arc;
///
/// define_registry!(app);
///
/// let value: Arc<i32> = app::API.get_or_create(|| 100).unwrap();
/// assert_eq!(*value, 100);
/// ```
#[macro_export]
macro_rules! define_registry {
    ($name:ident) => {
        $crate::define_registry!($name, $crate::RegistryOptions::new());
    };
    ($name:ident, $options:expr) => {
        #[allow(dead_code)]
        pub mod $name {
            #[allow(unused_imports)]
            use super::*;

            use std::sync::{Arc, LazyLock};

            static REGISTRY: LazyLock<$crate::TypeRegistry> =
                LazyLock::new(|| $crate::TypeRegistry::with_options($options));

            /// Zero-sized handle implementing the registry API for this module.
            pub struct Api;

            impl $crate::RegistryApi for Api {
                fn registry() -> &'static $crate::TypeRegistry {
                    &REGISTRY
                }
            }

            pub const API: Api = Api;

            pub fn options() -> $crate::RegistryOptions {
                *<Api as $crate::RegistryApi>::registry().options()
            }

            /// Return the `T` singleton, constructing it on first use.
            pub fn get_or_create<T: Send + Sync + 'static>(
                factory: impl FnOnce() -> T,
            ) -> Result<Arc<T>, $crate::RegistryError> {
                use $crate::RegistryApi;
                API.get_or_create(factory)
            }

            /// Return the `T` singleton, constructing it with a fallible factory.
            pub fn try_get_or_create<T: Send + Sync + 'static, E>(
                factory: impl FnOnce() -> Result<T, E>,
            ) -> Result<Arc<T>, $crate::CreateError<E>> {
                use $crate::RegistryApi;
                API.try_get_or_create(factory)
            }

            pub fn peek<T: Send + Sync + 'static>() -> Option<Arc<T>> {
                use $crate::RegistryApi;
                API.peek()
            }

            pub fn contains<T: Send + Sync + 'static>() -> bool {
                use $crate::RegistryApi;
                API.contains::<T>()
            }

            pub fn state<T: Send + Sync + 'static>() -> $crate::KeyState {
                use $crate::RegistryApi;
                API.state::<T>()
            }

            pub fn len() -> usize {
                <Api as $crate::RegistryApi>::registry().len()
            }

            pub fn set_trace_callback(
                callback: impl Fn(&$crate::RegistryEvent<'_>) + Send + Sync + 'static,
            ) {
                use $crate::RegistryApi;
                API.set_trace_callback(callback)
            }

            pub fn clear_trace_callback() {
                use $crate::RegistryApi;
                API.clear_trace_callback()
            }
        }
    };
}
