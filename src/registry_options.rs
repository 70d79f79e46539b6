//! Construction-time knobs for a registry.

use std::time::Duration;

/// Options fixed when a registry is created.
///
/// ```rust
/// use lazy_singleton_registry::{LazyRegistry, RegistryOptions};
/// use std::time::Duration;
///
/// let registry: LazyRegistry<&str, u32> = LazyRegistry::with_options(
///     RegistryOptions::new().wait_timeout(Duration::from_secs(2)),
/// );
/// assert_eq!(registry.options().wait_timeout, Some(Duration::from_secs(2)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Upper bound on how long a caller waits for another thread's
    /// construction of the same key. `None` waits forever.
    pub wait_timeout: Option<Duration>,
}

impl RegistryOptions {
    pub const fn new() -> Self {
        Self { wait_timeout: None }
    }

    /// Bound the wait on a key's construction guard.
    pub const fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }
}
