use std::fmt;

/// Events emitted by a registry during `get_or_create` and `peek`.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// Keys are borrowed for the duration of the callback only; format them if
/// they need to outlive it.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton_registry::RegistryEvent;
///
/// let event = RegistryEvent::Construct { key: &"A" };
/// assert_eq!(event.to_string(), "construct { key: \"A\" }");
/// ```
#[derive(Debug, Clone, Copy)]
pub enum RegistryEvent<'a> {
    /// The instance was already published; returned without locking.
    Hit { key: &'a dyn fmt::Debug },

    /// The caller waited on another thread's construction and then found
    /// the published instance.
    Joined { key: &'a dyn fmt::Debug },

    /// This caller won the guard and is about to run the factory.
    Construct { key: &'a dyn fmt::Debug },

    /// The factory returned and its instance is now visible to every thread.
    Publish { key: &'a dyn fmt::Debug },

    /// The factory failed or construction was refused; the key is unset.
    Fail { key: &'a dyn fmt::Debug },

    /// A non-blocking existence query.
    Peek {
        key: &'a dyn fmt::Debug,
        found: bool,
    },
}

impl RegistryEvent<'_> {
    /// Short lowercase name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryEvent::Hit { .. } => "hit",
            RegistryEvent::Joined { .. } => "joined",
            RegistryEvent::Construct { .. } => "construct",
            RegistryEvent::Publish { .. } => "publish",
            RegistryEvent::Fail { .. } => "fail",
            RegistryEvent::Peek { .. } => "peek",
        }
    }
}

impl fmt::Display for RegistryEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEvent::Hit { key }
            | RegistryEvent::Joined { key }
            | RegistryEvent::Construct { key }
            | RegistryEvent::Publish { key }
            | RegistryEvent::Fail { key } => {
                write!(f, "{} {{ key: {:?} }}", self.kind(), key)
            }
            RegistryEvent::Peek { key, found } => {
                write!(f, "peek {{ key: {key:?}, found: {found} }}")
            }
        }
    }
}
