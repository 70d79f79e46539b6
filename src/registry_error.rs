use std::time::Duration;

/// Errors raised by the registry itself, independent of any factory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A factory asked the registry for the very key it is constructing.
    #[error("re-entrant construction of key {key}: factory requested its own instance")]
    Reentrant { key: String },

    /// The bounded wait on a key's construction guard expired.
    #[error("timed out after {waited:?} waiting for construction of key {key}")]
    Timeout { key: String, waited: Duration },

    /// The value stored for a type key is not of that type.
    #[error("type mismatch in registry for type: {type_name}")]
    TypeMismatch { type_name: &'static str },
}

/// Error returned by the fallible `try_get_or_create` family.
///
/// The factory's own error is handed back untouched in
/// [`CreateError::Construction`]; the key stays unset and the next caller
/// gets a fresh attempt.
#[derive(Debug, thiserror::Error)]
pub enum CreateError<E> {
    #[error("construction failed: {0}")]
    Construction(E),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl<E> CreateError<E> {
    /// The factory error, if that is what this is.
    pub fn construction(&self) -> Option<&E> {
        match self {
            CreateError::Construction(e) => Some(e),
            CreateError::Registry(_) => None,
        }
    }

    pub fn into_construction(self) -> Option<E> {
        match self {
            CreateError::Construction(e) => Some(e),
            CreateError::Registry(_) => None,
        }
    }
}
