//! Error types for shardio-core.

/// Errors produced when naming a custom implementation kind.
///
/// Wrapping and unwrapping streams never fails; the only fallible step is
/// constructing a [`CustomKind`](crate::CustomKind) identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KindError {
    /// The identifier was empty or consisted only of whitespace.
    #[error("implementation kind identifier must not be empty")]
    Empty,
    /// The identifier is already used by an allow-listed kind.
    #[error("implementation kind '{name}' is reserved for a tracked kind")]
    Reserved {
        /// The rejected identifier.
        name: String,
    },
}

/// Result type for kind construction.
pub type Result<T> = std::result::Result<T, KindError>;
