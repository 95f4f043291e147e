//! Error taxonomy reported by every bridge operation
//!
//! Nothing in the bridge swallows or retries these: each one reaches the
//! caller as a typed failure.

use crate::{HandleRef, ValueConversionError};

/// Errors surfaced by the foreign runtime and the adapters built on it
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// `next()` past the end
    #[error("No such element")]
    NoSuchElement,
    /// `remove()`/`set()` called out of protocol sequence
    #[error("Illegal state: {0}")]
    IllegalState(String),
    /// Mutation of an immutable or foreign-forbidden collection
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    /// Element or key class incompatible with the collection or comparison
    #[error("Class mismatch: expected {expected}, got {actual}")]
    ClassMismatch { expected: String, actual: String },
    /// Null passed to a collection that forbids it
    #[error("Null not allowed: {0}")]
    NullNotAllowed(String),
    /// Enum lookup miss
    #[error("No constant {name} in {type_name}")]
    NoSuchConstant { type_name: String, name: String },
    /// Traversal invalidated by a mutation made outside the cursor
    #[error("Collection was structurally modified outside the active traversal")]
    ConcurrentStructuralChange,
    /// Index outside `0..len`
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    /// Handle used after the foreign side released it
    #[error("Stale handle: {0}")]
    StaleHandle(HandleRef),
    /// Value could not be converted to the requested host type
    #[error(transparent)]
    Conversion(#[from] ValueConversionError),
}

impl BridgeError {
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        BridgeError::IllegalState(msg.into())
    }

    pub fn unsupported(op: impl Into<String>) -> Self {
        BridgeError::Unsupported(op.into())
    }

    pub fn class_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        BridgeError::ClassMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn null_not_allowed(context: impl Into<String>) -> Self {
        BridgeError::NullNotAllowed(context.into())
    }

    pub fn no_such_constant(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        BridgeError::NoSuchConstant {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// Result alias used across the bridge
pub type BridgeResult<T> = Result<T, BridgeError>;
