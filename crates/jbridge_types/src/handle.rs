//! Opaque references to foreign-runtime objects

use serde::{Deserialize, Serialize};

/// Identity-bearing reference to one foreign object.
///
/// Two handles are `==` only when they name the same foreign object. Value
/// equality of the referenced objects is a separate question answered by the
/// foreign runtime (see `EqualityAdapter` in the `jbridge` crate).
///
/// The bridge only borrows the object: the side that created it owns its
/// lifetime, and a handle must not be used after that side releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleRef(u64);

impl HandleRef {
    /// Create a handle from a raw runtime-assigned identifier.
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for HandleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
