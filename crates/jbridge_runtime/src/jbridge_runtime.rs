//! jbridge runtime - The foreign object model seen from the host
//!
//! This crate defines [`ForeignRuntime`], the capability set the bridge needs
//! from a foreign runtime, and [`HeapRuntime`], an in-process implementation of
//! that object model used to embed the bridge without a live foreign VM.

pub use jbridge_types;

mod enum_registry;
mod heap;
mod runtime;

pub use enum_registry::*;
pub use heap::*;
pub use runtime::*;
