//! jbridge types - Core data shapes shared by the foreign runtime and the bridge
//!
//! This crate contains the pure data structures that cross the bridge boundary:
//! opaque handles, boundary values, the tagged classification of foreign
//! objects, and the error taxonomy every adapter reports.

mod error;
mod handle;
mod kind;
mod value;

pub use error::*;
pub use handle::*;
pub use kind::*;
pub use value::*;
