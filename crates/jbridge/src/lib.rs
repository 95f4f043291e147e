//! jbridge - Cross-runtime collection, iterator and enum bridge
//!
//! This crate adapts objects living in a foreign runtime to host-native shapes:
//! - Two-step foreign iterators as fused host iterators
//! - Lists, sets and maps as live views over foreign handles
//! - Foreign enumerated types as typed `JavaEnum<K>` registries
//! - Set algebra, grouping and reduction helpers over those views
//!
//! Everything goes through an explicit [`Bridge`] context. There are no
//! ambient globals.

extern crate self as jbridge;

// Re-export core crates
pub use jbridge_runtime;
pub use jbridge_types;

pub use jbridge_macros::ForeignEnum;
pub use jbridge_runtime::{CollectionOptions, ForeignRuntime, HeapRuntime, SetOrder};
pub use jbridge_types::{
    BridgeError, BridgeResult, CollectionKind, ForeignKind, HandleRef, MapPart, Value,
    ValueClass, ValueConversionError,
};

mod bridge;
mod convert;
mod inspect;

// Equality contract
pub mod equality;

// Enumerated constants
pub mod enums;

// Iteration
pub mod iter;

// Collection views
pub mod collections;

// Bulk helpers
pub mod helpers;

// Inspector configuration and fixtures
pub mod config;
pub mod fixture;

pub use bridge::Bridge;
pub use collections::{
    JavaCollection, JavaList, JavaMap, JavaSet, ListWindow, MapEntry, MapEntrySet, MapValues,
};
pub use convert::Bridged;
pub use enums::{EnumConstant, EnumKey, EnumTable, JavaEnum};
pub use equality::{EqIndex, EqualityAdapter};
pub use inspect::Inspected;
pub use iter::{Elements, JavaIterator, JavaListIterator, TwoStep};
