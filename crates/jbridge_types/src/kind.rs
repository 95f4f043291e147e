//! Tagged classification of foreign objects
//!
//! The kind of a foreign object is decided once, at the bridge edge, by asking
//! the runtime. Callers match on the result instead of probing the object.

use serde::{Deserialize, Serialize};

/// Which projection of a map a live map view exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapPart {
    /// `keySet()`
    Keys,
    /// `values()`
    Values,
    /// `entrySet()`
    Entries,
}

impl std::fmt::Display for MapPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapPart::Keys => write!(f, "keys"),
            MapPart::Values => write!(f, "values"),
            MapPart::Entries => write!(f, "entries"),
        }
    }
}

/// Collection semantics a view exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Index-addressable, duplicates allowed
    List,
    /// No duplicates
    Set,
    /// Key to value
    Map,
    /// Plain collection: duplicates allowed, no index (e.g. `Map.values()`)
    Collection,
}

/// Classification of a foreign object reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForeignKind {
    List,
    Set,
    Map,
    /// Live projection of a map
    MapView { part: MapPart },
    /// A `Map.Entry` bound to its owning map
    Entry,
    /// A foreign two-step iterator
    Iterator,
    /// A named singleton from an enum registry
    EnumConstant { type_name: String },
    /// Anything else, identified by its foreign class name
    Object { class: String },
}

impl ForeignKind {
    /// Collection semantics of this object, if it is a collection at all
    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            ForeignKind::List => Some(CollectionKind::List),
            ForeignKind::Set => Some(CollectionKind::Set),
            ForeignKind::Map => Some(CollectionKind::Map),
            ForeignKind::MapView { part: MapPart::Keys | MapPart::Entries } => {
                Some(CollectionKind::Set)
            }
            ForeignKind::MapView { part: MapPart::Values } => Some(CollectionKind::Collection),
            _ => None,
        }
    }

    /// Whether elements can be enumerated with `iterator()`
    pub fn is_iterable(&self) -> bool {
        matches!(
            self.collection_kind(),
            Some(CollectionKind::List | CollectionKind::Set | CollectionKind::Collection)
        )
    }

    /// Short label used in error messages
    pub fn label(&self) -> String {
        match self {
            ForeignKind::List => "list".to_string(),
            ForeignKind::Set => "set".to_string(),
            ForeignKind::Map => "map".to_string(),
            ForeignKind::MapView { part } => format!("map {} view", part),
            ForeignKind::Entry => "map entry".to_string(),
            ForeignKind::Iterator => "iterator".to_string(),
            ForeignKind::EnumConstant { type_name } => type_name.clone(),
            ForeignKind::Object { class } => class.clone(),
        }
    }
}
