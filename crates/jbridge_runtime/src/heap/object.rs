//! Object model of the in-process heap

use serde::{Deserialize, Serialize};

use jbridge_types::{HandleRef, MapPart, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Collection Options
// ─────────────────────────────────────────────────────────────────────────────

/// Iteration order a set or map promises
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetOrder {
    /// Insertion order (`LinkedHashSet`, `LinkedHashMap`)
    #[default]
    Insertion,
    /// Natural ordering of the elements (`TreeSet`, `TreeMap`)
    Sorted,
    /// No promised order (`HashSet`, `HashMap`)
    Hashed,
}

/// Constraints a foreign collection enforces on mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOptions {
    /// Every mutation fails with `Unsupported`
    #[serde(default)]
    pub unmodifiable: bool,
    /// Inserting null fails with `NullNotAllowed`
    #[serde(default)]
    pub forbid_null: bool,
    /// Elements (map keys) must have exactly this foreign class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_class: Option<String>,
}

impl CollectionOptions {
    pub fn unmodifiable() -> Self {
        Self {
            unmodifiable: true,
            ..Self::default()
        }
    }

    pub fn non_null() -> Self {
        Self {
            forbid_null: true,
            ..Self::default()
        }
    }

    /// Restrict elements to one foreign class
    pub fn with_element_class(mut self, class: impl Into<String>) -> Self {
        self.element_class = Some(class.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Heap Objects
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct ListObject {
    pub items: Vec<Value>,
    pub options: CollectionOptions,
    pub version: u64,
}

#[derive(Debug)]
pub(crate) struct SetObject {
    pub items: Vec<Value>,
    pub order: SetOrder,
    pub options: CollectionOptions,
    pub version: u64,
}

#[derive(Debug)]
pub(crate) struct MapObject {
    pub entries: Vec<(Value, Value)>,
    pub order: SetOrder,
    pub options: CollectionOptions,
    pub version: u64,
}

/// Two-step cursor state
#[derive(Debug)]
pub(crate) struct Cursor {
    pub source: Source,
    pub position: usize,
    /// Position of the element last returned by `next`, cleared by `remove`
    pub last: Option<usize>,
    pub expected_version: u64,
}

#[derive(Debug)]
pub(crate) struct ConstantObject {
    pub type_name: String,
    pub name: String,
    pub ordinal: u32,
}

/// Plain foreign object with value-based equality over its fields
#[derive(Debug)]
pub(crate) struct RecordObject {
    pub class: String,
    pub fields: Vec<(String, Value)>,
}

#[derive(Debug)]
pub(crate) enum Object {
    List(ListObject),
    Set(SetObject),
    Map(MapObject),
    MapView { map: HandleRef, part: MapPart },
    Entry { map: HandleRef, key: Value },
    Iterator(Cursor),
    Constant(ConstantObject),
    Record(RecordObject),
}

/// What an iterator or collection operation ultimately reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    List(HandleRef),
    Set(HandleRef),
    Map(HandleRef, MapPart),
}

/// Foreign class names reported for heap objects
pub(crate) fn list_class(options: &CollectionOptions) -> &'static str {
    if options.unmodifiable {
        "java.util.Collections$UnmodifiableList"
    } else {
        "java.util.ArrayList"
    }
}

pub(crate) fn set_class(order: SetOrder, options: &CollectionOptions) -> &'static str {
    match (options.unmodifiable, order) {
        (true, _) => "java.util.Collections$UnmodifiableSet",
        (false, SetOrder::Insertion) => "java.util.LinkedHashSet",
        (false, SetOrder::Sorted) => "java.util.TreeSet",
        (false, SetOrder::Hashed) => "java.util.HashSet",
    }
}

pub(crate) fn map_class(order: SetOrder, options: &CollectionOptions) -> &'static str {
    match (options.unmodifiable, order) {
        (true, _) => "java.util.Collections$UnmodifiableMap",
        (false, SetOrder::Insertion) => "java.util.LinkedHashMap",
        (false, SetOrder::Sorted) => "java.util.TreeMap",
        (false, SetOrder::Hashed) => "java.util.HashMap",
    }
}
