//! Boundary classification
//!
//! [`Bridge::inspect`] asks the runtime once what a value is and hands back a
//! typed view, so callers match on a tag instead of probing the object.

use jbridge_types::{BridgeResult, CollectionKind, ForeignKind, HandleRef, Value};

use crate::collections::{JavaCollection, JavaList, JavaMap, JavaSet};
use crate::enums::EnumConstant;
use crate::Bridge;

/// A boundary value, classified
#[derive(Debug)]
pub enum Inspected {
    /// Null or a primitive
    Primitive(Value),
    List(JavaList<Value>),
    /// A set, or a map's key or entry view
    Set(JavaSet<Value>),
    Map(JavaMap<Value, Value>),
    Constant(EnumConstant),
    /// Anything without a view: value collections, entries, iterators, records
    Object { handle: HandleRef, class: String },
}

impl Bridge {
    /// Classify `value` into its host shape
    pub fn inspect(&self, value: Value) -> BridgeResult<Inspected> {
        let Value::Handle(handle) = value else {
            return Ok(Inspected::Primitive(value));
        };
        let kind = self.runtime().kind_of(handle)?;
        Ok(match kind {
            ForeignKind::List => Inspected::List(JavaList::unchecked(self.clone(), handle)),
            ForeignKind::Map => Inspected::Map(JavaMap::from_handle(self, handle)?),
            ForeignKind::EnumConstant { .. } => Inspected::Constant(self.enum_constant(handle)?),
            kind if kind.collection_kind() == Some(CollectionKind::Set) => {
                Inspected::Set(JavaSet::unchecked(self.clone(), handle))
            }
            _ => Inspected::Object {
                handle,
                class: self.runtime().class_name(handle)?,
            },
        })
    }

    /// Render a value as JSON, descending into lists, sets and maps
    ///
    /// Map keys are rendered with their string form. Constants render as
    /// their name; other objects as `{"class": ..., "handle": ...}`.
    pub fn to_json(&self, value: Value) -> BridgeResult<serde_json::Value> {
        Ok(match self.inspect(value)? {
            Inspected::Primitive(v) => v.into(),
            Inspected::List(list) => self.elements_json(&list)?,
            Inspected::Set(set) => self.elements_json(&set)?,
            Inspected::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (key, value) in map.entries()? {
                    obj.insert(key_string(&self.to_json(key)?), self.to_json(value)?);
                }
                serde_json::Value::Object(obj)
            }
            Inspected::Constant(constant) => serde_json::Value::String(constant.name().to_string()),
            Inspected::Object { handle, class } => serde_json::json!({
                "class": class,
                "handle": handle.raw(),
            }),
        })
    }

    fn elements_json<C: JavaCollection<Value>>(&self, coll: &C) -> BridgeResult<serde_json::Value> {
        let mut out = Vec::new();
        for element in coll.iter() {
            out.push(self.to_json(element?)?);
        }
        Ok(serde_json::Value::Array(out))
    }
}

fn key_string(key: &serde_json::Value) -> String {
    match key {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
