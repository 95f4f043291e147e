//! Value semantics of heap objects: equality, hashing and natural ordering
//!
//! These follow the foreign platform's contracts: boxed primitives compare by
//! value, collections compare by content, enum constants by identity, and equal
//! values always hash identically.

use std::cmp::Ordering;

use jbridge_types::{BridgeError, BridgeResult, HandleRef, MapPart, Value};

use super::object::Object;
use super::Heap;

/// Comparability family of a value, used by the strict equality check
#[derive(Debug, PartialEq, Eq)]
enum Family {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Set,
    Map,
    Entry,
    Constant(String),
    Record(String),
    Identity,
}

/// Content of a set-like object for equality purposes
enum SetContent {
    Elements(Vec<Value>),
    Pairs(Vec<(Value, Value)>),
}

impl Heap {
    // ── Equality ─────────────────────────────────────────────────────────────

    /// Foreign `equals`: values of unrelated classes are simply unequal
    pub(crate) fn value_eq(&self, a: &Value, b: &Value) -> BridgeResult<bool> {
        Ok(match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => canonical_bits(*x) == canonical_bits(*y),
            (Value::String(x), Value::String(y)) => x == y,
            (Value::Handle(x), Value::Handle(y)) => x == y || self.object_eq(*x, *y)?,
            _ => false,
        })
    }

    /// Equality that refuses to compare values of incomparable classes
    pub(crate) fn strict_eq(&self, a: &Value, b: &Value) -> BridgeResult<bool> {
        let fa = self.family(a)?;
        let fb = self.family(b)?;
        if fa != Family::Null && fb != Family::Null && fa != fb {
            return Err(BridgeError::class_mismatch(self.class_of(a)?, self.class_of(b)?));
        }
        self.value_eq(a, b)
    }

    fn object_eq(&self, x: HandleRef, y: HandleRef) -> BridgeResult<bool> {
        match (self.family_of_handle(x)?, self.family_of_handle(y)?) {
            (Family::List, Family::List) => {
                let a = self.list_items(x)?;
                let b = self.list_items(y)?;
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (ea, eb) in a.iter().zip(b.iter()) {
                    if !self.value_eq(ea, eb)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Family::Set, Family::Set) => match (self.set_content(x)?, self.set_content(y)?) {
                (SetContent::Elements(a), SetContent::Elements(b)) => {
                    if a.len() != b.len() {
                        return Ok(false);
                    }
                    for e in &a {
                        if !self.contains_eq(&b, e)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                (SetContent::Pairs(a), SetContent::Pairs(b)) => self.pairs_eq(&a, &b),
                _ => Ok(false),
            },
            (Family::Map, Family::Map) => {
                let a = self.map_entries(x)?;
                let b = self.map_entries(y)?;
                self.pairs_eq(a, b)
            }
            (Family::Entry, Family::Entry) => {
                let (ka, va) = self.entry_pair(x)?;
                let (kb, vb) = self.entry_pair(y)?;
                Ok(self.value_eq(&ka, &kb)? && self.value_eq(&va, &vb)?)
            }
            (Family::Record(ca), Family::Record(cb)) if ca == cb => {
                let (Object::Record(a), Object::Record(b)) = (self.object(x)?, self.object(y)?) else {
                    return Ok(false);
                };
                if a.fields.len() != b.fields.len() {
                    return Ok(false);
                }
                for ((na, va), (nb, vb)) in a.fields.iter().zip(b.fields.iter()) {
                    if na != nb || !self.value_eq(va, vb)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            // Constants and identity-only objects are equal only to themselves
            _ => Ok(false),
        }
    }

    fn pairs_eq(&self, a: &[(Value, Value)], b: &[(Value, Value)]) -> BridgeResult<bool> {
        if a.len() != b.len() {
            return Ok(false);
        }
        for (k, v) in a {
            match self.find_pair(b, k)? {
                Some(i) => {
                    if !self.value_eq(v, &b[i].1)? {
                        return Ok(false);
                    }
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Membership inside content equality, where unrelated classes are unequal
    fn contains_eq(&self, items: &[Value], value: &Value) -> BridgeResult<bool> {
        for item in items {
            if self.value_eq(item, value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// First position equal to `value` under [`Heap::strict_eq`]
    pub(crate) fn position_eq(&self, items: &[Value], value: &Value) -> BridgeResult<Option<usize>> {
        for (i, item) in items.iter().enumerate() {
            if self.strict_eq(item, value)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    pub(crate) fn find_pair(&self, pairs: &[(Value, Value)], key: &Value) -> BridgeResult<Option<usize>> {
        for (i, (k, _)) in pairs.iter().enumerate() {
            if self.value_eq(k, key)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    // ── Hashing ──────────────────────────────────────────────────────────────

    /// Foreign `hashCode`
    pub(crate) fn hash(&self, value: &Value) -> BridgeResult<i32> {
        Ok(match value {
            Value::Null => 0,
            Value::Bool(true) => 1231,
            Value::Bool(false) => 1237,
            Value::Int(i) => fold_long(*i as u64),
            Value::Float(f) => fold_long(canonical_bits(*f)),
            Value::String(s) => s
                .encode_utf16()
                .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32)),
            Value::Handle(h) => self.object_hash(*h)?,
        })
    }

    fn object_hash(&self, handle: HandleRef) -> BridgeResult<i32> {
        match self.family_of_handle(handle)? {
            Family::List => {
                let mut h = 1i32;
                for e in self.list_items(handle)? {
                    h = h.wrapping_mul(31).wrapping_add(self.hash(e)?);
                }
                Ok(h)
            }
            Family::Set => match self.set_content(handle)? {
                SetContent::Elements(items) => {
                    let mut h = 0i32;
                    for e in &items {
                        h = h.wrapping_add(self.hash(e)?);
                    }
                    Ok(h)
                }
                SetContent::Pairs(pairs) => self.pairs_hash(&pairs),
            },
            Family::Map => self.pairs_hash(self.map_entries(handle)?),
            Family::Entry => {
                let (k, v) = self.entry_pair(handle)?;
                Ok(self.hash(&k)? ^ self.hash(&v)?)
            }
            Family::Record(class) => {
                let mut h = self.hash(&Value::String(class))?;
                if let Object::Record(record) = self.object(handle)? {
                    for (_, v) in &record.fields {
                        h = h.wrapping_mul(31).wrapping_add(self.hash(v)?);
                    }
                }
                Ok(h)
            }
            _ => Ok(identity_hash(handle)),
        }
    }

    fn pairs_hash(&self, pairs: &[(Value, Value)]) -> BridgeResult<i32> {
        let mut h = 0i32;
        for (k, v) in pairs {
            h = h.wrapping_add(self.hash(k)? ^ self.hash(v)?);
        }
        Ok(h)
    }

    // ── Natural ordering ─────────────────────────────────────────────────────

    /// Natural ordering used by sorted collections
    pub(crate) fn compare(&self, a: &Value, b: &Value) -> BridgeResult<Ordering> {
        match (a, b) {
            (Value::Null, _) | (_, Value::Null) => {
                Err(BridgeError::null_not_allowed("sorted collections cannot order null"))
            }
            (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
            (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
            (Value::Float(x), Value::Float(y)) => Ok(x.total_cmp(y)),
            (Value::String(x), Value::String(y)) => Ok(x.encode_utf16().cmp(y.encode_utf16())),
            (Value::Handle(x), Value::Handle(y)) => {
                match (self.object(*x)?, self.object(*y)?) {
                    (Object::Constant(cx), Object::Constant(cy)) if cx.type_name == cy.type_name => {
                        Ok(cx.ordinal.cmp(&cy.ordinal))
                    }
                    _ => Err(BridgeError::class_mismatch(
                        "java.lang.Comparable",
                        self.class_name_of(*x)?,
                    )),
                }
            }
            _ => Err(BridgeError::class_mismatch(self.class_of(a)?, self.class_of(b)?)),
        }
    }

    // ── Classes ──────────────────────────────────────────────────────────────

    /// Foreign class name of any value
    pub(crate) fn class_of(&self, value: &Value) -> BridgeResult<String> {
        match value {
            Value::Handle(h) => self.class_name_of(*h),
            other => Ok(other.class().foreign_name().to_string()),
        }
    }

    fn family(&self, value: &Value) -> BridgeResult<Family> {
        Ok(match value {
            Value::Null => Family::Null,
            Value::Bool(_) => Family::Bool,
            Value::Int(_) => Family::Int,
            Value::Float(_) => Family::Float,
            Value::String(_) => Family::String,
            Value::Handle(h) => self.family_of_handle(*h)?,
        })
    }

    fn family_of_handle(&self, handle: HandleRef) -> BridgeResult<Family> {
        Ok(match self.object(handle)? {
            Object::List(_) => Family::List,
            Object::Set(_) => Family::Set,
            Object::Map(_) => Family::Map,
            Object::MapView { part: MapPart::Keys | MapPart::Entries, .. } => Family::Set,
            Object::MapView { part: MapPart::Values, .. } => Family::Identity,
            Object::Entry { .. } => Family::Entry,
            Object::Constant(c) => Family::Constant(c.type_name.clone()),
            Object::Record(r) => Family::Record(r.class.clone()),
            Object::Iterator(_) => Family::Identity,
        })
    }

    // ── Content accessors ────────────────────────────────────────────────────

    fn list_items(&self, handle: HandleRef) -> BridgeResult<&[Value]> {
        match self.object(handle)? {
            Object::List(list) => Ok(&list.items),
            _ => Err(BridgeError::class_mismatch("list", self.class_name_of(handle)?)),
        }
    }

    fn set_content(&self, handle: HandleRef) -> BridgeResult<SetContent> {
        match self.object(handle)? {
            Object::Set(set) => Ok(SetContent::Elements(set.items.clone())),
            Object::MapView { map, part: MapPart::Keys } => Ok(SetContent::Elements(
                self.map_entries(*map)?.iter().map(|(k, _)| k.clone()).collect(),
            )),
            Object::MapView { map, part: MapPart::Entries } => {
                Ok(SetContent::Pairs(self.map_entries(*map)?.to_vec()))
            }
            _ => Err(BridgeError::class_mismatch("set", self.class_name_of(handle)?)),
        }
    }

    /// Key and current value of an entry. Fails when the key left its map.
    pub(crate) fn entry_pair(&self, handle: HandleRef) -> BridgeResult<(Value, Value)> {
        let Object::Entry { map, key } = self.object(handle)? else {
            return Err(BridgeError::class_mismatch("java.util.Map$Entry", self.class_name_of(handle)?));
        };
        let entries = self.map_entries(*map)?;
        match self.find_pair(entries, key)? {
            Some(i) => Ok((key.clone(), entries[i].1.clone())),
            None => Err(BridgeError::illegal_state("entry is no longer backed by its map")),
        }
    }
}

/// `Double.doubleToLongBits`: every NaN collapses to one bit pattern
fn canonical_bits(f: f64) -> u64 {
    if f.is_nan() {
        0x7ff8_0000_0000_0000
    } else {
        f.to_bits()
    }
}

fn fold_long(bits: u64) -> i32 {
    (bits ^ (bits >> 32)) as i32
}

fn identity_hash(handle: HandleRef) -> i32 {
    fold_long(handle.raw().wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
