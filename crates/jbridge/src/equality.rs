//! Equality Adapter
//!
//! Host-side uniqueness and lookup (set algebra, grouping, `distinct`, window
//! `index_of`, removal from a map's values) never uses host `==`. It goes
//! through [`EqualityAdapter`], which agrees with the foreign runtime's own
//! `equals`/`hashCode` contract:
//!
//! - primitives of the same class compare by value
//! - `Null` is comparable with anything and equal only to `Null`
//! - handles are compared by the foreign runtime
//! - values of incomparable classes fail with `ClassMismatch`

use std::collections::HashMap;

use jbridge_runtime::ForeignRuntime;
use jbridge_types::{BridgeError, BridgeResult, Value};

/// Foreign value equality and hashing
#[derive(Clone, Copy)]
pub struct EqualityAdapter<'a> {
    runtime: &'a dyn ForeignRuntime,
}

impl<'a> EqualityAdapter<'a> {
    pub fn new(runtime: &'a dyn ForeignRuntime) -> Self {
        Self { runtime }
    }

    pub fn equals(&self, a: &Value, b: &Value) -> BridgeResult<bool> {
        match (a, b) {
            (Value::Null, _) | (_, Value::Null) => Ok(a.is_null() && b.is_null()),
            (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
            (Value::Int(x), Value::Int(y)) => Ok(x == y),
            // `Double.equals`: NaN equals NaN, 0.0 differs from -0.0
            (Value::Float(x), Value::Float(y)) => {
                Ok(x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan()))
            }
            (Value::String(x), Value::String(y)) => Ok(x == y),
            (Value::Handle(x), Value::Handle(y)) if x == y => Ok(true),
            (Value::Handle(_), Value::Handle(_)) => self.runtime.equals(a, b),
            _ => Err(BridgeError::class_mismatch(
                a.class().foreign_name(),
                b.class().foreign_name(),
            )),
        }
    }

    /// Hash code consistent with [`EqualityAdapter::equals`]
    pub fn hash_code(&self, value: &Value) -> BridgeResult<i32> {
        self.runtime.hash_code(value)
    }

    /// Empty equality-keyed index
    pub fn index<T>(&self) -> EqIndex<'a, T> {
        EqIndex::new(*self)
    }
}

impl std::fmt::Debug for EqualityAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EqualityAdapter")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Equality Index
// ─────────────────────────────────────────────────────────────────────────────

/// Insertion-ordered index keyed by foreign equality.
///
/// Keys are bucketed by `hash_code`; within a bucket they are resolved with
/// `equals`. Every non-null key must be comparable with the first non-null
/// key the index saw, whatever its hash, so a key of an incomparable class
/// fails with `ClassMismatch` on insert and on lookup alike.
pub struct EqIndex<'a, T> {
    eq: EqualityAdapter<'a>,
    buckets: HashMap<i32, Vec<usize>>,
    entries: Vec<(Value, T)>,
    /// Position of the first non-null key
    witness: Option<usize>,
}

impl<'a, T> EqIndex<'a, T> {
    pub fn new(eq: EqualityAdapter<'a>) -> Self {
        Self {
            eq,
            buckets: HashMap::new(),
            entries: Vec::new(),
            witness: None,
        }
    }

    fn locate(&self, key: &Value) -> BridgeResult<(i32, Option<usize>)> {
        let hash = self.eq.hash_code(key)?;
        let mut compared = false;
        if let Some(bucket) = self.buckets.get(&hash) {
            for &i in bucket {
                if self.eq.equals(&self.entries[i].0, key)? {
                    return Ok((hash, Some(i)));
                }
                compared |= !self.entries[i].0.is_null();
            }
        }
        // A key comparable with any stored non-null key is comparable with the witness
        if let (false, false, Some(w)) = (compared, key.is_null(), self.witness) {
            self.eq.equals(&self.entries[w].0, key)?;
        }
        Ok((hash, None))
    }

    fn push(&mut self, hash: i32, key: Value, item: T) -> usize {
        let i = self.entries.len();
        if self.witness.is_none() && !key.is_null() {
            self.witness = Some(i);
        }
        self.buckets.entry(hash).or_default().push(i);
        self.entries.push((key, item));
        i
    }

    pub fn contains(&self, key: &Value) -> BridgeResult<bool> {
        Ok(self.locate(key)?.1.is_some())
    }

    pub fn get(&self, key: &Value) -> BridgeResult<Option<&T>> {
        Ok(self.locate(key)?.1.map(|i| &self.entries[i].1))
    }

    /// Insert `item` under `key` unless an equal key is already present.
    /// Returns whether the index grew.
    pub fn insert(&mut self, key: Value, item: T) -> BridgeResult<bool> {
        let (hash, found) = self.locate(&key)?;
        if found.is_some() {
            return Ok(false);
        }
        self.push(hash, key, item);
        Ok(true)
    }

    /// Item stored under `key`, inserting `make()` first when absent
    pub fn get_or_insert_with(&mut self, key: Value, make: impl FnOnce() -> T) -> BridgeResult<&mut T> {
        let (hash, found) = self.locate(&key)?;
        let index = match found {
            Some(i) => i,
            None => self.push(hash, key, make()),
        };
        Ok(&mut self.entries[index].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Items in first-insertion order
    pub fn into_values(self) -> Vec<T> {
        self.entries.into_iter().map(|(_, item)| item).collect()
    }

    pub fn into_entries(self) -> Vec<(Value, T)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jbridge_runtime::{HeapRuntime, SetOrder};

    #[test]
    fn test_primitive_equality() {
        let rt = HeapRuntime::new();
        let eq = EqualityAdapter::new(&rt);

        assert!(eq.equals(&Value::Int(3), &Value::Int(3)).unwrap());
        assert!(!eq.equals(&Value::from("a"), &Value::from("b")).unwrap());
        assert!(eq.equals(&Value::Float(f64::NAN), &Value::Float(f64::NAN)).unwrap());
        assert!(!eq.equals(&Value::Float(0.0), &Value::Float(-0.0)).unwrap());
    }

    #[test]
    fn test_null_is_comparable_with_anything() {
        let rt = HeapRuntime::new();
        let eq = EqualityAdapter::new(&rt);

        assert!(eq.equals(&Value::Null, &Value::Null).unwrap());
        assert!(!eq.equals(&Value::Null, &Value::Int(0)).unwrap());
        assert!(!eq.equals(&Value::from("x"), &Value::Null).unwrap());
    }

    #[test]
    fn test_incomparable_classes_fail() {
        let rt = HeapRuntime::new();
        let eq = EqualityAdapter::new(&rt);
        let list = rt.new_list([1]);

        let err = eq.equals(&Value::Int(1), &Value::from("1")).unwrap_err();
        assert!(matches!(err, BridgeError::ClassMismatch { .. }));
        let err = eq.equals(&Value::Int(1), &Value::Handle(list)).unwrap_err();
        assert!(matches!(err, BridgeError::ClassMismatch { .. }));
    }

    #[test]
    fn test_handles_use_foreign_equality() {
        let rt = HeapRuntime::new();
        let eq = EqualityAdapter::new(&rt);
        let a = Value::Handle(rt.new_list([1, 2]));
        let b = Value::Handle(rt.new_list([1, 2]));
        let s = Value::Handle(rt.new_set([1, 2], SetOrder::Insertion).unwrap());

        assert!(eq.equals(&a, &b).unwrap());
        assert_eq!(eq.hash_code(&a).unwrap(), eq.hash_code(&b).unwrap());
        assert!(eq.equals(&a, &s).is_err());
    }

    #[test]
    fn test_index_rejects_incomparable_keys_regardless_of_hash() {
        let rt = HeapRuntime::new();
        let eq = EqualityAdapter::new(&rt);
        let a = Value::from("a");
        assert_ne!(eq.hash_code(&a).unwrap(), eq.hash_code(&Value::Int(98)).unwrap());

        let mut index = eq.index();
        assert!(index.insert(Value::Null, ()).unwrap());
        assert!(index.insert(a, ()).unwrap());
        assert!(matches!(index.insert(Value::Int(98), ()), Err(BridgeError::ClassMismatch { .. })));
        assert!(matches!(index.contains(&Value::Int(97)), Err(BridgeError::ClassMismatch { .. })));
        assert!(!index.contains(&Value::from("b")).unwrap());
        assert!(index.contains(&Value::Null).unwrap());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_index_dedupes_by_foreign_equality() {
        let rt = HeapRuntime::new();
        let eq = EqualityAdapter::new(&rt);
        let mut index = eq.index();

        assert!(index.insert(Value::Handle(rt.new_list([1])), "first").unwrap());
        assert!(!index.insert(Value::Handle(rt.new_list([1])), "second").unwrap());
        assert!(index.insert(Value::Handle(rt.new_list([2])), "third").unwrap());

        *index.get_or_insert_with(Value::Handle(rt.new_list([2])), || "x").unwrap() = "updated";
        assert_eq!(index.into_values(), vec!["first", "updated"]);
    }
}
