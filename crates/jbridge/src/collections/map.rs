//! Map view and its live projections
//!
//! `key_set`, `values` and `entry_set` are views over the same foreign map.
//! Removing through any of them removes the mapping; entries write through
//! with [`MapEntry::set_value`].

use std::marker::PhantomData;

use tracing::trace;

use jbridge_types::{BridgeResult, ForeignKind, HandleRef, MapPart, Value};

use super::{JavaCollection, JavaSet};
use crate::convert::expect_kind;
use crate::iter::{JavaIterator, TwoStep};
use crate::{Bridge, Bridged};

// ─────────────────────────────────────────────────────────────────────────────
// Java Map
// ─────────────────────────────────────────────────────────────────────────────

/// View over a foreign map
///
/// A key mapped to `null` counts as absent for the present/absent branching
/// of `put_if_absent`, the `compute*` family and `merge`.
pub struct JavaMap<K, V> {
    bridge: Bridge,
    handle: HandleRef,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K: Bridged, V: Bridged> JavaMap<K, V> {
    /// View a foreign map. Fails with `ClassMismatch` for anything else.
    pub fn from_handle(bridge: &Bridge, handle: HandleRef) -> BridgeResult<Self> {
        Self::from_foreign(bridge, Value::Handle(handle))
    }

    pub fn handle(&self) -> HandleRef {
        self.handle
    }

    pub fn size(&self) -> BridgeResult<usize> {
        self.bridge.runtime().size(self.handle)
    }

    pub fn is_empty(&self) -> BridgeResult<bool> {
        self.bridge.runtime().is_empty(self.handle)
    }

    pub fn clear(&self) -> BridgeResult<()> {
        self.bridge.runtime().clear(self.handle)
    }

    /// Current non-null mapping of an already converted key
    fn present(&self, key: &Value) -> BridgeResult<Option<Value>> {
        Ok(self
            .bridge
            .runtime()
            .map_get(self.handle, key)?
            .filter(|v| !v.is_null()))
    }

    fn convert(&self, value: Value) -> BridgeResult<V> {
        V::from_foreign(&self.bridge, value)
    }

    pub fn get(&self, key: &K) -> BridgeResult<Option<V>> {
        let key = key.to_foreign(&self.bridge)?;
        self.bridge
            .runtime()
            .map_get(self.handle, &key)?
            .map(|v| self.convert(v))
            .transpose()
    }

    pub fn contains_key(&self, key: &K) -> BridgeResult<bool> {
        let key = key.to_foreign(&self.bridge)?;
        self.bridge.runtime().map_contains_key(self.handle, &key)
    }

    pub fn contains_value(&self, value: &V) -> BridgeResult<bool> {
        self.values()?.contains(value)
    }

    /// Associate `value` with `key`, returning the previous mapping
    pub fn put(&self, key: K, value: V) -> BridgeResult<Option<V>> {
        let key = key.to_foreign(&self.bridge)?;
        let value = value.to_foreign(&self.bridge)?;
        self.bridge
            .runtime()
            .map_put(self.handle, key, value)?
            .map(|v| self.convert(v))
            .transpose()
    }

    pub fn remove(&self, key: &K) -> BridgeResult<Option<V>> {
        let key = key.to_foreign(&self.bridge)?;
        self.bridge
            .runtime()
            .map_remove(self.handle, &key)?
            .map(|v| self.convert(v))
            .transpose()
    }

    pub fn get_or_default(&self, key: &K, default: V) -> BridgeResult<V> {
        let key = key.to_foreign(&self.bridge)?;
        match self.bridge.runtime().map_get(self.handle, &key)? {
            Some(v) => self.convert(v),
            None => Ok(default),
        }
    }

    /// Map `key` to `value` unless it is already present. Returns the existing value.
    pub fn put_if_absent(&self, key: K, value: V) -> BridgeResult<Option<V>> {
        let key = key.to_foreign(&self.bridge)?;
        if let Some(existing) = self.present(&key)? {
            return self.convert(existing).map(Some);
        }
        let value = value.to_foreign(&self.bridge)?;
        self.bridge.runtime().map_put(self.handle, key, value)?;
        Ok(None)
    }

    /// Compute a value only when `key` is absent. `None` creates no mapping.
    pub fn compute_if_absent<F>(&self, key: K, f: F) -> BridgeResult<Option<V>>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        let raw_key = key.to_foreign(&self.bridge)?;
        if let Some(existing) = self.present(&raw_key)? {
            return self.convert(existing).map(Some);
        }
        match f(&key) {
            Some(value) => {
                let raw = value.to_foreign(&self.bridge)?;
                self.bridge.runtime().map_put(self.handle, raw_key, raw)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Recompute a present value. `None` removes the mapping.
    pub fn compute_if_present<F>(&self, key: K, f: F) -> BridgeResult<Option<V>>
    where
        F: FnOnce(&K, V) -> Option<V>,
    {
        let raw_key = key.to_foreign(&self.bridge)?;
        let Some(existing) = self.present(&raw_key)? else {
            return Ok(None);
        };
        let existing = self.convert(existing)?;
        self.store(raw_key, f(&key, existing))
    }

    /// Recompute the mapping from its current value (or `None`). `None` removes it.
    pub fn compute<F>(&self, key: K, f: F) -> BridgeResult<Option<V>>
    where
        F: FnOnce(&K, Option<V>) -> Option<V>,
    {
        let raw_key = key.to_foreign(&self.bridge)?;
        let existing = self.present(&raw_key)?.map(|v| self.convert(v)).transpose()?;
        self.store(raw_key, f(&key, existing))
    }

    /// Insert `value` when absent, otherwise combine it with the present value.
    /// A combination of `None` removes the mapping.
    pub fn merge<F>(&self, key: K, value: V, f: F) -> BridgeResult<Option<V>>
    where
        F: FnOnce(V, V) -> Option<V>,
    {
        let raw_key = key.to_foreign(&self.bridge)?;
        let merged = match self.present(&raw_key)? {
            Some(existing) => f(self.convert(existing)?, value),
            None => Some(value),
        };
        self.store(raw_key, merged)
    }

    /// Write a computed result: `Some` puts, `None` removes
    fn store(&self, key: Value, result: Option<V>) -> BridgeResult<Option<V>> {
        match result {
            Some(value) => {
                let raw = value.to_foreign(&self.bridge)?;
                self.bridge.runtime().map_put(self.handle, key, raw)?;
                Ok(Some(value))
            }
            None => {
                if self.bridge.runtime().map_contains_key(self.handle, &key)? {
                    self.bridge.runtime().map_remove(self.handle, &key)?;
                }
                Ok(None)
            }
        }
    }

    /// Replace every value with `f(key, value)`, writing through the entries
    pub fn replace_all<F>(&self, mut f: F) -> BridgeResult<()>
    where
        F: FnMut(&K, V) -> V,
    {
        let mut cursor = self.entry_set()?.iterator()?;
        while cursor.has_next()? {
            let entry = cursor.next_element()?;
            let key = entry.key()?;
            let replaced = f(&key, entry.value()?);
            entry.set_value(replaced)?;
        }
        Ok(())
    }

    pub fn for_each<F>(&self, mut f: F) -> BridgeResult<()>
    where
        F: FnMut(K, V),
    {
        for entry in self.entry_set()?.iter() {
            let entry = entry?;
            f(entry.key()?, entry.value()?);
        }
        Ok(())
    }

    /// Snapshot of every mapping in the map's iteration order
    pub fn entries(&self) -> BridgeResult<Vec<(K, V)>> {
        let mut out = Vec::new();
        self.for_each(|k, v| out.push((k, v)))?;
        Ok(out)
    }

    fn view(&self, part: MapPart) -> BridgeResult<HandleRef> {
        self.bridge.runtime().map_view(self.handle, part)
    }

    /// Live set of keys
    pub fn key_set(&self) -> BridgeResult<JavaSet<K>> {
        Ok(JavaSet::unchecked(self.bridge.clone(), self.view(MapPart::Keys)?))
    }

    /// Live collection of values
    pub fn values(&self) -> BridgeResult<MapValues<V>> {
        Ok(MapValues {
            bridge: self.bridge.clone(),
            view: self.view(MapPart::Values)?,
            _elem: PhantomData,
        })
    }

    /// Live set of entries
    pub fn entry_set(&self) -> BridgeResult<MapEntrySet<K, V>> {
        Ok(MapEntrySet {
            bridge: self.bridge.clone(),
            map: self.handle,
            view: self.view(MapPart::Entries)?,
            _types: PhantomData,
        })
    }
}

impl<K: Bridged, V: Bridged> Bridged for JavaMap<K, V> {
    fn from_foreign(bridge: &Bridge, value: Value) -> BridgeResult<Self> {
        let handle = expect_kind(bridge, value, "java.util.Map", |k| matches!(k, ForeignKind::Map))?;
        Ok(Self {
            bridge: bridge.clone(),
            handle,
            _types: PhantomData,
        })
    }

    fn to_foreign(&self, _bridge: &Bridge) -> BridgeResult<Value> {
        Ok(Value::Handle(self.handle))
    }
}

impl<K, V> Clone for JavaMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            handle: self.handle,
            _types: PhantomData,
        }
    }
}

impl<K, V> std::fmt::Debug for JavaMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("JavaMap").field(&self.handle).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Values View
// ─────────────────────────────────────────────────────────────────────────────

/// Live collection of a map's values. Duplicates are allowed; adding is not.
pub struct MapValues<V> {
    bridge: Bridge,
    view: HandleRef,
    _elem: PhantomData<fn() -> V>,
}

impl<V: Bridged> JavaCollection<V> for MapValues<V> {
    type Iter = JavaIterator<V>;

    fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    fn size(&self) -> BridgeResult<usize> {
        self.bridge.runtime().size(self.view)
    }

    fn is_empty(&self) -> BridgeResult<bool> {
        self.bridge.runtime().is_empty(self.view)
    }

    fn contains(&self, element: &V) -> BridgeResult<bool> {
        let value = element.to_foreign(&self.bridge)?;
        self.bridge.runtime().contains(self.view, &value)
    }

    fn iterator(&self) -> BridgeResult<JavaIterator<V>> {
        JavaIterator::over(&self.bridge, self.view)
    }

    /// Always `Unsupported`
    fn add(&self, element: V) -> BridgeResult<bool> {
        let value = element.to_foreign(&self.bridge)?;
        self.bridge.runtime().add(self.view, value)
    }

    /// Remove the first mapping whose value equals `element`
    fn remove(&self, element: &V) -> BridgeResult<bool> {
        let needle = element.to_foreign(&self.bridge)?;
        let eq = self.bridge.equality();
        let mut cursor = JavaIterator::<Value>::over(&self.bridge, self.view)?;
        while cursor.has_next()? {
            if eq.equals(&cursor.next_element()?, &needle)? {
                cursor.remove()?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn clear(&self) -> BridgeResult<()> {
        self.bridge.runtime().clear(self.view)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Set View
// ─────────────────────────────────────────────────────────────────────────────

/// Live set of a map's entries
pub struct MapEntrySet<K, V> {
    bridge: Bridge,
    map: HandleRef,
    view: HandleRef,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K: Bridged, V: Bridged> MapEntrySet<K, V> {
    /// Whether the map currently maps `key` to a value equal to `value`
    pub fn contains_pair(&self, key: &K, value: &V) -> BridgeResult<bool> {
        let key = key.to_foreign(&self.bridge)?;
        let needle = value.to_foreign(&self.bridge)?;
        if !self.bridge.runtime().map_contains_key(self.map, &key)? {
            return Ok(false);
        }
        match self.bridge.runtime().map_get(self.map, &key)? {
            Some(current) => self.bridge.equality().equals(&current, &needle),
            None => Ok(needle.is_null()),
        }
    }
}

impl<K: Bridged, V: Bridged> JavaCollection<MapEntry<K, V>> for MapEntrySet<K, V> {
    type Iter = JavaIterator<MapEntry<K, V>>;

    fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    fn size(&self) -> BridgeResult<usize> {
        self.bridge.runtime().size(self.view)
    }

    fn is_empty(&self) -> BridgeResult<bool> {
        self.bridge.runtime().is_empty(self.view)
    }

    fn contains(&self, entry: &MapEntry<K, V>) -> BridgeResult<bool> {
        self.bridge.runtime().contains(self.view, &Value::Handle(entry.handle))
    }

    fn iterator(&self) -> BridgeResult<JavaIterator<MapEntry<K, V>>> {
        JavaIterator::over(&self.bridge, self.view)
    }

    /// Always `Unsupported`
    fn add(&self, entry: MapEntry<K, V>) -> BridgeResult<bool> {
        self.bridge.runtime().add(self.view, Value::Handle(entry.handle))
    }

    fn remove(&self, entry: &MapEntry<K, V>) -> BridgeResult<bool> {
        self.bridge.runtime().remove(self.view, &Value::Handle(entry.handle))
    }

    fn clear(&self) -> BridgeResult<()> {
        self.bridge.runtime().clear(self.view)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Map Entry
// ─────────────────────────────────────────────────────────────────────────────

/// One mapping, bound to its owning map
///
/// Wrappers converted from the same entry handle through one bridge share
/// it; the handle is released when the last of them drops. An entry whose key
/// has been removed from the map fails with `IllegalState`.
pub struct MapEntry<K, V> {
    bridge: Bridge,
    handle: HandleRef,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K: Bridged, V: Bridged> MapEntry<K, V> {
    pub fn handle(&self) -> HandleRef {
        self.handle
    }

    pub fn key(&self) -> BridgeResult<K> {
        let key = self.bridge.runtime().entry_key(self.handle)?;
        K::from_foreign(&self.bridge, key)
    }

    /// Current value in the owning map
    pub fn value(&self) -> BridgeResult<V> {
        let value = self.bridge.runtime().entry_value(self.handle)?;
        V::from_foreign(&self.bridge, value)
    }

    /// Write a new value through to the owning map, returning the old one
    pub fn set_value(&self, value: V) -> BridgeResult<V> {
        let raw = value.to_foreign(&self.bridge)?;
        let old = self.bridge.runtime().entry_set_value(self.handle, raw)?;
        V::from_foreign(&self.bridge, old)
    }
}

impl<K: Bridged, V: Bridged> Bridged for MapEntry<K, V> {
    fn from_foreign(bridge: &Bridge, value: Value) -> BridgeResult<Self> {
        let handle = expect_kind(bridge, value, "java.util.Map$Entry", |k| {
            matches!(k, ForeignKind::Entry)
        })?;
        bridge.retain_entry(handle);
        Ok(Self {
            bridge: bridge.clone(),
            handle,
            _types: PhantomData,
        })
    }

    fn to_foreign(&self, _bridge: &Bridge) -> BridgeResult<Value> {
        Ok(Value::Handle(self.handle))
    }
}

impl<K, V> Drop for MapEntry<K, V> {
    fn drop(&mut self) {
        if let Err(e) = self.bridge.release_entry(self.handle) {
            trace!("Entry {} was already gone: {}", self.handle, e);
        }
    }
}

impl<K, V> std::fmt::Debug for MapEntry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MapEntry").field(&self.handle).finish()
    }
}
