//! In-process foreign heap
//!
//! [`HeapRuntime`] implements [`ForeignRuntime`] over an arena of objects keyed
//! by handle id. Live views (map key/value/entry sets, map entries, iterators)
//! are arena objects that point at their backing object by handle, so every
//! mutation is observed through every view of the same store.
//!
//! Iterators are fail-fast: each cursor remembers the structural version of its
//! source and fails with `ConcurrentStructuralChange` once the source was
//! structurally modified by anything other than the cursor itself.

mod object;
mod semantics;

pub use object::{CollectionOptions, SetOrder};

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, trace};

use jbridge_types::{BridgeError, BridgeResult, ForeignKind, HandleRef, MapPart, Value};

use crate::{EnumRegistry, ForeignRuntime};
use object::*;

// ─────────────────────────────────────────────────────────────────────────────
// Heap Storage
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct Heap {
    next_id: u64,
    objects: HashMap<u64, Object>,
    /// One live view object per (map, part)
    views: HashMap<(HandleRef, MapPart), HandleRef>,
    enums: EnumRegistry,
}

impl Heap {
    fn alloc(&mut self, object: Object) -> HandleRef {
        self.next_id += 1;
        self.objects.insert(self.next_id, object);
        HandleRef::from_raw(self.next_id)
    }

    pub(crate) fn object(&self, handle: HandleRef) -> BridgeResult<&Object> {
        self.objects
            .get(&handle.raw())
            .ok_or(BridgeError::StaleHandle(handle))
    }

    fn object_mut(&mut self, handle: HandleRef) -> BridgeResult<&mut Object> {
        self.objects
            .get_mut(&handle.raw())
            .ok_or(BridgeError::StaleHandle(handle))
    }

    pub(crate) fn class_name_of(&self, handle: HandleRef) -> BridgeResult<String> {
        Ok(match self.object(handle)? {
            Object::List(list) => list_class(&list.options).to_string(),
            Object::Set(set) => set_class(set.order, &set.options).to_string(),
            Object::Map(map) => map_class(map.order, &map.options).to_string(),
            Object::MapView { map, part } => {
                let base = self.class_name_of(*map)?;
                match part {
                    MapPart::Keys => format!("{}$KeySet", base),
                    MapPart::Values => format!("{}$Values", base),
                    MapPart::Entries => format!("{}$EntrySet", base),
                }
            }
            Object::Entry { .. } => "java.util.Map$Entry".to_string(),
            Object::Iterator(_) => "java.util.Iterator".to_string(),
            Object::Constant(c) => c.type_name.clone(),
            Object::Record(r) => r.class.clone(),
        })
    }

    fn kind_of(&self, handle: HandleRef) -> BridgeResult<ForeignKind> {
        Ok(match self.object(handle)? {
            Object::List(_) => ForeignKind::List,
            Object::Set(_) => ForeignKind::Set,
            Object::Map(_) => ForeignKind::Map,
            Object::MapView { part, .. } => ForeignKind::MapView { part: *part },
            Object::Entry { .. } => ForeignKind::Entry,
            Object::Iterator(_) => ForeignKind::Iterator,
            Object::Constant(c) => ForeignKind::EnumConstant {
                type_name: c.type_name.clone(),
            },
            Object::Record(r) => ForeignKind::Object {
                class: r.class.clone(),
            },
        })
    }

    // ── Typed access ─────────────────────────────────────────────────────────

    fn mismatch(&self, expected: &str, handle: HandleRef) -> BridgeError {
        match self.class_name_of(handle) {
            Ok(actual) => BridgeError::class_mismatch(expected, actual),
            Err(e) => e,
        }
    }

    fn list(&self, handle: HandleRef) -> BridgeResult<&ListObject> {
        match self.object(handle)? {
            Object::List(list) => Ok(list),
            _ => Err(self.mismatch("java.util.List", handle)),
        }
    }

    fn list_mut(&mut self, handle: HandleRef) -> BridgeResult<&mut ListObject> {
        if !matches!(self.object(handle)?, Object::List(_)) {
            return Err(self.mismatch("java.util.List", handle));
        }
        match self.object_mut(handle)? {
            Object::List(list) => Ok(list),
            _ => unreachable!("checked above"),
        }
    }

    fn set_mut(&mut self, handle: HandleRef) -> BridgeResult<&mut SetObject> {
        if !matches!(self.object(handle)?, Object::Set(_)) {
            return Err(self.mismatch("java.util.Set", handle));
        }
        match self.object_mut(handle)? {
            Object::Set(set) => Ok(set),
            _ => unreachable!("checked above"),
        }
    }

    fn map(&self, handle: HandleRef) -> BridgeResult<&MapObject> {
        match self.object(handle)? {
            Object::Map(map) => Ok(map),
            _ => Err(self.mismatch("java.util.Map", handle)),
        }
    }

    fn map_mut(&mut self, handle: HandleRef) -> BridgeResult<&mut MapObject> {
        if !matches!(self.object(handle)?, Object::Map(_)) {
            return Err(self.mismatch("java.util.Map", handle));
        }
        match self.object_mut(handle)? {
            Object::Map(map) => Ok(map),
            _ => unreachable!("checked above"),
        }
    }

    pub(crate) fn map_entries(&self, handle: HandleRef) -> BridgeResult<&[(Value, Value)]> {
        Ok(&self.map(handle)?.entries)
    }

    // ── Sources ──────────────────────────────────────────────────────────────

    /// Resolve an iterable collection handle to the store it reads from
    fn source(&self, handle: HandleRef) -> BridgeResult<Source> {
        match self.object(handle)? {
            Object::List(_) => Ok(Source::List(handle)),
            Object::Set(_) => Ok(Source::Set(handle)),
            Object::MapView { map, part } => Ok(Source::Map(*map, *part)),
            _ => Err(self.mismatch("java.lang.Iterable", handle)),
        }
    }

    /// Resolve any sized handle (collections and maps)
    fn sized_source(&self, handle: HandleRef) -> BridgeResult<Source> {
        match self.object(handle)? {
            Object::Map(_) => Ok(Source::Map(handle, MapPart::Entries)),
            _ => self.source(handle),
        }
    }

    fn source_len(&self, source: Source) -> BridgeResult<usize> {
        match source {
            Source::List(h) => Ok(self.list(h)?.items.len()),
            Source::Set(h) => match self.object(h)? {
                Object::Set(set) => Ok(set.items.len()),
                _ => Err(self.mismatch("java.util.Set", h)),
            },
            Source::Map(h, _) => Ok(self.map(h)?.entries.len()),
        }
    }

    fn source_version(&self, source: Source) -> BridgeResult<u64> {
        match source {
            Source::List(h) => Ok(self.list(h)?.version),
            Source::Set(h) => match self.object(h)? {
                Object::Set(set) => Ok(set.version),
                _ => Err(self.mismatch("java.util.Set", h)),
            },
            Source::Map(h, _) => Ok(self.map(h)?.version),
        }
    }

    fn source_options(&self, source: Source) -> BridgeResult<&CollectionOptions> {
        match source {
            Source::List(h) => Ok(&self.list(h)?.options),
            Source::Set(h) => match self.object(h)? {
                Object::Set(set) => Ok(&set.options),
                _ => Err(self.mismatch("java.util.Set", h)),
            },
            Source::Map(h, _) => Ok(&self.map(h)?.options),
        }
    }

    fn element_at(&mut self, source: Source, position: usize) -> BridgeResult<Value> {
        match source {
            Source::List(h) => Ok(self.list(h)?.items[position].clone()),
            Source::Set(h) => match self.object(h)? {
                Object::Set(set) => Ok(set.items[position].clone()),
                _ => Err(self.mismatch("java.util.Set", h)),
            },
            Source::Map(h, part) => {
                let (key, value) = self.map(h)?.entries[position].clone();
                Ok(match part {
                    MapPart::Keys => key,
                    MapPart::Values => value,
                    MapPart::Entries => Value::Handle(self.alloc(Object::Entry { map: h, key })),
                })
            }
        }
    }

    fn remove_at(&mut self, source: Source, position: usize) -> BridgeResult<()> {
        match source {
            Source::List(h) => {
                let list = self.list_mut(h)?;
                list.items.remove(position);
                list.version += 1;
            }
            Source::Set(h) => {
                let set = self.set_mut(h)?;
                set.items.remove(position);
                set.version += 1;
            }
            Source::Map(h, _) => {
                let map = self.map_mut(h)?;
                map.entries.remove(position);
                map.version += 1;
            }
        }
        Ok(())
    }

    // ── Constraints ──────────────────────────────────────────────────────────

    fn check_mutable(options: &CollectionOptions, op: &str) -> BridgeResult<()> {
        if options.unmodifiable {
            return Err(BridgeError::unsupported(format!("{} on an unmodifiable collection", op)));
        }
        Ok(())
    }

    fn check_element(&self, options: &CollectionOptions, value: &Value, what: &str) -> BridgeResult<()> {
        if value.is_null() {
            if options.forbid_null {
                return Err(BridgeError::null_not_allowed(format!("{} may not be null", what)));
            }
            return Ok(());
        }
        if let Some(expected) = &options.element_class {
            let actual = self.class_of(value)?;
            if &actual != expected {
                return Err(BridgeError::class_mismatch(expected.clone(), actual));
            }
        }
        Ok(())
    }

    // ── Ordered lookup ───────────────────────────────────────────────────────

    /// Locate `value` among `len` ordered keys: `Ok(index)` when present,
    /// `Err(insertion point)` when absent.
    fn locate<'a>(
        &self,
        len: usize,
        key_at: impl Fn(usize) -> &'a Value,
        order: SetOrder,
        value: &Value,
    ) -> BridgeResult<Result<usize, usize>> {
        match order {
            SetOrder::Sorted => {
                if value.is_null() {
                    return Err(BridgeError::null_not_allowed("sorted collections cannot order null"));
                }
                let (mut lo, mut hi) = (0, len);
                while lo < hi {
                    let mid = (lo + hi) / 2;
                    match self.compare(key_at(mid), value)? {
                        std::cmp::Ordering::Less => lo = mid + 1,
                        std::cmp::Ordering::Greater => hi = mid,
                        std::cmp::Ordering::Equal => return Ok(Ok(mid)),
                    }
                }
                Ok(Err(lo))
            }
            SetOrder::Insertion => {
                for i in 0..len {
                    if self.strict_eq(key_at(i), value)? {
                        return Ok(Ok(i));
                    }
                }
                Ok(Err(len))
            }
            SetOrder::Hashed => {
                let hash = self.hash(value)? as u32;
                let mut insert_at = len;
                for i in 0..len {
                    let key = key_at(i);
                    if self.strict_eq(key, value)? {
                        return Ok(Ok(i));
                    }
                    if insert_at == len && self.hash(key)? as u32 > hash {
                        insert_at = i;
                    }
                }
                Ok(Err(insert_at))
            }
        }
    }

    fn locate_key(&self, map: HandleRef, key: &Value) -> BridgeResult<Result<usize, usize>> {
        let m = self.map(map)?;
        self.locate(m.entries.len(), |i| &m.entries[i].0, m.order, key)
    }

    /// Key and value of an entry handle, `None` for anything else or a stale entry
    fn entry_like(&self, value: &Value) -> BridgeResult<Option<(Value, Value)>> {
        let Value::Handle(h) = value else {
            return Ok(None);
        };
        if !matches!(self.object(*h)?, Object::Entry { .. }) {
            return Ok(None);
        }
        match self.entry_pair(*h) {
            Ok(pair) => Ok(Some(pair)),
            Err(BridgeError::IllegalState(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Position of a (key, value) pair in a map, comparing the value too
    fn locate_pair(&self, map: HandleRef, key: &Value, value: &Value) -> BridgeResult<Option<usize>> {
        match self.locate_key(map, key)? {
            Ok(i) if self.strict_eq(&self.map(map)?.entries[i].1, value)? => Ok(Some(i)),
            _ => Ok(None),
        }
    }

    /// Position of the first mapping whose value equals `value`
    fn value_position(&self, map: HandleRef, value: &Value) -> BridgeResult<Option<usize>> {
        for (i, (_, v)) in self.map_entries(map)?.iter().enumerate() {
            if self.strict_eq(v, value)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Heap Runtime
// ─────────────────────────────────────────────────────────────────────────────

/// In-process foreign runtime
///
/// The mutex only makes the heap shareable; the bridge contract stays
/// single-writer and callers must not mutate a collection structurally from
/// two places during one traversal.
#[derive(Debug, Default)]
pub struct HeapRuntime {
    heap: Mutex<Heap>,
}

impl HeapRuntime {
    /// Create an empty runtime
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects, including views, cursors and entries
    pub fn object_count(&self) -> usize {
        self.heap.lock().objects.len()
    }

    /// Create a mutable `ArrayList`
    pub fn new_list<I, V>(&self, items: I) -> HandleRef
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.heap.lock().alloc(Object::List(ListObject {
            items,
            options: CollectionOptions::default(),
            version: 0,
        }))
    }

    /// Create a list with constraints. Initial items must satisfy them.
    pub fn new_list_with<I, V>(&self, items: I, options: CollectionOptions) -> BridgeResult<HandleRef>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut heap = self.heap.lock();
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        for item in &items {
            heap.check_element(&options, item, "list element")?;
        }
        Ok(heap.alloc(Object::List(ListObject {
            items,
            options,
            version: 0,
        })))
    }

    /// Create a set. Duplicates (by foreign equality or ordering) collapse.
    pub fn new_set<I, V>(&self, items: I, order: SetOrder) -> BridgeResult<HandleRef>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.new_set_with(items, order, CollectionOptions::default())
    }

    pub fn new_set_with<I, V>(
        &self,
        items: I,
        order: SetOrder,
        options: CollectionOptions,
    ) -> BridgeResult<HandleRef>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut heap = self.heap.lock();
        let mut stored: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            heap.check_element(&options, &item, "set element")?;
            if let Err(pos) = heap.locate(stored.len(), |i| &stored[i], order, &item)? {
                stored.insert(pos, item);
            }
        }
        Ok(heap.alloc(Object::Set(SetObject {
            items: stored,
            order,
            options,
            version: 0,
        })))
    }

    /// Create a map. Later duplicates of a key overwrite earlier ones.
    pub fn new_map<I, K, V>(&self, entries: I, order: SetOrder) -> BridgeResult<HandleRef>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        self.new_map_with(entries, order, CollectionOptions::default())
    }

    pub fn new_map_with<I, K, V>(
        &self,
        entries: I,
        order: SetOrder,
        options: CollectionOptions,
    ) -> BridgeResult<HandleRef>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut heap = self.heap.lock();
        let mut stored: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            let (key, value) = (key.into(), value.into());
            heap.check_element(&options, &key, "map key")?;
            if value.is_null() && options.forbid_null {
                return Err(BridgeError::null_not_allowed("map value may not be null"));
            }
            match heap.locate(stored.len(), |i| &stored[i].0, order, &key)? {
                Ok(i) => stored[i].1 = value,
                Err(pos) => stored.insert(pos, (key, value)),
            }
        }
        Ok(heap.alloc(Object::Map(MapObject {
            entries: stored,
            order,
            options,
            version: 0,
        })))
    }

    /// Create a plain object whose equality is defined by its class and fields
    pub fn new_record<I, N, V>(&self, class: impl Into<String>, fields: I) -> HandleRef
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<Value>,
    {
        let fields = fields.into_iter().map(|(n, v)| (n.into(), v.into())).collect();
        self.heap.lock().alloc(Object::Record(RecordObject {
            class: class.into(),
            fields,
        }))
    }

    /// Read a record field
    pub fn record_field(&self, record: HandleRef, name: &str) -> BridgeResult<Option<Value>> {
        let heap = self.heap.lock();
        match heap.object(record)? {
            Object::Record(r) => Ok(r.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())),
            _ => Err(heap.mismatch("record", record)),
        }
    }

    /// Define an enumerated type. Constants get ordinals in declaration order.
    pub fn define_enum(&self, type_name: &str, names: &[&str]) -> BridgeResult<Vec<HandleRef>> {
        let mut heap = self.heap.lock();
        heap.enums
            .check(type_name, names)
            .map_err(|e| BridgeError::illegal_state(e.to_string()))?;

        let constants: Vec<(String, HandleRef)> = names
            .iter()
            .enumerate()
            .map(|(ordinal, name)| {
                let handle = heap.alloc(Object::Constant(ConstantObject {
                    type_name: type_name.to_string(),
                    name: name.to_string(),
                    ordinal: ordinal as u32,
                }));
                (name.to_string(), handle)
            })
            .collect();

        let handles = heap
            .enums
            .define(type_name, constants)
            .map_err(|e| BridgeError::illegal_state(e.to_string()))?
            .constants()
            .to_vec();
        debug!("Defined enum {} with {} constants", type_name, handles.len());
        Ok(handles)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ForeignRuntime Implementation
// ─────────────────────────────────────────────────────────────────────────────

impl ForeignRuntime for HeapRuntime {
    fn kind_of(&self, handle: HandleRef) -> BridgeResult<ForeignKind> {
        self.heap.lock().kind_of(handle)
    }

    fn class_name(&self, handle: HandleRef) -> BridgeResult<String> {
        self.heap.lock().class_name_of(handle)
    }

    fn release(&self, handle: HandleRef) -> BridgeResult<()> {
        let mut heap = self.heap.lock();
        if let Object::Constant(c) = heap.object(handle)? {
            return Err(BridgeError::unsupported(format!(
                "releasing constant {}.{}",
                c.type_name, c.name
            )));
        }
        heap.objects.remove(&handle.raw());
        let mut orphaned = Vec::new();
        heap.views.retain(|(map, _), view| {
            if *map == handle {
                orphaned.push(*view);
            }
            *map != handle && *view != handle
        });
        for view in orphaned {
            heap.objects.remove(&view.raw());
        }
        trace!("Released {}", handle);
        Ok(())
    }

    fn equals(&self, a: &Value, b: &Value) -> BridgeResult<bool> {
        self.heap.lock().strict_eq(a, b)
    }

    fn hash_code(&self, value: &Value) -> BridgeResult<i32> {
        self.heap.lock().hash(value)
    }

    fn size(&self, coll: HandleRef) -> BridgeResult<usize> {
        let heap = self.heap.lock();
        let source = heap.sized_source(coll)?;
        heap.source_len(source)
    }

    fn is_empty(&self, coll: HandleRef) -> BridgeResult<bool> {
        Ok(self.size(coll)? == 0)
    }

    fn contains(&self, coll: HandleRef, value: &Value) -> BridgeResult<bool> {
        let heap = self.heap.lock();
        match heap.source(coll)? {
            Source::List(h) => Ok(heap.position_eq(&heap.list(h)?.items, value)?.is_some()),
            Source::Set(h) => {
                let Object::Set(set) = heap.object(h)? else {
                    return Err(heap.mismatch("java.util.Set", h));
                };
                Ok(heap.locate(set.items.len(), |i| &set.items[i], set.order, value)?.is_ok())
            }
            Source::Map(h, MapPart::Keys) => Ok(heap.locate_key(h, value)?.is_ok()),
            Source::Map(h, MapPart::Values) => Ok(heap.value_position(h, value)?.is_some()),
            Source::Map(h, MapPart::Entries) => match heap.entry_like(value)? {
                Some((k, v)) => Ok(heap.locate_pair(h, &k, &v)?.is_some()),
                None => Ok(false),
            },
        }
    }

    fn add(&self, coll: HandleRef, value: Value) -> BridgeResult<bool> {
        let mut heap = self.heap.lock();
        let source = heap.source(coll)?;
        Heap::check_mutable(heap.source_options(source)?, "add")?;
        match source {
            Source::List(h) => {
                heap.check_element(&heap.list(h)?.options, &value, "list element")?;
                let list = heap.list_mut(h)?;
                list.items.push(value);
                list.version += 1;
                Ok(true)
            }
            Source::Set(h) => {
                let Object::Set(set) = heap.object(h)? else {
                    return Err(heap.mismatch("java.util.Set", h));
                };
                heap.check_element(&set.options, &value, "set element")?;
                match heap.locate(set.items.len(), |i| &set.items[i], set.order, &value)? {
                    Ok(_) => Ok(false),
                    Err(pos) => {
                        let set = heap.set_mut(h)?;
                        set.items.insert(pos, value);
                        set.version += 1;
                        Ok(true)
                    }
                }
            }
            Source::Map(_, part) => Err(BridgeError::unsupported(format!("add to a map {} view", part))),
        }
    }

    fn remove(&self, coll: HandleRef, value: &Value) -> BridgeResult<bool> {
        let mut heap = self.heap.lock();
        let source = heap.source(coll)?;
        Heap::check_mutable(heap.source_options(source)?, "remove")?;
        let position = match source {
            Source::List(h) => heap.position_eq(&heap.list(h)?.items, value)?,
            Source::Set(h) => {
                let Object::Set(set) = heap.object(h)? else {
                    return Err(heap.mismatch("java.util.Set", h));
                };
                heap.locate(set.items.len(), |i| &set.items[i], set.order, value)?.ok()
            }
            Source::Map(h, MapPart::Keys) => heap.locate_key(h, value)?.ok(),
            Source::Map(h, MapPart::Values) => heap.value_position(h, value)?,
            Source::Map(h, MapPart::Entries) => match heap.entry_like(value)? {
                Some((k, v)) => heap.locate_pair(h, &k, &v)?,
                None => None,
            },
        };
        match position {
            Some(i) => {
                heap.remove_at(source, i)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&self, coll: HandleRef) -> BridgeResult<()> {
        let mut heap = self.heap.lock();
        let source = heap.sized_source(coll)?;
        Heap::check_mutable(heap.source_options(source)?, "clear")?;
        match source {
            Source::List(h) => {
                let list = heap.list_mut(h)?;
                list.items.clear();
                list.version += 1;
            }
            Source::Set(h) => {
                let set = heap.set_mut(h)?;
                set.items.clear();
                set.version += 1;
            }
            Source::Map(h, _) => {
                let map = heap.map_mut(h)?;
                map.entries.clear();
                map.version += 1;
            }
        }
        Ok(())
    }

    fn structural_version(&self, coll: HandleRef) -> BridgeResult<u64> {
        let heap = self.heap.lock();
        let source = heap.sized_source(coll)?;
        heap.source_version(source)
    }

    fn iterator(&self, coll: HandleRef) -> BridgeResult<HandleRef> {
        let mut heap = self.heap.lock();
        let source = heap.source(coll)?;
        let expected_version = heap.source_version(source)?;
        Ok(heap.alloc(Object::Iterator(Cursor {
            source,
            position: 0,
            last: None,
            expected_version,
        })))
    }

    fn has_next(&self, iterator: HandleRef) -> BridgeResult<bool> {
        let heap = self.heap.lock();
        let Object::Iterator(cursor) = heap.object(iterator)? else {
            return Err(heap.mismatch("java.util.Iterator", iterator));
        };
        Ok(cursor.position < heap.source_len(cursor.source)?)
    }

    fn next(&self, iterator: HandleRef) -> BridgeResult<Value> {
        let mut heap = self.heap.lock();
        let Object::Iterator(cursor) = heap.object(iterator)? else {
            return Err(heap.mismatch("java.util.Iterator", iterator));
        };
        let (source, position, expected) = (cursor.source, cursor.position, cursor.expected_version);

        if heap.source_version(source)? != expected {
            debug!("Iterator {} invalidated by an outside structural change", iterator);
            return Err(BridgeError::ConcurrentStructuralChange);
        }
        if position >= heap.source_len(source)? {
            return Err(BridgeError::NoSuchElement);
        }

        let value = heap.element_at(source, position)?;
        if let Object::Iterator(cursor) = heap.object_mut(iterator)? {
            cursor.last = Some(position);
            cursor.position = position + 1;
        }
        Ok(value)
    }

    fn iterator_remove(&self, iterator: HandleRef) -> BridgeResult<()> {
        let mut heap = self.heap.lock();
        let Object::Iterator(cursor) = heap.object(iterator)? else {
            return Err(heap.mismatch("java.util.Iterator", iterator));
        };
        let (source, last, expected) = (cursor.source, cursor.last, cursor.expected_version);

        // Protocol misuse is reported ahead of an unmodifiable source
        let Some(last) = last else {
            return Err(BridgeError::illegal_state(
                "remove() requires a preceding next() with no remove() since",
            ));
        };
        Heap::check_mutable(heap.source_options(source)?, "Iterator.remove")?;
        if heap.source_version(source)? != expected {
            return Err(BridgeError::ConcurrentStructuralChange);
        }

        heap.remove_at(source, last)?;
        let version = heap.source_version(source)?;
        if let Object::Iterator(cursor) = heap.object_mut(iterator)? {
            cursor.position = last;
            cursor.last = None;
            cursor.expected_version = version;
        }
        trace!("Iterator {} removed position {}", iterator, last);
        Ok(())
    }

    fn list_get(&self, list: HandleRef, index: usize) -> BridgeResult<Value> {
        let heap = self.heap.lock();
        let items = &heap.list(list)?.items;
        items
            .get(index)
            .cloned()
            .ok_or(BridgeError::IndexOutOfBounds { index, len: items.len() })
    }

    fn list_set(&self, list: HandleRef, index: usize, value: Value) -> BridgeResult<Value> {
        let mut heap = self.heap.lock();
        let obj = heap.list(list)?;
        Heap::check_mutable(&obj.options, "set")?;
        heap.check_element(&obj.options, &value, "list element")?;
        let len = obj.items.len();
        let slot = heap
            .list_mut(list)?
            .items
            .get_mut(index)
            .ok_or(BridgeError::IndexOutOfBounds { index, len })?;
        Ok(std::mem::replace(slot, value))
    }

    fn list_insert(&self, list: HandleRef, index: usize, value: Value) -> BridgeResult<()> {
        let mut heap = self.heap.lock();
        let obj = heap.list(list)?;
        Heap::check_mutable(&obj.options, "add")?;
        heap.check_element(&obj.options, &value, "list element")?;
        let len = obj.items.len();
        if index > len {
            return Err(BridgeError::IndexOutOfBounds { index, len });
        }
        let obj = heap.list_mut(list)?;
        obj.items.insert(index, value);
        obj.version += 1;
        Ok(())
    }

    fn list_remove_at(&self, list: HandleRef, index: usize) -> BridgeResult<Value> {
        let mut heap = self.heap.lock();
        let obj = heap.list(list)?;
        Heap::check_mutable(&obj.options, "remove")?;
        let len = obj.items.len();
        if index >= len {
            return Err(BridgeError::IndexOutOfBounds { index, len });
        }
        let obj = heap.list_mut(list)?;
        obj.version += 1;
        Ok(obj.items.remove(index))
    }

    fn map_get(&self, map: HandleRef, key: &Value) -> BridgeResult<Option<Value>> {
        let heap = self.heap.lock();
        Ok(heap
            .locate_key(map, key)?
            .ok()
            .map(|i| heap.map_entries(map).map(|e| e[i].1.clone()))
            .transpose()?)
    }

    fn map_contains_key(&self, map: HandleRef, key: &Value) -> BridgeResult<bool> {
        Ok(self.heap.lock().locate_key(map, key)?.is_ok())
    }

    fn map_put(&self, map: HandleRef, key: Value, value: Value) -> BridgeResult<Option<Value>> {
        let mut heap = self.heap.lock();
        let obj = heap.map(map)?;
        Heap::check_mutable(&obj.options, "put")?;
        heap.check_element(&obj.options, &key, "map key")?;
        if value.is_null() && obj.options.forbid_null {
            return Err(BridgeError::null_not_allowed("map value may not be null"));
        }
        match heap.locate_key(map, &key)? {
            Ok(i) => {
                let obj = heap.map_mut(map)?;
                Ok(Some(std::mem::replace(&mut obj.entries[i].1, value)))
            }
            Err(pos) => {
                let obj = heap.map_mut(map)?;
                obj.entries.insert(pos, (key, value));
                obj.version += 1;
                Ok(None)
            }
        }
    }

    fn map_remove(&self, map: HandleRef, key: &Value) -> BridgeResult<Option<Value>> {
        let mut heap = self.heap.lock();
        Heap::check_mutable(&heap.map(map)?.options, "remove")?;
        match heap.locate_key(map, key)? {
            Ok(i) => {
                let obj = heap.map_mut(map)?;
                obj.version += 1;
                Ok(Some(obj.entries.remove(i).1))
            }
            Err(_) => Ok(None),
        }
    }

    fn map_view(&self, map: HandleRef, part: MapPart) -> BridgeResult<HandleRef> {
        let mut heap = self.heap.lock();
        heap.map(map)?;
        if let Some(view) = heap.views.get(&(map, part)).copied() {
            if heap.objects.contains_key(&view.raw()) {
                return Ok(view);
            }
        }
        let view = heap.alloc(Object::MapView { map, part });
        heap.views.insert((map, part), view);
        Ok(view)
    }

    fn entry_key(&self, entry: HandleRef) -> BridgeResult<Value> {
        let heap = self.heap.lock();
        match heap.object(entry)? {
            Object::Entry { key, .. } => Ok(key.clone()),
            _ => Err(heap.mismatch("java.util.Map$Entry", entry)),
        }
    }

    fn entry_value(&self, entry: HandleRef) -> BridgeResult<Value> {
        Ok(self.heap.lock().entry_pair(entry)?.1)
    }

    fn entry_set_value(&self, entry: HandleRef, value: Value) -> BridgeResult<Value> {
        let mut heap = self.heap.lock();
        let Object::Entry { map, key } = heap.object(entry)? else {
            return Err(heap.mismatch("java.util.Map$Entry", entry));
        };
        let (map, key) = (*map, key.clone());
        let options = &heap.map(map)?.options;
        Heap::check_mutable(options, "Entry.setValue")?;
        if value.is_null() && options.forbid_null {
            return Err(BridgeError::null_not_allowed("map value may not be null"));
        }
        match heap.locate_key(map, &key)? {
            Ok(i) => {
                let obj = heap.map_mut(map)?;
                Ok(std::mem::replace(&mut obj.entries[i].1, value))
            }
            Err(_) => Err(BridgeError::illegal_state("entry is no longer backed by its map")),
        }
    }

    fn enum_constants(&self, type_name: &str) -> BridgeResult<Vec<HandleRef>> {
        let heap = self.heap.lock();
        heap.enums
            .get(type_name)
            .map(|ty| ty.constants().to_vec())
            .ok_or_else(|| BridgeError::class_mismatch("enum type", type_name))
    }

    fn enum_lookup(&self, type_name: &str, name: &str) -> BridgeResult<Option<HandleRef>> {
        let heap = self.heap.lock();
        heap.enums
            .get(type_name)
            .map(|ty| ty.lookup(name))
            .ok_or_else(|| BridgeError::class_mismatch("enum type", type_name))
    }

    fn constant_name(&self, constant: HandleRef) -> BridgeResult<String> {
        let heap = self.heap.lock();
        match heap.object(constant)? {
            Object::Constant(c) => Ok(c.name.clone()),
            _ => Err(heap.mismatch("java.lang.Enum", constant)),
        }
    }

    fn constant_ordinal(&self, constant: HandleRef) -> BridgeResult<u32> {
        let heap = self.heap.lock();
        match heap.object(constant)? {
            Object::Constant(c) => Ok(c.ordinal),
            _ => Err(heap.mismatch("java.lang.Enum", constant)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn drain(rt: &HeapRuntime, coll: HandleRef) -> Vec<Value> {
        let it = rt.iterator(coll).unwrap();
        let mut out = Vec::new();
        while rt.has_next(it).unwrap() {
            out.push(rt.next(it).unwrap());
        }
        out
    }

    fn ints(values: &[Value]) -> Vec<i64> {
        values.iter().map(|v| v.as_i64().unwrap()).collect()
    }

    #[test]
    fn test_list_iteration_and_remove() {
        let rt = HeapRuntime::new();
        let list = rt.new_list([1, 2, 3, 4]);

        let it = rt.iterator(list).unwrap();
        while rt.has_next(it).unwrap() {
            let v = rt.next(it).unwrap();
            if v.as_i64().unwrap() % 2 == 0 {
                rt.iterator_remove(it).unwrap();
            }
        }
        assert_eq!(ints(&drain(&rt, list)), vec![1, 3]);
    }

    #[test]
    fn test_remove_protocol() {
        let rt = HeapRuntime::new();
        let list = rt.new_list([1]);
        let it = rt.iterator(list).unwrap();

        assert!(matches!(rt.iterator_remove(it), Err(BridgeError::IllegalState(_))));
        rt.next(it).unwrap();
        rt.iterator_remove(it).unwrap();
        assert!(matches!(rt.iterator_remove(it), Err(BridgeError::IllegalState(_))));
        assert!(matches!(rt.next(it), Err(BridgeError::NoSuchElement)));
    }

    #[test]
    fn test_iterator_fails_fast() {
        let rt = HeapRuntime::new();
        let list = rt.new_list([1, 2, 3]);
        let it = rt.iterator(list).unwrap();
        rt.next(it).unwrap();

        rt.add(list, Value::Int(4)).unwrap();
        assert!(matches!(rt.next(it), Err(BridgeError::ConcurrentStructuralChange)));
    }

    #[test]
    fn test_replacing_is_not_structural() {
        let rt = HeapRuntime::new();
        let list = rt.new_list([1, 2]);
        let it = rt.iterator(list).unwrap();
        rt.next(it).unwrap();

        rt.list_set(list, 1, Value::Int(20)).unwrap();
        assert_eq!(rt.next(it).unwrap().as_i64(), Some(20));
    }

    #[test]
    fn test_sorted_set_orders_and_dedupes() {
        let rt = HeapRuntime::new();
        let set = rt.new_set([5, 1, 3, 1], SetOrder::Sorted).unwrap();
        assert_eq!(ints(&drain(&rt, set)), vec![1, 3, 5]);

        assert!(!rt.add(set, Value::Int(3)).unwrap());
        assert!(rt.add(set, Value::Int(2)).unwrap());
        assert_eq!(ints(&drain(&rt, set)), vec![1, 2, 3, 5]);

        let err = rt.add(set, Value::from("x")).unwrap_err();
        assert!(matches!(err, BridgeError::ClassMismatch { .. }));
    }

    #[test]
    fn test_unmodifiable_and_null_hostile() {
        let rt = HeapRuntime::new();
        let frozen = rt.new_list_with([1], CollectionOptions::unmodifiable()).unwrap();
        assert!(matches!(rt.add(frozen, Value::Int(2)), Err(BridgeError::Unsupported(_))));
        assert!(matches!(rt.remove(frozen, &Value::Int(9)), Err(BridgeError::Unsupported(_))));

        let strict = rt.new_list_with(Vec::<Value>::new(), CollectionOptions::non_null()).unwrap();
        assert!(matches!(rt.add(strict, Value::Null), Err(BridgeError::NullNotAllowed(_))));

        let typed = rt
            .new_list_with(
                Vec::<Value>::new(),
                CollectionOptions::default().with_element_class("java.lang.String"),
            )
            .unwrap();
        assert!(matches!(rt.add(typed, Value::Int(1)), Err(BridgeError::ClassMismatch { .. })));
        assert!(rt.add(typed, Value::from("ok")).unwrap());
    }

    #[test]
    fn test_map_views_are_live() {
        let rt = HeapRuntime::new();
        let map = rt.new_map([("x", 1), ("y", 2)], SetOrder::Insertion).unwrap();
        let keys = rt.map_view(map, MapPart::Keys).unwrap();
        assert_eq!(rt.map_view(map, MapPart::Keys).unwrap(), keys);

        assert!(rt.remove(keys, &Value::from("x")).unwrap());
        assert!(!rt.map_contains_key(map, &Value::from("x")).unwrap());
        assert_eq!(rt.size(keys).unwrap(), 1);

        rt.map_put(map, Value::from("z"), Value::Int(3)).unwrap();
        assert_eq!(rt.size(keys).unwrap(), 2);
        assert!(rt.contains(keys, &Value::from("z")).unwrap());
    }

    #[test]
    fn test_entry_set_value_writes_through() {
        let rt = HeapRuntime::new();
        let map = rt.new_map([("x", 1)], SetOrder::Insertion).unwrap();
        let entries = rt.map_view(map, MapPart::Entries).unwrap();
        let it = rt.iterator(entries).unwrap();
        let entry = rt.next(it).unwrap().as_handle().unwrap();

        assert_eq!(rt.entry_set_value(entry, Value::Int(10)).unwrap().as_i64(), Some(1));
        assert_eq!(rt.map_get(map, &Value::from("x")).unwrap().unwrap().as_i64(), Some(10));

        rt.map_remove(map, &Value::from("x")).unwrap();
        assert!(matches!(rt.entry_value(entry), Err(BridgeError::IllegalState(_))));
    }

    #[test]
    fn test_record_equality_is_by_value() {
        let rt = HeapRuntime::new();
        let a = rt.new_record("org.bukkit.Location", [("x", 1), ("y", 2)]);
        let b = rt.new_record("org.bukkit.Location", [("x", 1), ("y", 2)]);
        assert_ne!(a, b);
        assert!(rt.equals(&Value::Handle(a), &Value::Handle(b)).unwrap());
        assert_eq!(
            rt.hash_code(&Value::Handle(a)).unwrap(),
            rt.hash_code(&Value::Handle(b)).unwrap()
        );
    }

    #[test]
    fn test_strict_equality_rejects_incomparable() {
        let rt = HeapRuntime::new();
        let list = rt.new_list([1]);
        let set = rt.new_set([1], SetOrder::Insertion).unwrap();
        assert!(matches!(
            rt.equals(&Value::Int(1), &Value::from("1")),
            Err(BridgeError::ClassMismatch { .. })
        ));
        assert!(matches!(
            rt.equals(&Value::Handle(list), &Value::Handle(set)),
            Err(BridgeError::ClassMismatch { .. })
        ));
        assert!(!rt.equals(&Value::Null, &Value::Int(1)).unwrap());
    }

    #[test]
    fn test_lookups_reject_incomparable_classes() {
        let rt = HeapRuntime::new();
        let list = rt.new_list([Value::Int(1), Value::from("a")]);
        assert!(matches!(rt.contains(list, &Value::from("a")), Err(BridgeError::ClassMismatch { .. })));
        assert!(matches!(rt.remove(list, &Value::from("a")), Err(BridgeError::ClassMismatch { .. })));
        assert!(rt.contains(list, &Value::Int(1)).unwrap());
        assert!(!rt.contains(list, &Value::Null).unwrap());

        let set = rt.new_set([1, 2], SetOrder::Hashed).unwrap();
        assert!(matches!(rt.add(set, Value::from("x")), Err(BridgeError::ClassMismatch { .. })));
        assert!(matches!(rt.contains(set, &Value::from("x")), Err(BridgeError::ClassMismatch { .. })));
        assert_eq!(rt.size(set).unwrap(), 2);

        let map = rt.new_map([("k", 1)], SetOrder::Insertion).unwrap();
        let values = rt.map_view(map, MapPart::Values).unwrap();
        assert!(matches!(rt.contains(values, &Value::from("1")), Err(BridgeError::ClassMismatch { .. })));
        assert!(rt.contains(values, &Value::Int(1)).unwrap());
    }

    #[test]
    fn test_remove_without_next_on_unmodifiable() {
        let rt = HeapRuntime::new();
        let list = rt
            .new_list_with([1, 2], CollectionOptions::unmodifiable())
            .unwrap();
        let it = rt.iterator(list).unwrap();
        assert!(matches!(rt.iterator_remove(it), Err(BridgeError::IllegalState(_))));
        rt.next(it).unwrap();
        assert!(matches!(rt.iterator_remove(it), Err(BridgeError::Unsupported(_))));
    }

    #[test]
    fn test_releasing_a_map_releases_its_views() {
        let rt = HeapRuntime::new();
        let map = rt.new_map([("k", 1)], SetOrder::Insertion).unwrap();
        let before = rt.object_count();
        let keys = rt.map_view(map, MapPart::Keys).unwrap();
        let values = rt.map_view(map, MapPart::Values).unwrap();
        assert_eq!(rt.object_count(), before + 2);

        rt.release(map).unwrap();
        assert_eq!(rt.object_count(), before - 1);
        assert!(matches!(rt.size(keys), Err(BridgeError::StaleHandle(_))));
        assert!(matches!(rt.size(values), Err(BridgeError::StaleHandle(_))));
    }

    #[test]
    fn test_released_handle_is_stale() {
        let rt = HeapRuntime::new();
        let list = rt.new_list([1]);
        rt.release(list).unwrap();
        assert!(matches!(rt.size(list), Err(BridgeError::StaleHandle(h)) if h == list));
    }

    #[test]
    fn test_enum_constants() {
        let rt = HeapRuntime::new();
        let constants = rt.define_enum("test.Color", &["RED", "GREEN"]).unwrap();
        assert_eq!(rt.enum_constants("test.Color").unwrap(), constants);
        assert_eq!(rt.constant_ordinal(constants[1]).unwrap(), 1);
        assert_eq!(rt.enum_lookup("test.Color", "RED").unwrap(), Some(constants[0]));
        assert_eq!(rt.enum_lookup("test.Color", "red").unwrap(), None);
        assert!(matches!(rt.release(constants[0]), Err(BridgeError::Unsupported(_))));
    }

    proptest! {
        #[test]
        fn prop_equal_lists_hash_identically(items in proptest::collection::vec(any::<i64>(), 0..16)) {
            let rt = HeapRuntime::new();
            let a = Value::Handle(rt.new_list(items.clone()));
            let b = Value::Handle(rt.new_list(items));
            prop_assert!(rt.equals(&a, &b).unwrap());
            prop_assert_eq!(rt.hash_code(&a).unwrap(), rt.hash_code(&b).unwrap());
        }

        #[test]
        fn prop_set_equality_ignores_order(items in proptest::collection::vec(-20i64..20, 0..16)) {
            let rt = HeapRuntime::new();
            let a = Value::Handle(rt.new_set(items.clone(), SetOrder::Insertion).unwrap());
            let b = Value::Handle(rt.new_set(items, SetOrder::Hashed).unwrap());
            prop_assert!(rt.equals(&a, &b).unwrap());
            prop_assert_eq!(rt.hash_code(&a).unwrap(), rt.hash_code(&b).unwrap());
        }
    }
}
