// Foreign Runtime - The capability boundary between host adapters and foreign objects
//
// Every adapter in the bridge reaches the foreign object graph exclusively
// through this trait. Calls are synchronous: each returns before the caller
// proceeds and none spawns background work.

use jbridge_types::{BridgeResult, ForeignKind, HandleRef, MapPart, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Foreign Runtime Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Capabilities required from a foreign runtime.
///
/// Implementations own the referenced objects. Handles passed in must not have
/// been released; using one that was fails with `StaleHandle`.
///
/// Collection operations (`size`, `contains`, `add`, ...) accept lists, sets
/// and live map views. `size`, `is_empty`, `clear` and `structural_version`
/// also accept maps.
pub trait ForeignRuntime: Send + Sync {
    // ── Objects ──────────────────────────────────────────────────────────────

    /// Classify a foreign object
    fn kind_of(&self, handle: HandleRef) -> BridgeResult<ForeignKind>;

    /// Foreign class name of an object
    fn class_name(&self, handle: HandleRef) -> BridgeResult<String>;

    /// Release an object the host asked the runtime to create (iterators,
    /// entries). Released handles become stale.
    fn release(&self, handle: HandleRef) -> BridgeResult<()>;

    // ── Equality contract ────────────────────────────────────────────────────

    /// Foreign value equality. Fails with `ClassMismatch` when the two values
    /// are of classes that cannot be compared.
    fn equals(&self, a: &Value, b: &Value) -> BridgeResult<bool>;

    /// Foreign hash code, consistent with [`ForeignRuntime::equals`]
    fn hash_code(&self, value: &Value) -> BridgeResult<i32>;

    // ── Collections ──────────────────────────────────────────────────────────

    fn size(&self, coll: HandleRef) -> BridgeResult<usize>;

    fn is_empty(&self, coll: HandleRef) -> BridgeResult<bool>;

    fn contains(&self, coll: HandleRef, value: &Value) -> BridgeResult<bool>;

    /// Append (lists) or insert (sets). Returns whether the collection changed.
    fn add(&self, coll: HandleRef, value: Value) -> BridgeResult<bool>;

    /// Remove the first element equal to `value`. Returns whether one was found.
    fn remove(&self, coll: HandleRef, value: &Value) -> BridgeResult<bool>;

    fn clear(&self, coll: HandleRef) -> BridgeResult<()>;

    /// Counter bumped by every structural modification (insertions and
    /// removals, not in-place replacement). Views report their owner's counter.
    fn structural_version(&self, coll: HandleRef) -> BridgeResult<u64>;

    // ── Iteration ────────────────────────────────────────────────────────────

    /// Create a fresh two-step iterator over a collection
    fn iterator(&self, coll: HandleRef) -> BridgeResult<HandleRef>;

    fn has_next(&self, iterator: HandleRef) -> BridgeResult<bool>;

    fn next(&self, iterator: HandleRef) -> BridgeResult<Value>;

    /// Remove the element last returned by `next` from the underlying collection
    fn iterator_remove(&self, iterator: HandleRef) -> BridgeResult<()>;

    // ── Lists ────────────────────────────────────────────────────────────────

    fn list_get(&self, list: HandleRef, index: usize) -> BridgeResult<Value>;

    /// Replace the element at `index`, returning the previous one
    fn list_set(&self, list: HandleRef, index: usize, value: Value) -> BridgeResult<Value>;

    /// Insert at `index` (`index == size` appends)
    fn list_insert(&self, list: HandleRef, index: usize, value: Value) -> BridgeResult<()>;

    fn list_remove_at(&self, list: HandleRef, index: usize) -> BridgeResult<Value>;

    // ── Maps ─────────────────────────────────────────────────────────────────

    /// Value mapped to `key`, `None` when the key is absent
    fn map_get(&self, map: HandleRef, key: &Value) -> BridgeResult<Option<Value>>;

    fn map_contains_key(&self, map: HandleRef, key: &Value) -> BridgeResult<bool>;

    /// Associate `value` with `key`, returning the previous mapping
    fn map_put(&self, map: HandleRef, key: Value, value: Value) -> BridgeResult<Option<Value>>;

    fn map_remove(&self, map: HandleRef, key: &Value) -> BridgeResult<Option<Value>>;

    /// Live projection of a map. Repeated calls return the same view object.
    fn map_view(&self, map: HandleRef, part: MapPart) -> BridgeResult<HandleRef>;

    // ── Map entries ──────────────────────────────────────────────────────────

    fn entry_key(&self, entry: HandleRef) -> BridgeResult<Value>;

    fn entry_value(&self, entry: HandleRef) -> BridgeResult<Value>;

    /// Write a new value through to the owning map, returning the old one
    fn entry_set_value(&self, entry: HandleRef, value: Value) -> BridgeResult<Value>;

    // ── Enum registry ────────────────────────────────────────────────────────

    /// Every constant of an enumerated type, in ordinal order
    fn enum_constants(&self, type_name: &str) -> BridgeResult<Vec<HandleRef>>;

    /// Exact name lookup in an enumerated type
    fn enum_lookup(&self, type_name: &str, name: &str) -> BridgeResult<Option<HandleRef>>;

    fn constant_name(&self, constant: HandleRef) -> BridgeResult<String>;

    fn constant_ordinal(&self, constant: HandleRef) -> BridgeResult<u32>;
}
