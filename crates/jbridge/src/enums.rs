//! Enum Bridge
//!
//! A foreign enumerated type is a closed, ordered set of named singletons.
//! Its constants are discovered from the foreign registry the first time the
//! type is bound and cached inside the [`Bridge`]; the host never assumes a
//! default member list.
//!
//! [`JavaEnum<K>`] is the typed face of one such table, keyed by a host enum
//! `K` (usually `#[derive(ForeignEnum)]`). Host keys whose foreign constant is
//! missing in the running version fail in [`JavaEnum::get`] and are `None` in
//! [`JavaEnum::try_get`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use jbridge_runtime::ForeignRuntime;
use jbridge_types::{BridgeError, BridgeResult, HandleRef, Value};

use crate::{Bridge, Bridged};

// ─────────────────────────────────────────────────────────────────────────────
// Enum Constant
// ─────────────────────────────────────────────────────────────────────────────

/// One constant of a foreign enumerated type. Equality is identity.
#[derive(Debug, Clone)]
pub struct EnumConstant {
    type_name: Arc<str>,
    name: String,
    ordinal: u32,
    handle: HandleRef,
}

impl EnumConstant {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration position, dense and 0-based
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn handle(&self) -> HandleRef {
        self.handle
    }
}

impl PartialEq for EnumConstant {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for EnumConstant {}

impl std::hash::Hash for EnumConstant {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl std::fmt::Display for EnumConstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

impl Bridged for EnumConstant {
    fn from_foreign(bridge: &Bridge, value: Value) -> BridgeResult<Self> {
        let handle = HandleRef::try_from(value)?;
        bridge.enum_constant(handle)
    }

    fn to_foreign(&self, _bridge: &Bridge) -> BridgeResult<Value> {
        Ok(Value::Handle(self.handle))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Enum Table
// ─────────────────────────────────────────────────────────────────────────────

/// Every constant of one foreign type, in ordinal order
#[derive(Debug)]
pub struct EnumTable {
    type_name: Arc<str>,
    constants: Vec<EnumConstant>,
    by_name: HashMap<String, usize>,
    by_handle: HashMap<HandleRef, usize>,
}

impl EnumTable {
    /// Read a type's constants from the foreign registry
    pub(crate) fn discover(runtime: &dyn ForeignRuntime, type_name: &str) -> BridgeResult<Self> {
        let type_name: Arc<str> = Arc::from(type_name);
        let handles = runtime.enum_constants(&type_name)?;

        let mut constants = Vec::with_capacity(handles.len());
        for handle in handles {
            constants.push(EnumConstant {
                type_name: type_name.clone(),
                name: runtime.constant_name(handle)?,
                ordinal: runtime.constant_ordinal(handle)?,
                handle,
            });
        }
        constants.sort_by_key(|c| c.ordinal);

        let by_name = constants
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        let by_handle = constants.iter().enumerate().map(|(i, c)| (c.handle, i)).collect();

        Ok(Self {
            type_name,
            constants,
            by_name,
            by_handle,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// All constants in ordinal order
    pub fn values(&self) -> &[EnumConstant] {
        &self.constants
    }

    /// Exact, case-sensitive lookup
    pub fn value_of(&self, name: &str) -> BridgeResult<&EnumConstant> {
        self.try_value_of(name)
            .ok_or_else(|| BridgeError::no_such_constant(&*self.type_name, name))
    }

    pub fn try_value_of(&self, name: &str) -> Option<&EnumConstant> {
        self.by_name.get(name).map(|&i| &self.constants[i])
    }

    pub fn constant_of(&self, handle: HandleRef) -> Option<&EnumConstant> {
        self.by_handle.get(&handle).map(|&i| &self.constants[i])
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed Enum
// ─────────────────────────────────────────────────────────────────────────────

/// Host-side key naming a constant of a foreign enumerated type
pub trait EnumKey: Copy + Eq + std::hash::Hash + std::fmt::Debug + 'static {
    /// Foreign type name (e.g., "org.bukkit.GameMode")
    const FOREIGN_TYPE: &'static str;

    /// Every host key. The foreign type may define more or fewer constants.
    const ALL: &'static [Self];

    /// Foreign constant name of this key
    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

/// Typed registry of one foreign enumerated type
pub struct JavaEnum<K: EnumKey> {
    table: Arc<EnumTable>,
    _key: PhantomData<fn() -> K>,
}

impl<K: EnumKey> JavaEnum<K> {
    /// Bind `K::FOREIGN_TYPE` through the bridge's enum cache
    pub fn bind(bridge: &Bridge) -> BridgeResult<Self> {
        Ok(Self {
            table: bridge.enum_table(K::FOREIGN_TYPE)?,
            _key: PhantomData,
        })
    }

    pub fn type_name(&self) -> &str {
        self.table.type_name()
    }

    /// All constants the foreign registry reports, in ordinal order
    pub fn values(&self) -> &[EnumConstant] {
        self.table.values()
    }

    pub fn value_of(&self, name: &str) -> BridgeResult<&EnumConstant> {
        self.table.value_of(name)
    }

    pub fn try_value_of(&self, name: &str) -> Option<&EnumConstant> {
        self.table.try_value_of(name)
    }

    /// Constant for a host key. Fails when the running foreign version does
    /// not define it.
    pub fn get(&self, key: K) -> BridgeResult<&EnumConstant> {
        self.value_of(key.name())
    }

    pub fn try_get(&self, key: K) -> Option<&EnumConstant> {
        self.try_value_of(key.name())
    }

    /// Resolve a foreign constant handle back to its constant
    pub fn constant_of(&self, handle: HandleRef) -> Option<&EnumConstant> {
        self.table.constant_of(handle)
    }

    /// Host key of a constant of this type
    pub fn key_of(&self, constant: &EnumConstant) -> BridgeResult<K> {
        if constant.type_name() != self.type_name() {
            return Err(BridgeError::class_mismatch(self.type_name(), constant.type_name()));
        }
        K::from_name(constant.name())
            .ok_or_else(|| BridgeError::no_such_constant(std::any::type_name::<K>(), constant.name()))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<K: EnumKey> Clone for JavaEnum<K> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            _key: PhantomData,
        }
    }
}

impl<K: EnumKey> std::fmt::Debug for JavaEnum<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaEnum")
            .field("type_name", &self.type_name())
            .field("len", &self.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Derive Support
// ─────────────────────────────────────────────────────────────────────────────

/// `Bridged::from_foreign` for a derived enum key
pub fn key_from_foreign<K: EnumKey>(bridge: &Bridge, value: Value) -> BridgeResult<K> {
    let constant = EnumConstant::from_foreign(bridge, value)?;
    JavaEnum::<K>::bind(bridge)?.key_of(&constant)
}

/// `Bridged::to_foreign` for a derived enum key
pub fn key_to_foreign<K: EnumKey>(bridge: &Bridge, key: K) -> BridgeResult<Value> {
    let constants = JavaEnum::<K>::bind(bridge)?;
    Ok(Value::Handle(constants.get(key)?.handle()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForeignEnum;
    use jbridge_runtime::HeapRuntime;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ForeignEnum)]
    #[foreign(class = "org.bukkit.GameMode")]
    enum GameMode {
        Survival,
        Creative,
        #[foreign(name = "SPECTATOR")]
        Ghost,
        /// Not defined by the runtime below
        Hardcore,
    }

    fn setup() -> (Arc<HeapRuntime>, Bridge) {
        let runtime = Arc::new(HeapRuntime::new());
        runtime
            .define_enum("org.bukkit.GameMode", &["SURVIVAL", "CREATIVE", "ADVENTURE", "SPECTATOR"])
            .unwrap();
        let bridge = Bridge::new(runtime.clone());
        (runtime, bridge)
    }

    #[test]
    fn test_values_come_from_the_registry() {
        let (_, bridge) = setup();
        let modes = JavaEnum::<GameMode>::bind(&bridge).unwrap();

        let names: Vec<&str> = modes.values().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["SURVIVAL", "CREATIVE", "ADVENTURE", "SPECTATOR"]);
        let ordinals: Vec<u32> = modes.values().iter().map(|c| c.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_value_of_round_trip() {
        let (_, bridge) = setup();
        let modes = JavaEnum::<GameMode>::bind(&bridge).unwrap();

        for constant in modes.values() {
            assert_eq!(modes.value_of(constant.name()).unwrap(), constant);
        }
        assert!(matches!(
            modes.value_of("survival"),
            Err(BridgeError::NoSuchConstant { .. })
        ));
        assert!(modes.try_value_of("survival").is_none());
    }

    #[test]
    fn test_keys_map_to_constants() {
        let (_, bridge) = setup();
        let modes = JavaEnum::<GameMode>::bind(&bridge).unwrap();

        assert_eq!(modes.get(GameMode::Ghost).unwrap().name(), "SPECTATOR");
        assert!(modes.get(GameMode::Hardcore).is_err());
        assert!(modes.try_get(GameMode::Hardcore).is_none());

        let creative = modes.get(GameMode::Creative).unwrap();
        assert_eq!(modes.key_of(creative).unwrap(), GameMode::Creative);

        let adventure = modes.value_of("ADVENTURE").unwrap();
        assert!(modes.key_of(adventure).is_err());
    }

    #[test]
    fn test_table_is_cached_per_bridge() {
        let (_, bridge) = setup();
        let a = JavaEnum::<GameMode>::bind(&bridge).unwrap();
        let b = JavaEnum::<GameMode>::bind(&bridge).unwrap();
        assert!(Arc::ptr_eq(&a.table, &b.table));
        assert_eq!(bridge.bound_enum_count(), 1);
    }

    #[test]
    fn test_derived_key_crosses_the_bridge() {
        let (_, bridge) = setup();
        let value = GameMode::Creative.to_foreign(&bridge).unwrap();
        assert_eq!(GameMode::from_foreign(&bridge, value).unwrap(), GameMode::Creative);
        assert!(GameMode::Hardcore.to_foreign(&bridge).is_err());
    }

    #[test]
    fn test_unknown_type_fails() {
        let bridge = Bridge::new(Arc::new(HeapRuntime::new()));
        assert!(matches!(
            JavaEnum::<GameMode>::bind(&bridge),
            Err(BridgeError::ClassMismatch { .. })
        ));
    }
}
