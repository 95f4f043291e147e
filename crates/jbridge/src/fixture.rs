//! Heap fixtures
//!
//! A fixture is a TOML document describing named objects to create in a
//! [`HeapRuntime`]:
//!
//! ```toml
//! [enums."org.example.GameMode"]
//! constants = ["SURVIVAL", "CREATIVE"]
//!
//! [lists.players]
//! items = ["alice", "bob"]
//! forbid_null = true
//!
//! [sets.tags]
//! items = ["red", "blue"]
//! order = "sorted"
//!
//! [maps.modes]
//! entries = { alice = { enum = "org.example.GameMode", name = "CREATIVE" } }
//!
//! [records.spawn]
//! class = "org.example.Point"
//! fields = { x = 0, y = 64 }
//! ```
//!
//! Items may be primitives, `{ ref = "name" }` to another object in the same
//! fixture, or `{ enum = "Type", name = "CONSTANT" }`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use jbridge_runtime::{CollectionOptions, ForeignRuntime, HeapRuntime, SetOrder};
use jbridge_types::{BridgeError, HandleRef, Value};

/// Error type for fixture loading
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Fixture not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read fixture: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse fixture: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Object name {0} is defined more than once")]
    DuplicateName(String),

    #[error("Unknown object reference: {0}")]
    UnknownRef(String),

    #[error("Reference cycle through {0}")]
    Cycle(String),

    #[error("Unsupported item in {owner}: {reason}")]
    BadItem { owner: String, reason: String },

    #[error("Runtime rejected {owner}: {source}")]
    Runtime {
        owner: String,
        #[source]
        source: BridgeError,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureDoc {
    #[serde(default)]
    pub enums: BTreeMap<String, EnumDef>,
    #[serde(default)]
    pub lists: BTreeMap<String, ListDef>,
    #[serde(default)]
    pub sets: BTreeMap<String, SetDef>,
    #[serde(default)]
    pub maps: BTreeMap<String, MapDef>,
    #[serde(default)]
    pub records: BTreeMap<String, RecordDef>,
}

#[derive(Debug, Deserialize)]
pub struct EnumDef {
    pub constants: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListDef {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub options: CollectionOptions,
}

#[derive(Debug, Deserialize)]
pub struct SetDef {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub order: SetOrder,
    #[serde(flatten)]
    pub options: CollectionOptions,
}

#[derive(Debug, Deserialize)]
pub struct MapDef {
    #[serde(default)]
    pub entries: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub order: SetOrder,
    #[serde(flatten)]
    pub options: CollectionOptions,
}

#[derive(Debug, Deserialize)]
pub struct RecordDef {
    pub class: String,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

enum Def<'a> {
    List(&'a ListDef),
    Set(&'a SetDef),
    Map(&'a MapDef),
    Record(&'a RecordDef),
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Named objects created from a fixture
#[derive(Debug, Default)]
pub struct LoadedFixture {
    /// Every list, set, map and record by name
    pub objects: BTreeMap<String, HandleRef>,
    /// Enum types defined by the fixture
    pub enum_types: Vec<String>,
}

impl LoadedFixture {
    pub fn get(&self, name: &str) -> Option<HandleRef> {
        self.objects.get(name).copied()
    }
}

impl FixtureDoc {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FixtureError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, FixtureError> {
        Ok(toml::from_str(content)?)
    }

    /// Create every object in `runtime`. Enums first, then objects in
    /// dependency order.
    pub fn load_into(&self, runtime: &HeapRuntime) -> Result<LoadedFixture, FixtureError> {
        let mut loaded = LoadedFixture::default();
        for (type_name, def) in &self.enums {
            let names: Vec<&str> = def.constants.iter().map(String::as_str).collect();
            runtime
                .define_enum(type_name, &names)
                .map_err(|source| FixtureError::Runtime {
                    owner: type_name.clone(),
                    source,
                })?;
            loaded.enum_types.push(type_name.clone());
        }

        let defs = self.definitions()?;
        let mut builder = Builder {
            runtime,
            defs: &defs,
            built: BTreeMap::new(),
            in_progress: BTreeSet::new(),
        };
        for name in defs.keys() {
            builder.build(name)?;
        }
        loaded.objects = builder.built;

        info!(
            "Loaded fixture: {} objects, {} enum types",
            loaded.objects.len(),
            loaded.enum_types.len()
        );
        Ok(loaded)
    }

    fn definitions(&self) -> Result<BTreeMap<&str, Def<'_>>, FixtureError> {
        let mut defs = BTreeMap::new();
        let all = self
            .lists
            .iter()
            .map(|(n, d)| (n, Def::List(d)))
            .chain(self.sets.iter().map(|(n, d)| (n, Def::Set(d))))
            .chain(self.maps.iter().map(|(n, d)| (n, Def::Map(d))))
            .chain(self.records.iter().map(|(n, d)| (n, Def::Record(d))));
        for (name, def) in all {
            if defs.insert(name.as_str(), def).is_some() {
                return Err(FixtureError::DuplicateName(name.clone()));
            }
        }
        Ok(defs)
    }
}

/// Load a fixture file into `runtime`
pub fn load_fixture(path: impl AsRef<Path>, runtime: &HeapRuntime) -> Result<LoadedFixture, FixtureError> {
    FixtureDoc::from_path(path)?.load_into(runtime)
}

struct Builder<'a> {
    runtime: &'a HeapRuntime,
    defs: &'a BTreeMap<&'a str, Def<'a>>,
    built: BTreeMap<String, HandleRef>,
    in_progress: BTreeSet<String>,
}

impl Builder<'_> {
    fn build(&mut self, name: &str) -> Result<HandleRef, FixtureError> {
        if let Some(handle) = self.built.get(name) {
            return Ok(*handle);
        }
        let defs = self.defs;
        let def = defs
            .get(name)
            .ok_or_else(|| FixtureError::UnknownRef(name.to_string()))?;
        if !self.in_progress.insert(name.to_string()) {
            return Err(FixtureError::Cycle(name.to_string()));
        }

        let runtime = self.runtime;
        let rejected = |source| FixtureError::Runtime {
            owner: name.to_string(),
            source,
        };
        let handle = match def {
            Def::List(def) => {
                let items = self.items(name, &def.items)?;
                runtime.new_list_with(items, def.options.clone()).map_err(rejected)?
            }
            Def::Set(def) => {
                let items = self.items(name, &def.items)?;
                runtime
                    .new_set_with(items, def.order, def.options.clone())
                    .map_err(rejected)?
            }
            Def::Map(def) => {
                let mut entries = Vec::with_capacity(def.entries.len());
                for (key, value) in &def.entries {
                    entries.push((Value::from(key.as_str()), self.item(name, value)?));
                }
                runtime
                    .new_map_with(entries, def.order, def.options.clone())
                    .map_err(rejected)?
            }
            Def::Record(def) => {
                let mut fields = Vec::with_capacity(def.fields.len());
                for (field, value) in &def.fields {
                    fields.push((field.clone(), self.item(name, value)?));
                }
                runtime.new_record(def.class.clone(), fields)
            }
        };

        debug!("Fixture object {} -> {}", name, handle);
        self.in_progress.remove(name);
        self.built.insert(name.to_string(), handle);
        Ok(handle)
    }

    fn items(&mut self, owner: &str, items: &[serde_json::Value]) -> Result<Vec<Value>, FixtureError> {
        items.iter().map(|item| self.item(owner, item)).collect()
    }

    fn item(&mut self, owner: &str, item: &serde_json::Value) -> Result<Value, FixtureError> {
        let bad = |reason: &str| FixtureError::BadItem {
            owner: owner.to_string(),
            reason: reason.to_string(),
        };
        let serde_json::Value::Object(obj) = item else {
            return Value::try_from(item.clone()).map_err(|e| bad(&e.to_string()));
        };

        if let Some(target) = obj.get("ref") {
            let target = target.as_str().ok_or_else(|| bad("ref must be a string"))?;
            return Ok(Value::Handle(self.build(target)?));
        }
        if let (Some(type_name), Some(constant)) = (obj.get("enum"), obj.get("name")) {
            let (Some(type_name), Some(constant)) = (type_name.as_str(), constant.as_str()) else {
                return Err(bad("enum and name must be strings"));
            };
            let handle = self
                .runtime
                .enum_lookup(type_name, constant)
                .map_err(|source| FixtureError::Runtime {
                    owner: owner.to_string(),
                    source,
                })?
                .ok_or_else(|| {
                    bad(&format!("no constant {} in {}", constant, type_name))
                })?;
            return Ok(Value::Handle(handle));
        }
        Err(bad("tables must be { ref } or { enum, name }"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::*;
    use crate::{Bridge, JavaCollection, JavaList, JavaMap, JavaSet};

    const WORLD: &str = r#"
        [enums."org.example.GameMode"]
        constants = ["SURVIVAL", "CREATIVE"]

        [lists.players]
        items = ["alice", "bob"]
        forbid_null = true

        [sets.tags]
        items = ["red", "blue", "red"]
        order = "sorted"

        [maps.modes]
        entries = { alice = { enum = "org.example.GameMode", name = "CREATIVE" } }

        [lists.groups]
        items = [{ ref = "players" }, { ref = "tags" }]
        unmodifiable = true

        [records.spawn]
        class = "org.example.Point"
        fields = { x = 0, y = 64 }
    "#;

    #[test]
    fn test_load_world() {
        let runtime = Arc::new(HeapRuntime::new());
        let loaded = FixtureDoc::parse(WORLD).unwrap().load_into(&runtime).unwrap();
        let bridge = Bridge::new(runtime.clone());

        assert_eq!(loaded.objects.len(), 5);
        assert_eq!(loaded.enum_types, vec!["org.example.GameMode"]);

        let players = JavaList::<String>::from_handle(&bridge, loaded.get("players").unwrap()).unwrap();
        assert_eq!(players.to_vec().unwrap(), vec!["alice", "bob"]);

        let tags = JavaSet::<String>::from_handle(&bridge, loaded.get("tags").unwrap()).unwrap();
        assert_eq!(tags.to_vec().unwrap(), vec!["blue", "red"]);

        let modes = JavaMap::<String, Value>::from_handle(&bridge, loaded.get("modes").unwrap()).unwrap();
        let Some(Value::Handle(mode)) = modes.get(&"alice".to_string()).unwrap() else {
            panic!("expected a constant handle");
        };
        assert_eq!(bridge.enum_constant(mode).unwrap().name(), "CREATIVE");

        let groups = JavaList::<Value>::from_handle(&bridge, loaded.get("groups").unwrap()).unwrap();
        assert_eq!(groups.size().unwrap(), 2);
        assert!(groups.push(Value::Null).is_err());

        assert_eq!(
            runtime
                .record_field(loaded.get("spawn").unwrap(), "y")
                .unwrap()
                .and_then(|v| v.as_i64()),
            Some(64)
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[lists.xs]\nitems = [1, 2, 3]\n").unwrap();

        let runtime = HeapRuntime::new();
        let loaded = load_fixture(file.path(), &runtime).unwrap();
        assert!(loaded.get("xs").is_some());

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_fixture(dir.path().join("missing.toml"), &runtime),
            Err(FixtureError::NotFound(_))
        ));
    }

    #[test]
    fn test_reference_errors() {
        let runtime = HeapRuntime::new();

        let doc = FixtureDoc::parse("[lists.a]\nitems = [{ ref = \"nowhere\" }]").unwrap();
        assert!(matches!(doc.load_into(&runtime), Err(FixtureError::UnknownRef(_))));

        let doc = FixtureDoc::parse(
            "[lists.a]\nitems = [{ ref = \"b\" }]\n[lists.b]\nitems = [{ ref = \"a\" }]",
        )
        .unwrap();
        assert!(matches!(doc.load_into(&runtime), Err(FixtureError::Cycle(_))));

        let doc = FixtureDoc::parse("[lists.a]\nitems = []\n[sets.a]\nitems = []").unwrap();
        assert!(matches!(doc.load_into(&runtime), Err(FixtureError::DuplicateName(_))));
    }

    #[test]
    fn test_runtime_constraints_apply() {
        let runtime = HeapRuntime::new();
        let doc = FixtureDoc::parse(
            "[lists.a]\nitems = [1, \"two\"]\nelement_class = \"java.lang.Long\"",
        )
        .unwrap();
        assert!(matches!(
            doc.load_into(&runtime),
            Err(FixtureError::Runtime { source: BridgeError::ClassMismatch { .. }, .. })
        ));

        let doc = FixtureDoc::parse("[lists.a]\nitems = [[1, 2]]").unwrap();
        assert!(matches!(doc.load_into(&runtime), Err(FixtureError::BadItem { .. })));
    }
}
