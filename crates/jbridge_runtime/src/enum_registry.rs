//! Registry of enumerated-constant types
//!
//! Each enumerated type is a closed, ordered set of named singletons fixed when
//! the type is defined. The registry maps type names to their constants in
//! declaration order and indexes them by name.

use std::collections::HashMap;

use jbridge_types::HandleRef;

// ─────────────────────────────────────────────────────────────────────────────
// Enum Type
// ─────────────────────────────────────────────────────────────────────────────

/// The constants of one enumerated type
#[derive(Debug, Clone)]
pub struct EnumType {
    type_name: String,
    constants: Vec<HandleRef>,
    by_name: HashMap<String, HandleRef>,
}

impl EnumType {
    /// Type name (e.g., "org.bukkit.Sound")
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Constants in ordinal order
    pub fn constants(&self) -> &[HandleRef] {
        &self.constants
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(&self, name: &str) -> Option<HandleRef> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when defining enumerated types
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnumRegistryError {
    #[error("Enum type already exists: {0}")]
    TypeAlreadyExists(String),
    #[error("Duplicate constant {name} in {type_name}")]
    DuplicateConstant { type_name: String, name: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Enum Registry
// ─────────────────────────────────────────────────────────────────────────────

/// All enumerated types known to a runtime
#[derive(Debug, Default)]
pub struct EnumRegistry {
    types: HashMap<String, EnumType>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a definition before any constants are allocated for it
    pub fn check(&self, type_name: &str, names: &[&str]) -> Result<(), EnumRegistryError> {
        if self.types.contains_key(type_name) {
            return Err(EnumRegistryError::TypeAlreadyExists(type_name.to_string()));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(EnumRegistryError::DuplicateConstant {
                    type_name: type_name.to_string(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Register a type whose constants were allocated in declaration order
    pub fn define(
        &mut self,
        type_name: &str,
        constants: Vec<(String, HandleRef)>,
    ) -> Result<&EnumType, EnumRegistryError> {
        let names: Vec<&str> = constants.iter().map(|(n, _)| n.as_str()).collect();
        self.check(type_name, &names)?;

        let by_name = constants.iter().map(|(n, h)| (n.clone(), *h)).collect();
        let def = EnumType {
            type_name: type_name.to_string(),
            constants: constants.into_iter().map(|(_, h)| h).collect(),
            by_name,
        };
        Ok(self.types.entry(type_name.to_string()).or_insert(def))
    }

    /// Get a type by name
    pub fn get(&self, type_name: &str) -> Option<&EnumType> {
        self.types.get(type_name)
    }

    /// All registered type names
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
