// Bridge - The explicit context every adapter is created from
//
// A Bridge pairs a foreign runtime with the per-process enum cache. Cloning is
// cheap; adapters keep their own clone so they stay usable on their own.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use jbridge_runtime::ForeignRuntime;
use jbridge_types::{BridgeError, BridgeResult, ForeignKind, HandleRef};

use crate::enums::{EnumConstant, EnumTable};
use crate::equality::EqualityAdapter;

/// Entry point to a foreign runtime
#[derive(Clone)]
pub struct Bridge {
    runtime: Arc<dyn ForeignRuntime>,
    /// Enum tables by foreign type name, bound once per type
    enums: Arc<DashMap<String, Arc<EnumTable>>>,
    /// Live `MapEntry` wrappers per entry handle
    entries: Arc<DashMap<HandleRef, usize>>,
}

impl Bridge {
    pub fn new(runtime: Arc<dyn ForeignRuntime>) -> Self {
        Self {
            runtime,
            enums: Arc::new(DashMap::new()),
            entries: Arc::new(DashMap::new()),
        }
    }

    /// The foreign runtime behind this bridge
    pub fn runtime(&self) -> &dyn ForeignRuntime {
        self.runtime.as_ref()
    }

    /// Equality contract shared by every host-side lookup
    pub fn equality(&self) -> EqualityAdapter<'_> {
        EqualityAdapter::new(self.runtime())
    }

    /// Constants of a foreign enumerated type, discovered on first use and
    /// cached for the lifetime of this bridge
    pub fn enum_table(&self, type_name: &str) -> BridgeResult<Arc<EnumTable>> {
        if let Some(table) = self.enums.get(type_name) {
            return Ok(table.clone());
        }

        let table = Arc::new(EnumTable::discover(self.runtime(), type_name)?);
        debug!("Bound enum {} ({} constants)", type_name, table.len());

        // A concurrent binder may have won the race; keep whichever landed first
        Ok(self
            .enums
            .entry(type_name.to_string())
            .or_insert(table)
            .clone())
    }

    /// Resolve a foreign constant handle to its cached constant
    pub fn enum_constant(&self, handle: HandleRef) -> BridgeResult<EnumConstant> {
        let type_name = match self.runtime.kind_of(handle)? {
            ForeignKind::EnumConstant { type_name } => type_name,
            other => {
                return Err(BridgeError::class_mismatch("java.lang.Enum", other.label()));
            }
        };
        let table = self.enum_table(&type_name)?;
        table.constant_of(handle).cloned().ok_or_else(|| {
            BridgeError::illegal_state(format!(
                "constant {} is not registered in {}",
                handle, type_name
            ))
        })
    }

    /// Number of enum types bound so far
    pub fn bound_enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Register one more wrapper sharing `entry`
    pub(crate) fn retain_entry(&self, entry: HandleRef) {
        *self.entries.entry(entry).or_insert(0) += 1;
    }

    /// Drop one wrapper of `entry`. The foreign handle is released with the
    /// last one.
    pub(crate) fn release_entry(&self, entry: HandleRef) -> BridgeResult<()> {
        let last = match self.entries.get_mut(&entry) {
            Some(mut count) => {
                *count -= 1;
                *count == 0
            }
            None => true,
        };
        if last {
            self.entries.remove(&entry);
            self.runtime.release(entry)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("bound_enums", &self.enums.len())
            .finish_non_exhaustive()
    }
}
