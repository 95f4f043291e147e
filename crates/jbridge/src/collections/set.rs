//! Set view

use std::marker::PhantomData;

use jbridge_types::{BridgeResult, CollectionKind, ForeignKind, HandleRef, Value};

use super::JavaCollection;
use crate::convert::expect_kind;
use crate::iter::JavaIterator;
use crate::{Bridge, Bridged};

/// View over a foreign set, or over a map's key set
///
/// Iteration order is whatever the foreign set promises; hashed sets promise
/// none.
pub struct JavaSet<E> {
    bridge: Bridge,
    handle: HandleRef,
    _elem: PhantomData<fn() -> E>,
}

impl<E: Bridged> JavaSet<E> {
    /// View a foreign set. Fails with `ClassMismatch` for anything else.
    pub fn from_handle(bridge: &Bridge, handle: HandleRef) -> BridgeResult<Self> {
        Self::from_foreign(bridge, Value::Handle(handle))
    }

    pub(crate) fn unchecked(bridge: Bridge, handle: HandleRef) -> Self {
        Self {
            bridge,
            handle,
            _elem: PhantomData,
        }
    }

    pub fn handle(&self) -> HandleRef {
        self.handle
    }
}

impl<E: Bridged> JavaCollection<E> for JavaSet<E> {
    type Iter = JavaIterator<E>;

    fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    fn size(&self) -> BridgeResult<usize> {
        self.bridge.runtime().size(self.handle)
    }

    fn is_empty(&self) -> BridgeResult<bool> {
        self.bridge.runtime().is_empty(self.handle)
    }

    fn contains(&self, element: &E) -> BridgeResult<bool> {
        let value = element.to_foreign(&self.bridge)?;
        self.bridge.runtime().contains(self.handle, &value)
    }

    fn iterator(&self) -> BridgeResult<JavaIterator<E>> {
        JavaIterator::over(&self.bridge, self.handle)
    }

    /// Returns whether the cardinality changed
    fn add(&self, element: E) -> BridgeResult<bool> {
        let value = element.to_foreign(&self.bridge)?;
        self.bridge.runtime().add(self.handle, value)
    }

    fn remove(&self, element: &E) -> BridgeResult<bool> {
        let value = element.to_foreign(&self.bridge)?;
        self.bridge.runtime().remove(self.handle, &value)
    }

    fn clear(&self) -> BridgeResult<()> {
        self.bridge.runtime().clear(self.handle)
    }
}

impl<E: Bridged> Bridged for JavaSet<E> {
    fn from_foreign(bridge: &Bridge, value: Value) -> BridgeResult<Self> {
        let handle = expect_kind(bridge, value, "java.util.Set", |k: &ForeignKind| {
            k.collection_kind() == Some(CollectionKind::Set)
        })?;
        Ok(Self::unchecked(bridge.clone(), handle))
    }

    fn to_foreign(&self, _bridge: &Bridge) -> BridgeResult<Value> {
        Ok(Value::Handle(self.handle))
    }
}

impl<E> Clone for JavaSet<E> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            handle: self.handle,
            _elem: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for JavaSet<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("JavaSet").field(&self.handle).finish()
    }
}
