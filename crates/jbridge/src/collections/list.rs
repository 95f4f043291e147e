//! List view

use std::marker::PhantomData;

use jbridge_types::{BridgeResult, ForeignKind, HandleRef, Value};

use super::window::ListWindow;
use super::JavaCollection;
use crate::convert::expect_kind;
use crate::iter::{JavaIterator, JavaListIterator};
use crate::{Bridge, Bridged};

/// Index-addressable view over a foreign list
pub struct JavaList<E> {
    bridge: Bridge,
    handle: HandleRef,
    _elem: PhantomData<fn() -> E>,
}

impl<E: Bridged> JavaList<E> {
    /// View a foreign list. Fails with `ClassMismatch` for anything else.
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

    /// Element at `index`, `IndexOutOfBounds` outside `0..size`
    pub fn get(&self, index: usize) -> BridgeResult<E> {
        let value = self.bridge.runtime().list_get(self.handle, index)?;
        E::from_foreign(&self.bridge, value)
    }

    /// Replace the element at `index`, returning the previous one
    pub fn set(&self, index: usize, element: E) -> BridgeResult<E> {
        let value = element.to_foreign(&self.bridge)?;
        let old = self.bridge.runtime().list_set(self.handle, index, value)?;
        E::from_foreign(&self.bridge, old)
    }

    /// Append to the end
    pub fn push(&self, element: E) -> BridgeResult<()> {
        self.add(element).map(|_| ())
    }

    /// Insert at `index`, shifting later elements right. `index == size` appends.
    pub fn insert(&self, index: usize, element: E) -> BridgeResult<()> {
        let value = element.to_foreign(&self.bridge)?;
        self.bridge.runtime().list_insert(self.handle, index, value)
    }

    pub fn remove_at(&self, index: usize) -> BridgeResult<E> {
        let value = self.bridge.runtime().list_remove_at(self.handle, index)?;
        E::from_foreign(&self.bridge, value)
    }

    /// First index of an element equal to `element`
    pub fn index_of(&self, element: &E) -> BridgeResult<Option<usize>> {
        let needle = element.to_foreign(&self.bridge)?;
        let eq = self.bridge.equality();
        let cursor = JavaIterator::<Value>::over(&self.bridge, self.handle)?;
        for (index, value) in cursor.enumerate() {
            if eq.equals(&value?, &needle)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Last index of an element equal to `element`
    pub fn last_index_of(&self, element: &E) -> BridgeResult<Option<usize>> {
        let needle = element.to_foreign(&self.bridge)?;
        let eq = self.bridge.equality();
        let runtime = self.bridge.runtime();
        for index in (0..runtime.size(self.handle)?).rev() {
            if eq.equals(&runtime.list_get(self.handle, index)?, &needle)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Live window over `from..to`
    pub fn sub_list(&self, from: usize, to: usize) -> BridgeResult<ListWindow<E>> {
        ListWindow::over_list(self.bridge.clone(), self.handle, from, to)
    }

    /// Bidirectional cursor starting before the first element
    pub fn list_iterator(&self) -> BridgeResult<JavaListIterator<E>> {
        self.list_iterator_at(0)
    }

    /// Bidirectional cursor whose first `next_element` returns `index`
    pub fn list_iterator_at(&self, index: usize) -> BridgeResult<JavaListIterator<E>> {
        let len = self.size()?;
        JavaListIterator::new(self.sub_list(0, len)?, index)
    }
}

impl<E: Bridged> JavaCollection<E> for JavaList<E> {
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

impl<E: Bridged> Bridged for JavaList<E> {
    fn from_foreign(bridge: &Bridge, value: Value) -> BridgeResult<Self> {
        let handle = expect_kind(bridge, value, "java.util.List", |k| matches!(k, ForeignKind::List))?;
        Ok(Self::unchecked(bridge.clone(), handle))
    }

    fn to_foreign(&self, _bridge: &Bridge) -> BridgeResult<Value> {
        Ok(Value::Handle(self.handle))
    }
}

impl<E> Clone for JavaList<E> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            handle: self.handle,
            _elem: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for JavaList<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("JavaList").field(&self.handle).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use jbridge_runtime::{CollectionOptions, ForeignRuntime, HeapRuntime, SetOrder};
    use jbridge_types::BridgeError;

    fn setup(items: &[i64]) -> (Arc<HeapRuntime>, JavaList<i64>) {
        let runtime = Arc::new(HeapRuntime::new());
        let handle = runtime.new_list(items.iter().copied());
        let bridge = Bridge::new(runtime.clone());
        (runtime, JavaList::from_handle(&bridge, handle).unwrap())
    }

    #[test]
    fn test_indexed_access() {
        let (_, list) = setup(&[1, 2, 3]);
        assert_eq!(list.get(1).unwrap(), 2);
        assert_eq!(list.set(1, 20).unwrap(), 2);
        list.insert(0, 0).unwrap();
        list.push(4).unwrap();
        assert_eq!(list.remove_at(2).unwrap(), 20);
        assert_eq!(list.to_vec().unwrap(), vec![0, 1, 3, 4]);
        assert!(matches!(
            list.get(9),
            Err(BridgeError::IndexOutOfBounds { index: 9, len: 4 })
        ));
    }

    #[test]
    fn test_index_of() {
        let (_, list) = setup(&[5, 7, 5]);
        assert_eq!(list.index_of(&5).unwrap(), Some(0));
        assert_eq!(list.last_index_of(&5).unwrap(), Some(2));
        assert_eq!(list.index_of(&9).unwrap(), None);
    }

    #[test]
    fn test_bulk_operations() {
        let (_, list) = setup(&[1, 2, 3, 4, 5, 6]);
        assert!(list.contains_all(&[2, 4]).unwrap());
        assert!(!list.contains_all(&[2, 9]).unwrap());

        assert_eq!(list.remove_if(|n| n % 2 == 0).unwrap(), 3);
        assert_eq!(list.to_vec().unwrap(), vec![1, 3, 5]);

        assert_eq!(list.retain_if(|n| *n > 1).unwrap(), 1);
        assert!(list.add_all([7, 8]).unwrap());
        assert_eq!(list.to_vec().unwrap(), vec![3, 5, 7, 8]);

        list.clear().unwrap();
        assert!(list.is_empty().unwrap());
    }

    #[test]
    fn test_from_handle_checks_kind() {
        let runtime = Arc::new(HeapRuntime::new());
        let set = runtime.new_set([1], SetOrder::Insertion).unwrap();
        let bridge = Bridge::new(runtime.clone());
        assert!(matches!(
            JavaList::<i64>::from_handle(&bridge, set),
            Err(BridgeError::ClassMismatch { .. })
        ));
    }

    #[test]
    fn test_constraints_surface_as_errors() {
        let runtime = Arc::new(HeapRuntime::new());
        let bridge = Bridge::new(runtime.clone());

        let frozen = runtime.new_list_with([1], CollectionOptions::unmodifiable()).unwrap();
        let frozen = JavaList::<i64>::from_handle(&bridge, frozen).unwrap();
        assert!(matches!(frozen.push(2), Err(BridgeError::Unsupported(_))));

        let strict = runtime
            .new_list_with(Vec::<Value>::new(), CollectionOptions::non_null())
            .unwrap();
        let strict = JavaList::<Option<i64>>::from_handle(&bridge, strict).unwrap();
        assert!(matches!(strict.push(None), Err(BridgeError::NullNotAllowed(_))));
    }

    #[test]
    fn test_iter_reports_cursor_failure() {
        let (runtime, list) = setup(&[1]);
        runtime.release(list.handle()).unwrap();
        let mut iter = list.iter();
        assert!(matches!(iter.next(), Some(Err(BridgeError::StaleHandle(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_lookups_agree_on_mixed_classes() {
        let runtime = Arc::new(HeapRuntime::new());
        let handle = runtime.new_list([Value::Int(1), Value::from("a")]);
        let list = JavaList::<Value>::from_handle(&Bridge::new(runtime.clone()), handle).unwrap();

        let needle = Value::from("a");
        assert!(matches!(list.contains(&needle), Err(BridgeError::ClassMismatch { .. })));
        assert!(matches!(list.index_of(&needle), Err(BridgeError::ClassMismatch { .. })));
        assert!(matches!(list.remove(&needle), Err(BridgeError::ClassMismatch { .. })));
        assert_eq!(list.size().unwrap(), 2);

        assert!(list.contains(&Value::Int(1)).unwrap());
        assert_eq!(list.index_of(&Value::Int(1)).unwrap(), Some(0));
        assert!(!list.contains(&Value::Null).unwrap());
        assert_eq!(list.index_of(&Value::Null).unwrap(), None);
    }
}
