//! Live sublist windows
//!
//! A [`ListWindow`] is a span `offset..offset + len` of a backing foreign list.
//! Reads and writes go straight to the backing list. Structural changes made
//! through a window resize it and every window it was cut from; structural
//! changes made anywhere else invalidate it.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use jbridge_types::{BridgeError, BridgeResult, HandleRef};

use super::JavaCollection;
use crate::iter::JavaListIterator;
use crate::{Bridge, Bridged};

#[derive(Debug)]
struct Span {
    offset: usize,
    len: usize,
    /// Structural version of the backing list this span is valid for
    version: u64,
}

fn check_range(from: usize, to: usize, len: usize) -> BridgeResult<()> {
    if to > len {
        return Err(BridgeError::IndexOutOfBounds { index: to, len });
    }
    if from > to {
        return Err(BridgeError::IndexOutOfBounds { index: from, len: to });
    }
    Ok(())
}

fn check_index(index: usize, len: usize) -> BridgeResult<()> {
    if index >= len {
        return Err(BridgeError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

/// Live view over a contiguous range of a foreign list
pub struct ListWindow<E> {
    bridge: Bridge,
    list: HandleRef,
    span: Arc<Mutex<Span>>,
    /// Spans of the windows this one was cut from, outermost first
    ancestors: Vec<Arc<Mutex<Span>>>,
    _elem: PhantomData<fn() -> E>,
}

impl<E: Bridged> ListWindow<E> {
    pub(crate) fn over_list(bridge: Bridge, list: HandleRef, from: usize, to: usize) -> BridgeResult<Self> {
        let runtime = bridge.runtime();
        check_range(from, to, runtime.size(list)?)?;
        let version = runtime.structural_version(list)?;
        Ok(Self {
            span: Arc::new(Mutex::new(Span {
                offset: from,
                len: to - from,
                version,
            })),
            bridge,
            list,
            ancestors: Vec::new(),
            _elem: PhantomData,
        })
    }

    /// Backing list handle
    pub fn list_handle(&self) -> HandleRef {
        self.list
    }

    /// Validate against the backing list, returning `(offset, len)`
    pub(crate) fn check(&self) -> BridgeResult<(usize, usize)> {
        let version = self.bridge.runtime().structural_version(self.list)?;
        let span = self.span.lock();
        if span.version != version {
            debug!("Window over {} invalidated by an outside structural change", self.list);
            return Err(BridgeError::ConcurrentStructuralChange);
        }
        Ok((span.offset, span.len))
    }

    /// Record a structural change made through this window
    fn resized(&self, grew: bool) -> BridgeResult<()> {
        let version = self.bridge.runtime().structural_version(self.list)?;
        for span in self.ancestors.iter().chain(std::iter::once(&self.span)) {
            let mut span = span.lock();
            if grew {
                span.len += 1;
            } else {
                span.len -= 1;
            }
            span.version = version;
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> BridgeResult<E> {
        let (offset, len) = self.check()?;
        check_index(index, len)?;
        let value = self.bridge.runtime().list_get(self.list, offset + index)?;
        E::from_foreign(&self.bridge, value)
    }

    pub fn set(&self, index: usize, element: E) -> BridgeResult<E> {
        let (offset, len) = self.check()?;
        check_index(index, len)?;
        let value = element.to_foreign(&self.bridge)?;
        let old = self.bridge.runtime().list_set(self.list, offset + index, value)?;
        E::from_foreign(&self.bridge, old)
    }

    pub fn insert(&self, index: usize, element: E) -> BridgeResult<()> {
        let (offset, len) = self.check()?;
        if index > len {
            return Err(BridgeError::IndexOutOfBounds { index, len });
        }
        let value = element.to_foreign(&self.bridge)?;
        self.bridge.runtime().list_insert(self.list, offset + index, value)?;
        self.resized(true)
    }

    pub fn push(&self, element: E) -> BridgeResult<()> {
        let (_, len) = self.check()?;
        self.insert(len, element)
    }

    pub fn remove_at(&self, index: usize) -> BridgeResult<E> {
        let (offset, len) = self.check()?;
        check_index(index, len)?;
        let value = self.bridge.runtime().list_remove_at(self.list, offset + index)?;
        self.resized(false)?;
        E::from_foreign(&self.bridge, value)
    }

    pub fn index_of(&self, element: &E) -> BridgeResult<Option<usize>> {
        let needle = element.to_foreign(&self.bridge)?;
        let (offset, len) = self.check()?;
        let eq = self.bridge.equality();
        for index in 0..len {
            let value = self.bridge.runtime().list_get(self.list, offset + index)?;
            if eq.equals(&value, &needle)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    pub fn last_index_of(&self, element: &E) -> BridgeResult<Option<usize>> {
        let needle = element.to_foreign(&self.bridge)?;
        let (offset, len) = self.check()?;
        let eq = self.bridge.equality();
        for index in (0..len).rev() {
            let value = self.bridge.runtime().list_get(self.list, offset + index)?;
            if eq.equals(&value, &needle)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Window over `from..to` of this window
    pub fn sub_list(&self, from: usize, to: usize) -> BridgeResult<ListWindow<E>> {
        let (offset, len) = self.check()?;
        check_range(from, to, len)?;
        let version = self.span.lock().version;

        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.span.clone());
        Ok(Self {
            bridge: self.bridge.clone(),
            list: self.list,
            span: Arc::new(Mutex::new(Span {
                offset: offset + from,
                len: to - from,
                version,
            })),
            ancestors,
            _elem: PhantomData,
        })
    }

    pub fn list_iterator(&self) -> BridgeResult<JavaListIterator<E>> {
        self.list_iterator_at(0)
    }

    pub fn list_iterator_at(&self, index: usize) -> BridgeResult<JavaListIterator<E>> {
        JavaListIterator::new(self.clone(), index)
    }
}

impl<E: Bridged> JavaCollection<E> for ListWindow<E> {
    type Iter = JavaListIterator<E>;

    fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    fn size(&self) -> BridgeResult<usize> {
        Ok(self.check()?.1)
    }

    fn contains(&self, element: &E) -> BridgeResult<bool> {
        Ok(self.index_of(element)?.is_some())
    }

    fn iterator(&self) -> BridgeResult<JavaListIterator<E>> {
        self.list_iterator()
    }

    fn add(&self, element: E) -> BridgeResult<bool> {
        self.push(element)?;
        Ok(true)
    }

    fn remove(&self, element: &E) -> BridgeResult<bool> {
        match self.index_of(element)? {
            Some(index) => {
                self.remove_at(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the window's range from the backing list
    fn clear(&self) -> BridgeResult<()> {
        let (_, len) = self.check()?;
        for _ in 0..len {
            self.remove_at(0)?;
        }
        Ok(())
    }
}

/// Clones share the window: a change through one resizes the other
impl<E> Clone for ListWindow<E> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            list: self.list,
            span: self.span.clone(),
            ancestors: self.ancestors.clone(),
            _elem: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for ListWindow<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let span = self.span.lock();
        f.debug_struct("ListWindow")
            .field("list", &self.list)
            .field("offset", &span.offset)
            .field("len", &span.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JavaList;
    use jbridge_runtime::HeapRuntime;

    fn setup(items: &[i64]) -> (Arc<HeapRuntime>, JavaList<i64>) {
        let runtime = Arc::new(HeapRuntime::new());
        let handle = runtime.new_list(items.iter().copied());
        let bridge = Bridge::new(runtime.clone());
        (runtime, JavaList::from_handle(&bridge, handle).unwrap())
    }

    #[test]
    fn test_window_reads_and_writes_through() {
        let (_, list) = setup(&[0, 1, 2, 3, 4]);
        let window = list.sub_list(1, 4).unwrap();

        assert_eq!(window.to_vec().unwrap(), vec![1, 2, 3]);
        window.set(0, 10).unwrap();
        assert_eq!(list.get(1).unwrap(), 10);
        assert!(window.get(3).is_err());
    }

    #[test]
    fn test_structural_changes_resize_ancestors() {
        let (_, list) = setup(&[0, 1, 2, 3, 4, 5]);
        let outer = list.sub_list(1, 5).unwrap();
        let inner = outer.sub_list(1, 3).unwrap();

        inner.push(99).unwrap();
        assert_eq!(inner.to_vec().unwrap(), vec![2, 3, 99]);
        assert_eq!(outer.to_vec().unwrap(), vec![1, 2, 3, 99, 4]);
        assert_eq!(list.to_vec().unwrap(), vec![0, 1, 2, 3, 99, 4, 5]);

        inner.clear().unwrap();
        assert_eq!(outer.to_vec().unwrap(), vec![1, 4]);
        assert_eq!(list.to_vec().unwrap(), vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_outside_change_invalidates_window() {
        let (_, list) = setup(&[0, 1, 2, 3]);
        let window = list.sub_list(0, 2).unwrap();
        list.push(4).unwrap();
        assert!(matches!(window.size(), Err(BridgeError::ConcurrentStructuralChange)));

        let (_, list) = setup(&[0, 1, 2, 3]);
        let a = list.sub_list(0, 2).unwrap();
        let b = list.sub_list(2, 4).unwrap();
        a.remove_at(0).unwrap();
        assert!(matches!(b.get(0), Err(BridgeError::ConcurrentStructuralChange)));
    }

    #[test]
    fn test_replacement_does_not_invalidate() {
        let (_, list) = setup(&[0, 1, 2]);
        let window = list.sub_list(1, 3).unwrap();
        list.set(2, 20).unwrap();
        assert_eq!(window.to_vec().unwrap(), vec![1, 20]);
    }

    #[test]
    fn test_window_index_of_and_remove() {
        let (_, list) = setup(&[7, 1, 7, 2, 7]);
        let window = list.sub_list(1, 4).unwrap();
        assert_eq!(window.index_of(&7).unwrap(), Some(1));
        assert_eq!(window.last_index_of(&7).unwrap(), Some(1));
        assert!(window.remove(&7).unwrap());
        assert!(!window.contains(&7).unwrap());
        assert_eq!(list.to_vec().unwrap(), vec![7, 1, 2, 7]);
    }

    #[test]
    fn test_range_checks() {
        let (_, list) = setup(&[0, 1, 2]);
        assert!(matches!(list.sub_list(2, 4), Err(BridgeError::IndexOutOfBounds { .. })));
        assert!(matches!(list.sub_list(2, 1), Err(BridgeError::IndexOutOfBounds { .. })));
        assert!(list.sub_list(3, 3).unwrap().is_empty().unwrap());
    }
}
