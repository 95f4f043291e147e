//! Collection Views
//!
//! Host views over foreign collection handles. A view holds one handle and a
//! bridge; every read and write goes to the foreign object, so views are
//! cheap to create and always live. Mutating methods take `&self`: the state
//! they change belongs to the foreign runtime.

mod list;
mod map;
mod set;
mod window;

pub use list::JavaList;
pub use map::{JavaMap, MapEntry, MapEntrySet, MapValues};
pub use set::JavaSet;
pub use window::ListWindow;

use jbridge_types::BridgeResult;

use crate::iter::{Elements, TwoStep};
use crate::{Bridge, Bridged};

/// Operations shared by lists, sets, list windows and map views
pub trait JavaCollection<E: Bridged> {
    /// Cursor type returned by [`JavaCollection::iterator`]
    type Iter: TwoStep<Item = E> + Iterator<Item = BridgeResult<E>>;

    fn bridge(&self) -> &Bridge;

    fn size(&self) -> BridgeResult<usize>;

    fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.size()? == 0)
    }

    fn contains(&self, element: &E) -> BridgeResult<bool>;

    /// Fresh cursor positioned before the first element
    fn iterator(&self) -> BridgeResult<Self::Iter>;

    /// Returns whether the collection changed
    fn add(&self, element: E) -> BridgeResult<bool>;

    /// Remove one element equal to `element`. Returns whether one was found.
    fn remove(&self, element: &E) -> BridgeResult<bool>;

    fn clear(&self) -> BridgeResult<()>;

    /// Host iteration; a cursor that cannot be opened is yielded as an error
    fn iter(&self) -> Elements<Self::Iter> {
        Elements::from_result(self.iterator())
    }

    fn to_vec(&self) -> BridgeResult<Vec<E>> {
        self.iterator()?.collect()
    }

    fn contains_all<'a, I>(&self, elements: I) -> BridgeResult<bool>
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        for element in elements {
            if !self.contains(element)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Returns whether any element changed the collection
    fn add_all<I>(&self, elements: I) -> BridgeResult<bool>
    where
        I: IntoIterator<Item = E>,
    {
        let mut changed = false;
        for element in elements {
            changed |= self.add(element)?;
        }
        Ok(changed)
    }

    /// Remove every element matching `predicate` through one cursor.
    /// Returns how many were removed.
    fn remove_if<F>(&self, mut predicate: F) -> BridgeResult<usize>
    where
        F: FnMut(&E) -> bool,
    {
        let mut cursor = self.iterator()?;
        let mut removed = 0;
        while cursor.has_next()? {
            let element = cursor.next_element()?;
            if predicate(&element) {
                cursor.remove()?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn retain_if<F>(&self, mut predicate: F) -> BridgeResult<usize>
    where
        F: FnMut(&E) -> bool,
    {
        self.remove_if(|e| !predicate(e))
    }
}
