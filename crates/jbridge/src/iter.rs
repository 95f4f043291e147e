//! Iterator Bridge
//!
//! Foreign iterators are two-step cursors: `has_next` is a pure query and
//! `next` advances. [`JavaIterator`] keeps that shape (trait [`TwoStep`]) and
//! also implements the host pull protocol as a finite, fused, forward-only
//! `Iterator<Item = BridgeResult<E>>`.
//!
//! A cursor may remove the element it last returned, once per advance.
//! Structural changes made to the collection by anything other than the cursor
//! make the next cursor operation fail with `ConcurrentStructuralChange`.

use std::marker::PhantomData;

use tracing::trace;

use jbridge_types::{BridgeError, BridgeResult, HandleRef};

use crate::collections::{JavaCollection, ListWindow};
use crate::{Bridge, Bridged};

// ─────────────────────────────────────────────────────────────────────────────
// Two-Step Protocol
// ─────────────────────────────────────────────────────────────────────────────

/// The foreign cursor protocol
pub trait TwoStep {
    type Item;

    /// Whether another element is available. Repeatable, never advances.
    fn has_next(&self) -> BridgeResult<bool>;

    /// The foreign `next()`: advance one position, `NoSuchElement` when exhausted
    fn next_element(&mut self) -> BridgeResult<Self::Item>;

    /// Remove the element last returned by `next_element`
    fn remove(&mut self) -> BridgeResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Java Iterator
// ─────────────────────────────────────────────────────────────────────────────

/// Host view of a foreign iterator
///
/// Owns the foreign cursor and releases it on drop.
pub struct JavaIterator<E> {
    bridge: Bridge,
    cursor: HandleRef,
    /// Set by a successful advance, cleared by `remove`
    removable: bool,
    /// Fused: once exhausted or failed, `Iterator::next` yields `None`
    finished: bool,
    _elem: PhantomData<fn() -> E>,
}

impl<E: Bridged> JavaIterator<E> {
    /// Take ownership of a foreign cursor
    pub fn new(bridge: Bridge, cursor: HandleRef) -> Self {
        Self {
            bridge,
            cursor,
            removable: false,
            finished: false,
            _elem: PhantomData,
        }
    }

    /// Open a fresh cursor over a foreign collection
    pub fn over(bridge: &Bridge, collection: HandleRef) -> BridgeResult<Self> {
        let cursor = bridge.runtime().iterator(collection)?;
        Ok(Self::new(bridge.clone(), cursor))
    }

    pub fn handle(&self) -> HandleRef {
        self.cursor
    }
}

impl<E: Bridged> TwoStep for JavaIterator<E> {
    type Item = E;

    fn has_next(&self) -> BridgeResult<bool> {
        self.bridge.runtime().has_next(self.cursor)
    }

    fn next_element(&mut self) -> BridgeResult<E> {
        let value = self.bridge.runtime().next(self.cursor)?;
        self.removable = true;
        E::from_foreign(&self.bridge, value)
    }

    fn remove(&mut self) -> BridgeResult<()> {
        if !self.removable {
            return Err(BridgeError::illegal_state(
                "remove() requires a preceding next() with no remove() since",
            ));
        }
        self.bridge.runtime().iterator_remove(self.cursor)?;
        self.removable = false;
        Ok(())
    }
}

impl<E: Bridged> Iterator for JavaIterator<E> {
    type Item = BridgeResult<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let step = match self.has_next() {
            Ok(true) => self.next_element(),
            Ok(false) => {
                self.finished = true;
                return None;
            }
            Err(e) => Err(e),
        };
        // A conversion failure still consumed a foreign element; traversal goes on
        if matches!(step, Err(ref e) if !matches!(e, BridgeError::Conversion(_))) {
            self.finished = true;
        }
        Some(step)
    }
}

impl<E: Bridged> std::iter::FusedIterator for JavaIterator<E> {}

impl<E> Drop for JavaIterator<E> {
    fn drop(&mut self) {
        if let Err(e) = self.bridge.runtime().release(self.cursor) {
            trace!("Iterator {} was already gone: {}", self.cursor, e);
        }
    }
}

impl<E> std::fmt::Debug for JavaIterator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaIterator")
            .field("cursor", &self.cursor)
            .field("removable", &self.removable)
            .field("finished", &self.finished)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Elements
// ─────────────────────────────────────────────────────────────────────────────

/// Iterator returned by `JavaCollection::iter`. Failing to open the cursor
/// surfaces as a single `Err` item.
pub struct Elements<I> {
    state: ElementsState<I>,
}

enum ElementsState<I> {
    Live(I),
    Failed(Option<BridgeError>),
}

impl<I> Elements<I> {
    pub(crate) fn from_result(result: BridgeResult<I>) -> Self {
        let state = match result {
            Ok(iter) => ElementsState::Live(iter),
            Err(e) => ElementsState::Failed(Some(e)),
        };
        Self { state }
    }
}

impl<E, I> Iterator for Elements<I>
where
    I: Iterator<Item = BridgeResult<E>>,
{
    type Item = BridgeResult<E>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            ElementsState::Live(iter) => iter.next(),
            ElementsState::Failed(error) => error.take().map(Err),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Java List Iterator
// ─────────────────────────────────────────────────────────────────────────────

/// Bidirectional cursor over a list or list window
///
/// `set` and `remove` act on the element last returned by `next_element` or
/// `previous`, and need no `add`/`remove` in between.
pub struct JavaListIterator<E> {
    window: ListWindow<E>,
    /// Index of the element `next_element` returns
    cursor: usize,
    last: Option<usize>,
    finished: bool,
}

impl<E: Bridged> JavaListIterator<E> {
    pub(crate) fn new(window: ListWindow<E>, start: usize) -> BridgeResult<Self> {
        let len = window.size()?;
        if start > len {
            return Err(BridgeError::IndexOutOfBounds { index: start, len });
        }
        Ok(Self {
            window,
            cursor: start,
            last: None,
            finished: false,
        })
    }

    pub fn has_previous(&self) -> BridgeResult<bool> {
        self.window.check()?;
        Ok(self.cursor > 0)
    }

    /// Step back one position
    pub fn previous(&mut self) -> BridgeResult<E> {
        if !self.has_previous()? {
            return Err(BridgeError::NoSuchElement);
        }
        let element = self.window.get(self.cursor - 1)?;
        self.cursor -= 1;
        self.last = Some(self.cursor);
        Ok(element)
    }

    pub fn next_index(&self) -> usize {
        self.cursor
    }

    /// `None` at the start of the list
    pub fn previous_index(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    /// Replace the element last returned
    pub fn set(&mut self, element: E) -> BridgeResult<E> {
        let last = self.last.ok_or_else(|| {
            BridgeError::illegal_state("set() requires a preceding next() or previous()")
        })?;
        self.window.set(last, element)
    }

    /// Insert before the cursor. A following `next_element` is unaffected.
    pub fn add(&mut self, element: E) -> BridgeResult<()> {
        self.window.insert(self.cursor, element)?;
        self.cursor += 1;
        self.last = None;
        Ok(())
    }
}

impl<E: Bridged> TwoStep for JavaListIterator<E> {
    type Item = E;

    fn has_next(&self) -> BridgeResult<bool> {
        Ok(self.cursor < self.window.size()?)
    }

    fn next_element(&mut self) -> BridgeResult<E> {
        if !self.has_next()? {
            return Err(BridgeError::NoSuchElement);
        }
        let element = self.window.get(self.cursor)?;
        self.last = Some(self.cursor);
        self.cursor += 1;
        Ok(element)
    }

    fn remove(&mut self) -> BridgeResult<()> {
        let last = self.last.ok_or_else(|| {
            BridgeError::illegal_state("remove() requires a preceding next() or previous()")
        })?;
        self.window.remove_at(last)?;
        if last < self.cursor {
            self.cursor -= 1;
        }
        self.last = None;
        Ok(())
    }
}

impl<E: Bridged> Iterator for JavaListIterator<E> {
    type Item = BridgeResult<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.has_next() {
            Ok(true) => {
                let step = self.next_element();
                if matches!(step, Err(ref e) if !matches!(e, BridgeError::Conversion(_))) {
                    self.finished = true;
                }
                Some(step)
            }
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<E: Bridged> std::iter::FusedIterator for JavaListIterator<E> {}
