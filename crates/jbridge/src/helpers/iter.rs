//! Reductions over a two-step cursor
//!
//! Every helper advances with `has_next`/`next_element` only and stops as
//! soon as its answer is known, leaving the cursor positioned after the last
//! element it consumed.

use jbridge_types::BridgeResult;

use crate::iter::TwoStep;

/// Drain the remaining elements
pub fn to_vec<T: TwoStep>(it: &mut T) -> BridgeResult<Vec<T::Item>> {
    let mut out = Vec::new();
    while it.has_next()? {
        out.push(it.next_element()?);
    }
    Ok(out)
}

pub fn for_each_remaining<T, F>(it: &mut T, mut f: F) -> BridgeResult<()>
where
    T: TwoStep,
    F: FnMut(T::Item),
{
    while it.has_next()? {
        f(it.next_element()?);
    }
    Ok(())
}

/// First remaining element matching `predicate`
pub fn find<T, F>(it: &mut T, mut predicate: F) -> BridgeResult<Option<T::Item>>
where
    T: TwoStep,
    F: FnMut(&T::Item) -> bool,
{
    while it.has_next()? {
        let element = it.next_element()?;
        if predicate(&element) {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

pub fn any<T, F>(it: &mut T, mut predicate: F) -> BridgeResult<bool>
where
    T: TwoStep,
    F: FnMut(&T::Item) -> bool,
{
    Ok(find(it, |e| predicate(e))?.is_some())
}

/// True for an exhausted cursor
pub fn all<T, F>(it: &mut T, mut predicate: F) -> BridgeResult<bool>
where
    T: TwoStep,
    F: FnMut(&T::Item) -> bool,
{
    Ok(find(it, |e| !predicate(e))?.is_none())
}

/// Combine the remaining elements left to right. `None` when none remain.
pub fn reduce<T, F>(it: &mut T, mut f: F) -> BridgeResult<Option<T::Item>>
where
    T: TwoStep,
    F: FnMut(T::Item, T::Item) -> T::Item,
{
    if !it.has_next()? {
        return Ok(None);
    }
    let mut acc = it.next_element()?;
    while it.has_next()? {
        acc = f(acc, it.next_element()?);
    }
    Ok(Some(acc))
}

pub fn fold<T, A, F>(it: &mut T, init: A, mut f: F) -> BridgeResult<A>
where
    T: TwoStep,
    F: FnMut(A, T::Item) -> A,
{
    let mut acc = init;
    while it.has_next()? {
        acc = f(acc, it.next_element()?);
    }
    Ok(acc)
}

/// Consume at most `n` elements. The cursor stays usable afterwards.
pub fn take<T: TwoStep>(it: &mut T, n: usize) -> BridgeResult<Vec<T::Item>> {
    let mut out = Vec::with_capacity(n.min(64));
    while out.len() < n && it.has_next()? {
        out.push(it.next_element()?);
    }
    Ok(out)
}

/// Discard at most `n` elements, returning how many were discarded
pub fn skip<T: TwoStep>(it: &mut T, n: usize) -> BridgeResult<usize> {
    let mut skipped = 0;
    while skipped < n && it.has_next()? {
        it.next_element()?;
        skipped += 1;
    }
    Ok(skipped)
}

/// Exhaust the cursor, counting what was left
pub fn count_remaining<T: TwoStep>(it: &mut T) -> BridgeResult<usize> {
    skip(it, usize::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Bridge, JavaCollection, JavaList};
    use jbridge_runtime::HeapRuntime;

    fn list(items: &[&str]) -> JavaList<String> {
        let runtime = Arc::new(HeapRuntime::new());
        let handle = runtime.new_list(items.iter().copied());
        JavaList::from_handle(&Bridge::new(runtime), handle).unwrap()
    }

    #[test]
    fn test_take_leaves_cursor_positioned() {
        let list = list(&["A", "B", "C", "D", "E"]);
        let mut it = list.iterator().unwrap();

        assert_eq!(take(&mut it, 2).unwrap(), vec!["A", "B"]);
        assert!(it.has_next().unwrap());
        assert_eq!(it.next_element().unwrap(), "C");

        assert_eq!(take(&mut it, 10).unwrap(), vec!["D", "E"]);
        assert!(take(&mut it, 1).unwrap().is_empty());
    }

    #[test]
    fn test_skip_and_count() {
        let list = list(&["a", "b", "c", "d"]);
        let mut it = list.iterator().unwrap();
        assert_eq!(skip(&mut it, 3).unwrap(), 3);
        assert_eq!(count_remaining(&mut it).unwrap(), 1);
        assert_eq!(skip(&mut it, 3).unwrap(), 0);
    }

    #[test]
    fn test_find_stops_at_match() {
        let list = list(&["x", "yy", "zzz", "ww"]);
        let mut it = list.iterator().unwrap();
        assert_eq!(find(&mut it, |s| s.len() == 2).unwrap().as_deref(), Some("yy"));
        assert_eq!(it.next_element().unwrap(), "zzz");

        let mut it = list.iterator().unwrap();
        assert!(any(&mut it, |s| s.starts_with('z')).unwrap());
        let mut it = list.iterator().unwrap();
        assert!(!all(&mut it, |s| s.len() < 3).unwrap());
        let mut it = list.iterator().unwrap();
        assert!(all(&mut it, |s| !s.is_empty()).unwrap());
    }

    #[test]
    fn test_reductions() {
        let list = list(&["a", "b", "c"]);
        let mut it = list.iterator().unwrap();
        assert_eq!(reduce(&mut it, |a, b| a + &b).unwrap().as_deref(), Some("abc"));
        assert_eq!(reduce(&mut it, |a, b| a + &b).unwrap(), None);

        let mut it = list.iterator().unwrap();
        assert_eq!(fold(&mut it, 0, |n, s| n + s.len()).unwrap(), 3);

        let mut seen = Vec::new();
        let mut it = list.iterator().unwrap();
        it.next_element().unwrap();
        for_each_remaining(&mut it, |s| seen.push(s)).unwrap();
        assert_eq!(seen, vec!["b", "c"]);

        let mut it = list.iterator().unwrap();
        assert_eq!(to_vec(&mut it).unwrap().len(), 3);
    }
}
