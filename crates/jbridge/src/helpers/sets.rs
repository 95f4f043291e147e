//! Set algebra over any collection view
//!
//! Membership is decided with `contains` on the other operand and results are
//! deduplicated with foreign equality, so lists can take part too. Results are
//! host vectors in first-seen order of the left operand; for hashed sets that
//! order carries no meaning.

use jbridge_types::BridgeResult;

use crate::collections::JavaCollection;
use crate::equality::EqIndex;
use crate::Bridged;

/// Pushes elements not already seen, by foreign equality
struct Distinct<'a, E> {
    index: EqIndex<'a, ()>,
    out: Vec<E>,
}

impl<'a, E: Bridged> Distinct<'a, E> {
    fn new<C: JavaCollection<E>>(source: &'a C) -> Self {
        Self {
            index: source.bridge().equality().index(),
            out: Vec::new(),
        }
    }

    fn push<C: JavaCollection<E>>(&mut self, source: &C, element: E) -> BridgeResult<()> {
        let key = element.to_foreign(source.bridge())?;
        if self.index.insert(key, ())? {
            self.out.push(element);
        }
        Ok(())
    }
}

/// Elements of `a`, then elements of `b` not in `a`
pub fn union<E, A, B>(a: &A, b: &B) -> BridgeResult<Vec<E>>
where
    E: Bridged,
    A: JavaCollection<E>,
    B: JavaCollection<E>,
{
    let mut acc = Distinct::new(a);
    for element in a.iter() {
        acc.push(a, element?)?;
    }
    for element in b.iter() {
        acc.push(a, element?)?;
    }
    Ok(acc.out)
}

/// Elements of `a` that `b` contains
pub fn intersection<E, A, B>(a: &A, b: &B) -> BridgeResult<Vec<E>>
where
    E: Bridged,
    A: JavaCollection<E>,
    B: JavaCollection<E>,
{
    let mut acc = Distinct::new(a);
    for element in a.iter() {
        let element = element?;
        if b.contains(&element)? {
            acc.push(a, element)?;
        }
    }
    Ok(acc.out)
}

/// Elements of `a` that `b` does not contain
pub fn difference<E, A, B>(a: &A, b: &B) -> BridgeResult<Vec<E>>
where
    E: Bridged,
    A: JavaCollection<E>,
    B: JavaCollection<E>,
{
    let mut acc = Distinct::new(a);
    for element in a.iter() {
        let element = element?;
        if !b.contains(&element)? {
            acc.push(a, element)?;
        }
    }
    Ok(acc.out)
}

/// Whether `b` contains every element of `a`
pub fn is_subset<E, A, B>(a: &A, b: &B) -> BridgeResult<bool>
where
    E: Bridged,
    A: JavaCollection<E>,
    B: JavaCollection<E>,
{
    for element in a.iter() {
        if !b.contains(&element?)? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(crate) fn dedupe<E, C>(source: &C, elements: impl IntoIterator<Item = E>) -> BridgeResult<Vec<E>>
where
    E: Bridged,
    C: JavaCollection<E>,
{
    let mut acc = Distinct::new(source);
    for element in elements {
        acc.push(source, element)?;
    }
    Ok(acc.out)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Bridge, JavaList, JavaSet};
    use jbridge_runtime::{HeapRuntime, SetOrder};

    fn sets(a: &[i64], b: &[i64]) -> (JavaSet<i64>, JavaSet<i64>) {
        let runtime = Arc::new(HeapRuntime::new());
        let bridge = Bridge::new(runtime.clone());
        let a = runtime.new_set(a.iter().copied(), SetOrder::Hashed).unwrap();
        let b = runtime.new_set(b.iter().copied(), SetOrder::Hashed).unwrap();
        (
            JavaSet::from_handle(&bridge, a).unwrap(),
            JavaSet::from_handle(&bridge, b).unwrap(),
        )
    }

    fn sorted(mut v: Vec<i64>) -> Vec<i64> {
        v.sort();
        v
    }

    #[test]
    fn test_set_algebra() {
        let (a, b) = sets(&[1, 2, 3, 4], &[3, 4, 5]);
        assert_eq!(sorted(union(&a, &b).unwrap()), vec![1, 2, 3, 4, 5]);
        assert_eq!(sorted(intersection(&a, &b).unwrap()), vec![3, 4]);
        assert_eq!(sorted(difference(&a, &b).unwrap()), vec![1, 2]);
        assert!(!is_subset(&a, &b).unwrap());

        let (small, big) = sets(&[2, 3], &[1, 2, 3]);
        assert!(is_subset(&small, &big).unwrap());
    }

    #[test]
    fn test_algebra_dedupes_lists() {
        let runtime = Arc::new(HeapRuntime::new());
        let bridge = Bridge::new(runtime.clone());
        let a = JavaList::<i64>::from_handle(&bridge, runtime.new_list([1, 1, 2, 2])).unwrap();
        let b = JavaList::<i64>::from_handle(&bridge, runtime.new_list([2, 3, 3])).unwrap();

        assert_eq!(union(&a, &b).unwrap(), vec![1, 2, 3]);
        assert_eq!(intersection(&a, &b).unwrap(), vec![2]);
        assert_eq!(difference(&a, &b).unwrap(), vec![1]);
    }

    #[test]
    fn test_handle_elements_compare_by_foreign_equality() {
        let runtime = Arc::new(HeapRuntime::new());
        let bridge = Bridge::new(runtime.clone());
        let a = runtime.new_list([runtime.new_list([1]), runtime.new_list([2])]);
        let b = runtime.new_list([runtime.new_list([1])]);
        let a = JavaList::<JavaList<i64>>::from_handle(&bridge, a).unwrap();
        let b = JavaList::<JavaList<i64>>::from_handle(&bridge, b).unwrap();

        let common = intersection(&a, &b).unwrap();
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].to_vec().unwrap(), vec![1]);
        assert_eq!(union(&a, &b).unwrap().len(), 2);
    }
}
