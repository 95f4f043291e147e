//! Grouping and filtering over collection views

use jbridge_types::BridgeResult;

use super::sets::dedupe;
use crate::collections::JavaCollection;
use crate::Bridged;

/// Group elements by a derived key, keys compared with foreign equality.
/// Groups come out in the order their keys were first seen.
pub fn group_by<E, K, C, F>(source: &C, mut key_fn: F) -> BridgeResult<Vec<(K, Vec<E>)>>
where
    E: Bridged,
    K: Bridged,
    C: JavaCollection<E>,
    F: FnMut(&E) -> K,
{
    let bridge = source.bridge();
    let mut groups = bridge.equality().index::<(K, Vec<E>)>();
    for element in source.iter() {
        let element = element?;
        let key = key_fn(&element);
        let raw = key.to_foreign(bridge)?;
        groups.get_or_insert_with(raw, || (key, Vec::new()))?.1.push(element);
    }
    Ok(groups.into_values())
}

pub fn filter<E, C, F>(source: &C, mut predicate: F) -> BridgeResult<Vec<E>>
where
    E: Bridged,
    C: JavaCollection<E>,
    F: FnMut(&E) -> bool,
{
    let mut out = Vec::new();
    for element in source.iter() {
        let element = element?;
        if predicate(&element) {
            out.push(element);
        }
    }
    Ok(out)
}

/// Split into `(matching, rest)`, both in iteration order
pub fn partition<E, C, F>(source: &C, mut predicate: F) -> BridgeResult<(Vec<E>, Vec<E>)>
where
    E: Bridged,
    C: JavaCollection<E>,
    F: FnMut(&E) -> bool,
{
    let mut matching = Vec::new();
    let mut rest = Vec::new();
    for element in source.iter() {
        let element = element?;
        if predicate(&element) {
            matching.push(element);
        } else {
            rest.push(element);
        }
    }
    Ok((matching, rest))
}

/// First occurrence of every element, by foreign equality
pub fn distinct<E, C>(source: &C) -> BridgeResult<Vec<E>>
where
    E: Bridged,
    C: JavaCollection<E>,
{
    let elements = source.to_vec()?;
    dedupe(source, elements)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Bridge, JavaList};
    use jbridge_runtime::HeapRuntime;
    use jbridge_types::{BridgeError, Value};

    fn words(items: &[&str]) -> JavaList<String> {
        let runtime = Arc::new(HeapRuntime::new());
        let handle = runtime.new_list(items.iter().copied());
        JavaList::from_handle(&Bridge::new(runtime), handle).unwrap()
    }

    #[test]
    fn test_group_by_first_letter() {
        let list = words(&["apple", "bean", "avocado", "beet", "corn"]);
        let groups = group_by(&list, |w| w[..1].to_string()).unwrap();
        assert_eq!(
            groups,
            vec![
                ("a".to_string(), vec!["apple".to_string(), "avocado".to_string()]),
                ("b".to_string(), vec!["bean".to_string(), "beet".to_string()]),
                ("c".to_string(), vec!["corn".to_string()]),
            ]
        );
    }

    #[test]
    fn test_filter_partition_distinct() {
        let list = words(&["a", "bb", "a", "ccc", "bb"]);
        assert_eq!(filter(&list, |w| w.len() > 1).unwrap(), vec!["bb", "ccc", "bb"]);

        let (short, long) = partition(&list, |w| w.len() == 1).unwrap();
        assert_eq!(short, vec!["a", "a"]);
        assert_eq!(long, vec!["bb", "ccc", "bb"]);

        assert_eq!(distinct(&list).unwrap(), vec!["a", "bb", "ccc"]);
    }

    #[test]
    fn test_distinct_rejects_mixed_classes() {
        let runtime = Arc::new(HeapRuntime::new());
        let bridge = Bridge::new(runtime.clone());
        // "a".hashCode() is 97, so 97 shares its bucket and 98 does not
        for other in [97, 98] {
            let handle = runtime.new_list([Value::from("a"), Value::Null, Value::Int(other)]);
            let list = JavaList::<Value>::from_handle(&bridge, handle).unwrap();
            assert!(matches!(distinct(&list), Err(BridgeError::ClassMismatch { .. })));
            assert!(matches!(
                group_by(&list, |v: &Value| v.clone()),
                Err(BridgeError::ClassMismatch { .. })
            ));
        }
    }
}
