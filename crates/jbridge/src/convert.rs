//! Host <-> foreign value conversion
//!
//! [`Bridged`] is implemented by every type that can be an element, key or
//! value of a bridged collection: primitives, raw values and handles, the
//! adapters themselves and any `#[derive(ForeignEnum)]` key.

use jbridge_types::{BridgeError, BridgeResult, ForeignKind, HandleRef, Value, ValueConversionError};

use crate::Bridge;

/// Conversion between a host type and a foreign value
pub trait Bridged: Sized {
    fn from_foreign(bridge: &Bridge, value: Value) -> BridgeResult<Self>;

    fn to_foreign(&self, bridge: &Bridge) -> BridgeResult<Value>;
}

impl Bridged for Value {
    fn from_foreign(_bridge: &Bridge, value: Value) -> BridgeResult<Self> {
        Ok(value)
    }

    fn to_foreign(&self, _bridge: &Bridge) -> BridgeResult<Value> {
        Ok(self.clone())
    }
}

macro_rules! bridged_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bridged for $ty {
                fn from_foreign(_bridge: &Bridge, value: Value) -> BridgeResult<Self> {
                    Ok(<$ty>::try_from(value)?)
                }

                fn to_foreign(&self, _bridge: &Bridge) -> BridgeResult<Value> {
                    Ok(Value::from(self.clone()))
                }
            }
        )*
    };
}

bridged_primitive!(bool, i32, i64, f64, String, HandleRef);

/// `null` on the foreign side is `None` on the host side
impl<T: Bridged> Bridged for Option<T> {
    fn from_foreign(bridge: &Bridge, value: Value) -> BridgeResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_foreign(bridge, other).map(Some),
        }
    }

    fn to_foreign(&self, bridge: &Bridge) -> BridgeResult<Value> {
        match self {
            Some(inner) => inner.to_foreign(bridge),
            None => Ok(Value::Null),
        }
    }
}

/// Unwrap a handle and check its kind before an adapter is built on it
pub(crate) fn expect_kind(
    bridge: &Bridge,
    value: Value,
    expected: &'static str,
    accepts: impl Fn(&ForeignKind) -> bool,
) -> BridgeResult<HandleRef> {
    let Value::Handle(handle) = value else {
        return Err(ValueConversionError::TypeMismatch {
            expected,
            actual: value.class(),
        }
        .into());
    };
    let kind = bridge.runtime().kind_of(handle)?;
    if accepts(&kind) {
        Ok(handle)
    } else {
        Err(BridgeError::class_mismatch(expected, bridge.runtime().class_name(handle)?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use jbridge_runtime::HeapRuntime;

    #[test]
    fn test_option_maps_null() {
        let bridge = Bridge::new(Arc::new(HeapRuntime::new()));
        assert_eq!(Option::<i64>::from_foreign(&bridge, Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_foreign(&bridge, Value::Int(3)).unwrap(), Some(3));
        assert!(Some(5i64).to_foreign(&bridge).unwrap().as_i64() == Some(5));
        assert!(None::<String>.to_foreign(&bridge).unwrap().is_null());
    }

    #[test]
    fn test_mismatched_primitive_is_a_conversion_error() {
        let bridge = Bridge::new(Arc::new(HeapRuntime::new()));
        let err = i64::from_foreign(&bridge, Value::from("7")).unwrap_err();
        assert!(matches!(err, BridgeError::Conversion(_)));
    }

    #[test]
    fn test_expect_kind_checks_the_runtime() {
        let runtime = Arc::new(HeapRuntime::new());
        let bridge = Bridge::new(runtime.clone());
        let list = runtime.new_list([1, 2]);

        let ok = expect_kind(&bridge, Value::Handle(list), "java.util.List", |k| {
            matches!(k, ForeignKind::List)
        });
        assert_eq!(ok.unwrap(), list);

        let err = expect_kind(&bridge, Value::Handle(list), "java.util.Map", |k| {
            matches!(k, ForeignKind::Map)
        })
        .unwrap_err();
        assert!(matches!(err, BridgeError::ClassMismatch { .. }));
    }
}
