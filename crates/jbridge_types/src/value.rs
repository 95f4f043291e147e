//! Boundary value type that flows between the host and the foreign runtime
//!
//! Primitives cross the bridge by value. Everything else crosses as an opaque
//! [`HandleRef`] and stays owned by the foreign side.

use serde::{Deserialize, Serialize};

use crate::HandleRef;

// ─────────────────────────────────────────────────────────────────────────────
// Value Classes
// ─────────────────────────────────────────────────────────────────────────────

/// Class of a boundary value, used for comparability and class constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueClass {
    Null,
    Bool,
    Int,
    Float,
    String,
    Handle,
}

impl ValueClass {
    /// Foreign class name of a boxed primitive of this class
    pub fn foreign_name(self) -> &'static str {
        match self {
            ValueClass::Null => "null",
            ValueClass::Bool => "java.lang.Boolean",
            ValueClass::Int => "java.lang.Long",
            ValueClass::Float => "java.lang.Double",
            ValueClass::String => "java.lang.String",
            ValueClass::Handle => "java.lang.Object",
        }
    }
}

impl std::fmt::Display for ValueClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueClass::Null => "null",
            ValueClass::Bool => "bool",
            ValueClass::Int => "int",
            ValueClass::Float => "float",
            ValueClass::String => "string",
            ValueClass::Handle => "handle",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Boundary Value Type
// ─────────────────────────────────────────────────────────────────────────────

/// A value crossing the bridge
///
/// `Value` intentionally does not implement `PartialEq`: whether two values are
/// equal is decided by the foreign runtime's equality contract, never by host
/// structural or reference equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// Foreign `null`
    #[default]
    Null,
    /// Boxed boolean
    Bool(bool),
    /// Boxed 64-bit integer
    Int(i64),
    /// Boxed 64-bit float
    Float(f64),
    /// Foreign string, copied by value
    String(String),
    /// Reference to a foreign object
    Handle(HandleRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn class(&self) -> ValueClass {
        match self {
            Value::Null => ValueClass::Null,
            Value::Bool(_) => ValueClass::Bool,
            Value::Int(_) => ValueClass::Int,
            Value::Float(_) => ValueClass::Float,
            Value::String(_) => ValueClass::String,
            Value::Handle(_) => ValueClass::Handle,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(flag) = self { Some(*flag) } else { None }
    }

    /// Integer view. A float with no fractional part also qualifies.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(n) => Some(n),
            Value::Float(x) if x.fract() == 0.0 => Some(x as i64),
            _ => None,
        }
    }

    /// Float view, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(x) => Some(x),
            Value::Int(n) => Some(n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(text) = self { Some(text.as_str()) } else { None }
    }

    pub fn as_handle(&self) -> Option<HandleRef> {
        if let Value::Handle(handle) = self { Some(*handle) } else { None }
    }

    /// Whether both values are the very same foreign object, or the same
    /// primitive bit pattern. This is identity, not foreign equality.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => a == b,
            _ => false,
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueConversionError {
        ValueConversionError::TypeMismatch { expected, actual: self.class() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host -> Value
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! value_from {
    ($($host:ty => |$v:ident| $body:expr;)*) => {
        $(
            impl From<$host> for Value {
                fn from($v: $host) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    () => |_unit| Value::Null;
    bool => |flag| Value::Bool(flag);
    i32 => |n| Value::Int(i64::from(n));
    i64 => |n| Value::Int(n);
    u32 => |n| Value::Int(i64::from(n));
    f64 => |x| Value::Float(x);
    String => |text| Value::String(text);
    &str => |text| Value::String(text.to_owned());
    HandleRef => |handle| Value::Handle(handle);
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(slot: Option<T>) -> Self {
        slot.map_or(Value::Null, Into::into)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value -> Host
// ─────────────────────────────────────────────────────────────────────────────

/// Error when converting from Value
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValueConversionError {
    #[error("Expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: ValueClass,
    },
    #[error("Integer overflow")]
    IntegerOverflow,
}

macro_rules! value_into {
    ($($host:ty as $label:literal => |$v:ident| $extract:expr;)*) => {
        $(
            impl TryFrom<Value> for $host {
                type Error = ValueConversionError;

                fn try_from($v: Value) -> Result<Self, Self::Error> {
                    let found: Option<$host> = $extract;
                    match found {
                        Some(host) => Ok(host),
                        None => Err($v.mismatch($label)),
                    }
                }
            }
        )*
    };
}

value_into! {
    bool as "bool" => |v| v.as_bool();
    i64 as "int" => |v| if let Value::Int(n) = v { Some(n) } else { None };
    f64 as "float" => |v| v.as_f64();
    String as "string" => |v| if let Value::String(ref text) = v { Some(text.clone()) } else { None };
    HandleRef as "handle" => |v| v.as_handle();
}

impl TryFrom<Value> for i32 {
    type Error = ValueConversionError;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        let wide = i64::try_from(v)?;
        i32::try_from(wide).map_err(|_| ValueConversionError::IntegerOverflow)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON
// ─────────────────────────────────────────────────────────────────────────────

/// Error when a JSON document cannot be represented as a single boundary value
#[derive(Debug, Clone, thiserror::Error)]
#[error("JSON {0} cannot cross the bridge as a single value")]
pub struct UnrepresentableJson(&'static str);

impl TryFrom<serde_json::Value> for Value {
    type Error = UnrepresentableJson;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as Json;

        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(flag) => Value::Bool(flag),
            Json::Number(num) => match (num.as_i64(), num.as_f64()) {
                (Some(n), _) => Value::Int(n),
                (None, Some(x)) => Value::Float(x),
                (None, None) => return Err(UnrepresentableJson("number")),
            },
            Json::String(text) => Value::String(text),
            Json::Array(_) => return Err(UnrepresentableJson("array")),
            Json::Object(_) => return Err(UnrepresentableJson("object")),
        })
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        use serde_json::{Value as Json, json};

        match value {
            Value::Null => Json::Null,
            Value::Bool(flag) => Json::Bool(flag),
            Value::Int(n) => json!(n),
            // NaN and infinities have no JSON form
            Value::Float(x) => serde_json::Number::from_f64(x).map_or(Json::Null, Json::Number),
            Value::String(text) => Json::String(text),
            Value::Handle(handle) => json!({ "__handle__": handle.raw() }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(Value::from(42).as_i64(), Some(42));
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert!(Value::from(None::<i64>).is_null());
    }

    #[test]
    fn test_int_does_not_convert_from_string() {
        let err = i64::try_from(Value::from("7")).unwrap_err();
        assert!(matches!(
            err,
            ValueConversionError::TypeMismatch { expected: "int", actual: ValueClass::String }
        ));
    }

    #[test]
    fn test_i32_overflow() {
        let err = i32::try_from(Value::Int(i64::MAX)).unwrap_err();
        assert!(matches!(err, ValueConversionError::IntegerOverflow));
    }

    #[test]
    fn test_identity_is_not_equality() {
        let a = Value::Handle(HandleRef::from_raw(1));
        let b = Value::Handle(HandleRef::from_raw(2));
        assert!(a.is_identical(&a.clone()));
        assert!(!a.is_identical(&b));
        assert!(!Value::Int(1).is_identical(&Value::Float(1.0)));
    }

    #[test]
    fn test_json_interop() {
        let v = Value::try_from(serde_json::json!(12)).unwrap();
        assert_eq!(v.as_i64(), Some(12));
        assert!(Value::try_from(serde_json::json!([1, 2])).is_err());

        let json: serde_json::Value = Value::Handle(HandleRef::from_raw(9)).into();
        assert_eq!(json["__handle__"], serde_json::json!(9));
    }
}
