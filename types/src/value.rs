//! Scalar values and their types.

use core::fmt;
use core::hash::{Hash, Hasher};

/// Declared type of a scalar attribute or scalar slot.
///
/// # Examples
///
/// ```
/// use relgraph_types::{ScalarType, Value};
///
/// assert!(ScalarType::Integer.accepts(&Value::Integer(1)));
/// assert!(ScalarType::Integer.accepts(&Value::Null));
/// assert!(!ScalarType::Integer.accepts(&Value::from("one")));
/// assert!(ScalarType::Any.accepts(&Value::from(1.5)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScalarType {
    /// `true` / `false`
    Bool,
    /// 64-bit signed integer
    Integer,
    /// 64-bit float
    Real,
    /// UTF-8 text
    Text,
    /// Raw bytes
    Blob,
    /// Untyped, accepts every value
    #[default]
    Any,
}

impl ScalarType {
    /// Returns `true` if `value` may be stored under this type.
    ///
    /// NULL is accepted by every type; nullability is a property of the
    /// attribute, not of the scalar type.
    #[must_use]
    pub const fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ScalarType::Any, _)
                | (ScalarType::Bool, Value::Bool(_))
                | (ScalarType::Integer, Value::Integer(_))
                | (ScalarType::Real, Value::Real(_))
                | (ScalarType::Text, Value::Text(_))
                | (ScalarType::Blob, Value::Blob(_))
        )
    }

    /// JSON Schema `type` of the serialized form; `None` for [`ScalarType::Any`].
    ///
    /// Blobs serialize as arrays of bytes.
    #[must_use]
    pub const fn json_type(&self) -> Option<&'static str> {
        match self {
            ScalarType::Bool => Some("boolean"),
            ScalarType::Integer => Some("integer"),
            ScalarType::Real => Some("number"),
            ScalarType::Text => Some("string"),
            ScalarType::Blob => Some("array"),
            ScalarType::Any => None,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Integer => "integer",
            ScalarType::Real => "real",
            ScalarType::Text => "text",
            ScalarType::Blob => "blob",
            ScalarType::Any => "any",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owned scalar value read from a result row.
///
/// Equality and hashing are total: reals compare by bit pattern, so `NaN`
/// equals itself and `0.0` differs from `-0.0`. This lets values take part in
/// identity keys.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Integer(i64),
    /// Real value (f64)
    Real(f64),
    /// Text value (owned string)
    Text(String),
    /// Blob value (owned binary data)
    Blob(Box<[u8]>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The narrowest scalar type describing this value (`Any` for NULL).
    #[must_use]
    pub const fn scalar_type(&self) -> ScalarType {
        match self {
            Value::Null => ScalarType::Any,
            Value::Bool(_) => ScalarType::Bool,
            Value::Integer(_) => ScalarType::Integer,
            Value::Real(_) => ScalarType::Real,
            Value::Text(_) => ScalarType::Text,
            Value::Blob(_) => ScalarType::Blob,
        }
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the real payload, widening integers.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the blob payload, if any.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Real(r) => r.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Blob(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

//------------------------------------------------------------------------------
// Conversions
//------------------------------------------------------------------------------

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    #[inline]
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    #[inline]
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v.into_boxed_slice())
    }
}

impl From<&[u8]> for Value {
    #[inline]
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_real_equality_is_bitwise() {
        assert_eq!(Value::Real(f64::NAN), Value::Real(f64::NAN));
        assert_ne!(Value::Real(0.0), Value::Real(-0.0));
        assert_ne!(Value::Real(1.0), Value::Integer(1));
    }

    #[test]
    fn test_values_hash_consistently() {
        let mut set = HashSet::new();
        set.insert(Value::from("a"));
        set.insert(Value::from("a"));
        set.insert(Value::from(1));
        set.insert(Value::Null);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Integer(3));
    }

    #[test]
    fn test_scalar_type_accepts() {
        assert!(ScalarType::Text.accepts(&Value::from("x")));
        assert!(!ScalarType::Text.accepts(&Value::from(1)));
        assert!(ScalarType::Blob.accepts(&Value::from(vec![1u8, 2])));
        assert!(ScalarType::Real.accepts(&Value::Null));
        assert_eq!(Value::from(2.5).scalar_type(), ScalarType::Real);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(ScalarType::Integer.to_string(), "integer");
    }
}
