//! Parameter types, bound values, and typed extraction.
//!
//! [`ParamType`] is the declared type of an action parameter as recorded in a
//! method descriptor. [`Value`] is what a binder produces for it, and
//! [`FromValue`] turns a `Value` back into the Rust type the action takes.
//!
//! # Example
//!
//! ```
//! use actionwire::binding::{FromValue, ParamType, Value};
//!
//! assert_eq!(<Vec<String>>::param_type(), ParamType::Seq(Box::new(ParamType::String)));
//!
//! let n = i32::from_value(Value::Int(3)).unwrap();
//! assert_eq!(n, 3);
//! ```

use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::connection::ConnectionHandle;
use crate::error::{ActionError, Result};

/// Declared type of an action parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// UTF-8 text.
    String,
    /// Signed integer `bits` wide.
    Int {
        /// Width of the action's parameter type.
        bits: u32,
    },
    /// Unsigned integer `bits` wide.
    Uint {
        /// Width of the action's parameter type.
        bits: u32,
    },
    /// Floating point number.
    Float,
    /// Boolean flag.
    Bool,
    /// Raw bytes.
    Bytes,
    /// Arbitrary structured data (deserialized by the action).
    Json,
    /// Homogeneous sequence.
    Seq(Box<ParamType>),
    /// Value that may be absent from the request.
    Optional(Box<ParamType>),
    /// Live connection attached to the request. Never bound from request data.
    Connection,
}

impl ParamType {
    /// Element type of a sequence, if this is one.
    pub fn element(&self) -> Option<&ParamType> {
        match self {
            ParamType::Seq(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether a signed value fits this integer type.
    ///
    /// Always false for non-integer types.
    pub fn fits_int(&self, value: i64) -> bool {
        match *self {
            ParamType::Int { bits } => {
                bits >= 64 || (value >= -(1i64 << (bits - 1)) && value < 1i64 << (bits - 1))
            }
            ParamType::Uint { .. } => value >= 0 && self.fits_uint(value as u64),
            _ => false,
        }
    }

    /// Whether an unsigned value fits this integer type.
    ///
    /// Always false for non-integer types.
    pub fn fits_uint(&self, value: u64) -> bool {
        match *self {
            ParamType::Uint { bits } => bits >= 64 || value < 1u64 << bits,
            ParamType::Int { .. } => i64::try_from(value).is_ok_and(|v| self.fits_int(v)),
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => f.write_str("string"),
            ParamType::Int { bits: 64 } => f.write_str("int"),
            ParamType::Int { bits } => write!(f, "int{}", bits),
            ParamType::Uint { bits: 64 } => f.write_str("uint"),
            ParamType::Uint { bits } => write!(f, "uint{}", bits),
            ParamType::Float => f.write_str("float"),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::Json => f.write_str("json"),
            ParamType::Seq(inner) => write!(f, "[{}]", inner),
            ParamType::Optional(inner) => write!(f, "{}?", inner),
            ParamType::Connection => f.write_str("connection"),
        }
    }
}

/// A bound argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value.
    Null,
    /// Text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Raw bytes.
    Bytes(Bytes),
    /// Structured data.
    Json(serde_json::Value),
    /// Sequence of values.
    Seq(Vec<Value>),
    /// The request's live connection, if it has one.
    Connection(Option<ConnectionHandle>),
}

impl Value {
    /// The zero value for a parameter type.
    pub fn zero(ty: &ParamType) -> Value {
        match ty {
            ParamType::String => Value::Str(String::new()),
            ParamType::Int { .. } => Value::Int(0),
            ParamType::Uint { .. } => Value::Uint(0),
            ParamType::Float => Value::Float(0.0),
            ParamType::Bool => Value::Bool(false),
            ParamType::Bytes => Value::Bytes(Bytes::new()),
            ParamType::Json => Value::Json(serde_json::Value::Null),
            ParamType::Seq(_) => Value::Seq(Vec::new()),
            ParamType::Optional(_) => Value::Null,
            ParamType::Connection => Value::Connection(None),
        }
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Str(_) => "string",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Seq(_) => "sequence",
            Value::Connection(_) => "connection",
        }
    }

    /// Convert into a JSON value tree.
    ///
    /// Bytes become an array of numbers; connections have no data
    /// representation and become `null`.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Null | Value::Connection(_) => serde_json::Value::Null,
            Value::Str(s) => serde_json::Value::String(s),
            Value::Int(i) => i.into(),
            Value::Uint(u) => u.into(),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Bytes(b) => serde_json::Value::Array(b.iter().map(|&x| x.into()).collect()),
            Value::Json(v) => v,
            Value::Seq(items) => {
                serde_json::Value::Array(items.into_iter().map(Value::into_json).collect())
            }
        }
    }
}

/// Types that can be extracted from a bound [`Value`].
///
/// `param_type` is recorded in the method descriptor at registration, so the
/// binder knows what to produce for each parameter.
pub trait FromValue: Sized {
    /// Declared type for parameters of this Rust type.
    fn param_type() -> ParamType;

    /// Extract from a bound value.
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T: FromValue>(value: &Value) -> ActionError {
    ActionError::Conversion {
        expected: T::param_type(),
        found: value.kind(),
    }
}

fn out_of_range<T: FromValue>(value: impl fmt::Display) -> ActionError {
    ActionError::OutOfRange {
        expected: T::param_type(),
        value: value.to_string(),
    }
}

impl FromValue for String {
    fn param_type() -> ParamType {
        ParamType::String
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            Value::Json(serde_json::Value::String(s)) => Ok(s),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

macro_rules! impl_from_value_signed {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn param_type() -> ParamType {
                    ParamType::Int { bits: <$t>::BITS }
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Int(i) => <$t>::try_from(i).map_err(|_| out_of_range::<Self>(i)),
                        Value::Uint(u) => <$t>::try_from(u).map_err(|_| out_of_range::<Self>(u)),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

macro_rules! impl_from_value_unsigned {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn param_type() -> ParamType {
                    ParamType::Uint { bits: <$t>::BITS }
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Uint(u) => <$t>::try_from(u).map_err(|_| out_of_range::<Self>(u)),
                        Value::Int(i) => <$t>::try_from(i).map_err(|_| out_of_range::<Self>(i)),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

impl_from_value_signed!(i64, i32, i16, i8);
impl_from_value_unsigned!(u64, u32, u16, u8, usize);

impl FromValue for f64 {
    fn param_type() -> ParamType {
        ParamType::Float
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::Uint(u) => Ok(u as f64),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for f32 {
    fn param_type() -> ParamType {
        ParamType::Float
    }

    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for bool {
    fn param_type() -> ParamType {
        ParamType::Bool
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for Bytes {
    fn param_type() -> ParamType {
        ParamType::Bytes
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Str(s) => Ok(Bytes::from(s)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn param_type() -> ParamType {
        ParamType::Json
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Connection(_) => Err(mismatch::<Self>(&value)),
            other => Ok(other.into_json()),
        }
    }
}

/// Structured parameter deserialized from bound JSON data.
///
/// Data that does not match `T` is a binding error: the request, not the
/// route, is at fault.
///
/// ```
/// use actionwire::binding::{FromValue, Json, Value};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Point { x: i32, y: i32 }
///
/// let Json(p) = Json::<Point>::from_value(Value::Json(serde_json::json!({"x": 1, "y": 2}))).unwrap();
/// assert_eq!((p.x, p.y), (1, 2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn param_type() -> ParamType {
        ParamType::Json
    }

    fn from_value(value: Value) -> Result<Self> {
        let json = <serde_json::Value as FromValue>::from_value(value)?;
        serde_json::from_value(json)
            .map(Json)
            .map_err(|e| ActionError::binding("", &ParamType::Json, e.to_string()))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn param_type() -> ParamType {
        ParamType::Seq(Box::new(T::param_type()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn param_type() -> ParamType {
        ParamType::Optional(Box::new(T::param_type()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Action parameter receiving the request's live connection.
///
/// Holds `None` when the request did not establish one.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveConnection(pub Option<ConnectionHandle>);

impl LiveConnection {
    /// The attached handle, if any.
    pub fn handle(&self) -> Option<&ConnectionHandle> {
        self.0.as_ref()
    }

    /// Unwrap the inner handle.
    pub fn into_inner(self) -> Option<ConnectionHandle> {
        self.0
    }
}

impl FromValue for LiveConnection {
    fn param_type() -> ParamType {
        ParamType::Connection
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Connection(handle) => Ok(LiveConnection(handle)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}
