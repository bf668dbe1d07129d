//! Value representations on both sides of the codec.
//!
//! `AvroValue` is the generic Avro in-memory form: records indexed by field
//! position, unions and enums tagged with their member index, fixed byte
//! arrays. It is fully resolved, so the binary encoder needs no schema.
//!
//! `HostValue` is the host-side dynamic value the extractors consume and the
//! readers produce. It carries host shapes the generic form does not:
//! options, container flavors, UUIDs, newtype wrappers, and records tagged
//! with their fully-qualified type name.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use uuid::Uuid;

/// Represents a decoded Avro value in the generic in-memory form.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Record with named fields in schema order
    Record(Vec<(String, AvroValue)>),
    /// Enum variant (index and symbol name)
    Enum(i32, String),
    /// Array of values
    Array(Vec<AvroValue>),
    /// Map with string keys
    Map(Vec<(String, AvroValue)>),
    /// Union variant (member index and value)
    Union(i32, Box<AvroValue>),
    /// Fixed-size byte array
    Fixed(Vec<u8>),
}

impl AvroValue {
    /// Render the value in the Avro JSON default encoding.
    ///
    /// Bytes and fixed values are encoded as ISO-8859-1 strings, enums as
    /// their symbol, unions as the JSON of their inner value (a union
    /// default always belongs to the first member, which carries no index
    /// in JSON).
    pub fn to_default_json(&self) -> Value {
        match self {
            AvroValue::Null => Value::Null,
            AvroValue::Boolean(b) => Value::Bool(*b),
            AvroValue::Int(i) => Value::Number((*i).into()),
            AvroValue::Long(l) => Value::Number((*l).into()),
            AvroValue::Float(f) => serde_json::Number::from_f64(*f as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AvroValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AvroValue::Bytes(b) | AvroValue::Fixed(b) => {
                Value::String(b.iter().map(|&byte| byte as char).collect())
            }
            AvroValue::String(s) => Value::String(s.clone()),
            AvroValue::Record(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_default_json());
                }
                Value::Object(map)
            }
            AvroValue::Enum(_, symbol) => Value::String(symbol.clone()),
            AvroValue::Array(items) => {
                Value::Array(items.iter().map(|v| v.to_default_json()).collect())
            }
            AvroValue::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_default_json());
                }
                Value::Object(map)
            }
            AvroValue::Union(_, value) => value.to_default_json(),
        }
    }

    /// A short tag naming the value's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AvroValue::Null => "null",
            AvroValue::Boolean(_) => "boolean",
            AvroValue::Int(_) => "int",
            AvroValue::Long(_) => "long",
            AvroValue::Float(_) => "float",
            AvroValue::Double(_) => "double",
            AvroValue::Bytes(_) => "bytes",
            AvroValue::String(_) => "string",
            AvroValue::Record(_) => "record",
            AvroValue::Enum(_, _) => "enum",
            AvroValue::Array(_) => "array",
            AvroValue::Map(_) => "map",
            AvroValue::Union(_, _) => "union",
            AvroValue::Fixed(_) => "fixed",
        }
    }
}

/// A host-side value, dispatched on by the extractors and produced by the
/// readers.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Null (unit) value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    Str(String),
    /// Byte array
    Bytes(Vec<u8>),
    /// UUID
    Uuid(Uuid),
    /// Optional value
    Optional(Option<Box<HostValue>>),
    /// List-shaped sequence
    List(Vec<HostValue>),
    /// Set-shaped sequence (unique elements, insertion order)
    Set(Vec<HostValue>),
    /// Deque-shaped sequence
    Deque(Vec<HostValue>),
    /// Map with string keys; ordered so equal values encode identically
    Map(BTreeMap<String, HostValue>),
    /// Enum value identified by its symbol
    Enum {
        /// The symbol name
        symbol: String,
    },
    /// Record instance with positional fields
    Record {
        /// Fully-qualified host type name
        fqn: String,
        /// Field values in declaration order
        fields: Vec<HostValue>,
    },
    /// Newtype wrapper around a primitive
    Newtype {
        /// Fully-qualified host type name
        fqn: String,
        /// The wrapped value
        value: Box<HostValue>,
    },
}

impl HostValue {
    /// Convenience constructor for `Optional(Some(..))`.
    pub fn some(value: HostValue) -> Self {
        HostValue::Optional(Some(Box::new(value)))
    }

    /// Convenience constructor for `Optional(None)`.
    pub fn none() -> Self {
        HostValue::Optional(None)
    }

    /// A short tag naming the value's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Boolean(_) => "boolean",
            HostValue::Int(_) => "int",
            HostValue::Long(_) => "long",
            HostValue::Float(_) => "float",
            HostValue::Double(_) => "double",
            HostValue::Str(_) => "string",
            HostValue::Bytes(_) => "bytes",
            HostValue::Uuid(_) => "uuid",
            HostValue::Optional(_) => "optional",
            HostValue::List(_) => "list",
            HostValue::Set(_) => "set",
            HostValue::Deque(_) => "deque",
            HostValue::Map(_) => "map",
            HostValue::Enum { .. } => "enum",
            HostValue::Record { .. } => "record",
            HostValue::Newtype { .. } => "newtype",
        }
    }
}

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        HostValue::Boolean(v)
    }
}

impl From<i32> for HostValue {
    fn from(v: i32) -> Self {
        HostValue::Int(v)
    }
}

impl From<i64> for HostValue {
    fn from(v: i64) -> Self {
        HostValue::Long(v)
    }
}

impl From<f32> for HostValue {
    fn from(v: f32) -> Self {
        HostValue::Float(v)
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        HostValue::Double(v)
    }
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        HostValue::Str(v.to_string())
    }
}

impl From<String> for HostValue {
    fn from(v: String) -> Self {
        HostValue::Str(v)
    }
}

impl From<Uuid> for HostValue {
    fn from(v: Uuid) -> Self {
        HostValue::Uuid(v)
    }
}
