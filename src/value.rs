//! Dynamically-typed source values.
//!
//! This is the shape generic document decoders hand out: scalars of every
//! width, strings, ordered sequences, and a handful of map flavours that only
//! differ in their key type. Records are converted *from* these values.
use std::fmt;
use indexmap::IndexMap;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(isize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Uint(usize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Seq(Vec<Value>),
    /// Heterogeneous keys (what YAML-ish decoders produce).
    Map(IndexMap<Key, Value>),
    StrMap(IndexMap<String, Value>),
    IntMap(IndexMap<isize, Value>),
    Int64Map(IndexMap<i64, Value>),
}

/// Key of a generic-keyed map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Bool(bool),
    Int(isize),
    I64(i64),
    U64(u64),
    Str(String),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    /// Short name of the runtime shape, used in diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "isize",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Uint(_) => "usize",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map<any, any>",
            Value::StrMap(_) => "map<string, any>",
            Value::IntMap(_) => "map<isize, any>",
            Value::Int64Map(_) => "map<i64, any>",
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(
            self,
            Value::Map(_) | Value::StrMap(_) | Value::IntMap(_) | Value::Int64Map(_)
        )
    }

    /// Build a generic-keyed map from anything that yields key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Build a string-keyed map.
    pub fn str_map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::StrMap(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn seq<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(i) => write!(f, "{i}"),
            Key::I64(i) => write!(f, "{i}"),
            Key::U64(u) => write!(f, "{u}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

// -------------------------------- From ----------------------------------- //

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(x: $ty) -> Self { Value::$variant(x) }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    isize => Int, i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    usize => Uint, u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64,
    String => Str,
    Vec<Value> => Seq,
    IndexMap<Key, Value> => Map,
    IndexMap<String, Value> => StrMap,
    IndexMap<isize, Value> => IntMap,
    IndexMap<i64, Value> => Int64Map,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_owned()) }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self { Key::Str(s.to_owned()) }
}

impl From<String> for Key {
    fn from(s: String) -> Self { Key::Str(s) }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self { Key::Bool(b) }
}

impl From<isize> for Key {
    fn from(i: isize) -> Self { Key::Int(i) }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self { Key::I64(i) }
}

impl From<u64> for Key {
    fn from(u: u64) -> Self { Key::U64(u) }
}

/// JSON objects become string-keyed maps; integral numbers prefer `i64`,
/// falling back to `u64` above `i64::MAX`.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::I64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::U64(u)
                } else {
                    Value::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(xs) => Value::Seq(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::StrMap(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
