//! RESP reply values.
//!
//! A [`Value`] is the decoded, protocol-agnostic tree a transport hands back after
//! reading one reply. RESP2 servers only ever produce a subset of the variants:
//! - Simple String: `+OK\r\n`
//! - Error: `-ERR message\r\n`
//! - Integer: `:1000\r\n`
//! - Bulk String: `$6\r\nfoobar\r\n`
//! - Null: `$-1\r\n` or `*-1\r\n`
//! - Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
//!
//! RESP3 servers may additionally produce:
//! - Null: `_\r\n`
//! - Boolean: `#t\r\n` or `#f\r\n`
//! - Double: `,3.14159\r\n`
//! - Map: `%<len>\r\n<key><val>...`
//! - Set: `~<len>\r\n<elem>...`
//!
//! Simple strings and bulk strings stay distinct: some commands reply `+OK` on
//! success and a bulk payload otherwise, and their parsers rely on telling them apart.

use bytes::Bytes;

/// The reply protocol negotiated on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// RESP2: maps arrive as flat arrays, doubles as bulk strings, booleans as integers.
    #[default]
    Resp2,
    /// RESP3: native map, set, double and boolean types.
    Resp3,
}

impl Protocol {
    /// The numeric protocol version as sent in `HELLO`.
    #[inline]
    pub fn version(self) -> u8 {
        match self {
            Protocol::Resp2 => 2,
            Protocol::Resp3 => 3,
        }
    }

    /// Resolve a protocol version number, e.g. the `proto` field of a `HELLO` reply.
    #[inline]
    pub fn from_version(version: i64) -> Option<Self> {
        match version {
            2 => Some(Protocol::Resp2),
            3 => Some(Protocol::Resp3),
            _ => None,
        }
    }
}

/// A RESP reply value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    /// RESP2: `$-1\r\n` or `*-1\r\n`
    /// RESP3: `_\r\n`
    Null,
    /// Integer: `:1000\r\n`
    Integer(i64),
    /// Double-precision floating point: `,3.14159\r\n`
    Double(f64),
    /// Boolean: `#t\r\n` or `#f\r\n`
    Boolean(bool),
    /// Bulk string: `$6\r\nfoobar\r\n`
    BulkString(Bytes),
    /// Simple string (status): `+OK\r\n`
    SimpleString(Bytes),
    /// Error: `-ERR message\r\n`. Holds the full text, error code first.
    Error(Bytes),
    /// Array: `*2\r\n...`
    Array(Vec<Value>),
    /// Map: `%<len>\r\n<key><val>...`
    Map(Vec<(Value, Value)>),
    /// Set: `~<len>\r\n<elem>...`
    Set(Vec<Value>),
}

impl Value {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create an error value.
    #[inline]
    pub fn error(msg: &[u8]) -> Self {
        Value::Error(Bytes::copy_from_slice(msg))
    }

    /// Create an integer value.
    #[inline]
    pub fn integer(n: i64) -> Self {
        Value::Integer(n)
    }

    /// Create a bulk string value.
    #[inline]
    pub fn bulk_string(data: &[u8]) -> Self {
        Value::BulkString(Bytes::copy_from_slice(data))
    }

    /// Create an array value.
    #[inline]
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(elements)
    }

    /// Create a boolean value.
    #[inline]
    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    /// Create a double value.
    #[inline]
    pub fn double(d: f64) -> Self {
        Value::Double(d)
    }

    /// Create a map value.
    #[inline]
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(entries)
    }

    /// Create a set value.
    #[inline]
    pub fn set(elements: Vec<Value>) -> Self {
        Value::Set(elements)
    }

    /// The `+OK` status reply.
    #[inline]
    pub fn ok() -> Self {
        Value::SimpleString(Bytes::from_static(b"OK"))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns true if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the value as bytes if it's a string type (simple, bulk or error).
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::SimpleString(s) | Value::BulkString(s) | Value::Error(s) => Some(s),
            _ => None,
        }
    }

    /// Consume the value, returning the elements of an array or set.
    #[inline]
    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Consume the value, returning the bytes of a simple or bulk string.
    #[inline]
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Value::SimpleString(s) | Value::BulkString(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::BulkString(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::BulkString(data)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
