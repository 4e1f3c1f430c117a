//! The caller-facing result of a command.

use bytes::Bytes;
use resp_proto::Value;

use crate::error::ServerError;

/// A reshaped reply.
///
/// Unlike [`Value`], there is a single associative type and a single sequence
/// type, so a RESP2 flat array and a RESP3 map describing the same state
/// compare equal once parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Nil,
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Bytes),
    /// A status reply such as `OK` or `QUEUED`.
    Status(String),
    /// An error nested inside an aggregate reply (`EXEC`).
    Error(ServerError),
    List(Vec<Response>),
    /// Ordered entries; keys are unique.
    Map(Vec<(Response, Response)>),
}

impl Response {
    /// Build a map, keeping the first-seen position and the last value of
    /// duplicate keys.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Response>,
        V: Into<Response>,
    {
        let mut out = Vec::new();
        for (k, v) in entries {
            insert(&mut out, k.into(), v.into());
        }
        Response::Map(out)
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Response>,
    {
        Response::List(items.into_iter().map(Into::into).collect())
    }

    pub fn status(text: &str) -> Self {
        Response::Status(text.to_string())
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Response::Nil)
    }

    /// Returns true for the `OK` status.
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Status(s) if s == "OK")
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Response::Bytes(b) => Some(b),
            Response::Status(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Response::Status(s) => Some(s),
            Response::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Response::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Response::Float(f) => Some(*f),
            Response::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Response::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Response]> {
        match self {
            Response::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Response, Response)]> {
        match self {
            Response::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Response>> {
        match self {
            Response::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<Vec<(Response, Response)>> {
        match self {
            Response::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Response::Bytes(b) => Some(b),
            Response::Status(s) => Some(Bytes::from(s)),
            _ => None,
        }
    }

    /// Look up a map entry whose key is the string `key`.
    pub fn get(&self, key: &str) -> Option<&Response> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_bytes() == Some(key.as_bytes()))
            .map(|(_, v)| v)
    }
}

/// Insert into an ordered map, replacing the value of an existing key in place.
pub(crate) fn insert(entries: &mut Vec<(Response, Response)>, key: Response, value: Response) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

impl From<Value> for Response {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Response::Nil,
            Value::Integer(n) => Response::Int(n),
            Value::Double(f) => Response::Float(f),
            Value::Boolean(b) => Response::Bool(b),
            Value::BulkString(b) => Response::Bytes(b),
            Value::SimpleString(s) => Response::Status(String::from_utf8_lossy(&s).into_owned()),
            Value::Error(e) => Response::Error(ServerError::from(e)),
            Value::Array(items) | Value::Set(items) => {
                Response::List(items.into_iter().map(Response::from).collect())
            }
            Value::Map(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    insert(&mut out, Response::from(k), Response::from(v));
                }
                Response::Map(out)
            }
        }
    }
}

impl From<&str> for Response {
    fn from(s: &str) -> Self {
        Response::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Response {
    fn from(s: String) -> Self {
        Response::Bytes(Bytes::from(s))
    }
}

impl From<Bytes> for Response {
    fn from(b: Bytes) -> Self {
        Response::Bytes(b)
    }
}

impl From<i64> for Response {
    fn from(n: i64) -> Self {
        Response::Int(n)
    }
}

impl From<i32> for Response {
    fn from(n: i32) -> Self {
        Response::Int(n as i64)
    }
}

impl From<f64> for Response {
    fn from(f: f64) -> Self {
        Response::Float(f)
    }
}

impl From<bool> for Response {
    fn from(b: bool) -> Self {
        Response::Bool(b)
    }
}

impl<T: Into<Response>> From<Vec<T>> for Response {
    fn from(items: Vec<T>) -> Self {
        Response::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Response>> From<Option<T>> for Response {
    fn from(value: Option<T>) -> Self {
        value.map_or(Response::Nil, Into::into)
    }
}
