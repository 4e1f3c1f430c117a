//! Reply reshaping shared by command parsers.
//!
//! The public functions have the [`Parser`](crate::command::Parser) signature
//! and can be used directly in definitions. The `to_*` helpers work on bare
//! values and are combined by command-specific parsers. All of them accept
//! both the RESP2 and the RESP3 encoding of a reply.

use resp_proto::Value;

use crate::command::Command;
use crate::error::Error;
use crate::response::{Response, insert};

// ── Parsers ─────────────────────────────────────────────────────────────

/// Convert the reply without reshaping.
pub fn identity(_: &Command, reply: Value) -> Result<Response, Error> {
    Ok(Response::from(reply))
}

/// Integer `1`/`0`, a RESP3 boolean, or `OK` as a boolean.
pub fn boolean(_: &Command, reply: Value) -> Result<Response, Error> {
    to_bool(reply)
}

/// An array of integers as booleans.
pub fn booleans(_: &Command, reply: Value) -> Result<Response, Error> {
    to_list_with(reply, to_bool)
}

/// A numeric string or double as a float. Nil stays nil.
pub fn float(_: &Command, reply: Value) -> Result<Response, Error> {
    to_float(reply)
}

/// An array of floats or nils.
pub fn floats(_: &Command, reply: Value) -> Result<Response, Error> {
    to_list_with(reply, to_float)
}

/// An array of numeric strings as integers.
pub fn integers(_: &Command, reply: Value) -> Result<Response, Error> {
    to_list_with(reply, to_int)
}

/// A flat field/value array or a map, as a map.
pub fn map(_: &Command, reply: Value) -> Result<Response, Error> {
    to_map(reply)
}

/// Member/score pairs as a map of floats.
pub fn scores(_: &Command, reply: Value) -> Result<Response, Error> {
    to_scores(reply)
}

/// An array of field/value arrays, as a list of maps.
pub fn maps(_: &Command, reply: Value) -> Result<Response, Error> {
    to_list_with(reply, to_map)
}

// ── Value helpers ───────────────────────────────────────────────────────

pub(crate) fn to_bool(value: Value) -> Result<Response, Error> {
    match value {
        Value::Integer(n) => Ok(Response::Bool(n != 0)),
        Value::Boolean(b) => Ok(Response::Bool(b)),
        Value::SimpleString(s) => Ok(Response::Bool(&s[..] == b"OK")),
        Value::Null => Ok(Response::Nil),
        _ => Err(Error::UnexpectedResponse("expected an integer or boolean reply")),
    }
}

pub(crate) fn to_float(value: Value) -> Result<Response, Error> {
    match value {
        Value::Null => Ok(Response::Nil),
        Value::Double(f) => Ok(Response::Float(f)),
        Value::Integer(n) => Ok(Response::Float(n as f64)),
        Value::BulkString(s) | Value::SimpleString(s) => std::str::from_utf8(&s)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .map(Response::Float)
            .ok_or(Error::UnexpectedResponse("expected a numeric string")),
        _ => Err(Error::UnexpectedResponse("expected a numeric reply")),
    }
}

pub(crate) fn to_int(value: Value) -> Result<Response, Error> {
    match value {
        Value::Null => Ok(Response::Nil),
        Value::Integer(n) => Ok(Response::Int(n)),
        Value::Double(f) if f.fract() == 0.0 => Ok(Response::Int(f as i64)),
        Value::BulkString(s) | Value::SimpleString(s) => std::str::from_utf8(&s)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Response::Int)
            .ok_or(Error::UnexpectedResponse("expected an integer string")),
        _ => Err(Error::UnexpectedResponse("expected an integer reply")),
    }
}

/// The elements of an array or set reply.
pub(crate) fn to_vec(value: Value) -> Result<Vec<Value>, Error> {
    value
        .into_array()
        .ok_or(Error::UnexpectedResponse("expected an array reply"))
}

/// Apply `f` to every element. Nil stays nil.
pub(crate) fn to_list_with(
    value: Value,
    f: fn(Value) -> Result<Response, Error>,
) -> Result<Response, Error> {
    if value.is_null() {
        return Ok(Response::Nil);
    }
    to_vec(value)?
        .into_iter()
        .map(f)
        .collect::<Result<Vec<_>, _>>()
        .map(Response::List)
}

/// Key/value pairs from a RESP3 map, a nested `[[k, v], ..]` array, or a flat
/// `[k, v, k, v]` array.
pub(crate) fn to_pairs(value: Value) -> Result<Vec<(Value, Value)>, Error> {
    match value {
        Value::Map(entries) => Ok(entries),
        Value::Null => Ok(Vec::new()),
        Value::Array(items) | Value::Set(items) => {
            if items.first().is_some_and(|first| matches!(first, Value::Array(_))) {
                items
                    .into_iter()
                    .map(|item| {
                        let mut pair = to_vec(item)?.into_iter();
                        match (pair.next(), pair.next(), pair.next()) {
                            (Some(k), Some(v), None) => Ok((k, v)),
                            _ => Err(Error::UnexpectedResponse("expected a two-element pair")),
                        }
                    })
                    .collect()
            } else {
                flat_pairs(items)
            }
        }
        _ => Err(Error::UnexpectedResponse("expected an array or map reply")),
    }
}

/// Pair up the elements of a flat array.
pub(crate) fn flat_pairs(items: Vec<Value>) -> Result<Vec<(Value, Value)>, Error> {
    if items.len() % 2 != 0 {
        return Err(Error::UnexpectedResponse("expected an even number of elements"));
    }
    let mut out = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        out.push((k, v));
    }
    Ok(out)
}

/// Build a map, converting values with `f`. Nil stays nil.
pub(crate) fn to_map_with(
    value: Value,
    f: fn(Value) -> Result<Response, Error>,
) -> Result<Response, Error> {
    if value.is_null() {
        return Ok(Response::Nil);
    }
    let mut out = Vec::new();
    for (k, v) in to_pairs(value)? {
        insert(&mut out, Response::from(k), f(v)?);
    }
    Ok(Response::Map(out))
}

pub(crate) fn to_map(value: Value) -> Result<Response, Error> {
    to_map_with(value, |v| Ok(Response::from(v)))
}

pub(crate) fn to_scores(value: Value) -> Result<Response, Error> {
    to_map_with(value, to_float)
}

/// A converter for one named field of a structured reply.
pub(crate) type FieldParser = (&'static str, fn(Value) -> Result<Response, Error>);

/// Build a map where the listed fields are converted by their own function
/// and every other value is converted as-is. Nil stays nil.
pub(crate) fn to_map_fields(value: Value, fields: &[FieldParser]) -> Result<Response, Error> {
    if value.is_null() {
        return Ok(Response::Nil);
    }
    let mut out = Vec::new();
    for (k, v) in to_pairs(value)? {
        let convert = fields
            .iter()
            .find(|(name, _)| k.as_bytes() == Some(name.as_bytes()))
            .map(|(_, f)| *f);
        let v = match convert {
            Some(f) => f(v)?,
            None => Response::from(v),
        };
        insert(&mut out, Response::from(k), v);
    }
    Ok(Response::Map(out))
}

/// A list of maps.
pub(crate) fn to_maps(value: Value) -> Result<Response, Error> {
    to_list_with(value, to_map)
}
