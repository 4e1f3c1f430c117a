//! Hash commands, including per-field expiration.

use resp_proto::{Token, Value};

use super::{key_variadic, passthrough};
use crate::arg::{Arg, Args, Options};
use crate::builder::{self, Modifier, Modifiers, counted_block, one_of};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::options::{ExpireCondition, Render, TtlMode, render_ttl};
use crate::prefix::KeySpec;
use crate::reply::{boolean, float, identity, map, to_map, to_vec};
use crate::response::Response;

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("HSET", hset, identity).keys(KeySpec::First),
    CommandSpec::new("HMSET", hset, identity).keys(KeySpec::First),
    CommandSpec::new("HSETNX", passthrough, boolean).keys(KeySpec::First),
    CommandSpec::new("HGET", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("HMGET", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("HGETALL", passthrough, map).keys(KeySpec::First),
    CommandSpec::new("HDEL", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("HEXISTS", passthrough, boolean).keys(KeySpec::First),
    CommandSpec::new("HLEN", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("HKEYS", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("HVALS", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("HSTRLEN", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("HINCRBY", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("HINCRBYFLOAT", passthrough, float).keys(KeySpec::First),
    CommandSpec::new("HRANDFIELD", hrandfield, parse_hrandfield).keys(KeySpec::First),
    CommandSpec::new("HSCAN", hscan, parse_hscan).keys(KeySpec::First),
    CommandSpec::new("HEXPIRE", hexpire, identity).keys(KeySpec::First),
    CommandSpec::new("HPEXPIRE", hexpire, identity).keys(KeySpec::First),
    CommandSpec::new("HEXPIREAT", hexpire, identity).keys(KeySpec::First),
    CommandSpec::new("HPEXPIREAT", hexpire, identity).keys(KeySpec::First),
    CommandSpec::new("HTTL", key_fields, identity).keys(KeySpec::First),
    CommandSpec::new("HPTTL", key_fields, identity).keys(KeySpec::First),
    CommandSpec::new("HEXPIRETIME", key_fields, identity).keys(KeySpec::First),
    CommandSpec::new("HPEXPIRETIME", key_fields, identity).keys(KeySpec::First),
    CommandSpec::new("HPERSIST", key_fields, identity).keys(KeySpec::First),
    CommandSpec::new("HGETDEL", key_fields, identity).keys(KeySpec::First),
    CommandSpec::new("HGETEX", hgetex, identity).keys(KeySpec::First),
    CommandSpec::new("HSETEX", hsetex, boolean).keys(KeySpec::First),
    CommandSpec::new("HGETF", hgetf, identity).keys(KeySpec::First),
    CommandSpec::new("HSETF", hsetf, identity).keys(KeySpec::First),
];

// ── Field helpers ───────────────────────────────────────────────────────

/// Field/value pairs from the remaining arguments: a single map or list, or
/// alternating variadic fields and values.
fn field_values(args: &mut Args<'_>) -> Result<Vec<(Token, Token)>, Error> {
    let command = args.command();
    let pairs = match args.take_rest() {
        [] => Vec::new(),
        [single] => builder::pairs(command, "fields", single)?,
        many => builder::pairs(command, "fields", &Arg::List(many.to_vec()))?,
    };
    if pairs.is_empty() {
        return Err(Error::invalid(command, "expects at least one field/value pair"));
    }
    Ok(pairs)
}

/// A field list argument that has already been read from the cursor.
fn field_list(command: &str, fields: Option<&Arg>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    if let Some(fields) = fields {
        builder::flatten(fields, &mut out);
    }
    if out.is_empty() {
        return Err(Error::invalid(command, "missing argument `fields`"));
    }
    Ok(out)
}

/// `FIELDS n f v ..` or `FVS n f v ..`: the count is the number of fields.
fn field_value_block(out: &mut Vec<Token>, literal: &'static str, pairs: Vec<(Token, Token)>) {
    out.push(Token::from_static(literal));
    out.push(Token::Int(pairs.len() as i64));
    for (field, value) in pairs {
        out.push(field);
        out.push(value);
    }
}

// ── Filters ─────────────────────────────────────────────────────────────

fn hset(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    for (field, value) in field_values(args)? {
        out.push(field);
        out.push(value);
    }
    Ok(out)
}

fn hrandfield(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    let count = args.opt_int("count")?;
    let with_values = args.flag("WITHVALUES")?;
    args.finish()?;
    match (count, with_values) {
        (Some(count), _) => out.push(Token::Int(count)),
        (None, true) => out.push(Token::Int(1)),
        (None, false) => {}
    }
    if with_values {
        out.push(Token::from_static("WITHVALUES"));
        args.mark("WITHVALUES");
    }
    Ok(out)
}

static HSCAN_MODIFIERS: &[Modifier] = &[
    Modifier::value("MATCH"),
    Modifier::value("COUNT"),
    Modifier::flag("NOVALUES"),
];

fn hscan(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("cursor")?];
    let modifiers = Modifiers::collect(HSCAN_MODIFIERS, args)?;
    modifiers.mark(args, &["NOVALUES"]);
    modifiers.render(&mut out);
    Ok(out)
}

/// `key ttl [NX|XX|GT|LT] FIELDS n field ..`. The condition is validated
/// before the field list so a bad literal is reported first.
fn hexpire(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?, args.token("ttl")?];
    let fields = args.next_arg();
    let condition = ExpireCondition::from_opt_arg(command, args.next_arg())?;
    args.finish()?;
    let fields = field_list(command, fields)?;
    if let Some(condition) = condition {
        condition.render(&mut out);
    }
    counted_block(&mut out, "FIELDS", fields);
    Ok(out)
}

fn key_fields(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let fields = match args.take_rest() {
        [single] => field_list(command, Some(single))?,
        many => field_list(command, Some(&Arg::List(many.to_vec())))?,
    };
    counted_block(&mut out, "FIELDS", fields);
    Ok(out)
}

/// `key [EX|PX|EXAT|PXAT ttl | PERSIST] FIELDS n field ..`.
fn hgetex(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let fields = field_list(command, args.next_arg())?;
    let mode = args.next_arg();
    let value = args.next_arg();
    args.finish()?;
    render_ttl(command, mode, value, TtlMode::GETEX, &mut out)?;
    counted_block(&mut out, "FIELDS", fields);
    Ok(out)
}

/// `key [FNX|FXX] [EX|PX|EXAT|PXAT ttl | KEEPTTL] FIELDS n field value ..`.
fn hsetex(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let pairs = builder::pairs(command, "fields", args.required("fields")?)?;
    if pairs.is_empty() {
        return Err(Error::invalid(command, "expects at least one field/value pair"));
    }
    if let Some(condition) = args.opt_keyword("condition", &["FNX", "FXX"])? {
        out.push(condition);
    }
    let mode = args.next_arg();
    let value = args.next_arg();
    args.finish()?;
    render_ttl(command, mode, value, TtlMode::SETEX, &mut out)?;
    field_value_block(&mut out, "FIELDS", pairs);
    Ok(out)
}

const HGETF_OPTIONS: &[&str] = &["condition", "ttl", "value", "persist"];
const HSETF_OPTIONS: &[&str] = &["dc", "dcf", "dof", "get", "condition", "ttl", "value", "keepttl"];

/// Shared `[NX|XX|GT|LT] [mode ttl]` rendering of the HGETF/HSETF options map.
fn render_field_ttl(
    command: &str,
    options: &Options<'_>,
    accepted: &[TtlMode],
    out: &mut Vec<Token>,
) -> Result<(), Error> {
    if let Some(condition) = ExpireCondition::from_opt_arg(command, options.get("condition"))? {
        condition.render(out);
    }
    let flag_mode = [TtlMode::Persist, TtlMode::KeepTtl]
        .into_iter()
        .filter(|m| accepted.contains(m))
        .find(|m| options.flag(&m.as_str().to_ascii_lowercase()))
        .map(Arg::from);
    let mode = options.get("ttl").or(flag_mode.as_ref());
    render_ttl(command, mode, options.get("value"), accepted, out)
}

/// `key [NX|XX|GT|LT] [EX|PX|EXAT|PXAT ttl | PERSIST] FIELDS n field ..`.
fn hgetf(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let fields = field_list(command, args.next_arg())?;
    let options = args.options()?;
    args.finish()?;
    options.check(HGETF_OPTIONS)?;
    render_field_ttl(command, &options, TtlMode::GETEX, &mut out)?;
    counted_block(&mut out, "FIELDS", fields);
    Ok(out)
}

/// `key [DC] [DCF|DOF] [GETNEW|GETOLD] [NX|XX|GT|LT] [mode ttl | KEEPTTL]
/// FVS n field value ..`.
fn hsetf(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let pairs = builder::pairs(command, "fields", args.required("fields")?)?;
    if pairs.is_empty() {
        return Err(Error::invalid(command, "expects at least one field/value pair"));
    }
    let options = args.options()?;
    args.finish()?;
    options.check(HSETF_OPTIONS)?;
    if options.flag("dc") {
        out.push(Token::from_static("DC"));
    }
    match (options.flag("dcf"), options.flag("dof")) {
        (true, true) => return Err(Error::invalid(command, "DCF and DOF are mutually exclusive")),
        (true, false) => out.push(Token::from_static("DCF")),
        (false, true) => out.push(Token::from_static("DOF")),
        (false, false) => {}
    }
    if let Some(get) = options.get("get") {
        out.push(one_of(command, "get", get, &["GETNEW", "GETOLD"])?);
    }
    render_field_ttl(command, &options, TtlMode::SETEX, &mut out)?;
    field_value_block(&mut out, "FVS", pairs);
    Ok(out)
}

// ── Parsers ─────────────────────────────────────────────────────────────

fn parse_hrandfield(command: &Command, reply: Value) -> Result<Response, Error> {
    if command.has_flag("WITHVALUES") {
        to_map(reply)
    } else {
        Ok(Response::from(reply))
    }
}

/// `[cursor, [field, value, ..]]` as `[cursor, {field: value}]`.
fn parse_hscan(command: &Command, reply: Value) -> Result<Response, Error> {
    let mut items = to_vec(reply)?.into_iter();
    let (Some(cursor), Some(entries), None) = (items.next(), items.next(), items.next()) else {
        return Err(Error::UnexpectedResponse("expected a [cursor, entries] pair"));
    };
    let entries = if command.has_flag("NOVALUES") {
        Response::from(entries)
    } else {
        to_map(entries)?
    };
    Ok(Response::List(vec![Response::from(cursor), entries]))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::{args, opts, tokens, Response};
    use resp_proto::Value;

    #[test]
    fn test_hset_styles_agree() {
        let mapped = build("HSET", args!["h", opts! { "f1" => "v1", "f2" => 2 }]).unwrap();
        assert_eq!(mapped, tokens!["h", "f1", "v1", "f2", 2]);
        assert_eq!(mapped, build("HSET", args!["h", "f1", "v1", "f2", 2]).unwrap());
        assert!(build("HSET", args!["h", "f1"]).is_err());
        assert!(build("HSET", args!["h"]).is_err());
    }

    #[test]
    fn test_hgetall_resp2_resp3() {
        let expected = Response::map([("f1", "v1"), ("f2", "v2")]);
        assert_eq!(parse("HGETALL", args!["h"], bulks(&["f1", "v1", "f2", "v2"])), expected);
        let resp3 = Value::map(vec![(b("f1"), b("v1")), (b("f2"), b("v2"))]);
        assert_eq!(parse3("HGETALL", args!["h"], resp3), expected);
        assert_eq!(parse("HGETALL", args!["h"], arr(vec![])), Response::Map(vec![]));
    }

    #[test]
    fn test_hincrbyfloat() {
        assert_eq!(parse("HINCRBYFLOAT", args!["h", "f", 0.5], b("10.5")), Response::Float(10.5));
    }

    #[test]
    fn test_hrandfield() {
        assert_eq!(build("HRANDFIELD", args!["h"]).unwrap(), tokens!["h"]);
        assert_eq!(
            build("HRANDFIELD", args!["h", None::<i64>, true]).unwrap(),
            tokens!["h", 1, "WITHVALUES"]
        );
        let reply = bulks(&["f", "v"]);
        assert_eq!(
            parse("HRANDFIELD", args!["h", 1, true], reply),
            Response::map([("f", "v")])
        );
    }

    #[test]
    fn test_hscan() {
        assert_eq!(
            build("HSCAN", args!["h", 0, opts! { "match" => "f*", "count" => 10 }]).unwrap(),
            tokens!["h", 0, "MATCH", "f*", "COUNT", 10]
        );
        assert_eq!(prefixed("HSCAN", args!["h", 0, "MATCH", "f*"]), tokens!["p:h", 0, "MATCH", "f*"]);
        let reply = arr(vec![b("0"), bulks(&["f", "v"])]);
        assert_eq!(
            parse("HSCAN", args!["h", 0], reply),
            Response::list([Response::from("0"), Response::map([("f", "v")])])
        );
    }

    #[test]
    fn test_hexpire() {
        assert_eq!(
            build("HEXPIRE", args!["key", 1000, ["f1", "f2"], "nx"]).unwrap(),
            tokens!["key", 1000, "NX", "FIELDS", 2, "f1", "f2"]
        );
        assert_eq!(
            build("HPEXPIRE", args!["key", 1000, "f1"]).unwrap(),
            tokens!["key", 1000, "FIELDS", 1, "f1"]
        );
    }

    #[test]
    fn test_hexpire_reports_flag_before_fields() {
        let err = build_err("HEXPIRE", args!["key", 1000, None::<&str>, "wrong"]);
        assert!(err.contains("Unsupported flag value"));
        let err = build_err("HEXPIRE", args!["key", 1000, None::<&str>]);
        assert!(err.contains("missing argument `fields`"));
    }

    #[test]
    fn test_httl_family() {
        assert_eq!(
            build("HTTL", args!["key", ["a", "b"]]).unwrap(),
            tokens!["key", "FIELDS", 2, "a", "b"]
        );
        assert_eq!(
            build("HPERSIST", args!["key", "a", "b"]).unwrap(),
            tokens!["key", "FIELDS", 2, "a", "b"]
        );
        assert_eq!(prefixed("HGETDEL", args!["key", ["a"]]), tokens!["p:key", "FIELDS", 1, "a"]);
    }

    #[test]
    fn test_hgetex() {
        assert_eq!(
            build("HGETEX", args!["key", ["a", "b"], "EX", 60]).unwrap(),
            tokens!["key", "EX", 60, "FIELDS", 2, "a", "b"]
        );
        assert_eq!(
            build("HGETEX", args!["key", ["a"], "persist"]).unwrap(),
            tokens!["key", "PERSIST", "FIELDS", 1, "a"]
        );
        assert!(build_err("HGETEX", args!["key", ["a"], "KEEPTTL"]).contains("Accepted values"));
    }

    #[test]
    fn test_hsetex() {
        let fields = opts! { "a" => 1, "b" => 2 };
        assert_eq!(
            build("HSETEX", args!["key", fields.clone(), "FNX", "PX", 500]).unwrap(),
            tokens!["key", "FNX", "PX", 500, "FIELDS", 2, "a", 1, "b", 2]
        );
        assert_eq!(
            build("HSETEX", args!["key", fields.clone(), None::<&str>, "keepttl"]).unwrap(),
            tokens!["key", "KEEPTTL", "FIELDS", 2, "a", 1, "b", 2]
        );
        let err = build_err("HSETEX", args!["key", fields.clone(), None::<&str>, None::<&str>, 10]);
        assert!(err.contains("TTL value requires a TTL resolution flag"));
        let err = build_err("HSETEX", args!["key", fields, "FNX", "EX"]);
        assert!(err.contains("EX requires a TTL value"));
    }

    #[test]
    fn test_hgetf() {
        let call = args!["key", ["a", "b"], opts! { "condition" => "GT", "ttl" => "EX", "value" => 10 }];
        assert_eq!(
            build("HGETF", call).unwrap(),
            tokens!["key", "GT", "EX", 10, "FIELDS", 2, "a", "b"]
        );
        assert_eq!(
            build("HGETF", args!["key", ["a"], opts! { "persist" => true }]).unwrap(),
            tokens!["key", "PERSIST", "FIELDS", 1, "a"]
        );
    }

    #[test]
    fn test_hsetf() {
        let call = args![
            "key",
            opts! { "a" => 1 },
            opts! { "dc" => true, "dof" => true, "get" => "getnew", "ttl" => "PX", "value" => 100 }
        ];
        assert_eq!(
            build("HSETF", call).unwrap(),
            tokens!["key", "DC", "DOF", "GETNEW", "PX", 100, "FVS", 1, "a", 1]
        );
        let err = build_err("HSETF", args!["key", opts! { "a" => 1 }, opts! { "dcf" => true, "dof" => true }]);
        assert!(err.contains("mutually exclusive"));
        let err = build_err("HSETF", args!["key", opts! { "a" => 1 }, opts! { "value" => 10 }]);
        assert!(err.contains("TTL value requires a TTL resolution flag"));
    }

    #[test]
    fn test_fields_named_like_flags_keep_default_shape() {
        assert_eq!(
            parse("HRANDFIELD", args!["withvalues"], b("f")),
            Response::from("f")
        );
        let reply = arr(vec![b("0"), bulks(&["novalues", "v"])]);
        assert_eq!(
            parse("HSCAN", args!["novalues", 0, opts! { "match" => "novalues" }], reply),
            Response::list([Response::from("0"), Response::map([("novalues", "v")])])
        );
    }
}
