//! `XINFO` subcommands. Replies are reshaped identically for RESP2 and RESP3.

use resp_proto::{Token, Value};

use crate::arg::Args;
use crate::command::{Command, CommandSpec};
use crate::commands::stream::to_entries;
use crate::commands::subcommand;
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::{FieldParser, identity, to_list_with, to_map_fields, to_maps};
use crate::response::Response;

pub(crate) static COMMANDS: &[CommandSpec] =
    &[CommandSpec::new("XINFO", xinfo, parse_xinfo).keys(KeySpec::Positions(&[1]))];

fn xinfo(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, &["STREAM", "GROUPS", "CONSUMERS"])?;
    let mut out = vec![sub.clone(), args.token("key")?];
    match sub.as_bytes().unwrap_or_default() {
        b"STREAM" => {
            let full = args.flag("FULL")?;
            let count = args.opt_int("count")?;
            if full {
                out.push(Token::from_static("FULL"));
            }
            match count {
                Some(count) if full => out.extend([Token::from_static("COUNT"), Token::Int(count)]),
                Some(_) => return Err(args.invalid("COUNT requires FULL")),
                None => {}
            }
        }
        b"CONSUMERS" => out.push(args.token("group")?),
        _ => {}
    }
    args.finish()?;
    Ok(out)
}

const STREAM_FIELDS: &[FieldParser] = &[
    ("first-entry", to_entry),
    ("last-entry", to_entry),
    ("entries", to_entries),
    ("groups", to_full_groups),
];

fn parse_xinfo(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("STREAM") => to_map_fields(reply, STREAM_FIELDS),
        Some("GROUPS" | "CONSUMERS") => to_maps(reply),
        _ => identity(command, reply),
    }
}

/// A single `[id, fields]` entry as `{id: fields}`.
fn to_entry(value: Value) -> Result<Response, Error> {
    if value.is_null() {
        return Ok(Response::Nil);
    }
    to_entries(Value::Array(vec![value]))
}

/// `FULL` groups: a list of maps whose consumers are maps too. The summary
/// form reports a group count instead, which passes through.
fn to_full_groups(value: Value) -> Result<Response, Error> {
    match value {
        Value::Array(_) | Value::Set(_) => to_list_with(value, to_full_group),
        other => Ok(Response::from(other)),
    }
}

fn to_full_group(value: Value) -> Result<Response, Error> {
    to_map_fields(value, &[("consumers", to_maps)])
}

#[cfg(test)]
mod tests {
    use crate::commands::test_util::*;
    use crate::{args, tokens, Response};
    use resp_proto::Value;

    fn entry(id: &str, field: &str, value: &str) -> Value {
        arr(vec![b(id), bulks(&[field, value])])
    }

    #[test]
    fn test_xinfo_build() {
        assert_eq!(
            prefixed("XINFO", args!["stream", "s", true, 10]),
            tokens!["STREAM", "p:s", "FULL", "COUNT", 10]
        );
        assert_eq!(build("XINFO", args!["STREAM", "s"]).unwrap(), tokens!["STREAM", "s"]);
        assert!(build("XINFO", args!["STREAM", "s", false, 10]).is_err());
        assert_eq!(
            prefixed("XINFO", args!["CONSUMERS", "s", "g"]),
            tokens!["CONSUMERS", "p:s", "g"]
        );
    }

    #[test]
    fn test_xinfo_stream_summary_resp2_resp3_agree() {
        let resp2 = arr(vec![
            b("length"),
            int(2),
            b("groups"),
            int(1),
            b("first-entry"),
            entry("1-0", "a", "1"),
            b("last-entry"),
            entry("2-0", "b", "2"),
        ]);
        let resp3 = Value::Map(vec![
            (b("length"), int(2)),
            (b("groups"), int(1)),
            (b("first-entry"), entry("1-0", "a", "1")),
            (b("last-entry"), entry("2-0", "b", "2")),
        ]);
        let expected = Response::map([
            ("length", Response::Int(2)),
            ("groups", Response::Int(1)),
            ("first-entry", Response::map([("1-0", Response::map([("a", "1")]))])),
            ("last-entry", Response::map([("2-0", Response::map([("b", "2")]))])),
        ]);
        assert_eq!(parse("XINFO", args!["STREAM", "s"], resp2), expected);
        assert_eq!(parse3("XINFO", args!["STREAM", "s"], resp3), expected);
    }

    #[test]
    fn test_xinfo_stream_full() {
        let reply = arr(vec![
            b("length"),
            int(1),
            b("entries"),
            arr(vec![entry("1-0", "a", "1")]),
            b("groups"),
            arr(vec![arr(vec![
                b("name"),
                b("g"),
                b("consumers"),
                arr(vec![arr(vec![b("name"), b("alice"), b("pel-count"), int(0)])]),
            ])]),
        ]);
        let parsed = parse("XINFO", args!["STREAM", "s", "FULL"], reply);
        assert_eq!(
            parsed.get("entries"),
            Some(&Response::map([("1-0", Response::map([("a", "1")]))]))
        );
        let groups = parsed.get("groups").and_then(Response::as_list).unwrap();
        let consumers = groups[0].get("consumers").and_then(Response::as_list).unwrap();
        assert_eq!(consumers[0].get("name"), Some(&Response::from("alice")));
    }

    #[test]
    fn test_xinfo_groups_and_empty_stream() {
        let reply = arr(vec![arr(vec![b("name"), b("g"), b("pending"), int(3)])]);
        assert_eq!(
            parse("XINFO", args!["GROUPS", "s"], reply),
            Response::list([Response::map([
                ("name", Response::from("g")),
                ("pending", Response::Int(3)),
            ])])
        );
        let empty = arr(vec![b("length"), int(0), b("first-entry"), Value::Null]);
        assert_eq!(
            parse("XINFO", args!["STREAM", "s"], empty).get("first-entry"),
            Some(&Response::Nil)
        );
    }
}
