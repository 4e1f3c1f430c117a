//! List commands.

use resp_proto::{Token, Value};

use super::{key_variadic, passthrough};
use crate::arg::Args;
use crate::builder::{Modifier, Modifiers, count_prefixed};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::{identity, to_vec};
use crate::response::Response;

const DIRECTIONS: &[&str] = &["LEFT", "RIGHT"];

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("LPUSH", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("RPUSH", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("LPUSHX", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("RPUSHX", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("LPOP", pop, identity).keys(KeySpec::First),
    CommandSpec::new("RPOP", pop, identity).keys(KeySpec::First),
    CommandSpec::new("LLEN", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("LINDEX", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("LINSERT", linsert, identity).keys(KeySpec::First),
    CommandSpec::new("LRANGE", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("LREM", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("LSET", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("LTRIM", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("LPOS", lpos, identity).keys(KeySpec::First),
    CommandSpec::new("LMOVE", lmove, identity).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("BLMOVE", blmove, identity).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("RPOPLPUSH", passthrough, identity).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("BRPOPLPUSH", passthrough, identity).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("BLPOP", blocking_pop, identity).keys(KeySpec::SkipLast(1)),
    CommandSpec::new("BRPOP", blocking_pop, identity).keys(KeySpec::SkipLast(1)),
    CommandSpec::new("LMPOP", lmpop, parse_mpop).keys(KeySpec::Counted { at: 0 }),
    CommandSpec::new("BLMPOP", blmpop, parse_mpop).keys(KeySpec::Counted { at: 1 }),
];

fn pop(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    out.extend(args.opt_token("count")?);
    args.finish()?;
    Ok(out)
}

fn linsert(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let key = args.token("key")?;
    let position = args.keyword("position", &["BEFORE", "AFTER"])?;
    let out = vec![key, position, args.token("pivot")?, args.token("element")?];
    args.finish()?;
    Ok(out)
}

static LPOS_MODIFIERS: &[Modifier] = &[
    Modifier::value("RANK"),
    Modifier::value("COUNT"),
    Modifier::value("MAXLEN"),
];

fn lpos(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("element")?];
    Modifiers::collect(LPOS_MODIFIERS, args)?.render(&mut out);
    Ok(out)
}

fn lmove(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("source")?, args.token("destination")?];
    out.push(args.keyword("wherefrom", DIRECTIONS)?);
    out.push(args.keyword("whereto", DIRECTIONS)?);
    args.finish()?;
    Ok(out)
}

fn blmove(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("source")?, args.token("destination")?];
    out.push(args.keyword("wherefrom", DIRECTIONS)?);
    out.push(args.keyword("whereto", DIRECTIONS)?);
    out.push(args.token("timeout")?);
    args.finish()?;
    Ok(out)
}

/// `key [key ..] timeout`; keys may be given variadic or as one list.
fn blocking_pop(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let out = args.rest();
    if out.len() < 2 {
        return Err(args.invalid("expects at least one key and a timeout"));
    }
    Ok(out)
}

/// `numkeys key [key ..] direction [COUNT count]`; the direction defaults to
/// the first accepted literal and `COUNT 1` is left implicit.
pub(super) fn mpop_tail(
    args: &mut Args<'_>,
    out: &mut Vec<Token>,
    directions: &[&'static str],
) -> Result<(), Error> {
    count_prefixed(out, args.list("keys")?);
    let direction = args
        .opt_keyword("direction", directions)?
        .unwrap_or(Token::from_static(directions[0]));
    out.push(direction);
    if let Some(count) = args.opt_int("count")? {
        if count < 1 {
            return Err(args.invalid("COUNT must be positive"));
        }
        if count != 1 {
            out.push(Token::from_static("COUNT"));
            out.push(Token::Int(count));
        }
    }
    args.finish()
}

fn lmpop(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    mpop_tail(args, &mut out, DIRECTIONS)?;
    Ok(out)
}

fn blmpop(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("timeout")?];
    mpop_tail(args, &mut out, DIRECTIONS)?;
    Ok(out)
}

/// `[key, [elements]]` as `{key: [elements]}`.
pub(super) fn parse_mpop(_: &Command, reply: Value) -> Result<Response, Error> {
    if reply.is_null() {
        return Ok(Response::Nil);
    }
    let mut items = to_vec(reply)?.into_iter();
    match (items.next(), items.next(), items.next()) {
        (Some(key), Some(elements), None) => {
            Ok(Response::map([(Response::from(key), Response::from(elements))]))
        }
        _ => Err(Error::UnexpectedResponse("expected a [key, elements] pair")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::{args, opts, tokens, Response};

    #[test]
    fn test_push_styles_agree() {
        assert_eq!(
            build("LPUSH", args!["list", "a", "b"]).unwrap(),
            build("LPUSH", args!["list", ["a", "b"]]).unwrap()
        );
        assert!(build("LPUSH", args!["list"]).is_err());
    }

    #[test]
    fn test_linsert_validates_position() {
        assert_eq!(
            build("LINSERT", args!["l", "before", "p", "e"]).unwrap(),
            tokens!["l", "BEFORE", "p", "e"]
        );
        let err = build_err("LINSERT", args!["l", "beside", "p", "e"]);
        assert!(err.contains("Accepted values: BEFORE, AFTER"));
    }

    #[test]
    fn test_lpos() {
        assert_eq!(
            build("LPOS", args!["l", "e", opts! { "maxlen" => 10, "rank" => -1 }]).unwrap(),
            tokens!["l", "e", "RANK", -1, "MAXLEN", 10]
        );
    }

    #[test]
    fn test_lmove_validates_directions() {
        assert_eq!(
            build("LMOVE", args!["a", "b", "left", "RIGHT"]).unwrap(),
            tokens!["a", "b", "LEFT", "RIGHT"]
        );
        assert!(build_err("LMOVE", args!["a", "b", "up", "left"]).contains("Accepted values: LEFT, RIGHT"));
        assert_eq!(prefixed("BLMOVE", args!["a", "b", "LEFT", "LEFT", 0]), tokens!["p:a", "p:b", "LEFT", "LEFT", 0]);
    }

    #[test]
    fn test_blpop_keys_and_timeout() {
        let call = args![["a", "b"], 0];
        assert_eq!(build("BLPOP", call.clone()).unwrap(), tokens!["a", "b", 0]);
        assert_eq!(prefixed("BLPOP", call), tokens!["p:a", "p:b", 0]);
        assert!(build("BLPOP", args![0]).is_err());
    }

    #[test]
    fn test_lmpop() {
        assert_eq!(
            build("LMPOP", args![["key"], "left", 2]).unwrap(),
            tokens![1, "key", "LEFT", "COUNT", 2]
        );
        assert_eq!(
            build("LMPOP", args![["a", "b"], "RIGHT", 1]).unwrap(),
            tokens![2, "a", "b", "RIGHT"]
        );
        assert_eq!(build("LMPOP", args!["a"]).unwrap(), tokens![1, "a", "LEFT"]);
    }

    #[test]
    fn test_lmpop_parse() {
        let reply = arr(vec![b("key"), bulks(&["elem1", "elem2"])]);
        assert_eq!(
            parse("LMPOP", args![["key"], "left", 2], reply),
            Response::map([("key", Response::list(["elem1", "elem2"]))])
        );
        assert_eq!(
            parse("LMPOP", args![["key"]], resp_proto::Value::Null),
            Response::Nil
        );
    }

    #[test]
    fn test_blmpop_prefix() {
        assert_eq!(
            prefixed("BLMPOP", args![0, ["a", "b"], "left"]),
            tokens![0, 2, "p:a", "p:b", "LEFT"]
        );
    }
}
