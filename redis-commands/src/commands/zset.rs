//! Sorted set commands.
//!
//! Replies carrying scores are always reshaped into `{member: score}` maps
//! with float values, whichever protocol delivered them.

use resp_proto::{Token, Value};

use super::list::mpop_tail;
use super::set::keys_with_limit;
use super::{key_variadic, passthrough};
use crate::arg::{Arg, Args};
use crate::builder::{self, Modifier, Modifiers, count_prefixed};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::{float, floats, identity, to_float, to_scores, to_vec};
use crate::response::Response;

const MIN_MAX: &[&str] = &["MIN", "MAX"];

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("ZADD", zadd, parse_zadd).keys(KeySpec::First),
    CommandSpec::new("ZCARD", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("ZCOUNT", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("ZLEXCOUNT", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("ZINCRBY", passthrough, float).keys(KeySpec::First),
    CommandSpec::new("ZSCORE", passthrough, float).keys(KeySpec::First),
    CommandSpec::new("ZMSCORE", key_variadic, floats).keys(KeySpec::First),
    CommandSpec::new("ZRANK", zrank, parse_zrank).keys(KeySpec::First),
    CommandSpec::new("ZREVRANK", zrank, parse_zrank).keys(KeySpec::First),
    CommandSpec::new("ZREM", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("ZREMRANGEBYLEX", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("ZREMRANGEBYRANK", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("ZREMRANGEBYSCORE", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("ZRANGE", zrange, with_scores).keys(KeySpec::First),
    CommandSpec::new("ZREVRANGE", zrevrange, with_scores).keys(KeySpec::First),
    CommandSpec::new("ZRANGEBYSCORE", zrangebyscore, with_scores).keys(KeySpec::First),
    CommandSpec::new("ZREVRANGEBYSCORE", zrangebyscore, with_scores).keys(KeySpec::First),
    CommandSpec::new("ZRANGEBYLEX", zrangebylex, identity).keys(KeySpec::First),
    CommandSpec::new("ZREVRANGEBYLEX", zrangebylex, identity).keys(KeySpec::First),
    CommandSpec::new("ZRANGESTORE", zrangestore, identity).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("ZRANDMEMBER", zrandmember, with_scores).keys(KeySpec::First),
    CommandSpec::new("ZPOPMIN", key_count, scores).keys(KeySpec::First),
    CommandSpec::new("ZPOPMAX", key_count, scores).keys(KeySpec::First),
    CommandSpec::new("BZPOPMIN", blocking_pop, parse_bzpop).keys(KeySpec::SkipLast(1)),
    CommandSpec::new("BZPOPMAX", blocking_pop, parse_bzpop).keys(KeySpec::SkipLast(1)),
    CommandSpec::new("ZMPOP", zmpop, parse_zmpop).keys(KeySpec::Counted { at: 0 }),
    CommandSpec::new("BZMPOP", bzmpop, parse_zmpop).keys(KeySpec::Counted { at: 1 }),
    CommandSpec::new("ZINTER", combine, with_scores).keys(KeySpec::Counted { at: 0 }),
    CommandSpec::new("ZUNION", combine, with_scores).keys(KeySpec::Counted { at: 0 }),
    CommandSpec::new("ZDIFF", zdiff, with_scores).keys(KeySpec::Counted { at: 0 }),
    CommandSpec::new("ZINTERSTORE", combine_store, identity).keys(STORE_KEYS),
    CommandSpec::new("ZUNIONSTORE", combine_store, identity).keys(STORE_KEYS),
    CommandSpec::new("ZDIFFSTORE", zdiffstore, identity).keys(STORE_KEYS),
    CommandSpec::new("ZINTERCARD", keys_with_limit, identity).keys(KeySpec::Counted { at: 0 }),
    CommandSpec::new("ZSCAN", zscan, parse_zscan).keys(KeySpec::First),
];

/// `destination numkeys key [key ..] ..`.
const STORE_KEYS: KeySpec = KeySpec::Many(&[KeySpec::First, KeySpec::Counted { at: 1 }]);

// ── ZADD ────────────────────────────────────────────────────────────────

const ZADD_FLAGS: &[&str] = &["NX", "XX", "GT", "LT", "CH", "INCR"];

/// `key [NX|XX] [GT|LT] [CH] [INCR] score member [score member ..]`.
///
/// Leading flags may be given in any order; score/member pairs come either as
/// variadic arguments or as a `{member: score}` map.
fn zadd(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let mut flags = [false; 6];
    while let Some(arg) = args.peek() {
        let Some(i) = ZADD_FLAGS.iter().position(|f| arg.is_literal(f)) else {
            break;
        };
        flags[i] = true;
        args.next_arg();
    }
    let given = |names: &[&str]| -> Vec<&'static str> {
        ZADD_FLAGS
            .iter()
            .zip(flags)
            .filter(|(name, set)| *set && names.contains(*name))
            .map(|(name, _)| *name)
            .collect()
    };
    let groups: [&[&str]; 4] = [&["NX", "XX"], &["GT", "LT"], &["NX", "GT"], &["NX", "LT"]];
    for group in groups {
        let set = given(group);
        if set.len() > 1 {
            return Err(Error::invalid(
                command,
                format!("{} are mutually exclusive", set.join(" and ")),
            ));
        }
    }
    out.extend(
        ZADD_FLAGS
            .iter()
            .zip(flags)
            .filter(|(_, set)| *set)
            .map(|(name, _)| Token::from_static(*name)),
    );

    let pairs = match args.take_rest() {
        [Arg::Map(entries)] => entries
            .iter()
            .map(|(member, score)| {
                let score = score.to_token().ok_or_else(|| {
                    Error::invalid(command, "scores must be numbers")
                })?;
                Ok([score, Token::Bulk(member.clone())])
            })
            .collect::<Result<Vec<_>, Error>>()?
            .concat(),
        rest => {
            let tokens = builder::flatten_all(rest);
            if tokens.len() % 2 != 0 {
                return Err(Error::invalid(command, "expects score/member pairs"));
            }
            tokens
        }
    };
    if pairs.is_empty() {
        return Err(Error::invalid(command, "expects at least one score/member pair"));
    }
    if flags[5] && pairs.len() != 2 {
        return Err(Error::invalid(command, "INCR accepts a single score/member pair"));
    }
    args.mark_if(flags[5], "INCR");
    out.extend(pairs);
    Ok(out)
}

fn parse_zadd(command: &Command, reply: Value) -> Result<Response, Error> {
    if command.has_flag("INCR") {
        to_float(reply)
    } else {
        Ok(Response::from(reply))
    }
}

// ── Ranges ──────────────────────────────────────────────────────────────

fn zrank(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("member")?];
    if args.flag("WITHSCORE")? {
        out.push(Token::from_static("WITHSCORE"));
        args.mark("WITHSCORE");
    }
    args.finish()?;
    Ok(out)
}

/// `[rank, score]` with the score as a float.
fn parse_zrank(command: &Command, reply: Value) -> Result<Response, Error> {
    if !command.has_flag("WITHSCORE") || reply.is_null() {
        return Ok(Response::from(reply));
    }
    let mut items = to_vec(reply)?.into_iter();
    match (items.next(), items.next(), items.next()) {
        (Some(rank), Some(score), None) => {
            Ok(Response::List(vec![Response::from(rank), to_float(score)?]))
        }
        _ => Err(Error::UnexpectedResponse("expected a [rank, score] pair")),
    }
}

static ZRANGE_MODIFIERS: &[Modifier] = &[
    Modifier::choice("BY", &["BYSCORE", "BYLEX"]),
    Modifier::flag("REV"),
    Modifier::limit(),
    Modifier::flag("WITHSCORES"),
];

static ZRANGESTORE_MODIFIERS: &[Modifier] = &[
    Modifier::choice("BY", &["BYSCORE", "BYLEX"]),
    Modifier::flag("REV"),
    Modifier::limit(),
];

static WITHSCORES: &[Modifier] = &[Modifier::flag("WITHSCORES")];

static BYSCORE_MODIFIERS: &[Modifier] = &[Modifier::limit(), Modifier::flag("WITHSCORES")];

static BYLEX_MODIFIERS: &[Modifier] = &[Modifier::limit()];

fn range_with(args: &mut Args<'_>, table: &'static [Modifier]) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("start")?, args.token("stop")?];
    let modifiers = Modifiers::collect(table, args)?;
    if table.iter().any(|m| m.name == "BY") && modifiers.has("LIMIT") && !modifiers.has("BY") {
        return Err(args.invalid("LIMIT requires BYSCORE or BYLEX"));
    }
    modifiers.mark(args, &["WITHSCORES"]);
    modifiers.render(&mut out);
    Ok(out)
}

fn zrange(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    range_with(args, ZRANGE_MODIFIERS)
}

fn zrevrange(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    range_with(args, WITHSCORES)
}

fn zrangebyscore(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    range_with(args, BYSCORE_MODIFIERS)
}

fn zrangebylex(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    range_with(args, BYLEX_MODIFIERS)
}

fn zrangestore(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("destination")?];
    out.extend(range_with(args, ZRANGESTORE_MODIFIERS)?);
    Ok(out)
}

fn zrandmember(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    let count = args.opt_int("count")?;
    let with_scores = args.flag("WITHSCORES")?;
    args.finish()?;
    match (count, with_scores) {
        (Some(count), _) => out.push(Token::Int(count)),
        (None, true) => out.push(Token::Int(1)),
        (None, false) => {}
    }
    if with_scores {
        out.push(Token::from_static("WITHSCORES"));
        args.mark("WITHSCORES");
    }
    Ok(out)
}

fn with_scores(command: &Command, reply: Value) -> Result<Response, Error> {
    if command.has_flag("WITHSCORES") {
        to_scores(reply)
    } else {
        Ok(Response::from(reply))
    }
}

fn scores(_: &Command, reply: Value) -> Result<Response, Error> {
    to_scores(reply)
}

// ── Pops ────────────────────────────────────────────────────────────────

fn key_count(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    out.extend(args.opt_token("count")?);
    args.finish()?;
    Ok(out)
}

fn blocking_pop(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let out = args.rest();
    if out.len() < 2 {
        return Err(args.invalid("expects at least one key and a timeout"));
    }
    Ok(out)
}

/// `[key, member, score]` as `{key: {member: score}}`.
fn parse_bzpop(_: &Command, reply: Value) -> Result<Response, Error> {
    if reply.is_null() {
        return Ok(Response::Nil);
    }
    let mut items = to_vec(reply)?.into_iter();
    match (items.next(), items.next(), items.next(), items.next()) {
        (Some(key), Some(member), Some(score), None) => Ok(Response::map([(
            Response::from(key),
            Response::map([(Response::from(member), to_float(score)?)]),
        )])),
        _ => Err(Error::UnexpectedResponse("expected a [key, member, score] triple")),
    }
}

fn zmpop(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    mpop_tail(args, &mut out, MIN_MAX)?;
    Ok(out)
}

fn bzmpop(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("timeout")?];
    mpop_tail(args, &mut out, MIN_MAX)?;
    Ok(out)
}

/// `[key, [[member, score], ..]]` as `{key: {member: score}}`.
fn parse_zmpop(_: &Command, reply: Value) -> Result<Response, Error> {
    if reply.is_null() {
        return Ok(Response::Nil);
    }
    let mut items = to_vec(reply)?.into_iter();
    match (items.next(), items.next(), items.next()) {
        (Some(key), Some(elements), None) => {
            Ok(Response::map([(Response::from(key), to_scores(elements)?)]))
        }
        _ => Err(Error::UnexpectedResponse("expected a [key, elements] pair")),
    }
}

// ── Combinations ────────────────────────────────────────────────────────

static COMBINE_MODIFIERS: &[Modifier] = &[
    Modifier::variadic("WEIGHTS"),
    Modifier::keyword("AGGREGATE", &["SUM", "MIN", "MAX"]),
    Modifier::flag("WITHSCORES"),
];

static COMBINE_STORE_MODIFIERS: &[Modifier] = &[
    Modifier::variadic("WEIGHTS"),
    Modifier::keyword("AGGREGATE", &["SUM", "MIN", "MAX"]),
];

/// Render `numkeys key ..` followed by the modifiers, checking that the
/// weights match the keys.
fn keys_and_weights(args: &mut Args<'_>, table: &'static [Modifier], out: &mut Vec<Token>) -> Result<(), Error> {
    let keys = args.list("keys")?;
    let key_count = keys.len();
    count_prefixed(out, keys);
    let modifiers = Modifiers::collect(table, args)?;
    if let Some(weights) = modifiers.get("WEIGHTS") {
        if weights.len() != key_count {
            return Err(args.invalid(format!(
                "WEIGHTS expects {key_count} value(s), one per key"
            )));
        }
    }
    modifiers.mark(args, &["WITHSCORES"]);
    modifiers.render(out);
    Ok(())
}

fn combine(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    keys_and_weights(args, COMBINE_MODIFIERS, &mut out)?;
    Ok(out)
}

fn combine_store(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("destination")?];
    keys_and_weights(args, COMBINE_STORE_MODIFIERS, &mut out)?;
    Ok(out)
}

fn zdiff(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    count_prefixed(&mut out, args.list("keys")?);
    if args.flag("WITHSCORES")? {
        out.push(Token::from_static("WITHSCORES"));
        args.mark("WITHSCORES");
    }
    args.finish()?;
    Ok(out)
}

fn zdiffstore(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("destination")?];
    let keys = args.rest();
    if keys.is_empty() {
        return Err(args.invalid("expects at least one source key"));
    }
    count_prefixed(&mut out, keys);
    Ok(out)
}

static ZSCAN_MODIFIERS: &[Modifier] = &[Modifier::value("MATCH"), Modifier::value("COUNT")];

fn zscan(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("cursor")?];
    Modifiers::collect(ZSCAN_MODIFIERS, args)?.render(&mut out);
    Ok(out)
}

/// `[cursor, [member, score, ..]]` as `[cursor, {member: score}]`.
fn parse_zscan(_: &Command, reply: Value) -> Result<Response, Error> {
    let mut items = to_vec(reply)?.into_iter();
    match (items.next(), items.next(), items.next()) {
        (Some(cursor), Some(entries), None) => {
            Ok(Response::List(vec![Response::from(cursor), to_scores(entries)?]))
        }
        _ => Err(Error::UnexpectedResponse("expected a [cursor, entries] pair")),
    }
}
