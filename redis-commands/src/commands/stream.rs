//! Stream commands. `XGROUP` and `XINFO` live with the containers.

use resp_proto::{Token, Value};

use super::{key_variadic, passthrough};
use crate::arg::{Arg, Args};
use crate::builder::{self, Modifier, Modifiers, counted_block};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::options::{Exactness, Idempotency, RefPolicy, Render, StreamTrim};
use crate::prefix::KeySpec;
use crate::reply::{identity, to_int, to_map, to_map_with, to_vec};
use crate::response::Response;

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("XADD", xadd, identity).keys(KeySpec::First),
    CommandSpec::new("XTRIM", xtrim, identity).keys(KeySpec::First),
    CommandSpec::new("XDEL", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("XDELEX", xdelex, identity).keys(KeySpec::First),
    CommandSpec::new("XACK", xack, identity).keys(KeySpec::First),
    CommandSpec::new("XACKDEL", xackdel, identity).keys(KeySpec::First),
    CommandSpec::new("XLEN", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("XRANGE", xrange, parse_entries).keys(KeySpec::First),
    CommandSpec::new("XREVRANGE", xrange, parse_entries).keys(KeySpec::First),
    CommandSpec::new("XREAD", xread, parse_streams).keys(KeySpec::Custom(xread_keys)),
    CommandSpec::new("XREADGROUP", xreadgroup, parse_streams)
        .keys(KeySpec::Custom(xreadgroup_keys)),
    CommandSpec::new("XCLAIM", xclaim, parse_claim).keys(KeySpec::First),
    CommandSpec::new("XAUTOCLAIM", xautoclaim, parse_autoclaim).keys(KeySpec::First),
    CommandSpec::new("XPENDING", xpending, parse_pending).keys(KeySpec::First),
    CommandSpec::new("XSETID", xsetid, identity).keys(KeySpec::First),
    CommandSpec::new("XCFGSET", xcfgset, identity).keys(KeySpec::First),
];

// ── Writes ──────────────────────────────────────────────────────────────

const XADD_OPTIONS: &[&str] = &["nomkstream", "ref", "idmp", "idmpauto", "trim", "limit"];

/// `key [NOMKSTREAM] [KEEPREF|DELREF|ACKED] [IDMP p i|IDMPAUTO p] [trim] id field value ..`.
fn xadd(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let fields = builder::pairs(command, "fields", args.required("fields")?)?;
    if fields.is_empty() {
        return Err(args.invalid("expects at least one field/value pair"));
    }
    let id = args
        .opt_token("id")?
        .unwrap_or(Token::from_static("*"));
    let options = args.options()?;
    options.check(XADD_OPTIONS)?;
    args.finish()?;

    if options.flag("nomkstream") {
        out.push(Token::from_static("NOMKSTREAM"));
    }
    if let Some(policy) = RefPolicy::from_opt_arg(command, options.get("ref"))? {
        policy.render(&mut out);
    }
    match (options.get("idmp"), options.get("idmpauto")) {
        (Some(_), Some(_)) => {
            return Err(args.invalid("IDMP and IDMPAUTO are mutually exclusive"));
        }
        (Some(idmp), None) => Idempotency::explicit_from_arg(command, idmp)?.render(&mut out),
        (None, Some(auto)) => Idempotency::auto_from_arg(command, auto)?.render(&mut out),
        (None, None) => {}
    }
    let trim = match options.get("trim") {
        Some(trim) => Some(StreamTrim::from_arg(command, trim)?),
        None => None,
    };
    if let Some(trim) = with_limit(command, trim, options.int("limit")?)? {
        trim.render(&mut out);
    }
    out.push(id);
    for (field, value) in fields {
        out.push(field);
        out.push(value);
    }
    Ok(out)
}

/// Merge a separately given `LIMIT` into the trim.
fn with_limit(
    command: &str,
    trim: Option<StreamTrim>,
    limit: Option<i64>,
) -> Result<Option<StreamTrim>, Error> {
    let Some(limit) = limit else {
        return Ok(trim);
    };
    match trim {
        None => Err(Error::invalid(command, "LIMIT requires a trim strategy")),
        Some(trim) if trim.exactness != Some(Exactness::Approximate) => Err(Error::invalid(
            command,
            "LIMIT requires approximate (~) trimming",
        )),
        Some(trim) => Ok(Some(trim.limit(limit))),
    }
}

/// `key MAXLEN|MINID [=|~] threshold [LIMIT n] [KEEPREF|DELREF|ACKED]`.
fn xtrim(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let trim = StreamTrim::from_arg(command, args.required("trim")?)?;
    let options = args.options()?;
    options.check(&["limit", "ref"])?;
    args.finish()?;
    if let Some(trim) = with_limit(command, Some(trim), options.int("limit")?)? {
        trim.render(&mut out);
    }
    if let Some(policy) = RefPolicy::from_opt_arg(command, options.get("ref"))? {
        policy.render(&mut out);
    }
    Ok(out)
}

/// `[KEEPREF|DELREF|ACKED] IDS n id ..`, shared by `XDELEX` and `XACKDEL`.
fn ids_with_policy(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    let command = args.command();
    let ids = args.list("ids")?;
    if let Some(policy) = RefPolicy::from_opt_arg(command, args.next_arg())? {
        policy.render(out);
    }
    counted_block(out, "IDS", ids);
    args.finish()
}

fn xdelex(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    ids_with_policy(args, &mut out)?;
    Ok(out)
}

fn xack(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("group")?];
    let ids = args.rest();
    if ids.is_empty() {
        return Err(args.invalid("expects at least one id"));
    }
    out.extend(ids);
    Ok(out)
}

fn xackdel(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("group")?];
    ids_with_policy(args, &mut out)?;
    Ok(out)
}

fn xsetid(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    static MODIFIERS: &[Modifier] = &[
        Modifier::value("ENTRIESADDED"),
        Modifier::value("MAXDELETEDID"),
    ];
    let mut out = vec![args.token("key")?, args.token("last-id")?];
    Modifiers::collect(MODIFIERS, args)?.render(&mut out);
    Ok(out)
}

fn xcfgset(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    static MODIFIERS: &[Modifier] = &[
        Modifier::value("IDMP-DURATION"),
        Modifier::value("IDMP-MAXSIZE"),
    ];
    let mut out = vec![args.token("key")?];
    Modifiers::collect(MODIFIERS, args)?.render(&mut out);
    if out.len() == 1 {
        return Err(args.invalid("expects IDMP-DURATION or IDMP-MAXSIZE"));
    }
    Ok(out)
}

// ── Reads ───────────────────────────────────────────────────────────────

fn xrange(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("start")?, args.token("end")?];
    if let Some(count) = args.opt_int("count")? {
        out.push(Token::from_static("COUNT"));
        out.push(Token::Int(count));
    }
    args.finish()?;
    Ok(out)
}

/// Options given as a leading map rather than trailing modifiers.
fn leading_modifiers(args: &mut Args<'_>, table: &'static [Modifier]) -> Result<Modifiers, Error> {
    let command = args.command();
    match args.next_arg() {
        None | Some(Arg::Null) => Modifiers::from_map(command, table, &[]),
        Some(Arg::Map(entries)) => Modifiers::from_map(command, table, entries),
        Some(_) => Err(args.invalid("options must be given as a map")),
    }
}

/// `STREAMS key .. id ..` from a `{key: id}` map or from a key list and an
/// id list of the same length.
fn streams(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    let command = args.command();
    let streams = args.required("streams")?;
    let (keys, ids): (Vec<Token>, Vec<Token>) = match streams {
        Arg::Map(_) => builder::pairs(command, "streams", streams)?
            .into_iter()
            .unzip(),
        _ => {
            let mut keys = Vec::new();
            builder::flatten(streams, &mut keys);
            (keys, args.list("ids")?)
        }
    };
    if keys.is_empty() || keys.len() != ids.len() {
        return Err(args.invalid("expects exactly one id per stream"));
    }
    out.push(Token::from_static("STREAMS"));
    out.extend(keys);
    out.extend(ids);
    args.finish()
}

static XREAD_MODIFIERS: &[Modifier] = &[Modifier::value("COUNT"), Modifier::value("BLOCK")];

fn xread(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    leading_modifiers(args, XREAD_MODIFIERS)?.render(&mut out);
    streams(args, &mut out)?;
    Ok(out)
}

static XREADGROUP_MODIFIERS: &[Modifier] = &[
    Modifier::value("COUNT"),
    Modifier::value("BLOCK"),
    Modifier::flag("NOACK"),
];

fn xreadgroup(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![
        Token::from_static("GROUP"),
        args.token("group")?,
        args.token("consumer")?,
    ];
    leading_modifiers(args, XREADGROUP_MODIFIERS)?.render(&mut out);
    streams(args, &mut out)?;
    Ok(out)
}

/// The first half of the tokens after `STREAMS`. The walk starts at `from`
/// and steps over `COUNT`/`BLOCK` values, so a value spelled `streams` is not
/// mistaken for the keyword.
fn stream_keys(args: &[Token], from: usize) -> Vec<usize> {
    let mut i = from;
    while i < args.len() && !args[i].eq_ignore_ascii_case("STREAMS") {
        i += if args[i].eq_ignore_ascii_case("NOACK") { 1 } else { 2 };
    }
    if i >= args.len() {
        return Vec::new();
    }
    let start = i + 1;
    let n = (args.len() - start) / 2;
    (start..start + n).collect()
}

fn xread_keys(args: &[Token]) -> Vec<usize> {
    stream_keys(args, 0)
}

fn xreadgroup_keys(args: &[Token]) -> Vec<usize> {
    stream_keys(args, 3)
}

static XCLAIM_MODIFIERS: &[Modifier] = &[
    Modifier::value("IDLE"),
    Modifier::value("TIME"),
    Modifier::value("RETRYCOUNT"),
    Modifier::flag("FORCE"),
    Modifier::flag("JUSTID"),
    Modifier::value("LASTID"),
];

fn xclaim(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![
        args.token("key")?,
        args.token("group")?,
        args.token("consumer")?,
        args.token("min-idle-time")?,
    ];
    out.extend(args.list("ids")?);
    let modifiers = Modifiers::collect(XCLAIM_MODIFIERS, args)?;
    modifiers.exclusive(args.command(), &["IDLE", "TIME"])?;
    modifiers.mark(args, &["JUSTID"]);
    modifiers.render(&mut out);
    Ok(out)
}

static XAUTOCLAIM_MODIFIERS: &[Modifier] = &[Modifier::value("COUNT"), Modifier::flag("JUSTID")];

fn xautoclaim(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![
        args.token("key")?,
        args.token("group")?,
        args.token("consumer")?,
        args.token("min-idle-time")?,
        args.token("start")?,
    ];
    let modifiers = Modifiers::collect(XAUTOCLAIM_MODIFIERS, args)?;
    modifiers.mark(args, &["JUSTID"]);
    modifiers.render(&mut out);
    Ok(out)
}

/// `key group [[IDLE ms] start end count [consumer]]`.
fn xpending(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("group")?];
    let options = args.options()?;
    options.check(&["idle", "start", "end", "count", "consumer"])?;
    args.finish()?;
    let idle = options.token("idle")?;
    let consumer = options.token("consumer")?;
    match (options.token("start")?, options.token("end")?, options.token("count")?) {
        (Some(start), Some(end), Some(count)) => {
            if let Some(idle) = idle {
                out.push(Token::from_static("IDLE"));
                out.push(idle);
            }
            out.extend([start, end, count]);
            out.extend(consumer);
        }
        (None, None, None) if idle.is_none() && consumer.is_none() => {}
        (None, None, None) => {
            return Err(args.invalid("IDLE and CONSUMER require start, end and count"));
        }
        _ => return Err(args.invalid("start, end and count must be given together")),
    }
    Ok(out)
}

// ── Replies ─────────────────────────────────────────────────────────────

/// `[[id, [field, value ..]] ..]` as `{id: {field: value}}`. Deleted entries
/// keep a nil body.
pub(crate) fn to_entries(value: Value) -> Result<Response, Error> {
    to_map_with(value, to_map)
}

fn parse_entries(_: &Command, reply: Value) -> Result<Response, Error> {
    to_entries(reply)
}

/// `{stream: {id: fields}}` from the RESP2 `[[stream, entries] ..]` array or
/// the RESP3 map. Nil on timeout.
fn parse_streams(_: &Command, reply: Value) -> Result<Response, Error> {
    to_map_with(reply, to_entries)
}

fn parse_claim(command: &Command, reply: Value) -> Result<Response, Error> {
    if command.has_flag("JUSTID") {
        return Ok(Response::from(reply));
    }
    to_entries(reply)
}

/// `[next-start, claimed, deleted-ids]`; claimed entries are reshaped unless
/// `JUSTID` was given.
fn parse_autoclaim(command: &Command, reply: Value) -> Result<Response, Error> {
    let justid = command.has_flag("JUSTID");
    let mut items = to_vec(reply)?.into_iter();
    let next = items
        .next()
        .ok_or(Error::UnexpectedResponse("expected a cursor"))?;
    let claimed = items
        .next()
        .ok_or(Error::UnexpectedResponse("expected claimed entries"))?;
    let mut out = vec![Response::from(next)];
    out.push(if justid {
        Response::from(claimed)
    } else {
        to_entries(claimed)?
    });
    out.extend(items.map(Response::from));
    Ok(Response::List(out))
}

/// The summary form becomes `[count, min-id, max-id, {consumer: pending}]`.
fn parse_pending(command: &Command, reply: Value) -> Result<Response, Error> {
    if command.args().len() > 2 {
        return Ok(Response::from(reply));
    }
    let mut items = to_vec(reply)?.into_iter();
    match (items.next(), items.next(), items.next(), items.next()) {
        (Some(count), Some(min), Some(max), Some(consumers)) => Ok(Response::List(vec![
            to_int(count)?,
            Response::from(min),
            Response::from(max),
            to_map_with(consumers, to_int)?,
        ])),
        _ => Err(Error::UnexpectedResponse("expected a pending summary")),
    }
}
