//! Generic keyspace commands.

use resp_proto::{Token, Value};

use super::{passthrough, variadic};
use crate::arg::Args;
use crate::builder::{Modifier, Modifiers};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::options::{ExpireCondition, Render};
use crate::prefix::KeySpec;
use crate::reply::{boolean, identity, to_vec};
use crate::response::Response;

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("DEL", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("UNLINK", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("EXISTS", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("TOUCH", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("EXPIRE", expire, boolean).keys(KeySpec::First),
    CommandSpec::new("PEXPIRE", expire, boolean).keys(KeySpec::First),
    CommandSpec::new("EXPIREAT", expire, boolean).keys(KeySpec::First),
    CommandSpec::new("PEXPIREAT", expire, boolean).keys(KeySpec::First),
    CommandSpec::new("EXPIRETIME", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("PEXPIRETIME", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("TTL", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("PTTL", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("PERSIST", passthrough, boolean).keys(KeySpec::First),
    CommandSpec::new("TYPE", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("KEYS", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("RANDOMKEY", passthrough, identity),
    CommandSpec::new("RENAME", passthrough, identity).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("RENAMENX", passthrough, boolean).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("MOVE", passthrough, boolean).keys(KeySpec::First),
    CommandSpec::new("COPY", copy, boolean).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("DUMP", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("RESTORE", restore, identity).keys(KeySpec::First),
    CommandSpec::new("MIGRATE", migrate, identity).keys(KeySpec::Custom(migrate_keys)),
    CommandSpec::new("OBJECT", object, identity).keys(KeySpec::Positions(&[1])),
    CommandSpec::new("SCAN", scan, identity).keys(KeySpec::After {
        from: 1,
        literals: &["MATCH"],
    }),
    CommandSpec::new("SORT", sort, parse_sort).keys(KeySpec::Custom(sort_keys)),
    CommandSpec::new("SORT_RO", sort_ro, parse_sort).keys(KeySpec::Custom(sort_keys)),
    CommandSpec::new("WAIT", passthrough, identity),
    CommandSpec::new("WAITAOF", passthrough, identity),
];

fn expire(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("ttl")?];
    if let Some(condition) = ExpireCondition::from_opt_arg(args.command(), args.next_arg())? {
        condition.render(&mut out);
    }
    args.finish()?;
    Ok(out)
}

static COPY_MODIFIERS: &[Modifier] = &[Modifier::value("DB"), Modifier::flag("REPLACE")];

fn copy(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("source")?, args.token("destination")?];
    Modifiers::collect(COPY_MODIFIERS, args)?.render(&mut out);
    Ok(out)
}

static RESTORE_MODIFIERS: &[Modifier] = &[
    Modifier::flag("REPLACE"),
    Modifier::flag("ABSTTL"),
    Modifier::value("IDLETIME"),
    Modifier::value("FREQ"),
];

fn restore(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("ttl")?, args.token("payload")?];
    let modifiers = Modifiers::collect(RESTORE_MODIFIERS, args)?;
    modifiers.exclusive(args.command(), &["IDLETIME", "FREQ"])?;
    modifiers.render(&mut out);
    Ok(out)
}

static MIGRATE_MODIFIERS: &[Modifier] = &[
    Modifier::flag("COPY"),
    Modifier::flag("REPLACE"),
    Modifier::value("AUTH"),
    Modifier::values("AUTH2", 2),
    Modifier::variadic("KEYS"),
];

fn migrate(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let host = args.token("host")?;
    let port = args.token("port")?;
    let key = args
        .opt_token("key")?
        .unwrap_or(Token::from_static(""));
    let mut out = vec![host, port, key, args.token("destination-db")?, args.token("timeout")?];
    let modifiers = Modifiers::collect(MIGRATE_MODIFIERS, args)?;
    modifiers.exclusive(command, &["AUTH", "AUTH2"])?;
    if modifiers.has("KEYS") && out[2] != "" {
        return Err(Error::invalid(command, "key must be empty when KEYS is given"));
    }
    if !modifiers.has("KEYS") && out[2] == "" {
        return Err(Error::invalid(command, "missing argument `key`"));
    }
    modifiers.render(&mut out);
    Ok(out)
}

/// The key slot when non-empty, and everything after `KEYS`. Modifiers
/// follow `host port key db timeout` in table order, so the walk skips the
/// `AUTH`/`AUTH2` credentials instead of matching them.
fn migrate_keys(args: &[Token]) -> Vec<usize> {
    let mut out = Vec::new();
    if args.get(2).is_some_and(|key| *key != "") {
        out.push(2);
    }
    let mut i = 5;
    while i < args.len() {
        let token = &args[i];
        if token.eq_ignore_ascii_case("KEYS") {
            out.extend(i + 1..args.len());
            break;
        }
        i += if token.eq_ignore_ascii_case("AUTH2") {
            3
        } else if token.eq_ignore_ascii_case("AUTH") {
            2
        } else {
            1
        };
    }
    out
}

const OBJECT_SUBCOMMANDS: &[&str] = &["ENCODING", "FREQ", "IDLETIME", "REFCOUNT", "HELP"];

fn object(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![super::subcommand(args, OBJECT_SUBCOMMANDS)?];
    if out[0] != "HELP" {
        out.push(args.token("key")?);
    }
    args.finish()?;
    Ok(out)
}

static SCAN_MODIFIERS: &[Modifier] = &[
    Modifier::value("MATCH"),
    Modifier::value("COUNT"),
    Modifier::value("TYPE"),
];

fn scan(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("cursor")?];
    Modifiers::collect(SCAN_MODIFIERS, args)?.render(&mut out);
    Ok(out)
}

// ── SORT ────────────────────────────────────────────────────────────────

static SORT_MODIFIERS: &[Modifier] = &[
    Modifier::value("BY"),
    Modifier::limit(),
    Modifier::repeated("GET"),
    Modifier::choice("SORT", &["ASC", "DESC"]),
    Modifier::flag("ALPHA"),
    Modifier::value("STORE"),
];

static SORT_RO_MODIFIERS: &[Modifier] = &[
    Modifier::value("BY"),
    Modifier::limit(),
    Modifier::repeated("GET"),
    Modifier::choice("SORT", &["ASC", "DESC"]),
    Modifier::flag("ALPHA"),
];

fn sort_with(args: &mut Args<'_>, table: &'static [Modifier]) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    let modifiers = Modifiers::collect(table, args)?;
    for _ in modifiers.get("GET").unwrap_or_default() {
        args.mark("GET");
    }
    modifiers.mark(args, &["STORE"]);
    modifiers.render(&mut out);
    Ok(out)
}

fn sort(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    sort_with(args, SORT_MODIFIERS)
}

fn sort_ro(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    sort_with(args, SORT_RO_MODIFIERS)
}

/// The sorted key, the `BY` pattern, every `GET` pattern other than `#`, and
/// the `STORE` destination.
fn sort_keys(args: &[Token]) -> Vec<usize> {
    let mut out = vec![0];
    let mut i = 1;
    while i + 1 < args.len() {
        let token = &args[i];
        if token.eq_ignore_ascii_case("LIMIT") {
            i += 3;
            continue;
        }
        let next = &args[i + 1];
        let is_key = (token.eq_ignore_ascii_case("BY") && !next.eq_ignore_ascii_case("NOSORT"))
            || (token.eq_ignore_ascii_case("GET") && *next != "#")
            || token.eq_ignore_ascii_case("STORE");
        if is_key {
            out.push(i + 1);
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

/// With two or more `GET` patterns and no `STORE`, the flat reply is grouped into one list
/// per sorted element.
fn parse_sort(command: &Command, reply: Value) -> Result<Response, Error> {
    let patterns = command.count_flag("GET");
    if patterns < 2 || command.has_flag("STORE") || reply.is_null() {
        return Ok(Response::from(reply));
    }
    let items = to_vec(reply)?;
    if items.len() % patterns != 0 {
        return Err(Error::UnexpectedResponse(
            "SORT reply length is not a multiple of the GET patterns",
        ));
    }
    let mut groups = Vec::with_capacity(items.len() / patterns);
    let mut iter = items.into_iter().map(Response::from).peekable();
    while iter.peek().is_some() {
        groups.push(Response::List(iter.by_ref().take(patterns).collect()));
    }
    Ok(Response::List(groups))
}
