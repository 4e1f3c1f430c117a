//! String commands.

use resp_proto::{Token, Value};

use super::{passthrough, variadic};
use crate::arg::Args;
use crate::builder::{Modifier, Modifiers};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::options::{TtlMode, render_ttl};
use crate::prefix::KeySpec;
use crate::reply::{self, boolean, float, identity};
use crate::response::Response;

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("GET", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("SET", set, identity).keys(KeySpec::First),
    CommandSpec::new("SETNX", passthrough, boolean).keys(KeySpec::First),
    CommandSpec::new("SETEX", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("PSETEX", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("GETSET", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("GETDEL", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("GETEX", getex, identity).keys(KeySpec::First),
    CommandSpec::new("GETRANGE", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("SETRANGE", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("SUBSTR", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("STRLEN", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("APPEND", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("INCR", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("DECR", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("INCRBY", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("DECRBY", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("INCRBYFLOAT", passthrough, float).keys(KeySpec::First),
    CommandSpec::new("MGET", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("MSET", pairs, identity).keys(KeySpec::Interleaved { start: 0, step: 2 }),
    CommandSpec::new("MSETNX", pairs, boolean).keys(KeySpec::Interleaved { start: 0, step: 2 }),
    CommandSpec::new("LCS", lcs, parse_lcs).keys(KeySpec::Positions(&[0, 1])),
];

static SET_MODIFIERS: &[Modifier] = &[
    Modifier::flag("NX"),
    Modifier::flag("XX"),
    Modifier::flag("GET"),
    Modifier::value("EX"),
    Modifier::value("PX"),
    Modifier::value("EXAT"),
    Modifier::value("PXAT"),
    Modifier::flag("KEEPTTL"),
];

fn set(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?, args.token("value")?];
    let modifiers = Modifiers::collect(SET_MODIFIERS, args)?;
    modifiers.exclusive(command, &["NX", "XX"])?;
    modifiers.exclusive(command, &["EX", "PX", "EXAT", "PXAT", "KEEPTTL"])?;
    modifiers.render(&mut out);
    Ok(out)
}

fn getex(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    let mode = args.next_arg();
    let value = args.next_arg();
    render_ttl(args.command(), mode, value, TtlMode::GETEX, &mut out)?;
    args.finish()?;
    Ok(out)
}

fn pairs(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let tokens = variadic(args)?;
    if tokens.len() % 2 != 0 {
        return Err(args.invalid("expects key/value pairs"));
    }
    Ok(tokens)
}

static LCS_MODIFIERS: &[Modifier] = &[
    Modifier::flag("LEN"),
    Modifier::flag("IDX"),
    Modifier::value("MINMATCHLEN"),
    Modifier::flag("WITHMATCHLEN"),
];

fn lcs(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key1")?, args.token("key2")?];
    let modifiers = Modifiers::collect(LCS_MODIFIERS, args)?;
    modifiers.exclusive(args.command(), &["LEN", "IDX"])?;
    modifiers.mark(args, &["IDX"]);
    modifiers.render(&mut out);
    Ok(out)
}

fn parse_lcs(command: &Command, reply: Value) -> Result<Response, Error> {
    if command.has_flag("IDX") {
        reply::to_map(reply)
    } else {
        Ok(Response::from(reply))
    }
}
