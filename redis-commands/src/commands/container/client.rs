//! `CLIENT` subcommands.

use bytes::Bytes;
use resp_proto::{Token, Value};

use crate::arg::{Arg, Args};
use crate::builder::{self, Modifier, Modifiers, one_of};
use crate::command::{Command, CommandSpec};
use crate::commands::subcommand;
use crate::error::Error;
use crate::reply::{identity, to_bool, to_map};
use crate::response::{Response, insert};

const SUBCOMMANDS: &[&str] = &[
    "CACHING",
    "GETNAME",
    "GETREDIR",
    "ID",
    "INFO",
    "KILL",
    "LIST",
    "NO-EVICT",
    "NO-TOUCH",
    "PAUSE",
    "REPLY",
    "SETINFO",
    "SETNAME",
    "TRACKING",
    "TRACKINGINFO",
    "UNBLOCK",
    "UNPAUSE",
];

const ON_OFF: &[&str] = &["ON", "OFF"];

const CLIENT_TYPES: &[&str] = &["NORMAL", "MASTER", "REPLICA", "PUBSUB"];

const KILL_TYPES: &[&str] = &["NORMAL", "MASTER", "SLAVE", "REPLICA", "PUBSUB"];

pub(crate) static COMMANDS: &[CommandSpec] = &[CommandSpec::new("CLIENT", client, parse_client)];

fn client(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, SUBCOMMANDS)?;
    let mut out = vec![sub.clone()];
    match sub.as_bytes().unwrap_or_default() {
        b"CACHING" => out.push(args.keyword("mode", &["YES", "NO"])?),
        b"KILL" => kill(args, &mut out)?,
        b"LIST" => list(args, &mut out)?,
        b"NO-EVICT" | b"NO-TOUCH" => out.push(args.keyword("switch", ON_OFF)?),
        b"PAUSE" => {
            out.push(Token::Int(args.int("timeout")?));
            out.extend(args.opt_keyword("mode", &["WRITE", "ALL"])?);
        }
        b"REPLY" => out.push(args.keyword("mode", &["ON", "OFF", "SKIP"])?),
        b"SETINFO" => {
            out.push(args.keyword("attribute", &["LIB-NAME", "LIB-VER"])?);
            out.push(args.token("value")?);
        }
        b"SETNAME" => out.push(args.token("name")?),
        b"TRACKING" => tracking(args, &mut out)?,
        b"UNBLOCK" => {
            out.push(Token::Int(args.int("client_id")?));
            out.extend(args.opt_keyword("mode", &["TIMEOUT", "ERROR"])?);
        }
        _ => {}
    }
    args.finish()?;
    Ok(out)
}

/// Option names and their wire literals, in emission order.
const KILL_FILTERS: &[(&str, &str)] = &[
    ("id", "ID"),
    ("type", "TYPE"),
    ("user", "USER"),
    ("addr", "ADDR"),
    ("laddr", "LADDR"),
    ("skipme", "SKIPME"),
    ("maxage", "MAXAGE"),
];

/// `KILL addr` or `KILL <filter value> ..` from an options map.
fn kill(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    if !matches!(args.peek(), Some(Arg::Map(_))) {
        out.push(args.token("addr")?);
        return Ok(());
    }
    let command = args.command();
    let options = args.options()?;
    let names: Vec<&str> = KILL_FILTERS.iter().map(|(name, _)| *name).collect();
    options.check(&names)?;
    if options.is_empty() {
        return Err(args.invalid("KILL expects at least one filter"));
    }
    for (name, literal) in KILL_FILTERS {
        let Some(value) = options.get(name) else {
            continue;
        };
        let value = match *name {
            "type" => one_of(command, name, value, KILL_TYPES)?,
            "skipme" => match value {
                Arg::Bool(true) => Token::from_static("YES"),
                Arg::Bool(false) => Token::from_static("NO"),
                other => one_of(command, name, other, &["YES", "NO"])?,
            },
            "id" | "maxage" => Token::Int(value.as_int().ok_or_else(|| {
                args.invalid(format!("`{name}` must be an integer"))
            })?),
            _ => value
                .to_token()
                .ok_or_else(|| args.invalid(format!("`{name}` must be a scalar value")))?,
        };
        out.extend([Token::from_static(*literal), value]);
    }
    Ok(())
}

/// `LIST [TYPE type] [ID id ..]`.
fn list(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    let command = args.command();
    let options = args.options()?;
    options.check(&["type", "id"])?;
    if let Some(kind) = options.get("type") {
        out.extend([Token::from_static("TYPE"), one_of(command, "type", kind, CLIENT_TYPES)?]);
    }
    if let Some(ids) = options.get("id") {
        let mut flat = Vec::new();
        builder::flatten(ids, &mut flat);
        if flat.is_empty() {
            return Err(args.invalid("`id` must not be empty"));
        }
        out.push(Token::from_static("ID"));
        out.extend(flat);
    }
    Ok(())
}

static TRACKING_MODIFIERS: &[Modifier] = &[
    Modifier::value("REDIRECT"),
    Modifier::repeated("PREFIX"),
    Modifier::flag("BCAST"),
    Modifier::flag("OPTIN"),
    Modifier::flag("OPTOUT"),
    Modifier::flag("NOLOOP"),
];

fn tracking(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    let command = args.command();
    out.push(args.keyword("switch", ON_OFF)?);
    let modifiers = Modifiers::collect(TRACKING_MODIFIERS, args)?;
    modifiers.exclusive(command, &["OPTIN", "OPTOUT"])?;
    modifiers.exclusive(command, &["BCAST", "OPTIN"])?;
    modifiers.exclusive(command, &["BCAST", "OPTOUT"])?;
    modifiers.requires(command, "PREFIX", "BCAST")?;
    modifiers.render(out);
    Ok(())
}

fn parse_client(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("INFO") => to_client_info(reply),
        Some("LIST") => to_client_list(reply),
        Some("TRACKINGINFO") => to_map(reply),
        Some("UNBLOCK") => to_bool(reply),
        _ => identity(command, reply),
    }
}

fn client_text(value: Value) -> Result<Bytes, Error> {
    value
        .into_bytes()
        .ok_or(Error::UnexpectedResponse("expected a client description string"))
}

/// One `name=value name=value ..` line as a map of strings.
fn client_fields(line: &[u8]) -> Response {
    let mut out = Vec::new();
    for field in line.split(u8::is_ascii_whitespace).filter(|f| !f.is_empty()) {
        let (name, value) = match field.iter().position(|&b| b == b'=') {
            Some(i) => (&field[..i], &field[i + 1..]),
            None => (field, &b""[..]),
        };
        insert(
            &mut out,
            Response::Bytes(Bytes::copy_from_slice(name)),
            Response::Bytes(Bytes::copy_from_slice(value)),
        );
    }
    Response::Map(out)
}

fn to_client_info(value: Value) -> Result<Response, Error> {
    if value.is_null() {
        return Ok(Response::Nil);
    }
    Ok(client_fields(&client_text(value)?))
}

fn to_client_list(value: Value) -> Result<Response, Error> {
    let text = client_text(value)?;
    Ok(Response::List(
        text.split(|&b| b == b'\n')
            .filter(|line| !line.trim_ascii().is_empty())
            .map(client_fields)
            .collect(),
    ))
}
