//! `TFUNCTION` subcommands for triggers and functions libraries.

use resp_proto::{Token, Value};

use crate::arg::{Arg, Args};
use crate::command::{Command, CommandSpec};
use crate::commands::subcommand;
use crate::commands::vector::to_json;
use crate::error::Error;
use crate::reply::{identity, to_maps};
use crate::response::Response;

pub(crate) static COMMANDS: &[CommandSpec] =
    &[CommandSpec::new("TFUNCTION", tfunction, parse_tfunction)];

fn tfunction(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, &["LOAD", "DELETE", "LIST"])?;
    let mut out = vec![sub.clone()];
    match sub.as_bytes().unwrap_or_default() {
        b"LOAD" => load(args, &mut out)?,
        b"DELETE" => out.push(args.token("library")?),
        b"LIST" => list(args, &mut out)?,
        _ => {}
    }
    args.finish()?;
    Ok(out)
}

/// `LOAD [REPLACE] [CONFIG json] code`; a map config is serialized to JSON.
fn load(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    let code = args.token("code")?;
    if args.flag("REPLACE")? {
        out.push(Token::from_static("REPLACE"));
    }
    match args.next_arg() {
        None | Some(Arg::Null) => {}
        Some(config @ Arg::Map(_)) => {
            out.push(Token::from_static("CONFIG"));
            out.push(Token::from(to_json(config).to_string()));
        }
        Some(Arg::Bytes(config)) => {
            out.push(Token::from_static("CONFIG"));
            out.push(Token::Bulk(config.clone()));
        }
        Some(_) => return Err(args.invalid("`config` must be a JSON string or a map")),
    }
    out.push(code);
    Ok(())
}

/// `LIST [WITHCODE] [LIBRARY name] [v|vv|vvv]`.
fn list(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    let options = args.options()?;
    options.check(&["withcode", "verbose", "library"])?;
    if options.flag("withcode") {
        out.push(Token::from_static("WITHCODE"));
    }
    if let Some(library) = options.token("library")? {
        out.extend([Token::from_static("LIBRARY"), library]);
    }
    match options.int("verbose")?.unwrap_or(0) {
        0 => {}
        level @ 1..=3 => out.push(Token::from("v".repeat(level as usize))),
        _ => return Err(args.invalid("`verbose` must be between 0 and 3")),
    }
    Ok(())
}

fn parse_tfunction(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("LIST") => to_maps(reply),
        _ => identity(command, reply),
    }
}
