//! `CONFIG` subcommands.

use resp_proto::{Token, Value};

use crate::arg::{Arg, Args};
use crate::builder;
use crate::command::{Command, CommandSpec};
use crate::commands::subcommand;
use crate::error::Error;
use crate::reply::{identity, to_map};
use crate::response::Response;

pub(crate) static COMMANDS: &[CommandSpec] = &[CommandSpec::new("CONFIG", config, parse_config)];

fn config(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, &["GET", "SET", "RESETSTAT", "REWRITE"])?;
    let mut out = vec![sub.clone()];
    if sub == "GET" {
        let patterns = args.rest();
        if patterns.is_empty() {
            return Err(args.invalid("GET expects at least one parameter pattern"));
        }
        out.extend(patterns);
    } else if sub == "SET" {
        set(args, &mut out)?;
    }
    args.finish()?;
    Ok(out)
}

/// `SET param value [param value ..]` from a map or flat pairs.
fn set(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    let command = args.command();
    let pairs = match args.take_rest() {
        [] => Vec::new(),
        [single @ Arg::Map(_)] => builder::pairs(command, "parameters", single)?,
        rest => builder::pairs(command, "parameters", &Arg::List(rest.to_vec()))?,
    };
    if pairs.is_empty() {
        return Err(args.invalid("SET expects at least one parameter and value"));
    }
    for (name, value) in pairs {
        out.extend([name, value]);
    }
    Ok(())
}

fn parse_config(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("GET") => to_map(reply),
        _ => identity(command, reply),
    }
}
