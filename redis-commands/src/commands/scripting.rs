//! Scripts, functions and triggered functions.

use resp_proto::{Token, Value};

use super::subcommand;
use crate::arg::{Arg, Args};
use crate::builder;
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::{identity, to_bool, to_list_with};
use crate::response::Response;

/// `numkeys` sits right after the script, function or SHA.
const SCRIPT_KEYS: KeySpec = KeySpec::Counted { at: 1 };

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("EVAL", script_call, identity).keys(SCRIPT_KEYS),
    CommandSpec::new("EVAL_RO", script_call, identity).keys(SCRIPT_KEYS),
    CommandSpec::new("EVALSHA", script_call, identity).keys(SCRIPT_KEYS),
    CommandSpec::new("EVALSHA_RO", script_call, identity).keys(SCRIPT_KEYS),
    CommandSpec::new("FCALL", script_call, identity).keys(SCRIPT_KEYS),
    CommandSpec::new("FCALL_RO", script_call, identity).keys(SCRIPT_KEYS),
    CommandSpec::new("TFCALL", script_call, identity).keys(SCRIPT_KEYS),
    CommandSpec::new("TFCALLASYNC", script_call, identity).keys(SCRIPT_KEYS),
    CommandSpec::new("SCRIPT", script, parse_script),
];

/// `body numkeys key .. arg ..`. Keys come either as a list, whose length
/// becomes `numkeys`, or as an explicit count followed by flat arguments.
fn script_call(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("script")?];
    match args.next_arg() {
        None | Some(Arg::Null) => out.push(Token::Int(0)),
        Some(Arg::Int(n)) => {
            let rest = args.rest();
            if *n < 0 || *n as usize > rest.len() {
                return Err(args.invalid("numkeys exceeds the number of arguments"));
            }
            out.push(Token::Int(*n));
            out.extend(rest);
            return Ok(out);
        }
        Some(keys) => {
            let mut flat = Vec::new();
            builder::flatten(keys, &mut flat);
            builder::count_prefixed(&mut out, flat);
        }
    }
    out.extend(args.rest());
    Ok(out)
}

fn script(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, &["LOAD", "EXISTS", "FLUSH", "KILL"])?;
    let mut out = vec![sub.clone()];
    if sub == "LOAD" {
        out.push(args.token("script")?);
    } else if sub == "EXISTS" {
        out.extend(args.list("sha1")?);
        out.extend(args.rest());
    } else if sub == "FLUSH" {
        out.extend(args.opt_keyword("mode", &["ASYNC", "SYNC"])?);
    }
    args.finish()?;
    Ok(out)
}

fn parse_script(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("EXISTS") => to_list_with(reply, to_bool),
        _ => identity(command, reply),
    }
}
