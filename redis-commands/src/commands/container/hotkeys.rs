//! `HOTKEYS` subcommands: sampling of frequently accessed keys.

use std::slice;

use resp_proto::{Token, Value};

use crate::arg::{Arg, Args};
use crate::builder::{self, counted_block, one_of};
use crate::command::{Command, CommandSpec};
use crate::commands::subcommand;
use crate::error::Error;
use crate::reply::{identity, to_map};
use crate::response::Response;

const METRICS: &[&str] = &["CPU", "NET"];

pub(crate) static COMMANDS: &[CommandSpec] = &[CommandSpec::new("HOTKEYS", hotkeys, parse_hotkeys)];

fn hotkeys(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, &["START", "STOP", "RESET", "GET"])?;
    let mut out = vec![sub.clone()];
    if sub == "START" {
        start(args, &mut out)?;
    }
    args.finish()?;
    Ok(out)
}

/// `START METRICS n metric.. [COUNT k] [DURATION s] [SAMPLE ratio] [SLOTS n slot..]`.
fn start(args: &mut Args<'_>, out: &mut Vec<Token>) -> Result<(), Error> {
    let command = args.command();
    let options = args.options()?;
    options.check(&["metrics", "count", "duration", "sample", "slots"])?;

    let metrics = match options.get("metrics") {
        Some(Arg::List(items)) => items.as_slice(),
        Some(single) => slice::from_ref(single),
        None => &[],
    };
    if metrics.is_empty() {
        return Err(args.invalid("START requires at least one metric. Accepted values: CPU, NET"));
    }
    let metrics = metrics
        .iter()
        .map(|metric| one_of(command, "metric", metric, METRICS))
        .collect::<Result<Vec<_>, _>>()?;
    counted_block(out, "METRICS", metrics);

    if let Some(count) = options.int("count")? {
        if !(10..=64).contains(&count) {
            return Err(args.invalid("`count` must be between 10 and 64"));
        }
        out.extend([Token::from_static("COUNT"), Token::Int(count)]);
    }
    if let Some(duration) = options.int("duration")? {
        if duration < 0 {
            return Err(args.invalid("`duration` must not be negative"));
        }
        out.extend([Token::from_static("DURATION"), Token::Int(duration)]);
    }
    if let Some(sample) = options.int("sample")? {
        if sample <= 0 {
            return Err(args.invalid("`sample` must be greater than 0"));
        }
        out.extend([Token::from_static("SAMPLE"), Token::Int(sample)]);
    }
    if let Some(slots) = options.get("slots") {
        let mut flat = Vec::new();
        builder::flatten(slots, &mut flat);
        if flat.is_empty() {
            return Err(args.invalid("`slots` must not be empty"));
        }
        counted_block(out, "SLOTS", flat);
    }
    Ok(())
}

fn parse_hotkeys(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("GET") => to_map(reply),
        _ => identity(command, reply),
    }
}
