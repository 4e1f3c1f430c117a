//! Pub/Sub commands. Channel names are prefixed like keys.

use resp_proto::{Token, Value};

use super::{passthrough, subcommand, variadic};
use crate::arg::Args;
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::{identity, to_int, to_map_with, to_vec};
use crate::response::Response;

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("PUBLISH", publish, identity).keys(KeySpec::First),
    CommandSpec::new("SPUBLISH", publish, identity).keys(KeySpec::First),
    CommandSpec::new("SUBSCRIBE", variadic, parse_subscription).keys(KeySpec::All),
    CommandSpec::new("PSUBSCRIBE", variadic, parse_subscription).keys(KeySpec::All),
    CommandSpec::new("SSUBSCRIBE", variadic, parse_subscription).keys(KeySpec::All),
    CommandSpec::new("UNSUBSCRIBE", passthrough, parse_subscription).keys(KeySpec::All),
    CommandSpec::new("PUNSUBSCRIBE", passthrough, parse_subscription).keys(KeySpec::All),
    CommandSpec::new("SUNSUBSCRIBE", passthrough, parse_subscription).keys(KeySpec::All),
    CommandSpec::new("PUBSUB", pubsub, parse_pubsub).keys(KeySpec::From(1)),
];

fn publish(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let out = vec![args.token("channel")?, args.token("message")?];
    args.finish()?;
    Ok(out)
}

/// Subscription replies must be `[action, channel, count]`.
fn parse_subscription(_: &Command, reply: Value) -> Result<Response, Error> {
    let mut items = to_vec(reply)?.into_iter();
    match (items.next(), items.next(), items.next(), items.next()) {
        (Some(action), Some(channel), Some(count), None) if action.as_bytes().is_some() => {
            Ok(Response::List(vec![
                Response::from(action),
                Response::from(channel),
                to_int(count)?,
            ]))
        }
        _ => Err(Error::UnexpectedResponse(
            "expected an [action, channel, count] subscription reply",
        )),
    }
}

const PUBSUB_SUBCOMMANDS: &[&str] = &[
    "CHANNELS",
    "NUMSUB",
    "NUMPAT",
    "SHARDCHANNELS",
    "SHARDNUMSUB",
];

fn pubsub(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, PUBSUB_SUBCOMMANDS)?;
    let mut out = vec![sub.clone()];
    if sub == "CHANNELS" || sub == "SHARDCHANNELS" {
        out.extend(args.opt_token("pattern")?);
        args.finish()?;
    } else if sub == "NUMPAT" {
        args.finish()?;
    } else {
        out.extend(args.rest());
    }
    Ok(out)
}

/// `NUMSUB` and `SHARDNUMSUB` become `{channel: subscribers}`.
fn parse_pubsub(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("NUMSUB" | "SHARDNUMSUB") => to_map_with(reply, to_int),
        _ => identity(command, reply),
    }
}
