//! Command definitions, one module per command family.
//!
//! Each family exposes a static `COMMANDS` table of [`CommandSpec`]s; the
//! registry loads every table listed in [`FAMILIES`].

use resp_proto::Token;

use crate::arg::Args;
use crate::command::CommandSpec;
use crate::error::Error;

mod bitmap;
mod container;
mod geo;
mod hash;
mod key;
mod list;
mod pubsub;
mod scripting;
mod server;
mod set;
mod stream;
mod string;
mod vector;
mod zset;

/// Every built-in command table.
pub(crate) static FAMILIES: &[&[CommandSpec]] = &[
    string::COMMANDS,
    key::COMMANDS,
    list::COMMANDS,
    hash::COMMANDS,
    set::COMMANDS,
    zset::COMMANDS,
    geo::COMMANDS,
    stream::COMMANDS,
    pubsub::COMMANDS,
    scripting::COMMANDS,
    bitmap::COMMANDS,
    vector::COMMANDS,
    server::COMMANDS,
    container::acl::COMMANDS,
    container::client::COMMANDS,
    container::config::COMMANDS,
    container::function::COMMANDS,
    container::hotkeys::COMMANDS,
    container::tfunction::COMMANDS,
    container::xgroup::COMMANDS,
    container::xinfo::COMMANDS,
];

/// Every argument flattened in call order.
pub(crate) fn passthrough(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    Ok(args.rest())
}

/// Every argument flattened in call order; at least one token is required.
pub(crate) fn variadic(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let tokens = args.rest();
    if tokens.is_empty() {
        return Err(args.invalid("expects at least one argument"));
    }
    Ok(tokens)
}

/// A leading key followed by at least one more flattened argument.
pub(crate) fn key_variadic(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    let rest = args.rest();
    if rest.is_empty() {
        return Err(args.invalid("expects at least one value after the key"));
    }
    out.extend(rest);
    Ok(out)
}

/// The uppercased first argument, for commands that dispatch on a subcommand.
pub(crate) fn subcommand(args: &mut Args<'_>, accepted: &[&'static str]) -> Result<Token, Error> {
    let arg = args.required("subcommand")?;
    crate::builder::one_of(args.command(), "subcommand", arg, accepted)
}

#[cfg(test)]
pub(crate) mod test_util {
    use bytes::Bytes;
    use resp_proto::{Protocol, Token, Value};

    use crate::arg::Arg;
    use crate::command::Command;
    use crate::error::Error;
    use crate::registry::Registry;
    use crate::response::Response;

    pub(crate) fn command(id: &str, args: Vec<Arg>) -> Command {
        Registry::builtin()
            .create(id, args)
            .unwrap_or_else(|e| panic!("{id}: {e}"))
    }

    pub(crate) fn build(id: &str, args: Vec<Arg>) -> Result<Vec<Token>, Error> {
        Registry::builtin().create(id, args).map(Command::into_args)
    }

    pub(crate) fn build_err(id: &str, args: Vec<Arg>) -> String {
        match build(id, args) {
            Ok(tokens) => panic!("{id}: expected an error, built {tokens:?}"),
            Err(e) => e.to_string(),
        }
    }

    pub(crate) fn parse(id: &str, args: Vec<Arg>, reply: Value) -> Response {
        command(id, args).parse(reply, Protocol::Resp2).unwrap()
    }

    pub(crate) fn parse3(id: &str, args: Vec<Arg>, reply: Value) -> Response {
        command(id, args).parse(reply, Protocol::Resp3).unwrap()
    }

    pub(crate) fn prefixed(id: &str, args: Vec<Arg>) -> Vec<Token> {
        let mut command = command(id, args);
        command.prefix_keys(b"p:");
        command.into_args()
    }

    pub(crate) fn b(s: &str) -> Value {
        Value::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }

    pub(crate) fn arr(items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    pub(crate) fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    pub(crate) fn bulks(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| b(s)).collect())
    }
}
