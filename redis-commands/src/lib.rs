//! Redis command definitions shared by every transport.
//!
//! Each command is a [`CommandSpec`]: a filter that turns loosely-typed
//! caller arguments into wire tokens, a parser that reshapes the reply, and a
//! description of which tokens are keys. The [`Registry`] maps identifiers to
//! definitions; [`Client`] runs them over any [`Transport`].
//!
//! - **Arguments**: [`Arg`] trees built with [`args!`] and [`opts!`], so a
//!   command accepts variadic scalars, a list, or an options map alike
//! - **Replies**: RESP2 and RESP3 replies reshape into the same [`Response`]
//! - **Prefixing**: a keyspace prefix is applied to key tokens only
//!
//! # Example
//!
//! ```
//! use redis_commands::{Protocol, Response, Value, args, opts, tokens};
//!
//! let built = redis_commands::build("ZADD", args!["z", opts! { "m1" => 1, "m2" => 2.5 }]).unwrap();
//! assert_eq!(built, tokens!["z", 1, "m1", 2.5, "m2"]);
//!
//! let built = redis_commands::build("MSET", args!["a", "1", "b", "2"]).unwrap();
//! let prefixed = redis_commands::prefix("MSET", built, b"app:").unwrap();
//! assert_eq!(prefixed, tokens!["app:a", "1", "app:b", "2"]);
//!
//! let reply = Value::array(vec![Value::from("loglevel"), Value::from("verbose")]);
//! let parsed = redis_commands::parse("CONFIG GET", args!["loglevel"], reply, Protocol::Resp2).unwrap();
//! assert_eq!(parsed, Response::map([("loglevel", "verbose")]));
//! ```

pub mod arg;
pub mod builder;
pub mod client;
pub mod command;
mod commands;
pub mod config;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod options;
pub mod prefix;
pub mod registry;
pub mod reply;
pub mod response;

pub use bytes::Bytes;
pub use resp_proto::{Protocol, Request, Token, Value, tokens};

pub use arg::{Arg, Args, Options};
pub use client::{Client, ClientBuilder, CommandResult, Transport};
pub use command::{Command, CommandSpec};
pub use config::ClientConfig;
pub use error::{Error, ServerError};
#[cfg(feature = "metrics")]
pub use metrics::ClientMetrics;
pub use prefix::{KeyPrefix, KeySpec};
pub use registry::Registry;
pub use response::Response;

/// The wire tokens for built-in command `id` called with `args`.
pub fn build(id: &str, args: Vec<Arg>) -> Result<Vec<Token>, Error> {
    Registry::builtin().build(id, args)
}

/// Build built-in command `id` and reshape `reply` for `protocol`. Error
/// replies become [`Error::Server`].
pub fn parse(id: &str, args: Vec<Arg>, reply: Value, protocol: Protocol) -> Result<Response, Error> {
    Registry::builtin().parse(id, args, reply, protocol)
}

/// Prefix the key tokens of built-in command `id`, already built with
/// [`build`], by `prefix`. Non-key tokens pass through unchanged.
pub fn prefix(id: &str, tokens: Vec<Token>, prefix: &[u8]) -> Result<Vec<Token>, Error> {
    Registry::builtin().prefix_tokens(id, tokens, prefix)
}
