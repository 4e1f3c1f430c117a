//! Execution façade: build a command, hand it to a transport, reshape the
//! reply.
//!
//! The client owns no connection logic. A [`Transport`] sends one
//! [`Request`] at a time and returns the decoded [`Value`]; framing, pooling
//! and reconnection belong to the transport.
//!
//! # Example
//!
//! ```no_run
//! use redis_commands::{Client, Error, Response, Transport, args};
//!
//! async fn example<T: Transport>(transport: T) -> Result<(), Error> {
//!     let mut client = Client::builder(transport).prefix("app:").build();
//!     client.execute("SET", args!["greeting", "hello"]).await?;
//!     let value = client.execute("GET", args!["greeting"]).await?;
//!     assert_eq!(value, Response::from("hello"));
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::time::Instant;

use bytes::Bytes;
use resp_proto::{Protocol, Request, Value};
use tracing::trace;

use crate::arg::Arg;
use crate::command::Command;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::registry::Registry;
use crate::response::Response;

#[cfg(feature = "metrics")]
use crate::metrics::ClientMetrics;

/// Callback type for per-command result notifications.
type ResultCallback = Box<dyn Fn(&CommandResult)>;

/// Sends requests to a server and returns decoded replies.
pub trait Transport {
    /// Send `request` and wait for its reply. Server error replies are
    /// returned as [`Value::Error`], not as `Err`.
    fn send(&mut self, request: Request) -> impl Future<Output = Result<Value, Error>>;

    /// The reply protocol negotiated on this connection.
    fn protocol(&self) -> Protocol {
        Protocol::Resp2
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, request: Request) -> impl Future<Output = Result<Value, Error>> {
        (**self).send(request)
    }

    fn protocol(&self) -> Protocol {
        (**self).protocol()
    }
}

/// Result metadata for a completed command, passed to the `on_result` callback.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The command identifier.
    pub command: &'static str,
    /// Latency in nanoseconds (send → reply parsed).
    pub latency_ns: u64,
    /// Whether the command produced a result.
    pub success: bool,
    /// Whether the server answered with an error reply.
    pub server_error: bool,
}

// ── ClientBuilder ───────────────────────────────────────────────────────

/// Builder for a [`Client`] with a prefix, protocol override, callbacks and
/// metrics.
pub struct ClientBuilder<T> {
    transport: T,
    config: ClientConfig,
    registry: &'static Registry,
    on_result: Option<ResultCallback>,
    #[cfg(feature = "metrics")]
    with_metrics: bool,
}

impl<T: Transport> ClientBuilder<T> {
    fn new(transport: T) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
            registry: Registry::builtin(),
            on_result: None,
            #[cfg(feature = "metrics")]
            with_metrics: false,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Prefix every key with `prefix`.
    pub fn prefix(mut self, prefix: impl Into<Bytes>) -> Self {
        self.config.prefix = Some(prefix.into());
        self
    }

    /// Select parsers for `protocol` instead of asking the transport.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.config.protocol = Some(protocol);
        self
    }

    /// Resolve commands in `registry` instead of the built-in one.
    pub fn registry(mut self, registry: &'static Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a callback invoked after each command completes.
    pub fn on_result<F: Fn(&CommandResult) + 'static>(mut self, f: F) -> Self {
        self.on_result = Some(Box::new(f));
        self
    }

    /// Enable built-in histogram tracking (requires `metrics` feature).
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self) -> Self {
        self.with_metrics = true;
        self
    }

    pub fn build(self) -> Client<T> {
        Client {
            transport: self.transport,
            config: self.config,
            registry: self.registry,
            on_result: self.on_result,
            #[cfg(feature = "metrics")]
            metrics: self.with_metrics.then(ClientMetrics::new),
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────────

/// Executes registry commands over a [`Transport`].
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
    registry: &'static Registry,
    on_result: Option<ResultCallback>,
    #[cfg(feature = "metrics")]
    metrics: Option<ClientMetrics>,
}

impl<T: Transport> Client<T> {
    /// A client using the built-in registry and the default configuration.
    pub fn new(transport: T) -> Self {
        ClientBuilder::new(transport).build()
    }

    pub fn builder(transport: T) -> ClientBuilder<T> {
        ClientBuilder::new(transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Returns a reference to the built-in metrics, if enabled.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> Option<&ClientMetrics> {
        self.metrics.as_ref()
    }

    /// Returns a mutable reference to the built-in metrics, if enabled.
    #[cfg(feature = "metrics")]
    pub fn metrics_mut(&mut self) -> Option<&mut ClientMetrics> {
        self.metrics.as_mut()
    }

    /// The protocol used to select reply parsers.
    pub fn protocol(&self) -> Protocol {
        self.config
            .protocol
            .unwrap_or_else(|| self.transport.protocol())
    }

    /// Build `id` with the configured prefix applied, without sending it.
    pub fn command(&self, id: &str, args: Vec<Arg>) -> Result<Command, Error> {
        let mut command = self.registry.create(id, args)?;
        if let Some(prefix) = self.config.key_prefix() {
            command.prefix_keys(prefix);
        }
        Ok(command)
    }

    /// Build, send and parse one command. Argument errors are returned
    /// before anything reaches the transport.
    pub async fn execute(&mut self, id: &str, args: Vec<Arg>) -> Result<Response, Error> {
        let command = self.command(id, args)?;
        self.run(&command).await
    }

    /// Send an already built command and parse its reply.
    pub async fn run(&mut self, command: &Command) -> Result<Response, Error> {
        trace!(command = command.id(), args = command.args().len(), "dispatching command");
        let start = Instant::now();
        let protocol = self.protocol();
        let result = match self.transport.send(command.request()).await {
            Ok(reply) => command.parse(reply, protocol),
            Err(e) => Err(e),
        };
        let latency_ns = start.elapsed().as_nanos() as u64;
        self.record(&CommandResult {
            command: command.id(),
            latency_ns,
            success: result.is_ok(),
            server_error: matches!(result, Err(Error::Server(_))),
        });
        result
    }

    /// Record a command result: invoke callback and update metrics.
    #[inline]
    fn record(&mut self, result: &CommandResult) {
        if let Some(ref cb) = self.on_result {
            cb(result);
        }
        #[cfg(feature = "metrics")]
        if let Some(ref mut m) = self.metrics {
            m.record(result);
        }
    }

    // ── Typed shortcuts ─────────────────────────────────────────────────

    /// Get the value of a key.
    pub async fn get(&mut self, key: impl Into<Arg>) -> Result<Option<Bytes>, Error> {
        match self.execute("GET", vec![key.into()]).await? {
            Response::Nil => Ok(None),
            Response::Bytes(value) => Ok(Some(value)),
            _ => Err(Error::UnexpectedResponse("expected a bulk string or nil")),
        }
    }

    /// Set a key-value pair.
    pub async fn set(&mut self, key: impl Into<Arg>, value: impl Into<Arg>) -> Result<(), Error> {
        self.execute("SET", vec![key.into(), value.into()]).await?;
        Ok(())
    }

    /// Delete keys. Returns the number of keys deleted.
    pub async fn del(&mut self, keys: impl Into<Arg>) -> Result<i64, Error> {
        self.execute("DEL", vec![keys.into()])
            .await?
            .as_int()
            .ok_or(Error::UnexpectedResponse("expected an integer"))
    }

    /// Ping the server.
    pub async fn ping(&mut self) -> Result<(), Error> {
        self.execute("PING", Vec::new()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::{args, tokens};

    #[derive(Default)]
    struct Scripted {
        sent: Vec<Request>,
        replies: VecDeque<Value>,
        protocol: Option<Protocol>,
    }

    impl Scripted {
        fn replying(replies: impl IntoIterator<Item = Value>) -> Self {
            Self {
                replies: replies.into_iter().collect(),
                ..Default::default()
            }
        }
    }

    impl Transport for Scripted {
        fn send(&mut self, request: Request) -> impl Future<Output = Result<Value, Error>> {
            self.sent.push(request);
            std::future::ready(self.replies.pop_front().ok_or(Error::ConnectionClosed))
        }

        fn protocol(&self) -> Protocol {
            self.protocol.unwrap_or(Protocol::Resp2)
        }
    }

    #[test]
    fn test_execute_prefixes_and_parses() {
        let mut transport = Scripted::replying([Value::integer(1)]);
        let mut client = Client::builder(&mut transport).prefix("app:").build();
        let reply = block_on(client.execute("HSETNX", args!["h", "f", "v"])).unwrap();
        assert_eq!(reply, Response::Bool(true));
        drop(client);
        assert_eq!(transport.sent[0].name(), b"HSETNX");
        assert_eq!(transport.sent[0].args(), &tokens!["app:h", "f", "v"][..]);
    }

    #[test]
    fn test_invalid_arguments_never_reach_transport() {
        let mut transport = Scripted::default();
        let mut client = Client::new(&mut transport);
        let err = block_on(client.execute("EXPIRE", args!["k", 10, "SOMETIMES"])).unwrap_err();
        assert!(err.is_invalid_argument());
        drop(client);
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn test_server_error_and_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut client = Client::builder(Scripted::replying([Value::error(b"WRONGTYPE bad")]))
            .on_result(move |r| log.borrow_mut().push((r.command, r.success, r.server_error)))
            .build();
        let err = block_on(client.execute("GET", args!["k"])).unwrap_err();
        assert_eq!(err.as_server().map(|e| e.code()), Some("WRONGTYPE"));
        assert_eq!(*seen.borrow(), vec![("GET", false, true)]);
    }

    #[test]
    fn test_protocol_override_selects_parser() {
        let transport = Scripted {
            protocol: Some(Protocol::Resp3),
            ..Default::default()
        };
        let client = Client::builder(transport).protocol(Protocol::Resp2).build();
        assert_eq!(client.protocol(), Protocol::Resp2);
        let client = Client::new(Scripted {
            protocol: Some(Protocol::Resp3),
            ..Default::default()
        });
        assert_eq!(client.protocol(), Protocol::Resp3);
    }

    #[test]
    fn test_typed_shortcuts() {
        let mut client = Client::new(Scripted::replying([
            Value::ok(),
            Value::bulk_string(b"v"),
            Value::Null,
            Value::integer(2),
        ]));
        block_on(client.set("k", "v")).unwrap();
        assert_eq!(block_on(client.get("k")).unwrap(), Some(Bytes::from_static(b"v")));
        assert_eq!(block_on(client.get("missing")).unwrap(), None);
        assert_eq!(block_on(client.del(["a", "b"])).unwrap(), 2);
        assert!(matches!(block_on(client.ping()), Err(Error::ConnectionClosed)));
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_metrics_record_each_command() {
        let mut client = Client::builder(Scripted::replying([Value::ok(), Value::error(b"ERR x")]))
            .with_metrics()
            .build();
        block_on(client.execute("PING", args![])).unwrap();
        assert!(block_on(client.execute("PING", args![])).is_err());
        let metrics = client.metrics().unwrap();
        assert_eq!(metrics.requests, 2);
        assert_eq!(metrics.server_errors, 1);
    }
}
