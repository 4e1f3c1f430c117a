//! Command definitions and built command instances.

use std::fmt;

use resp_proto::{Protocol, Request, Token, Value};

use crate::arg::{Arg, Args};
use crate::error::{Error, ServerError};
use crate::prefix::KeySpec;
use crate::response::Response;

/// Turns caller arguments into the wire tokens that follow the command name.
///
/// Filters must be deterministic: the same input always yields the same tokens.
pub type Filter = fn(&mut Args<'_>) -> Result<Vec<Token>, Error>;

/// Turns a non-error reply into the caller-facing result. Parsers branch on
/// the modifiers the filter recorded, never on raw tokens, since a key or
/// member may spell the same word.
pub type Parser = fn(&Command, Value) -> Result<Response, Error>;

/// The static definition of one command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Canonical uppercase identifier, also the wire name.
    pub id: &'static str,
    pub filter: Filter,
    pub parse: Parser,
    /// Replaces `parse` on RESP3 connections when present.
    pub parse_resp3: Option<Parser>,
    /// Which tokens are keys, for prefixing.
    pub keys: KeySpec,
}

impl CommandSpec {
    pub const fn new(id: &'static str, filter: Filter, parse: Parser) -> Self {
        Self {
            id,
            filter,
            parse,
            parse_resp3: None,
            keys: KeySpec::None,
        }
    }

    pub const fn resp3(self, parser: Parser) -> Self {
        Self {
            parse_resp3: Some(parser),
            ..self
        }
    }

    pub const fn keys(self, keys: KeySpec) -> Self {
        Self { keys, ..self }
    }

    /// Run the argument filter.
    pub fn build(&self, args: &[Arg]) -> Result<Vec<Token>, Error> {
        let mut cursor = Args::new(self.id, args);
        (self.filter)(&mut cursor)
    }

    /// Run the argument filter, keeping the modifiers it recorded for the
    /// parser.
    pub fn command(&'static self, args: &[Arg]) -> Result<Command, Error> {
        let mut cursor = Args::new(self.id, args);
        let tokens = (self.filter)(&mut cursor)?;
        Ok(Command::new(self, tokens).with_flags(cursor.into_flags()))
    }

    /// The parser for `protocol`.
    pub fn parser(&self, protocol: Protocol) -> Parser {
        match (protocol, self.parse_resp3) {
            (Protocol::Resp3, Some(parser)) => parser,
            _ => self.parse,
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("id", &self.id)
            .field("resp3", &self.parse_resp3.is_some())
            .field("keys", &self.keys)
            .finish()
    }
}

/// A command built for one round-trip: its definition, the tokens produced
/// by the filter and the modifiers the filter recorded.
#[derive(Debug, Clone)]
pub struct Command {
    spec: &'static CommandSpec,
    args: Vec<Token>,
    flags: Vec<&'static str>,
}

impl Command {
    pub fn new(spec: &'static CommandSpec, args: Vec<Token>) -> Self {
        Self {
            spec,
            args,
            flags: Vec::new(),
        }
    }

    pub fn with_flags(self, flags: Vec<&'static str>) -> Self {
        Self { flags, ..self }
    }

    #[inline]
    pub fn id(&self) -> &'static str {
        self.spec.id
    }

    #[inline]
    pub fn spec(&self) -> &'static CommandSpec {
        self.spec
    }

    /// The wire tokens following the command name.
    #[inline]
    pub fn args(&self) -> &[Token] {
        &self.args
    }

    pub fn into_args(self) -> Vec<Token> {
        self.args
    }

    /// The request to hand to a transport.
    pub fn request(&self) -> Request {
        Request::new(self.spec.id, self.args.clone())
    }

    /// The uppercased first token, for container commands.
    pub fn subcommand(&self) -> Option<String> {
        let first = self.args.first()?.as_bytes()?;
        Some(String::from_utf8_lossy(first).to_ascii_uppercase())
    }

    /// The modifiers recorded by the filter, in emission order.
    #[inline]
    pub fn flags(&self) -> &[&'static str] {
        &self.flags
    }

    /// Whether the filter recorded modifier `flag`.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    /// How many times the filter recorded modifier `flag`.
    pub fn count_flag(&self, flag: &str) -> usize {
        self.flags
            .iter()
            .filter(|f| f.eq_ignore_ascii_case(flag))
            .count()
    }

    /// Reshape `reply` with the parser matching `protocol`. Error replies are
    /// returned as [`Error::Server`] without reaching the parser.
    pub fn parse(&self, reply: Value, protocol: Protocol) -> Result<Response, Error> {
        if let Value::Error(text) = reply {
            return Err(Error::Server(ServerError::from(text)));
        }
        (self.spec.parser(protocol))(self, reply)
    }

    /// Prepend `prefix` to every key token. Must be applied once per command.
    pub fn prefix_keys(&mut self, prefix: &[u8]) {
        self.spec.keys.apply(&mut self.args, prefix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args, reply, tokens};

    fn filter(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
        Ok(args.rest())
    }

    fn resp3_marker(_: &Command, _: Value) -> Result<Response, Error> {
        Ok(Response::status("RESP3"))
    }

    static ECHO: CommandSpec = CommandSpec::new("ECHO", filter, reply::identity);
    static DUAL: CommandSpec =
        CommandSpec::new("DUAL", filter, reply::identity).resp3(resp3_marker);
    static KEYED: CommandSpec =
        CommandSpec::new("KEYED", filter, reply::identity).keys(KeySpec::First);

    #[test]
    fn test_build_and_request() {
        let tokens = ECHO.build(&args!["hi"]).unwrap();
        let command = Command::new(&ECHO, tokens);
        assert_eq!(command.request(), Request::new("ECHO", tokens!["hi"]));
    }

    #[test]
    fn test_error_reply_never_reaches_parser() {
        let command = Command::new(&DUAL, Vec::new());
        let err = command
            .parse(Value::error(b"ERR unknown"), Protocol::Resp3)
            .unwrap_err();
        assert_eq!(err.as_server().unwrap().as_str(), "ERR unknown");
    }

    #[test]
    fn test_parser_selection() {
        let command = Command::new(&DUAL, Vec::new());
        assert_eq!(
            command.parse(Value::integer(1), Protocol::Resp3).unwrap(),
            Response::status("RESP3")
        );
        assert_eq!(
            command.parse(Value::integer(1), Protocol::Resp2).unwrap(),
            Response::Int(1)
        );
    }

    fn marking(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
        let tokens = args.rest();
        args.mark_if(tokens.len() > 1, "WITHSCORES");
        Ok(tokens)
    }

    static MARKING: CommandSpec = CommandSpec::new("MARKING", marking, reply::identity);

    #[test]
    fn test_flags_come_from_the_filter() {
        let command = Command::new(&ECHO, tokens!["get", "x", "WITHSCORES"]);
        assert_eq!(command.subcommand().as_deref(), Some("GET"));
        assert!(!command.has_flag("WITHSCORES"));
        assert_eq!(command.count_flag("GET"), 0);

        let command = MARKING.command(&args!["withscores"]).unwrap();
        assert!(!command.has_flag("WITHSCORES"));
        let command = MARKING.command(&args!["k", "v"]).unwrap();
        assert!(command.has_flag("withscores"));
        assert_eq!(command.flags(), ["WITHSCORES"]);
    }

    #[test]
    fn test_prefix_keys() {
        let mut command = Command::new(&KEYED, tokens!["key", "value"]);
        command.prefix_keys(b"p:");
        assert_eq!(command.args(), &tokens!["p:key", "value"][..]);
    }
}
