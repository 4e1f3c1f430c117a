//! Lookup of command definitions by identifier.

use std::collections::HashMap;
use std::sync::OnceLock;

use resp_proto::{Protocol, Token, Value};
use tracing::debug;

use crate::arg::Arg;
use crate::command::{Command, CommandSpec};
use crate::commands::FAMILIES;
use crate::error::Error;
use crate::response::Response;

/// Maps command identifiers to their definitions.
///
/// Identifiers are matched exactly (uppercase). A container subcommand can be
/// addressed as `"PARENT CHILD"`, e.g. `"CONFIG GET"`, which resolves to the
/// `CONFIG` definition with `GET` as the first argument.
#[derive(Debug, Clone)]
pub struct Registry {
    commands: HashMap<&'static str, &'static CommandSpec>,
}

impl Registry {
    /// A registry holding every built-in definition.
    pub fn new() -> Self {
        let mut commands = HashMap::new();
        for family in FAMILIES {
            for spec in family.iter() {
                commands.insert(spec.id, spec);
            }
        }
        Self { commands }
    }

    /// The shared, immutable registry of built-in definitions.
    pub fn builtin() -> &'static Registry {
        static BUILTIN: OnceLock<Registry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let registry = Registry::new();
            debug!(commands = registry.len(), "command registry initialised");
            registry
        })
    }

    /// Add a definition, replacing any existing one with the same identifier.
    pub fn define(&mut self, spec: &'static CommandSpec) -> &mut Self {
        self.commands.insert(spec.id, spec);
        self
    }

    pub fn get(&self, id: &str) -> Option<&'static CommandSpec> {
        self.commands.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Identifiers of every registered definition, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// The definition for `id`, plus the subcommand when `id` is a
    /// `"PARENT CHILD"` alias.
    fn resolve<'i>(&self, id: &'i str) -> Result<(&'static CommandSpec, Option<&'i str>), Error> {
        if let Some(spec) = self.get(id) {
            return Ok((spec, None));
        }
        id.split_once(' ')
            .and_then(|(parent, child)| Some((self.get(parent)?, Some(child))))
            .ok_or_else(|| Error::UnsupportedCommand(id.to_string()))
    }

    /// Resolve `id` and run its filter over `args`.
    pub fn create(&self, id: &str, mut args: Vec<Arg>) -> Result<Command, Error> {
        let (spec, child) = self.resolve(id)?;
        if let Some(child) = child {
            args.insert(0, Arg::from(child));
        }
        spec.command(&args)
    }

    /// The wire tokens for `id` called with `args`.
    pub fn build(&self, id: &str, args: Vec<Arg>) -> Result<Vec<Token>, Error> {
        self.create(id, args).map(Command::into_args)
    }

    /// Build `id` and reshape `reply` with its parser for `protocol`.
    pub fn parse(
        &self,
        id: &str,
        args: Vec<Arg>,
        reply: Value,
        protocol: Protocol,
    ) -> Result<Response, Error> {
        self.create(id, args)?.parse(reply, protocol)
    }

    /// Build `id` with every key argument prefixed.
    pub fn build_prefixed(&self, id: &str, args: Vec<Arg>, prefix: &[u8]) -> Result<Vec<Token>, Error> {
        let mut command = self.create(id, args)?;
        command.prefix_keys(prefix);
        Ok(command.into_args())
    }

    /// Prefix the key tokens of an already built `id` without running its
    /// filter again. For a `"PARENT CHILD"` alias the tokens start with the
    /// subcommand, as [`build`](Self::build) returns them.
    pub fn prefix_tokens(
        &self,
        id: &str,
        mut tokens: Vec<Token>,
        prefix: &[u8],
    ) -> Result<Vec<Token>, Error> {
        let (spec, _) = self.resolve(id)?;
        spec.keys.apply(&mut tokens, prefix);
        Ok(tokens)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::KeySpec;
    use crate::reply::identity;
    use crate::{args, tokens};

    fn shout(args: &mut crate::arg::Args<'_>) -> Result<Vec<Token>, Error> {
        Ok(args.rest())
    }

    static SHOUT: CommandSpec = CommandSpec::new("SHOUT", shout, identity).keys(KeySpec::First);

    #[test]
    fn test_builtin_is_shared_and_populated() {
        let a = Registry::builtin();
        let b = Registry::builtin();
        assert!(std::ptr::eq(a, b));
        assert!(a.len() >= 150);
        for id in ["GET", "SET", "ZADD", "XADD", "CONFIG", "VSIM", "HOTKEYS"] {
            assert!(a.contains(id), "{id} missing");
        }
    }

    #[test]
    fn test_unknown_command() {
        let err = Registry::builtin().create("NOPE", args![]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCommand(ref id) if id == "NOPE"));
        assert!(matches!(
            Registry::builtin().create("NOPE GET", args![]),
            Err(Error::UnsupportedCommand(_))
        ));
    }

    #[test]
    fn test_ids_are_case_sensitive() {
        assert!(matches!(
            Registry::builtin().create("get", args!["k"]),
            Err(Error::UnsupportedCommand(_))
        ));
    }

    #[test]
    fn test_container_alias() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.build("CONFIG GET", args!["maxmemory"]).unwrap(),
            registry.build("CONFIG", args!["GET", "maxmemory"]).unwrap()
        );
        let command = registry.create("XINFO GROUPS", args!["s"]).unwrap();
        assert_eq!(command.id(), "XINFO");
        assert_eq!(command.args(), &tokens!["GROUPS", "s"][..]);
    }

    #[test]
    fn test_define_overrides() {
        let mut registry = Registry::new();
        let before = registry.len();
        registry.define(&SHOUT);
        assert_eq!(registry.len(), before + 1);
        assert_eq!(
            registry.build_prefixed("SHOUT", args!["k", "v"], b"app:").unwrap(),
            tokens!["app:k", "v"]
        );
        assert!(!Registry::builtin().contains("SHOUT"));
    }

    #[test]
    fn test_free_operations() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.parse("CONFIG", args!["GET", "loglevel"], Value::array(vec![
                Value::from("loglevel"),
                Value::from("verbose"),
            ]), Protocol::Resp2)
            .unwrap(),
            Response::map([("loglevel", "verbose")])
        );
    }

    #[test]
    fn test_prefix_tokens_skips_the_filter() {
        let registry = Registry::builtin();
        let built = registry.build("SINTERSTORE", args!["dst", ["k1", "k2"]]).unwrap();
        assert_eq!(
            registry.prefix_tokens("SINTERSTORE", built, b"p:").unwrap(),
            tokens!["p:dst", "p:k1", "p:k2"]
        );
        // Tokens a filter would reject are still rewritten by position.
        assert_eq!(
            registry.prefix_tokens("GET", tokens!["k", "extra"], b"p:").unwrap(),
            tokens!["p:k", "extra"]
        );
        let built = registry.build("XINFO GROUPS", args!["s"]).unwrap();
        assert_eq!(
            registry.prefix_tokens("XINFO GROUPS", built, b"p:").unwrap(),
            tokens!["GROUPS", "p:s"]
        );
        assert!(matches!(
            registry.prefix_tokens("NOPE", tokens!["k"], b"p:"),
            Err(Error::UnsupportedCommand(_))
        ));
    }
}
