//! Caller-supplied command arguments.
//!
//! Commands accept a loosely-typed argument tree ([`Arg`]) so that the same
//! definition can be called with variadic scalars, a single list, or an
//! associative options map. Filters walk the tree with the [`Args`] cursor.

use bytes::Bytes;
use resp_proto::Token;

use crate::builder;
use crate::error::Error;

/// One caller argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// An absent optional argument.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Bytes),
    /// An ordered list of arguments.
    List(Vec<Arg>),
    /// An ordered associative structure (options, field/value pairs).
    Map(Vec<(Bytes, Arg)>),
}

impl Arg {
    /// Build an associative argument from `(name, value)` pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Into<Arg>,
    {
        Arg::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Bytes::copy_from_slice(k.as_ref()), v.into()))
                .collect(),
        )
    }

    /// Build a list argument.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Arg>,
    {
        Arg::List(items.into_iter().map(Into::into).collect())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Arg::Null)
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Arg::Bool(_) | Arg::Int(_) | Arg::Float(_) | Arg::Bytes(_)
        )
    }

    /// Whether a flag-style argument is set: `true`, a non-zero number or any
    /// non-empty payload.
    pub fn truthy(&self) -> bool {
        match self {
            Arg::Null => false,
            Arg::Bool(b) => *b,
            Arg::Int(n) => *n != 0,
            Arg::Float(f) => *f != 0.0,
            Arg::Bytes(b) => !b.is_empty(),
            Arg::List(items) => !items.is_empty(),
            Arg::Map(entries) => !entries.is_empty(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Arg::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Interpret as an integer. Decimal strings are parsed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(n) => Some(*n),
            Arg::Bytes(b) => std::str::from_utf8(b).ok()?.parse().ok(),
            _ => None,
        }
    }

    /// Interpret as a float. Integers and numeric strings are accepted.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Arg::Int(n) => Some(*n as f64),
            Arg::Float(f) => Some(*f),
            Arg::Bytes(b) => std::str::from_utf8(b).ok()?.parse().ok(),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[Arg]> {
        match self {
            Arg::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&[(Bytes, Arg)]> {
        match self {
            Arg::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a map entry by option name. Matching ignores ASCII case and
    /// treats `_` and `-` as equal.
    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.as_map()?
            .iter()
            .find(|(k, _)| option_name_eq(k, name))
            .map(|(_, v)| v)
    }

    /// Returns true if this is a string equal to `literal`, ignoring ASCII case.
    #[inline]
    pub fn is_literal(&self, literal: &str) -> bool {
        matches!(self, Arg::Bytes(b) if b.eq_ignore_ascii_case(literal.as_bytes()))
    }

    /// Convert a scalar into a wire token. Booleans become `1`/`0`.
    pub fn to_token(&self) -> Option<Token> {
        match self {
            Arg::Bool(b) => Some(Token::Int(*b as i64)),
            Arg::Int(n) => Some(Token::Int(*n)),
            Arg::Float(f) => Some(Token::Float(*f)),
            Arg::Bytes(b) => Some(Token::Bulk(b.clone())),
            _ => None,
        }
    }
}

pub(crate) fn option_name_eq(key: &[u8], name: &str) -> bool {
    key.len() == name.len()
        && key.iter().zip(name.bytes()).all(|(a, b)| {
            let a = if *a == b'_' { b'-' } else { a.to_ascii_uppercase() };
            let b = if b == b'_' { b'-' } else { b.to_ascii_uppercase() };
            a == b
        })
}

// ── Conversions ─────────────────────────────────────────────────────────

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Bytes(Bytes::from(s))
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::from(s.as_str())
    }
}

impl From<&[u8]> for Arg {
    fn from(data: &[u8]) -> Self {
        Arg::Bytes(Bytes::copy_from_slice(data))
    }
}

impl<const N: usize> From<&[u8; N]> for Arg {
    fn from(data: &[u8; N]) -> Self {
        Arg::Bytes(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Arg {
    fn from(data: Bytes) -> Self {
        Arg::Bytes(data)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<usize> for Arg {
    fn from(n: usize) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

impl From<f32> for Arg {
    fn from(f: f32) -> Self {
        Arg::Float(f as f64)
    }
}

impl From<Token> for Arg {
    fn from(token: Token) -> Self {
        match token {
            Token::Bulk(b) => Arg::Bytes(b),
            Token::Int(n) => Arg::Int(n),
            Token::Float(f) => Arg::Float(f),
        }
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(items: Vec<T>) -> Self {
        Arg::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for Arg {
    fn from(items: [T; N]) -> Self {
        Arg::List(items.into_iter().map(Into::into).collect())
    }
}

/// Build a `Vec<Arg>` from heterogeneous values.
///
/// ```
/// use redis_commands::{Arg, args};
///
/// let call = args!["letters", 1, "a", ["x", "y"], None::<i64>];
/// assert_eq!(call[1], Arg::Int(1));
/// assert!(call[4].is_null());
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Arg>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

/// Build an associative [`Arg::Map`] with heterogeneous values.
///
/// ```
/// use redis_commands::{Arg, opts};
///
/// let options = opts! { "withscores" => true, "limit" => [0, 10] };
/// assert_eq!(options.get("WITHSCORES"), Some(&Arg::Bool(true)));
/// ```
#[macro_export]
macro_rules! opts {
    () => { $crate::Arg::Map(::std::vec::Vec::new()) };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Arg::Map(::std::vec![
            $(($crate::Bytes::copy_from_slice(::std::convert::AsRef::<[u8]>::as_ref($name)), $crate::Arg::from($value))),+
        ])
    };
}

// ── Args cursor ─────────────────────────────────────────────────────────

/// A cursor over the caller arguments of one command invocation.
///
/// Besides consuming arguments, a filter records here the modifiers its
/// parser depends on; they end up in [`Command::flags`](crate::Command::flags).
#[derive(Debug, Clone)]
pub struct Args<'a> {
    command: &'static str,
    items: &'a [Arg],
    pos: usize,
    flags: Vec<&'static str>,
}

impl<'a> Args<'a> {
    pub fn new(command: &'static str, items: &'a [Arg]) -> Self {
        Self {
            command,
            items,
            pos: 0,
            flags: Vec::new(),
        }
    }

    /// Record that modifier `flag` was emitted. May be called more than once
    /// for repeated modifiers.
    pub fn mark(&mut self, flag: &'static str) {
        self.flags.push(flag);
    }

    /// Record `flag` when `given` holds.
    pub fn mark_if(&mut self, given: bool, flag: &'static str) {
        if given {
            self.mark(flag);
        }
    }

    /// The modifiers recorded so far.
    pub fn flags(&self) -> &[&'static str] {
        &self.flags
    }

    pub fn into_flags(self) -> Vec<&'static str> {
        self.flags
    }

    /// Identifier of the command being built.
    #[inline]
    pub fn command(&self) -> &'static str {
        self.command
    }

    /// Number of arguments not consumed yet.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The arguments not consumed yet.
    #[inline]
    pub fn remaining(&self) -> &'a [Arg] {
        &self.items[self.pos..]
    }

    #[inline]
    pub fn peek(&self) -> Option<&'a Arg> {
        self.items.get(self.pos)
    }

    #[inline]
    pub fn next_arg(&mut self) -> Option<&'a Arg> {
        let arg = self.items.get(self.pos)?;
        self.pos += 1;
        Some(arg)
    }

    /// Create an argument validation error for this command.
    pub fn invalid(&self, message: impl Into<String>) -> Error {
        Error::invalid(self.command, message)
    }

    /// The next argument, which must be present and non-null.
    pub fn required(&mut self, name: &str) -> Result<&'a Arg, Error> {
        match self.next_arg() {
            Some(Arg::Null) | None => Err(self.invalid(format!("missing argument `{name}`"))),
            Some(arg) => Ok(arg),
        }
    }

    /// The next argument as a single wire token.
    pub fn token(&mut self, name: &str) -> Result<Token, Error> {
        let arg = self.required(name)?;
        arg.to_token()
            .ok_or_else(|| self.invalid(format!("`{name}` must be a scalar value")))
    }

    /// The next argument as a wire token, if present.
    pub fn opt_token(&mut self, name: &str) -> Result<Option<Token>, Error> {
        match self.next_arg() {
            None | Some(Arg::Null) => Ok(None),
            Some(arg) => arg
                .to_token()
                .map(Some)
                .ok_or_else(|| self.invalid(format!("`{name}` must be a scalar value"))),
        }
    }

    pub fn int(&mut self, name: &str) -> Result<i64, Error> {
        let arg = self.required(name)?;
        arg.as_int()
            .ok_or_else(|| self.invalid(format!("`{name}` must be an integer")))
    }

    pub fn opt_int(&mut self, name: &str) -> Result<Option<i64>, Error> {
        match self.next_arg() {
            None | Some(Arg::Null) => Ok(None),
            Some(arg) => arg
                .as_int()
                .map(Some)
                .ok_or_else(|| self.invalid(format!("`{name}` must be an integer"))),
        }
    }

    pub fn float(&mut self, name: &str) -> Result<f64, Error> {
        let arg = self.required(name)?;
        arg.as_float()
            .ok_or_else(|| self.invalid(format!("`{name}` must be a number")))
    }

    /// An optional boolean switch. Accepts booleans, numbers, or the literal
    /// itself (e.g. `"WITHSCORES"`).
    pub fn flag(&mut self, literal: &str) -> Result<bool, Error> {
        match self.next_arg() {
            None | Some(Arg::Null) => Ok(false),
            Some(Arg::Bool(b)) => Ok(*b),
            Some(Arg::Int(n)) => Ok(*n != 0),
            Some(arg) if arg.is_literal(literal) => Ok(true),
            Some(_) => Err(self.invalid(format!("Unsupported value given. Expected `{literal}` or a boolean"))),
        }
    }

    /// The next argument flattened into tokens. A scalar yields a single
    /// token. Fails if the argument is missing or empty.
    pub fn list(&mut self, name: &str) -> Result<Vec<Token>, Error> {
        let arg = self.required(name)?;
        let mut out = Vec::new();
        builder::flatten(arg, &mut out);
        if out.is_empty() {
            return Err(self.invalid(format!("`{name}` must not be empty")));
        }
        Ok(out)
    }

    /// Consume and return the remaining arguments untouched.
    pub fn take_rest(&mut self) -> &'a [Arg] {
        let rest = self.remaining();
        self.pos = self.items.len();
        rest
    }

    /// All remaining arguments flattened into tokens.
    pub fn rest(&mut self) -> Vec<Token> {
        let mut out = Vec::new();
        for arg in self.remaining() {
            builder::flatten(arg, &mut out);
        }
        self.pos = self.items.len();
        out
    }

    /// A required literal from a fixed set. Returns the canonical spelling.
    pub fn keyword(&mut self, name: &str, accepted: &[&'static str]) -> Result<Token, Error> {
        match self.opt_keyword(name, accepted)? {
            Some(token) => Ok(token),
            None => Err(self.invalid(format!(
                "missing argument `{name}`. Accepted values: {}",
                accepted.join(", ")
            ))),
        }
    }

    /// An optional literal from a fixed set.
    pub fn opt_keyword(
        &mut self,
        name: &str,
        accepted: &[&'static str],
    ) -> Result<Option<Token>, Error> {
        match self.next_arg() {
            None | Some(Arg::Null) => Ok(None),
            Some(arg) => builder::one_of(self.command, name, arg, accepted).map(Some),
        }
    }

    /// The next argument as an options map. A missing or null argument yields
    /// empty options.
    pub fn options(&mut self) -> Result<Options<'a>, Error> {
        match self.next_arg() {
            None | Some(Arg::Null) => Ok(Options::new(self.command, &[])),
            Some(Arg::Map(entries)) => Ok(Options::new(self.command, entries)),
            Some(_) => Err(self.invalid("options must be given as a map")),
        }
    }

    /// Fail if any non-null argument is left over.
    pub fn finish(&self) -> Result<(), Error> {
        if self.remaining().iter().all(Arg::is_null) {
            Ok(())
        } else {
            Err(self.invalid(format!(
                "unexpected {} trailing argument(s)",
                self.remaining().len()
            )))
        }
    }
}

// ── Options ─────────────────────────────────────────────────────────────

/// A read-only view of an associative options argument.
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    command: &'static str,
    entries: &'a [(Bytes, Arg)],
}

impl<'a> Options<'a> {
    pub fn new(command: &'static str, entries: &'a [(Bytes, Arg)]) -> Self {
        Self { command, entries }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The value of option `name`, ignoring null values.
    pub fn get(&self, name: &str) -> Option<&'a Arg> {
        self.entries
            .iter()
            .find(|(k, _)| option_name_eq(k, name))
            .map(|(_, v)| v)
            .filter(|v| !v.is_null())
    }

    /// Whether switch `name` is set.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(Arg::truthy)
    }

    /// The value of option `name` as a single token.
    pub fn token(&self, name: &str) -> Result<Option<Token>, Error> {
        match self.get(name) {
            None => Ok(None),
            Some(arg) => arg.to_token().map(Some).ok_or_else(|| {
                Error::invalid(self.command, format!("option `{name}` must be a scalar value"))
            }),
        }
    }

    /// The value of option `name` as an integer.
    pub fn int(&self, name: &str) -> Result<Option<i64>, Error> {
        match self.get(name) {
            None => Ok(None),
            Some(arg) => arg.as_int().map(Some).ok_or_else(|| {
                Error::invalid(self.command, format!("option `{name}` must be an integer"))
            }),
        }
    }

    /// Reject option names outside `accepted`.
    pub fn check(&self, accepted: &[&str]) -> Result<(), Error> {
        for (key, _) in self.entries {
            if !accepted.iter().any(|name| option_name_eq(key, name)) {
                return Err(Error::invalid(
                    self.command,
                    format!(
                        "Unsupported option `{}`. Accepted options: {}",
                        String::from_utf8_lossy(key),
                        accepted.join(", ")
                    ),
                ));
            }
        }
        Ok(())
    }
}
