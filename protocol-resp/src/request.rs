//! Client-side request tokens.
//!
//! A command is sent as its name followed by an ordered list of [`Token`]s. Tokens
//! keep integers and floats typed until a transport renders them, so command
//! builders and tests can compare argument lists without caring about formatting.

use bytes::Bytes;

/// One scalar argument of a command as it goes over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A string or raw binary payload.
    Bulk(Bytes),
    /// An integer, rendered in decimal.
    Int(i64),
    /// A floating point number, rendered in shortest round-trip form.
    Float(f64),
}

impl Token {
    /// Create a bulk token from a static literal without copying.
    #[inline]
    pub const fn from_static(s: &'static str) -> Self {
        Token::Bulk(Bytes::from_static(s.as_bytes()))
    }

    /// Render the token into the bytes a transport writes as a bulk string.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Token::Bulk(data) => data.clone(),
            Token::Int(n) => {
                let mut buf = itoa::Buffer::new();
                Bytes::copy_from_slice(buf.format(*n).as_bytes())
            }
            Token::Float(f) => Bytes::from(format_float(*f)),
        }
    }

    /// Append the rendered token to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Token::Bulk(data) => out.extend_from_slice(data),
            Token::Int(n) => {
                let mut buf = itoa::Buffer::new();
                out.extend_from_slice(buf.format(*n).as_bytes());
            }
            Token::Float(f) => out.extend_from_slice(format_float(*f).as_bytes()),
        }
    }

    /// Returns the bulk payload, if this is a bulk token.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Token::Bulk(data) => Some(data),
            _ => None,
        }
    }

    /// Interpret the token as an integer. Bulk tokens holding a decimal integer
    /// are parsed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Token::Int(n) => Some(*n),
            Token::Bulk(data) => std::str::from_utf8(data).ok()?.parse().ok(),
            Token::Float(_) => None,
        }
    }

    /// Returns true if this is a bulk token equal to `literal`, ignoring ASCII case.
    #[inline]
    pub fn eq_ignore_ascii_case(&self, literal: &str) -> bool {
        match self {
            Token::Bulk(data) => data.eq_ignore_ascii_case(literal.as_bytes()),
            _ => false,
        }
    }

    /// Returns a bulk token holding `prefix` followed by this token's bytes.
    pub fn with_prefix(&self, prefix: &[u8]) -> Token {
        let mut out = Vec::with_capacity(prefix.len() + 16);
        out.extend_from_slice(prefix);
        self.write_to(&mut out);
        Token::Bulk(Bytes::from(out))
    }
}

fn format_float(f: f64) -> String {
    if f.is_infinite() {
        if f > 0.0 { "+inf".into() } else { "-inf".into() }
    } else {
        format!("{f}")
    }
}

impl From<&str> for Token {
    #[inline]
    fn from(s: &str) -> Self {
        Token::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Token {
    #[inline]
    fn from(s: String) -> Self {
        Token::Bulk(Bytes::from(s))
    }
}

impl From<&[u8]> for Token {
    #[inline]
    fn from(data: &[u8]) -> Self {
        Token::Bulk(Bytes::copy_from_slice(data))
    }
}

impl From<Vec<u8>> for Token {
    #[inline]
    fn from(data: Vec<u8>) -> Self {
        Token::Bulk(Bytes::from(data))
    }
}

impl From<Bytes> for Token {
    #[inline]
    fn from(data: Bytes) -> Self {
        Token::Bulk(data)
    }
}

impl From<i64> for Token {
    #[inline]
    fn from(n: i64) -> Self {
        Token::Int(n)
    }
}

impl From<i32> for Token {
    #[inline]
    fn from(n: i32) -> Self {
        Token::Int(n as i64)
    }
}

impl From<u32> for Token {
    #[inline]
    fn from(n: u32) -> Self {
        Token::Int(n as i64)
    }
}

impl From<usize> for Token {
    #[inline]
    fn from(n: usize) -> Self {
        Token::Int(n as i64)
    }
}

impl From<f64> for Token {
    #[inline]
    fn from(f: f64) -> Self {
        Token::Float(f)
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Token::Bulk(data) if data == other.as_bytes())
    }
}

/// Build a `Vec<Token>` from a list of literals.
///
/// ```
/// use resp_proto::{Token, tokens};
///
/// let args = tokens!["letters", 1, "a"];
/// assert_eq!(args[1], Token::Int(1));
/// ```
#[macro_export]
macro_rules! tokens {
    () => { ::std::vec::Vec::<$crate::Token>::new() };
    ($($token:expr),+ $(,)?) => {
        ::std::vec![$($crate::Token::from($token)),+]
    };
}

/// A command ready to hand to a transport: its name and argument tokens.
///
/// # Example
///
/// ```
/// use resp_proto::Request;
///
/// let req = Request::cmd("LRANGE").arg("mylist").arg(0).arg(-1);
/// assert_eq!(req.to_argv().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    name: Bytes,
    args: Vec<Token>,
}

impl Request {
    /// Create a new request with the given arguments.
    #[inline]
    pub fn new(name: impl Into<Bytes>, args: Vec<Token>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Create a request for a command with no arguments yet.
    #[inline]
    pub fn cmd(name: &'static str) -> Self {
        Self {
            name: Bytes::from_static(name.as_bytes()),
            args: Vec::new(),
        }
    }

    /// Add an argument to the command.
    #[inline]
    pub fn arg(mut self, arg: impl Into<Token>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The command name.
    #[inline]
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// The argument tokens, excluding the command name.
    #[inline]
    pub fn args(&self) -> &[Token] {
        &self.args
    }

    /// Consume the request, returning its argument tokens.
    #[inline]
    pub fn into_args(self) -> Vec<Token> {
        self.args
    }

    /// Number of arguments, excluding the command name.
    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if the command carries no arguments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The full argv as bulk payloads, command name first.
    pub fn to_argv(&self) -> Vec<Bytes> {
        let mut argv = Vec::with_capacity(1 + self.args.len());
        argv.push(self.name.clone());
        argv.extend(self.args.iter().map(Token::to_bytes));
        argv
    }
}
