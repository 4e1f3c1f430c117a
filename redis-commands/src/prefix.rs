//! Key positions and keyspace prefixing.
//!
//! Every definition carries a [`KeySpec`] describing which of its built tokens
//! are keys. Prefixing evaluates the descriptor against the token list, so the
//! caller's arguments are never re-interpreted.

use std::fmt;

use bytes::Bytes;
use resp_proto::Token;
use tracing::trace;

/// Describes which wire tokens of a command are keys.
#[derive(Clone, Copy)]
pub enum KeySpec {
    /// No keys.
    None,
    /// The first token.
    First,
    /// Every token.
    All,
    /// The listed token indexes.
    Positions(&'static [usize]),
    /// Every token from the index on.
    From(usize),
    /// Every token except the trailing `n` (`BLPOP k1 k2 timeout`).
    SkipLast(usize),
    /// Every `step`-th token starting at `start` (`MSET k v k v`).
    Interleaved { start: usize, step: usize },
    /// The token at `at` holds a count `n`; the next `n` tokens are keys.
    Counted { at: usize },
    /// Any token directly following one of `literals`, searching from `from`.
    /// A matched key is never itself taken for a literal.
    After {
        from: usize,
        literals: &'static [&'static str],
    },
    /// The union of several descriptors.
    Many(&'static [KeySpec]),
    /// A command-specific evaluator.
    Custom(fn(&[Token]) -> Vec<usize>),
}

impl KeySpec {
    /// Indexes of the key tokens within `args`, ascending and unique.
    pub fn positions(&self, args: &[Token]) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect(args, &mut out);
        out.retain(|&i| i < args.len());
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect(&self, args: &[Token], out: &mut Vec<usize>) {
        let len = args.len();
        match *self {
            KeySpec::None => {}
            KeySpec::First => out.push(0),
            KeySpec::All => out.extend(0..len),
            KeySpec::Positions(positions) => out.extend_from_slice(positions),
            KeySpec::From(start) => out.extend(start..len),
            KeySpec::SkipLast(n) => out.extend(0..len.saturating_sub(n)),
            KeySpec::Interleaved { start, step } => {
                out.extend((start..len).step_by(step.max(1)));
            }
            KeySpec::Counted { at } => {
                if let Some(n) = args.get(at).and_then(Token::as_int) {
                    let n = n.max(0) as usize;
                    out.extend(at + 1..(at + 1 + n).min(len));
                }
            }
            KeySpec::After { from, literals } => {
                let mut i = from;
                while i + 1 < len {
                    if literals.iter().any(|l| args[i].eq_ignore_ascii_case(l)) {
                        out.push(i + 1);
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
            }
            KeySpec::Many(specs) => {
                for spec in specs {
                    spec.collect(args, out);
                }
            }
            KeySpec::Custom(f) => out.extend(f(args)),
        }
    }

    /// Prepend `prefix` to every key token of `args`.
    pub fn apply(&self, args: &mut [Token], prefix: &[u8]) {
        let positions = self.positions(args);
        trace!(keys = positions.len(), "prefixing keys");
        for i in positions {
            args[i] = args[i].with_prefix(prefix);
        }
    }
}

impl fmt::Debug for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::None => f.write_str("None"),
            KeySpec::First => f.write_str("First"),
            KeySpec::All => f.write_str("All"),
            KeySpec::Positions(p) => f.debug_tuple("Positions").field(p).finish(),
            KeySpec::From(i) => f.debug_tuple("From").field(i).finish(),
            KeySpec::SkipLast(n) => f.debug_tuple("SkipLast").field(n).finish(),
            KeySpec::Interleaved { start, step } => f
                .debug_struct("Interleaved")
                .field("start", start)
                .field("step", step)
                .finish(),
            KeySpec::Counted { at } => f.debug_struct("Counted").field("at", at).finish(),
            KeySpec::After { from, literals } => f
                .debug_struct("After")
                .field("from", from)
                .field("literals", literals)
                .finish(),
            KeySpec::Many(specs) => f.debug_tuple("Many").field(specs).finish(),
            KeySpec::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A keyspace prefix applied to every command a session builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPrefix(Bytes);

impl KeyPrefix {
    pub fn new(prefix: impl Into<Bytes>) -> Self {
        Self(prefix.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Rewrite the key tokens of `args` as described by `keys`.
    pub fn apply(&self, keys: &KeySpec, args: &mut [Token]) {
        keys.apply(args, &self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens;

    fn prefixed(spec: KeySpec, mut args: Vec<Token>) -> Vec<Token> {
        spec.apply(&mut args, b"p:");
        args
    }

    #[test]
    fn test_first_and_all() {
        assert_eq!(prefixed(KeySpec::First, tokens!["k", "v"]), tokens!["p:k", "v"]);
        assert_eq!(
            prefixed(KeySpec::All, tokens!["dst", "k1", "k2"]),
            tokens!["p:dst", "p:k1", "p:k2"]
        );
        assert_eq!(prefixed(KeySpec::None, tokens!["x"]), tokens!["x"]);
    }

    #[test]
    fn test_skip_last() {
        assert_eq!(
            prefixed(KeySpec::SkipLast(1), tokens!["k1", "k2", 0]),
            tokens!["p:k1", "p:k2", 0]
        );
    }

    #[test]
    fn test_interleaved() {
        assert_eq!(
            prefixed(KeySpec::Interleaved { start: 0, step: 2 }, tokens!["k1", "v1", "k2", "v2"]),
            tokens!["p:k1", "v1", "p:k2", "v2"]
        );
    }

    #[test]
    fn test_counted() {
        assert_eq!(
            prefixed(KeySpec::Counted { at: 0 }, tokens![2, "k1", "k2", "LEFT", "COUNT", 2]),
            tokens![2, "p:k1", "p:k2", "LEFT", "COUNT", 2]
        );
    }

    #[test]
    fn test_counted_clamps_to_length() {
        assert_eq!(
            prefixed(KeySpec::Counted { at: 0 }, tokens![5, "k1"]),
            tokens![5, "p:k1"]
        );
    }

    #[test]
    fn test_after_literals() {
        static GEO: KeySpec = KeySpec::Many(&[
            KeySpec::First,
            KeySpec::After {
                from: 5,
                literals: &["STORE", "STOREDIST"],
            },
        ]);
        let args = tokens!["key", 15, 37, 200, "km", "STORE", "dst", "STOREDIST", "dist"];
        assert_eq!(
            prefixed(GEO, args),
            tokens!["p:key", 15, 37, 200, "km", "STORE", "p:dst", "STOREDIST", "p:dist"]
        );
        let args = tokens!["store", 15, 37, 200, "km", "STORE", "storedist", "STOREDIST", "d"];
        assert_eq!(
            prefixed(GEO, args),
            tokens!["p:store", 15, 37, 200, "km", "STORE", "p:storedist", "STOREDIST", "p:d"]
        );
    }

    #[test]
    fn test_numeric_key_is_rendered() {
        assert_eq!(prefixed(KeySpec::First, tokens![42]), tokens!["p:42"]);
    }

    #[test]
    fn test_custom() {
        fn last(args: &[Token]) -> Vec<usize> {
            args.len().checked_sub(1).into_iter().collect()
        }
        assert_eq!(
            prefixed(KeySpec::Custom(last), tokens!["a", "b"]),
            tokens!["a", "p:b"]
        );
    }

    #[test]
    fn test_key_prefix() {
        let prefix = KeyPrefix::new("app:");
        let mut args = tokens!["k"];
        prefix.apply(&KeySpec::First, &mut args);
        assert_eq!(args, tokens!["app:k"]);
        assert_eq!(prefix.as_bytes(), b"app:");
    }
}
