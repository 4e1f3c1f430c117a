use resp_proto::Token;

use super::Render;
use crate::arg::Arg;
use crate::builder::{one_of, unsupported};
use crate::error::Error;

/// Which end of a stream a trim threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimStrategy {
    MaxLen,
    MinId,
}

impl TrimStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MaxLen => "MAXLEN",
            Self::MinId => "MINID",
        }
    }

    fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        let token = one_of(command, "trim strategy", arg, &["MAXLEN", "MINID"])?;
        Ok(if token.eq_ignore_ascii_case("MINID") {
            Self::MinId
        } else {
            Self::MaxLen
        })
    }
}

/// Exact (`=`) or approximate (`~`) trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exactness {
    Exact,
    Approximate,
}

impl Exactness {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "=",
            Self::Approximate => "~",
        }
    }

    fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        match arg {
            Arg::Bool(true) => Ok(Self::Approximate),
            Arg::Bool(false) => Ok(Self::Exact),
            _ => {
                let token = one_of(command, "trim operator", arg, &["=", "~"])?;
                Ok(if token == "~" { Self::Approximate } else { Self::Exact })
            }
        }
    }
}

/// `MAXLEN|MINID [=|~] threshold [LIMIT count]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTrim {
    pub strategy: TrimStrategy,
    pub exactness: Option<Exactness>,
    pub threshold: Token,
    pub limit: Option<i64>,
}

impl StreamTrim {
    pub fn max_len(threshold: i64) -> Self {
        Self {
            strategy: TrimStrategy::MaxLen,
            exactness: None,
            threshold: Token::Int(threshold),
            limit: None,
        }
    }

    pub fn min_id(threshold: impl Into<Token>) -> Self {
        Self {
            strategy: TrimStrategy::MinId,
            exactness: None,
            threshold: threshold.into(),
            limit: None,
        }
    }

    pub fn approximate(mut self) -> Self {
        self.exactness = Some(Exactness::Approximate);
        self
    }

    pub fn exact(mut self) -> Self {
        self.exactness = Some(Exactness::Exact);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Accepts `[strategy, threshold]`, `[strategy, operator, threshold]`, or
    /// a map with `strategy`, `threshold`, `exactness` and `limit` entries.
    pub fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        let invalid = || Error::invalid(command, "Invalid trim argument value given");
        let threshold = |a: &Arg| a.to_token().ok_or_else(invalid);
        let trim = match arg {
            Arg::List(items) => match items.as_slice() {
                [strategy, value] => Self {
                    strategy: TrimStrategy::from_arg(command, strategy)?,
                    exactness: None,
                    threshold: threshold(value)?,
                    limit: None,
                },
                [strategy, operator, value] => Self {
                    strategy: TrimStrategy::from_arg(command, strategy)?,
                    exactness: Some(Exactness::from_arg(command, operator)?),
                    threshold: threshold(value)?,
                    limit: None,
                },
                [strategy, operator, value, limit] => Self {
                    strategy: TrimStrategy::from_arg(command, strategy)?,
                    exactness: Some(Exactness::from_arg(command, operator)?),
                    threshold: threshold(value)?,
                    limit: Some(limit.as_int().ok_or_else(invalid)?),
                },
                _ => return Err(invalid()),
            },
            Arg::Map(_) => {
                let exactness = match arg.get("exactness").or_else(|| arg.get("approximate")) {
                    None | Some(Arg::Null) => None,
                    Some(op) => Some(Exactness::from_arg(command, op)?),
                };
                let limit = match arg.get("limit") {
                    None | Some(Arg::Null) => None,
                    Some(limit) => Some(limit.as_int().ok_or_else(invalid)?),
                };
                let (strategy, value) = if let Some(value) = arg.get("maxlen") {
                    (TrimStrategy::MaxLen, value)
                } else if let Some(value) = arg.get("minid") {
                    (TrimStrategy::MinId, value)
                } else {
                    let strategy = arg.get("strategy").ok_or_else(invalid)?;
                    (
                        TrimStrategy::from_arg(command, strategy)?,
                        arg.get("threshold").ok_or_else(invalid)?,
                    )
                };
                Self {
                    strategy,
                    exactness,
                    threshold: threshold(value)?,
                    limit,
                }
            }
            _ => return Err(invalid()),
        };
        if trim.limit.is_some() && trim.exactness != Some(Exactness::Approximate) {
            return Err(Error::invalid(
                command,
                "LIMIT requires approximate (~) trimming",
            ));
        }
        Ok(trim)
    }
}

impl Render for StreamTrim {
    fn render(&self, out: &mut Vec<Token>) {
        out.push(Token::from_static(self.strategy.as_str()));
        if let Some(exactness) = self.exactness {
            out.push(Token::from_static(exactness.as_str()));
        }
        out.push(self.threshold.clone());
        if let Some(limit) = self.limit {
            out.push(Token::from_static("LIMIT"));
            out.push(Token::Int(limit));
        }
    }
}

impl From<StreamTrim> for Arg {
    fn from(trim: StreamTrim) -> Self {
        let mut entries = vec![
            ("strategy", Arg::from(trim.strategy.as_str())),
            ("threshold", Arg::from(trim.threshold)),
        ];
        if let Some(exactness) = trim.exactness {
            entries.push(("exactness", Arg::from(exactness.as_str())));
        }
        if let Some(limit) = trim.limit {
            entries.push(("limit", Arg::Int(limit)));
        }
        Arg::map(entries)
    }
}

/// What happens to consumer group references when entries are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefPolicy {
    KeepRef,
    DelRef,
    Acked,
}

impl RefPolicy {
    const LITERALS: &'static [&'static str] = &["KEEPREF", "DELREF", "ACKED"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepRef => "KEEPREF",
            Self::DelRef => "DELREF",
            Self::Acked => "ACKED",
        }
    }

    pub fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        [Self::KeepRef, Self::DelRef, Self::Acked]
            .into_iter()
            .find(|p| arg.is_literal(p.as_str()))
            .ok_or_else(|| unsupported(command, "reference policy", Self::LITERALS))
    }

    pub fn from_opt_arg(command: &str, arg: Option<&Arg>) -> Result<Option<Self>, Error> {
        match arg {
            None | Some(Arg::Null) => Ok(None),
            Some(arg) => Self::from_arg(command, arg).map(Some),
        }
    }
}

impl Render for RefPolicy {
    fn render(&self, out: &mut Vec<Token>) {
        out.push(Token::from_static(self.as_str()));
    }
}

impl From<RefPolicy> for Arg {
    fn from(policy: RefPolicy) -> Self {
        Arg::from(policy.as_str())
    }
}

/// Producer-side deduplication for `XADD`.
#[derive(Debug, Clone, PartialEq)]
pub enum Idempotency {
    /// `IDMP producer-id idempotent-id`.
    Explicit { producer: Token, id: Token },
    /// `IDMPAUTO producer-id`.
    Auto { producer: Token },
}

impl Idempotency {
    /// Parse the value of an `idmp` option: `[producer, id]`.
    pub fn explicit_from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        let invalid = || Error::invalid(command, "Invalid IDMP argument value given");
        match arg.as_list() {
            Some([producer, id]) => Ok(Self::Explicit {
                producer: producer.to_token().ok_or_else(invalid)?,
                id: id.to_token().ok_or_else(invalid)?,
            }),
            _ => match (arg.get("producer"), arg.get("id")) {
                (Some(producer), Some(id)) => Ok(Self::Explicit {
                    producer: producer.to_token().ok_or_else(invalid)?,
                    id: id.to_token().ok_or_else(invalid)?,
                }),
                _ => Err(invalid()),
            },
        }
    }

    /// Parse the value of an `idmpauto` option: the producer id.
    pub fn auto_from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        arg.to_token()
            .map(|producer| Self::Auto { producer })
            .ok_or_else(|| Error::invalid(command, "Invalid IDMPAUTO argument value given"))
    }
}

impl Render for Idempotency {
    fn render(&self, out: &mut Vec<Token>) {
        match self {
            Self::Explicit { producer, id } => {
                out.push(Token::from_static("IDMP"));
                out.push(producer.clone());
                out.push(id.clone());
            }
            Self::Auto { producer } => {
                out.push(Token::from_static("IDMPAUTO"));
                out.push(producer.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{opts, tokens};

    #[test]
    fn test_trim_from_list() {
        let trim = StreamTrim::from_arg("XTRIM", &Arg::from(vec![Arg::from("maxlen"), Arg::from("~"), Arg::Int(100)])).unwrap();
        assert_eq!(trim.to_tokens(), tokens!["MAXLEN", "~", 100]);

        let trim = StreamTrim::from_arg("XTRIM", &Arg::from(["MINID", "0-1"])).unwrap();
        assert_eq!(trim.to_tokens(), tokens!["MINID", "0-1"]);
    }

    #[test]
    fn test_trim_from_map() {
        let map = opts! { "maxlen" => 1000, "approximate" => true, "limit" => 10 };
        let trim = StreamTrim::from_arg("XADD", &map).unwrap();
        assert_eq!(trim, StreamTrim::max_len(1000).approximate().limit(10));
        assert_eq!(trim.to_tokens(), tokens!["MAXLEN", "~", 1000, "LIMIT", 10]);
    }

    #[test]
    fn test_trim_round_trips_through_arg() {
        let trim = StreamTrim::min_id("5-0").exact();
        assert_eq!(StreamTrim::from_arg("XTRIM", &Arg::from(trim.clone())).unwrap(), trim);
    }

    #[test]
    fn test_trim_rejects_bad_strategy() {
        let err = StreamTrim::from_arg("XTRIM", &Arg::from(["MAXAGE", "1"])).unwrap_err();
        assert!(err.to_string().contains("Accepted values: MAXLEN, MINID"));
    }

    #[test]
    fn test_trim_limit_requires_approximate() {
        let map = opts! { "maxlen" => 10, "limit" => 5 };
        assert!(StreamTrim::from_arg("XTRIM", &map).is_err());
    }

    #[test]
    fn test_ref_policy() {
        assert_eq!(RefPolicy::from_arg("XDELEX", &Arg::from("acked")).unwrap(), RefPolicy::Acked);
        let err = RefPolicy::from_arg("XDELEX", &Arg::from("KEEP")).unwrap_err();
        assert!(err.to_string().contains("KEEPREF, DELREF, ACKED"));
    }

    #[test]
    fn test_idempotency() {
        let idmp = Idempotency::explicit_from_arg("XADD", &Arg::from(["p1", "i1"])).unwrap();
        assert_eq!(idmp.to_tokens(), tokens!["IDMP", "p1", "i1"]);
        let auto = Idempotency::auto_from_arg("XADD", &Arg::from("p1")).unwrap();
        assert_eq!(auto.to_tokens(), tokens!["IDMPAUTO", "p1"]);
        assert!(Idempotency::explicit_from_arg("XADD", &Arg::from("p1")).is_err());
    }
}
