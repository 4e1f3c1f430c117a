use resp_proto::Token;

use super::Render;
use crate::arg::Arg;
use crate::builder::unsupported;
use crate::error::Error;

/// Condition attached to an expiration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireCondition {
    /// Only when no expiration is set.
    Nx,
    /// Only when an expiration is set.
    Xx,
    /// Only when the new expiration is greater.
    Gt,
    /// Only when the new expiration is less.
    Lt,
}

impl ExpireCondition {
    pub const ALL: [ExpireCondition; 4] = [Self::Nx, Self::Xx, Self::Gt, Self::Lt];
    const LITERALS: &'static [&'static str] = &["NX", "XX", "GT", "LT"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nx => "NX",
            Self::Xx => "XX",
            Self::Gt => "GT",
            Self::Lt => "LT",
        }
    }

    pub fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|c| arg.is_literal(c.as_str()))
            .ok_or_else(|| unsupported(command, "flag", Self::LITERALS))
    }

    /// Parse an optional condition; null means none.
    pub fn from_opt_arg(command: &str, arg: Option<&Arg>) -> Result<Option<Self>, Error> {
        match arg {
            None | Some(Arg::Null) => Ok(None),
            Some(arg) => Self::from_arg(command, arg).map(Some),
        }
    }
}

impl Render for ExpireCondition {
    fn render(&self, out: &mut Vec<Token>) {
        out.push(Token::from_static(self.as_str()));
    }
}

impl From<ExpireCondition> for Arg {
    fn from(condition: ExpireCondition) -> Self {
        Arg::from(condition.as_str())
    }
}

/// Time-to-live resolution for commands that set or read-and-touch a TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlMode {
    /// Seconds.
    Ex,
    /// Milliseconds.
    Px,
    /// Unix time in seconds.
    ExAt,
    /// Unix time in milliseconds.
    PxAt,
    /// Remove the TTL.
    Persist,
    /// Retain the existing TTL.
    KeepTtl,
}

impl TtlMode {
    pub const GETEX: &'static [TtlMode] = &[Self::Ex, Self::Px, Self::ExAt, Self::PxAt, Self::Persist];
    pub const SETEX: &'static [TtlMode] = &[Self::Ex, Self::Px, Self::ExAt, Self::PxAt, Self::KeepTtl];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ex => "EX",
            Self::Px => "PX",
            Self::ExAt => "EXAT",
            Self::PxAt => "PXAT",
            Self::Persist => "PERSIST",
            Self::KeepTtl => "KEEPTTL",
        }
    }

    /// Whether the mode is followed by a time value.
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::Persist | Self::KeepTtl)
    }

    /// Parse a mode restricted to `accepted`.
    pub fn from_arg(command: &str, arg: &Arg, accepted: &[TtlMode]) -> Result<Self, Error> {
        accepted
            .iter()
            .copied()
            .find(|m| arg.is_literal(m.as_str()))
            .ok_or_else(|| {
                let names: Vec<&str> = accepted.iter().map(|m| m.as_str()).collect();
                unsupported(command, "TTL resolution", &names)
            })
    }
}

impl Render for TtlMode {
    fn render(&self, out: &mut Vec<Token>) {
        out.push(Token::from_static(self.as_str()));
    }
}

impl From<TtlMode> for Arg {
    fn from(mode: TtlMode) -> Self {
        Arg::from(mode.as_str())
    }
}

/// Validate a TTL mode and its value as a pair, appending `MODE [value]`.
///
/// A value without a mode, or a timed mode without a value, is rejected.
pub(crate) fn render_ttl(
    command: &str,
    mode: Option<&Arg>,
    value: Option<&Arg>,
    accepted: &[TtlMode],
    out: &mut Vec<Token>,
) -> Result<(), Error> {
    let mode = match mode {
        None | Some(Arg::Null) => None,
        Some(arg) => Some(TtlMode::from_arg(command, arg, accepted)?),
    };
    let value = value.filter(|v| !v.is_null());
    match (mode, value) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(Error::invalid(
            command,
            "TTL value requires a TTL resolution flag",
        )),
        (Some(mode), None) if mode.takes_value() => Err(Error::invalid(
            command,
            format!("{} requires a TTL value", mode.as_str()),
        )),
        (Some(mode), Some(_)) if !mode.takes_value() => Err(Error::invalid(
            command,
            format!("{} does not take a TTL value", mode.as_str()),
        )),
        (Some(mode), value) => {
            mode.render(out);
            if let Some(value) = value {
                let token = value
                    .to_token()
                    .ok_or_else(|| Error::invalid(command, "TTL value must be a scalar"))?;
                out.push(token);
            }
            Ok(())
        }
    }
}
