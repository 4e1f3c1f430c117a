use resp_proto::Token;

use super::Render;
use crate::arg::Arg;
use crate::builder::limit_values;
use crate::error::Error;

/// `LIMIT offset count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: i64,
    pub count: i64,
}

impl Limit {
    pub fn new(offset: i64, count: i64) -> Self {
        Self { offset, count }
    }

    /// Accepts `[offset, count]` or `{offset: .., count: ..}`.
    pub fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        match limit_values(arg).as_deref() {
            Some([Token::Int(offset), Token::Int(count)]) => Ok(Self::new(*offset, *count)),
            _ => Err(Error::invalid(command, "Invalid LIMIT argument value given")),
        }
    }
}

impl Render for Limit {
    fn render(&self, out: &mut Vec<Token>) {
        out.push(Token::from_static("LIMIT"));
        out.push(Token::Int(self.offset));
        out.push(Token::Int(self.count));
    }
}

impl From<Limit> for Arg {
    fn from(limit: Limit) -> Self {
        Arg::map([("offset", limit.offset), ("count", limit.count)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{opts, tokens};

    #[test]
    fn test_limit_render() {
        assert_eq!(Limit::new(0, 10).to_tokens(), tokens!["LIMIT", 0, 10]);
    }

    #[test]
    fn test_limit_from_arg() {
        assert_eq!(
            Limit::from_arg("ZRANGE", &Arg::from([5, 1])).unwrap(),
            Limit::new(5, 1)
        );
        let map = opts! { "offset" => 2, "count" => 3 };
        assert_eq!(Limit::from_arg("ZRANGE", &map).unwrap(), Limit::new(2, 3));
        assert_eq!(
            Limit::from_arg("ZRANGE", &Arg::from(Limit::new(7, 8))).unwrap(),
            Limit::new(7, 8)
        );
    }

    #[test]
    fn test_limit_invalid() {
        let err = Limit::from_arg("ZRANGE", &Arg::from("x")).unwrap_err();
        assert!(err.to_string().contains("Invalid LIMIT argument value given"));
    }
}
