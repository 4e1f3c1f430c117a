//! Set commands.

use resp_proto::Token;

use super::{key_variadic, passthrough, variadic};
use crate::arg::Args;
use crate::builder::{Modifier, Modifiers, count_prefixed};
use crate::command::CommandSpec;
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::{boolean, booleans, identity};

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("SADD", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("SREM", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("SMEMBERS", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("SCARD", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("SISMEMBER", passthrough, boolean).keys(KeySpec::First),
    CommandSpec::new("SMISMEMBER", key_variadic, booleans).keys(KeySpec::First),
    CommandSpec::new("SMOVE", passthrough, boolean).keys(KeySpec::Positions(&[0, 1])),
    CommandSpec::new("SPOP", key_count, identity).keys(KeySpec::First),
    CommandSpec::new("SRANDMEMBER", key_count, identity).keys(KeySpec::First),
    CommandSpec::new("SDIFF", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("SINTER", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("SUNION", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("SDIFFSTORE", store, identity).keys(KeySpec::All),
    CommandSpec::new("SINTERSTORE", store, identity).keys(KeySpec::All),
    CommandSpec::new("SUNIONSTORE", store, identity).keys(KeySpec::All),
    CommandSpec::new("SINTERCARD", keys_with_limit, identity).keys(KeySpec::Counted { at: 0 }),
    CommandSpec::new("SSCAN", sscan, identity).keys(KeySpec::First),
];

fn key_count(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    out.extend(args.opt_token("count")?);
    args.finish()?;
    Ok(out)
}

/// `destination key [key ..]`.
fn store(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("destination")?];
    let keys = args.rest();
    if keys.is_empty() {
        return Err(args.invalid("expects at least one source key"));
    }
    out.extend(keys);
    Ok(out)
}

/// `numkeys key [key ..] [LIMIT limit]`.
pub(super) fn keys_with_limit(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    count_prefixed(&mut out, args.list("keys")?);
    if let Some(limit) = args.opt_int("limit")? {
        if limit < 0 {
            return Err(args.invalid("LIMIT must not be negative"));
        }
        out.push(Token::from_static("LIMIT"));
        out.push(Token::Int(limit));
    }
    args.finish()?;
    Ok(out)
}

static SSCAN_MODIFIERS: &[Modifier] = &[Modifier::value("MATCH"), Modifier::value("COUNT")];

fn sscan(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("cursor")?];
    Modifiers::collect(SSCAN_MODIFIERS, args)?.render(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::{args, tokens, Response};

    #[test]
    fn test_sinterstore_styles_and_prefix() {
        assert_eq!(
            build("SINTERSTORE", args!["dst", ["k1", "k2"]]).unwrap(),
            tokens!["dst", "k1", "k2"]
        );
        assert_eq!(
            build("SINTERSTORE", args!["dst", "k1", "k2"]).unwrap(),
            tokens!["dst", "k1", "k2"]
        );
        assert_eq!(
            prefixed("SINTERSTORE", args!["dst", ["k1", "k2"]]),
            tokens!["p:dst", "p:k1", "p:k2"]
        );
        assert!(build("SUNIONSTORE", args!["dst"]).is_err());
    }

    #[test]
    fn test_sintercard() {
        assert_eq!(
            build("SINTERCARD", args![["a", "b", "c"], 5]).unwrap(),
            tokens![3, "a", "b", "c", "LIMIT", 5]
        );
        assert_eq!(build("SINTERCARD", args!["a"]).unwrap(), tokens![1, "a"]);
        assert_eq!(
            prefixed("SINTERCARD", args![["a", "b"], 1]),
            tokens![2, "p:a", "p:b", "LIMIT", 1]
        );
    }

    #[test]
    fn test_smismember_parse() {
        let reply = arr(vec![int(1), int(0)]);
        assert_eq!(
            parse("SMISMEMBER", args!["s", "a", "b"], reply),
            Response::list([true, false])
        );
    }

    #[test]
    fn test_smove_prefix() {
        assert_eq!(prefixed("SMOVE", args!["a", "b", "m"]), tokens!["p:a", "p:b", "m"]);
    }

    #[test]
    fn test_spop_count() {
        assert_eq!(build("SPOP", args!["s"]).unwrap(), tokens!["s"]);
        assert_eq!(build("SPOP", args!["s", 3]).unwrap(), tokens!["s", 3]);
        assert!(build("SPOP", args!["s", 3, 4]).is_err());
    }
}
