//! Bitmap and HyperLogLog commands.

use resp_proto::Token;

use super::{passthrough, variadic};
use crate::arg::Args;
use crate::builder;
use crate::command::CommandSpec;
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::{boolean, identity};

const BIT_UNITS: &[&str] = &["BYTE", "BIT"];

const BITOP_OPERATIONS: &[&str] = &["AND", "OR", "XOR", "NOT", "DIFF", "DIFF1", "ANDOR", "ONE"];

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("GETBIT", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("SETBIT", setbit, identity).keys(KeySpec::First),
    CommandSpec::new("BITCOUNT", bitcount, identity).keys(KeySpec::First),
    CommandSpec::new("BITPOS", bitpos, identity).keys(KeySpec::First),
    CommandSpec::new("BITOP", bitop, identity).keys(KeySpec::From(1)),
    CommandSpec::new("BITFIELD", bitfield, identity).keys(KeySpec::First),
    CommandSpec::new("BITFIELD_RO", bitfield_ro, identity).keys(KeySpec::First),
    CommandSpec::new("PFADD", pfadd, boolean).keys(KeySpec::First),
    CommandSpec::new("PFCOUNT", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("PFMERGE", variadic, identity).keys(KeySpec::All),
];

fn bit(args: &mut Args<'_>) -> Result<Token, Error> {
    match args.int("bit")? {
        bit @ (0 | 1) => Ok(Token::Int(bit)),
        _ => Err(args.invalid("`bit` must be 0 or 1")),
    }
}

fn setbit(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("offset")?];
    out.push(bit(args)?);
    args.finish()?;
    Ok(out)
}

/// `key [start end [BYTE|BIT]]`.
fn bitcount(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    match (args.opt_token("start")?, args.opt_token("end")?) {
        (Some(start), Some(end)) => {
            out.extend([start, end]);
            out.extend(args.opt_keyword("unit", BIT_UNITS)?);
        }
        (None, None) => {}
        _ => return Err(args.invalid("start and end must be given together")),
    }
    args.finish()?;
    Ok(out)
}

/// `key bit [start [end [BYTE|BIT]]]`.
fn bitpos(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    out.push(bit(args)?);
    let start = args.opt_token("start")?;
    let end = args.opt_token("end")?;
    let unit = args.opt_keyword("unit", BIT_UNITS)?;
    match (start, end, unit) {
        (start, None, None) => out.extend(start),
        (Some(start), Some(end), unit) => {
            out.extend([start, end]);
            out.extend(unit);
        }
        (None, Some(_), _) => return Err(args.invalid("end requires start")),
        (_, None, Some(_)) => return Err(args.invalid("BYTE|BIT requires start and end")),
    }
    args.finish()?;
    Ok(out)
}

/// `operation destkey key [key ..]`; source keys may be variadic or one list.
fn bitop(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let operation = args.keyword("operation", BITOP_OPERATIONS)?;
    let mut out = vec![operation.clone(), args.token("destkey")?];
    let keys = args.rest();
    if keys.is_empty() {
        return Err(args.invalid("expects at least one source key"));
    }
    if operation == "NOT" && keys.len() != 1 {
        return Err(args.invalid("NOT takes exactly one source key"));
    }
    out.extend(keys);
    Ok(out)
}

fn bitfield(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    out.extend(args.rest());
    Ok(out)
}

/// `key GET encoding offset ..` from `{encoding: offset}` or flat pairs.
fn bitfield_ro(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    if let Some(gets) = args.next_arg().filter(|a| !a.is_null()) {
        for (encoding, offset) in builder::pairs(command, "GET", gets)? {
            out.extend([Token::from_static("GET"), encoding, offset]);
        }
    }
    args.finish()?;
    Ok(out)
}

fn pfadd(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    out.extend(args.rest());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::{args, opts, tokens, Response};

    #[test]
    fn test_bitop_styles_agree() {
        let variadic = build("BITOP", args!["AND", "dst", "k1", "k2"]).unwrap();
        let listed = build("BITOP", args!["and", "dst", ["k1", "k2"]]).unwrap();
        assert_eq!(variadic, tokens!["AND", "dst", "k1", "k2"]);
        assert_eq!(variadic, listed);
        assert_eq!(
            prefixed("BITOP", args!["OR", "dst", ["k1", "k2"]]),
            tokens!["OR", "p:dst", "p:k1", "p:k2"]
        );
    }

    #[test]
    fn test_bitop_validation() {
        let err = build_err("BITOP", args!["NAND", "dst", "k1"]);
        assert!(err.contains("Accepted values: AND, OR, XOR, NOT, DIFF, DIFF1, ANDOR, ONE"));
        assert!(build("BITOP", args!["NOT", "dst", "k1", "k2"]).is_err());
        assert!(build("BITOP", args!["XOR", "dst"]).is_err());
    }

    #[test]
    fn test_bitcount_ranges() {
        assert_eq!(build("BITCOUNT", args!["k"]).unwrap(), tokens!["k"]);
        assert_eq!(
            build("BITCOUNT", args!["k", 0, -1, "bit"]).unwrap(),
            tokens!["k", 0, -1, "BIT"]
        );
        assert!(build("BITCOUNT", args!["k", 0]).is_err());
        assert!(build_err("BITCOUNT", args!["k", 0, 1, "word"]).contains("Accepted values: BYTE, BIT"));
    }

    #[test]
    fn test_bitpos() {
        assert_eq!(build("BITPOS", args!["k", 1, 2]).unwrap(), tokens!["k", 1, 2]);
        assert_eq!(
            build("BITPOS", args!["k", 0, 2, 10, "BYTE"]).unwrap(),
            tokens!["k", 0, 2, 10, "BYTE"]
        );
        assert!(build("BITPOS", args!["k", 2]).is_err());
    }

    #[test]
    fn test_bitfield_ro() {
        assert_eq!(
            build("BITFIELD_RO", args!["k", opts! { "u8" => 0, "i4" => 8 }]).unwrap(),
            tokens!["k", "GET", "u8", 0, "GET", "i4", 8]
        );
        assert_eq!(build("BITFIELD_RO", args!["k"]).unwrap(), tokens!["k"]);
    }

    #[test]
    fn test_bitfield_passthrough() {
        assert_eq!(
            build("BITFIELD", args!["k", "INCRBY", "u2", 100, 1, "OVERFLOW", "SAT"]).unwrap(),
            tokens!["k", "INCRBY", "u2", 100, 1, "OVERFLOW", "SAT"]
        );
    }

    #[test]
    fn test_hyperloglog() {
        assert_eq!(
            parse("PFADD", args!["hll", "a", "b"], int(1)),
            Response::Bool(true)
        );
        assert_eq!(
            prefixed("PFMERGE", args!["dst", ["h1", "h2"]]),
            tokens!["p:dst", "p:h1", "p:h2"]
        );
        assert_eq!(prefixed("PFCOUNT", args!["h1", "h2"]), tokens!["p:h1", "p:h2"]);
    }
}
