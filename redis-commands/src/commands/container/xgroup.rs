//! `XGROUP` subcommands.

use resp_proto::Token;

use crate::arg::Args;
use crate::builder::{Modifier, Modifiers};
use crate::command::CommandSpec;
use crate::commands::subcommand;
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::identity;

const SUBCOMMANDS: &[&str] = &["CREATE", "CREATECONSUMER", "DELCONSUMER", "DESTROY", "SETID"];

pub(crate) static COMMANDS: &[CommandSpec] =
    &[CommandSpec::new("XGROUP", xgroup, identity).keys(KeySpec::Positions(&[1]))];

static CREATE_MODIFIERS: &[Modifier] = &[Modifier::flag("MKSTREAM"), Modifier::value("ENTRIESREAD")];

fn xgroup(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, SUBCOMMANDS)?;
    let mut out = vec![sub.clone(), args.token("key")?, args.token("group")?];
    match sub.as_bytes().unwrap_or_default() {
        b"CREATE" => {
            out.push(args.token("id")?);
            Modifiers::collect(CREATE_MODIFIERS, args)?.render(&mut out);
        }
        b"CREATECONSUMER" | b"DELCONSUMER" => out.push(args.token("consumer")?),
        b"SETID" => {
            out.push(args.token("id")?);
            if let Some(read) = args.opt_int("entriesread")? {
                out.extend([Token::from_static("ENTRIESREAD"), Token::Int(read)]);
            }
        }
        _ => {}
    }
    args.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::commands::test_util::*;
    use crate::{args, opts, tokens, Response};

    #[test]
    fn test_xgroup_create() {
        assert_eq!(
            build("XGROUP", args!["create", "s", "g", "$", opts! { "mkstream" => true, "entriesread" => 3 }])
                .unwrap(),
            tokens!["CREATE", "s", "g", "$", "MKSTREAM", "ENTRIESREAD", 3]
        );
        assert_eq!(
            prefixed("XGROUP", args!["CREATE", "s", "g", "0", "MKSTREAM"]),
            tokens!["CREATE", "p:s", "g", "0", "MKSTREAM"]
        );
        assert!(build_err("XGROUP", args!["CREATE", "s", "g", "$", opts! { "nomkstream" => true }])
            .contains("MKSTREAM, ENTRIESREAD"));
    }

    #[test]
    fn test_xgroup_consumers_and_destroy() {
        assert_eq!(
            prefixed("XGROUP", args!["CREATECONSUMER", "s", "g", "alice"]),
            tokens!["CREATECONSUMER", "p:s", "g", "alice"]
        );
        assert_eq!(build("XGROUP", args!["destroy", "s", "g"]).unwrap(), tokens!["DESTROY", "s", "g"]);
        assert!(build("XGROUP", args!["DESTROY", "s", "g", "extra"]).is_err());
        assert_eq!(parse("XGROUP", args!["DESTROY", "s", "g"], int(1)), Response::Int(1));
    }

    #[test]
    fn test_xgroup_setid() {
        assert_eq!(
            build("XGROUP", args!["SETID", "s", "g", "0-0", 5]).unwrap(),
            tokens!["SETID", "s", "g", "0-0", "ENTRIESREAD", 5]
        );
        assert_eq!(
            build("XGROUP", args!["SETID", "s", "g", "$"]).unwrap(),
            tokens!["SETID", "s", "g", "$"]
        );
    }
}
