//! `ACL` subcommands.

use resp_proto::{Token, Value};

use crate::arg::{Arg, Args};
use crate::command::{Command, CommandSpec};
use crate::commands::subcommand;
use crate::error::Error;
use crate::reply::{identity, to_map_fields, to_maps};
use crate::response::Response;

const SUBCOMMANDS: &[&str] = &[
    "CAT", "DELUSER", "DRYRUN", "GENPASS", "GETUSER", "LIST", "LOAD", "LOG", "SAVE", "SETUSER",
    "USERS", "WHOAMI",
];

pub(crate) static COMMANDS: &[CommandSpec] = &[CommandSpec::new("ACL", acl, parse_acl)];

fn acl(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, SUBCOMMANDS)?;
    let mut out = vec![sub.clone()];
    match sub.as_bytes().unwrap_or_default() {
        b"CAT" => out.extend(args.opt_token("category")?),
        b"DELUSER" => {
            let users = args.rest();
            if users.is_empty() {
                return Err(args.invalid("DELUSER expects at least one username"));
            }
            out.extend(users);
        }
        b"DRYRUN" => {
            out.extend([args.token("username")?, args.token("command")?]);
            out.extend(args.rest());
        }
        b"GENPASS" => out.extend(args.opt_int("bits")?.map(Token::Int)),
        b"GETUSER" => out.push(args.token("username")?),
        b"LOG" => match args.next_arg() {
            None | Some(Arg::Null) => {}
            Some(arg) if arg.is_literal("RESET") => {
                out.push(Token::from_static("RESET"));
                args.mark("RESET");
            }
            Some(arg) => match arg.as_int() {
                Some(count) => out.push(Token::Int(count)),
                None => return Err(args.invalid("LOG expects a count or RESET")),
            },
        },
        b"SETUSER" => {
            out.push(args.token("username")?);
            out.extend(args.rest());
        }
        _ => {}
    }
    args.finish()?;
    Ok(out)
}

fn parse_acl(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("GETUSER") => to_map_fields(reply, &[("selectors", to_maps)]),
        Some("LOG") if !command.has_flag("RESET") => to_maps(reply),
        _ => identity(command, reply),
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::test_util::*;
    use crate::{args, tokens, Response};
    use resp_proto::Value;

    #[test]
    fn test_acl_subcommand_validation() {
        assert_eq!(build("ACL", args!["whoami"]).unwrap(), tokens!["WHOAMI"]);
        let err = build_err("ACL", args!["BOGUS"]);
        assert!(err.contains("Accepted values: CAT, DELUSER, DRYRUN"));
        assert!(build("ACL", args!["DELUSER"]).is_err());
        assert!(build("ACL", args!["WHOAMI", "extra"]).is_err());
    }

    #[test]
    fn test_acl_setuser_and_dryrun() {
        assert_eq!(
            build("ACL", args!["SETUSER", "alice", ["on", ">pw", "~cached:*", "+get"]]).unwrap(),
            tokens!["SETUSER", "alice", "on", ">pw", "~cached:*", "+get"]
        );
        assert_eq!(
            build("ACL", args!["dryrun", "alice", "GET", "k"]).unwrap(),
            tokens!["DRYRUN", "alice", "GET", "k"]
        );
        assert_eq!(build("ACL", args!["GENPASS", 64]).unwrap(), tokens!["GENPASS", 64]);
    }

    #[test]
    fn test_acl_getuser_selectors() {
        let reply = arr(vec![
            b("flags"),
            bulks(&["on"]),
            b("selectors"),
            arr(vec![arr(vec![b("commands"), b("-@all +get"), b("keys"), b("~k*")])]),
        ]);
        let expected = Response::map([
            ("flags", Response::list(["on"])),
            (
                "selectors",
                Response::list([Response::map([("commands", "-@all +get"), ("keys", "~k*")])]),
            ),
        ]);
        assert_eq!(parse("ACL", args!["GETUSER", "alice"], reply), expected);
        assert_eq!(
            parse("ACL", args!["GETUSER", "nobody"], Value::Null),
            Response::Nil
        );
    }

    #[test]
    fn test_acl_log() {
        assert_eq!(build("ACL", args!["LOG", 10]).unwrap(), tokens!["LOG", 10]);
        assert_eq!(build("ACL", args!["LOG", "reset"]).unwrap(), tokens!["LOG", "RESET"]);
        assert!(build("ACL", args!["LOG", "soon"]).is_err());

        let reply = arr(vec![arr(vec![b("count"), int(1), b("reason"), b("auth")])]);
        assert_eq!(
            parse("ACL", args!["LOG"], reply),
            Response::list([Response::map([
                ("count", Response::Int(1)),
                ("reason", Response::from("auth")),
            ])])
        );
        assert!(parse("ACL", args!["LOG", "RESET"], Value::ok()).is_ok());
    }
}
