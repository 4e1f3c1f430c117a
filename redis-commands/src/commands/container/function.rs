//! `FUNCTION` subcommands.

use resp_proto::{Token, Value};

use crate::arg::Args;
use crate::builder::{Modifier, Modifiers};
use crate::command::{Command, CommandSpec};
use crate::commands::subcommand;
use crate::error::Error;
use crate::reply::{identity, to_list_with, to_map, to_map_fields, to_map_with, to_maps};
use crate::response::Response;

const SUBCOMMANDS: &[&str] = &[
    "LOAD", "DELETE", "FLUSH", "KILL", "LIST", "DUMP", "RESTORE", "STATS",
];

pub(crate) static COMMANDS: &[CommandSpec] =
    &[CommandSpec::new("FUNCTION", function, parse_function)];

static LIST_MODIFIERS: &[Modifier] = &[Modifier::value("LIBRARYNAME"), Modifier::flag("WITHCODE")];

fn function(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, SUBCOMMANDS)?;
    let mut out = vec![sub.clone()];
    match sub.as_bytes().unwrap_or_default() {
        b"LOAD" => {
            let code = args.token("code")?;
            if args.flag("REPLACE")? {
                out.push(Token::from_static("REPLACE"));
            }
            out.push(code);
        }
        b"DELETE" => out.push(args.token("library")?),
        b"FLUSH" => out.extend(args.opt_keyword("mode", &["ASYNC", "SYNC"])?),
        b"LIST" => Modifiers::collect(LIST_MODIFIERS, args)?.render(&mut out),
        b"RESTORE" => {
            out.push(args.token("payload")?);
            out.extend(args.opt_keyword("policy", &["FLUSH", "APPEND", "REPLACE"])?);
        }
        _ => {}
    }
    args.finish()?;
    Ok(out)
}

fn parse_function(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("LIST") => to_list_with(reply, library),
        Some("STATS") => to_map_fields(reply, &[("running_script", to_map), ("engines", engines)]),
        _ => identity(command, reply),
    }
}

fn library(value: Value) -> Result<Response, Error> {
    to_map_fields(value, &[("functions", to_maps)])
}

fn engines(value: Value) -> Result<Response, Error> {
    to_map_with(value, to_map)
}

#[cfg(test)]
mod tests {
    use crate::commands::test_util::*;
    use crate::{args, opts, tokens, Response};
    use resp_proto::Value;

    const CODE: &str = "#!lua name=mylib\nredis.register_function('f', function() return 1 end)";

    #[test]
    fn test_function_load() {
        assert_eq!(build("FUNCTION", args!["LOAD", CODE]).unwrap(), tokens!["LOAD", CODE]);
        assert_eq!(
            build("FUNCTION", args!["load", CODE, true]).unwrap(),
            tokens!["LOAD", "REPLACE", CODE]
        );
        assert!(build("FUNCTION", args!["LOAD"]).is_err());
    }

    #[test]
    fn test_function_list_modifiers() {
        assert_eq!(
            build("FUNCTION", args!["LIST", opts! { "withcode" => true, "libraryname" => "my*" }]).unwrap(),
            tokens!["LIST", "LIBRARYNAME", "my*", "WITHCODE"]
        );
        assert_eq!(
            build("FUNCTION", args!["LIST", "WITHCODE"]).unwrap(),
            tokens!["LIST", "WITHCODE"]
        );
    }

    #[test]
    fn test_function_list_parse() {
        let reply = arr(vec![arr(vec![
            b("library_name"),
            b("mylib"),
            b("engine"),
            b("LUA"),
            b("functions"),
            arr(vec![arr(vec![
                b("name"),
                b("f"),
                b("description"),
                Value::Null,
                b("flags"),
                arr(vec![]),
            ])]),
        ])]);
        let expected = Response::list([Response::map([
            ("library_name", Response::from("mylib")),
            ("engine", Response::from("LUA")),
            (
                "functions",
                Response::list([Response::map([
                    ("name", Response::from("f")),
                    ("description", Response::Nil),
                    ("flags", Response::List(vec![])),
                ])]),
            ),
        ])]);
        assert_eq!(parse("FUNCTION", args!["LIST"], reply), expected);
    }

    #[test]
    fn test_function_stats_parse() {
        let reply = arr(vec![
            b("running_script"),
            Value::Null,
            b("engines"),
            arr(vec![
                b("LUA"),
                arr(vec![b("libraries_count"), int(1), b("functions_count"), int(2)]),
            ]),
        ]);
        let expected = Response::map([
            ("running_script", Response::Nil),
            (
                "engines",
                Response::map([(
                    "LUA",
                    Response::map([("libraries_count", 1), ("functions_count", 2)]),
                )]),
            ),
        ]);
        assert_eq!(parse("FUNCTION", args!["STATS"], reply), expected);
    }

    #[test]
    fn test_function_restore_and_flush() {
        assert_eq!(
            build("FUNCTION", args!["RESTORE", "payload", "append"]).unwrap(),
            tokens!["RESTORE", "payload", "APPEND"]
        );
        assert!(build_err("FUNCTION", args!["FLUSH", "now"]).contains("Accepted values: ASYNC, SYNC"));
        assert_eq!(build("FUNCTION", args!["DUMP"]).unwrap(), tokens!["DUMP"]);
    }
}
