//! Connection, server and transaction commands.

use resp_proto::{Token, Value};

use super::{passthrough, subcommand, variadic};
use crate::arg::Args;
use crate::builder::{Modifier, Modifiers};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::prefix::KeySpec;
use crate::reply::{identity, integers, map, to_int, to_map, to_vec};
use crate::response::{Response, insert};

const FLUSH_MODES: &[&str] = &["ASYNC", "SYNC"];

pub(crate) static COMMANDS: &[CommandSpec] = &[
    // connection
    CommandSpec::new("PING", ping, identity),
    CommandSpec::new("ECHO", passthrough, identity),
    CommandSpec::new("SELECT", passthrough, identity),
    CommandSpec::new("AUTH", auth, identity),
    CommandSpec::new("HELLO", hello, map),
    CommandSpec::new("QUIT", passthrough, identity),
    CommandSpec::new("RESET", passthrough, identity),
    // server
    CommandSpec::new("DBSIZE", passthrough, identity),
    CommandSpec::new("FLUSHDB", flush, identity),
    CommandSpec::new("FLUSHALL", flush, identity),
    CommandSpec::new("INFO", passthrough, parse_info),
    CommandSpec::new("LASTSAVE", passthrough, identity),
    CommandSpec::new("SAVE", passthrough, identity),
    CommandSpec::new("BGSAVE", bgsave, identity),
    CommandSpec::new("BGREWRITEAOF", passthrough, identity),
    CommandSpec::new("TIME", passthrough, integers),
    CommandSpec::new("SWAPDB", passthrough, identity),
    CommandSpec::new("SHUTDOWN", shutdown, identity),
    CommandSpec::new("REPLICAOF", passthrough, identity),
    CommandSpec::new("SLAVEOF", passthrough, identity),
    CommandSpec::new("FAILOVER", failover, identity),
    CommandSpec::new("COMMAND", passthrough, identity),
    CommandSpec::new("SLOWLOG", slowlog, parse_slowlog),
    CommandSpec::new("MEMORY", memory, parse_memory).keys(KeySpec::Custom(memory_keys)),
    // transactions
    CommandSpec::new("MULTI", passthrough, identity),
    CommandSpec::new("EXEC", passthrough, identity),
    CommandSpec::new("DISCARD", passthrough, identity),
    CommandSpec::new("WATCH", variadic, identity).keys(KeySpec::All),
    CommandSpec::new("UNWATCH", passthrough, identity),
];

// ── Connection ──────────────────────────────────────────────────────────

fn ping(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let out = args.opt_token("message")?.into_iter().collect();
    args.finish()?;
    Ok(out)
}

/// `[username] password`.
fn auth(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let out = args.rest();
    if out.is_empty() || out.len() > 2 {
        return Err(args.invalid("expects a password, optionally preceded by a username"));
    }
    Ok(out)
}

/// `protover [AUTH username password] [SETNAME name]`.
fn hello(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    static MODIFIERS: &[Modifier] = &[Modifier::values("AUTH", 2), Modifier::value("SETNAME")];
    let Some(version) = args.opt_int("protover")? else {
        args.finish()?;
        return Ok(Vec::new());
    };
    if !(2..=3).contains(&version) {
        return Err(args.invalid("protover must be 2 or 3"));
    }
    let mut out = vec![Token::Int(version)];
    Modifiers::collect(MODIFIERS, args)?.render(&mut out);
    Ok(out)
}

// ── Server ──────────────────────────────────────────────────────────────

fn flush(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let out = args.opt_keyword("mode", FLUSH_MODES)?.into_iter().collect();
    args.finish()?;
    Ok(out)
}

fn bgsave(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    if args.flag("SCHEDULE")? {
        out.push(Token::from_static("SCHEDULE"));
    }
    args.finish()?;
    Ok(out)
}

fn shutdown(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    static MODIFIERS: &[Modifier] = &[
        Modifier::choice("SAVE", &["NOSAVE", "SAVE"]),
        Modifier::flag("NOW"),
        Modifier::flag("FORCE"),
        Modifier::flag("ABORT"),
    ];
    let mut out = Vec::new();
    let modifiers = Modifiers::collect(MODIFIERS, args)?;
    if modifiers.has("ABORT") && (modifiers.has("SAVE") || modifiers.has("NOW") || modifiers.has("FORCE")) {
        return Err(args.invalid("ABORT cannot be combined with other modifiers"));
    }
    modifiers.render(&mut out);
    Ok(out)
}

/// `[TO host port [FORCE]] [ABORT] [TIMEOUT ms]`.
fn failover(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    static MODIFIERS: &[Modifier] = &[
        Modifier::values("TO", 2),
        Modifier::flag("FORCE"),
        Modifier::flag("ABORT"),
        Modifier::value("TIMEOUT"),
    ];
    let command = args.command();
    let mut out = Vec::new();
    let modifiers = Modifiers::collect(MODIFIERS, args)?;
    modifiers.requires(command, "FORCE", "TO")?;
    modifiers.requires(command, "FORCE", "TIMEOUT")?;
    modifiers.exclusive(command, &["ABORT", "TO"])?;
    modifiers.render(&mut out);
    Ok(out)
}

/// `{section: {field: value}}` from the `# Section` / `field:value` text.
/// Fields listed before any section header land under `default`.
fn parse_info(_: &Command, reply: Value) -> Result<Response, Error> {
    let text = reply
        .into_bytes()
        .ok_or(Error::UnexpectedResponse("expected INFO text"))?;
    let text = String::from_utf8_lossy(&text);
    let mut sections: Vec<(Response, Response)> = Vec::new();
    let mut section = String::from("default");
    let mut fields = Vec::new();
    for line in text.lines().map(str::trim) {
        if let Some(name) = line.strip_prefix('#') {
            if !fields.is_empty() {
                insert(&mut sections, Response::from(section.as_str()), Response::Map(std::mem::take(&mut fields)));
            }
            section = name.trim().to_string();
        } else if let Some((field, value)) = line.split_once(':') {
            insert(&mut fields, Response::from(field), Response::from(value));
        }
    }
    if !fields.is_empty() {
        insert(&mut sections, Response::from(section.as_str()), Response::Map(fields));
    }
    Ok(Response::Map(sections))
}

fn slowlog(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, &["GET", "LEN", "RESET", "HELP"])?;
    let mut out = vec![sub.clone()];
    if sub == "GET" {
        out.extend(args.opt_token("count")?);
    }
    args.finish()?;
    Ok(out)
}

const SLOWLOG_FIELDS: &[&str] = &["id", "timestamp", "duration", "command", "client", "client_name"];

/// `SLOWLOG GET` entries as maps; older servers omit the client fields.
fn parse_slowlog(command: &Command, reply: Value) -> Result<Response, Error> {
    if command.subcommand().as_deref() != Some("GET") {
        return identity(command, reply);
    }
    let mut entries = Vec::new();
    for entry in to_vec(reply)? {
        let mut fields = Vec::new();
        for (name, value) in SLOWLOG_FIELDS.iter().zip(to_vec(entry)?) {
            let value = match *name {
                "id" | "timestamp" | "duration" => to_int(value)?,
                _ => Response::from(value),
            };
            fields.push((Response::from(*name), value));
        }
        entries.push(Response::Map(fields));
    }
    Ok(Response::List(entries))
}

const MEMORY_SUBCOMMANDS: &[&str] = &["USAGE", "STATS", "DOCTOR", "PURGE", "MALLOC-STATS", "HELP"];

fn memory(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let sub = subcommand(args, MEMORY_SUBCOMMANDS)?;
    let mut out = vec![sub.clone()];
    if sub == "USAGE" {
        out.push(args.token("key")?);
        if let Some(samples) = args.opt_int("samples")? {
            if samples < 0 {
                return Err(args.invalid("SAMPLES must not be negative"));
            }
            out.extend([Token::from_static("SAMPLES"), Token::Int(samples)]);
        }
    }
    args.finish()?;
    Ok(out)
}

fn memory_keys(args: &[Token]) -> Vec<usize> {
    match args.first() {
        Some(sub) if sub.eq_ignore_ascii_case("USAGE") => vec![1],
        _ => Vec::new(),
    }
}

fn parse_memory(command: &Command, reply: Value) -> Result<Response, Error> {
    match command.subcommand().as_deref() {
        Some("STATS") => to_map(reply),
        _ => identity(command, reply),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::{args, opts, tokens, Response};
    use resp_proto::Value;

    #[test]
    fn test_ping_and_echo() {
        assert_eq!(build("PING", args![]).unwrap(), tokens![]);
        assert_eq!(build("PING", args!["hi"]).unwrap(), tokens!["hi"]);
        assert_eq!(parse("PING", args![], Value::SimpleString("PONG".into())), Response::status("PONG"));
    }

    #[test]
    fn test_auth_arity() {
        assert_eq!(build("AUTH", args!["user", "pass"]).unwrap(), tokens!["user", "pass"]);
        assert!(build("AUTH", args![]).is_err());
        assert!(build("AUTH", args!["a", "b", "c"]).is_err());
    }

    #[test]
    fn test_hello() {
        let call = args![3, opts! { "setname" => "app", "auth" => ["user", "pass"] }];
        assert_eq!(
            build("HELLO", call).unwrap(),
            tokens![3, "AUTH", "user", "pass", "SETNAME", "app"]
        );
        assert!(build("HELLO", args![4]).is_err());
        let reply = arr(vec![b("server"), b("redis"), b("proto"), int(2)]);
        let resp3 = Value::Map(vec![(b("server"), b("redis")), (b("proto"), int(2))]);
        assert_eq!(parse("HELLO", args![2], reply), parse3("HELLO", args![2], resp3));
    }

    #[test]
    fn test_flush_modes() {
        assert_eq!(build("FLUSHALL", args!["async"]).unwrap(), tokens!["ASYNC"]);
        assert!(build_err("FLUSHDB", args!["NOW"]).contains("Accepted values: ASYNC, SYNC"));
    }

    #[test]
    fn test_info_sections() {
        let text = "# Server\r\nredis_version:7.2.0\r\nrun_id:abc\r\n\r\n# Keyspace\r\ndb0:keys=1,expires=0\r\n";
        let expected = Response::map([
            ("Server", Response::map([("redis_version", "7.2.0"), ("run_id", "abc")])),
            ("Keyspace", Response::map([("db0", "keys=1,expires=0")])),
        ]);
        assert_eq!(parse("INFO", args![], b(text)), expected);
    }

    #[test]
    fn test_time() {
        assert_eq!(
            parse("TIME", args![], bulks(&["1714000000", "123"])),
            Response::list([1714000000i64, 123])
        );
    }

    #[test]
    fn test_shutdown_and_failover() {
        assert_eq!(
            build("SHUTDOWN", args![opts! { "now" => true, "save" => "nosave" }]).unwrap(),
            tokens!["NOSAVE", "NOW"]
        );
        assert!(build("SHUTDOWN", args!["ABORT", "NOW"]).is_err());
        assert_eq!(
            build("FAILOVER", args![opts! { "to" => args!["host", 6380], "timeout" => 100, "force" => true }]).unwrap(),
            tokens!["TO", "host", 6380, "FORCE", "TIMEOUT", 100]
        );
        assert!(build("FAILOVER", args![opts! { "force" => true }]).is_err());
    }

    #[test]
    fn test_slowlog_get() {
        let entry = arr(vec![
            int(14),
            int(1309448221),
            int(15),
            bulks(&["ping"]),
            b("127.0.0.1:58217"),
            b("worker-123"),
        ]);
        let expected = Response::list([Response::map([
            ("id", Response::Int(14)),
            ("timestamp", Response::Int(1309448221)),
            ("duration", Response::Int(15)),
            ("command", Response::list(["ping"])),
            ("client", Response::from("127.0.0.1:58217")),
            ("client_name", Response::from("worker-123")),
        ])]);
        assert_eq!(parse("SLOWLOG", args!["get", 1], arr(vec![entry])), expected);
        assert_eq!(parse("SLOWLOG", args!["LEN"], int(3)), Response::Int(3));
    }

    #[test]
    fn test_memory_usage_prefix() {
        assert_eq!(
            prefixed("MEMORY", args!["usage", "k", 5]),
            tokens!["USAGE", "p:k", "SAMPLES", 5]
        );
        assert_eq!(prefixed("MEMORY", args!["STATS"]), tokens!["STATS"]);
        let reply = arr(vec![b("peak.allocated"), int(100)]);
        assert_eq!(
            parse("MEMORY", args!["STATS"], reply),
            Response::map([("peak.allocated", 100)])
        );
    }

    #[test]
    fn test_exec_nested_errors() {
        let reply = arr(vec![Value::SimpleString("OK".into()), Value::Error("WRONGTYPE bad".into())]);
        let response = parse("EXEC", args![], reply);
        let items = response.as_list().unwrap();
        assert!(items[0].is_ok());
        assert!(matches!(&items[1], Response::Error(e) if e.code() == "WRONGTYPE"));
        assert_eq!(parse("EXEC", args![], Value::Null), Response::Nil);
    }

    #[test]
    fn test_watch_prefix() {
        assert_eq!(prefixed("WATCH", args![["a", "b"]]), tokens!["p:a", "p:b"]);
    }
}
