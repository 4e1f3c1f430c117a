//! Geospatial commands.

use resp_proto::{Token, Value};

use super::key_variadic;
use crate::arg::Args;
use crate::builder::{self, Modifier, Modifiers};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::options::{GeoBy, GeoFrom, GeoUnit, Render};
use crate::prefix::KeySpec;
use crate::reply::{float, identity, to_float, to_int, to_list_with, to_vec};
use crate::response::{Response, insert};

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("GEOADD", geoadd, identity).keys(KeySpec::First),
    CommandSpec::new("GEODIST", geodist, float).keys(KeySpec::First),
    CommandSpec::new("GEOHASH", key_variadic, identity).keys(KeySpec::First),
    CommandSpec::new("GEOPOS", key_variadic, parse_geopos).keys(KeySpec::First),
    CommandSpec::new("GEORADIUS", georadius, parse_members).keys(RADIUS_KEYS),
    CommandSpec::new("GEORADIUS_RO", georadius_ro, parse_members).keys(KeySpec::First),
    CommandSpec::new("GEORADIUSBYMEMBER", georadiusbymember, parse_members).keys(BYMEMBER_KEYS),
    CommandSpec::new("GEORADIUSBYMEMBER_RO", georadiusbymember_ro, parse_members)
        .keys(KeySpec::First),
    CommandSpec::new("GEOSEARCH", geosearch, parse_members).keys(KeySpec::First),
    CommandSpec::new("GEOSEARCHSTORE", geosearchstore, identity)
        .keys(KeySpec::Positions(&[0, 1])),
];

/// The source key plus any key following `STORE`/`STOREDIST`.
const RADIUS_KEYS: KeySpec = KeySpec::Many(&[
    KeySpec::First,
    KeySpec::After {
        from: 5,
        literals: &["STORE", "STOREDIST"],
    },
]);

const BYMEMBER_KEYS: KeySpec = KeySpec::Many(&[
    KeySpec::First,
    KeySpec::After {
        from: 4,
        literals: &["STORE", "STOREDIST"],
    },
]);

const GEOADD_FLAGS: &[&str] = &["NX", "XX", "CH"];

/// `key [NX|XX] [CH] longitude latitude member ..`. Members may be given
/// flat or as `[longitude, latitude, member]` triples.
fn geoadd(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let mut flags = [false; 3];
    while let Some(arg) = args.peek() {
        let Some(i) = GEOADD_FLAGS.iter().position(|f| arg.is_literal(f)) else {
            break;
        };
        flags[i] = true;
        args.next_arg();
    }
    if flags[0] && flags[1] {
        return Err(Error::invalid(command, "NX and XX are mutually exclusive"));
    }
    for (name, set) in GEOADD_FLAGS.iter().zip(flags) {
        if set {
            out.push(Token::from_static(*name));
        }
    }
    let members = builder::flatten_all(args.take_rest());
    if members.is_empty() || members.len() % 3 != 0 {
        return Err(Error::invalid(
            command,
            "expects longitude, latitude, member triples",
        ));
    }
    out.extend(members);
    Ok(out)
}

fn geodist(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?, args.token("member1")?, args.token("member2")?];
    if let Some(unit) = args.next_arg().filter(|a| !a.is_null()) {
        GeoUnit::from_arg(command, unit)?.render(&mut out);
    }
    args.finish()?;
    Ok(out)
}

/// Each position becomes `[longitude, latitude]` floats; missing members stay nil.
fn parse_geopos(_: &Command, reply: Value) -> Result<Response, Error> {
    to_list_with(reply, |position| to_list_with(position, to_float))
}

// ── Radius queries ──────────────────────────────────────────────────────

/// Modifiers that change the reply shape.
const REPLY_FLAGS: &[&str] = &["WITHCOORD", "WITHDIST", "WITHHASH", "STORE", "STOREDIST"];

static RADIUS_MODIFIERS: &[Modifier] = &[
    Modifier::flag("WITHCOORD"),
    Modifier::flag("WITHDIST"),
    Modifier::flag("WITHHASH"),
    Modifier::value("COUNT"),
    Modifier::flag("ANY"),
    Modifier::choice("SORT", &["ASC", "DESC"]),
    Modifier::value("STORE"),
    Modifier::value("STOREDIST"),
];

static RADIUS_RO_MODIFIERS: &[Modifier] = &[
    Modifier::flag("WITHCOORD"),
    Modifier::flag("WITHDIST"),
    Modifier::flag("WITHHASH"),
    Modifier::value("COUNT"),
    Modifier::flag("ANY"),
    Modifier::choice("SORT", &["ASC", "DESC"]),
];

fn radius_tail(
    args: &mut Args<'_>,
    table: &'static [Modifier],
    out: &mut Vec<Token>,
) -> Result<(), Error> {
    let command = args.command();
    let radius = args.float("radius")?;
    out.push(Token::Float(radius));
    GeoUnit::from_arg(command, args.required("unit")?)?.render(out);
    let modifiers = Modifiers::collect(table, args)?;
    modifiers.requires(command, "ANY", "COUNT")?;
    modifiers.mark(args, REPLY_FLAGS);
    modifiers.render(out);
    Ok(())
}

fn georadius_with(args: &mut Args<'_>, table: &'static [Modifier]) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    out.push(Token::Float(args.float("longitude")?));
    out.push(Token::Float(args.float("latitude")?));
    radius_tail(args, table, &mut out)?;
    Ok(out)
}

fn georadius(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    georadius_with(args, RADIUS_MODIFIERS)
}

fn georadius_ro(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    georadius_with(args, RADIUS_RO_MODIFIERS)
}

fn georadiusbymember_with(
    args: &mut Args<'_>,
    table: &'static [Modifier],
) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("member")?];
    radius_tail(args, table, &mut out)?;
    Ok(out)
}

fn georadiusbymember(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    georadiusbymember_with(args, RADIUS_MODIFIERS)
}

fn georadiusbymember_ro(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    georadiusbymember_with(args, RADIUS_RO_MODIFIERS)
}

// ── GEOSEARCH ───────────────────────────────────────────────────────────

static SEARCH_MODIFIERS: &[Modifier] = &[
    Modifier::choice("SORT", &["ASC", "DESC"]),
    Modifier::value("COUNT"),
    Modifier::flag("ANY"),
    Modifier::flag("WITHCOORD"),
    Modifier::flag("WITHDIST"),
    Modifier::flag("WITHHASH"),
];

static SEARCHSTORE_MODIFIERS: &[Modifier] = &[
    Modifier::choice("SORT", &["ASC", "DESC"]),
    Modifier::value("COUNT"),
    Modifier::flag("ANY"),
    Modifier::flag("STOREDIST"),
];

/// `FROMMEMBER|FROMLONLAT .. BYRADIUS|BYBOX .. [modifiers]`.
fn search_tail(
    args: &mut Args<'_>,
    table: &'static [Modifier],
    out: &mut Vec<Token>,
) -> Result<(), Error> {
    let command = args.command();
    GeoFrom::from_arg(command, args.required("from")?)?.render(out);
    GeoBy::from_arg(command, args.required("by")?)?.render(out);
    let modifiers = Modifiers::collect(table, args)?;
    modifiers.requires(command, "ANY", "COUNT")?;
    modifiers.mark(args, REPLY_FLAGS);
    modifiers.render(out);
    Ok(())
}

fn geosearch(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    search_tail(args, SEARCH_MODIFIERS, &mut out)?;
    Ok(out)
}

fn geosearchstore(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("destination")?, args.token("source")?];
    search_tail(args, SEARCHSTORE_MODIFIERS, &mut out)?;
    Ok(out)
}

// ── Replies ─────────────────────────────────────────────────────────────

/// With any `WITH*` flag, each `[member, dist?, hash?, coord?]` entry becomes
/// `{member: {dist, hash, coord: [lon, lat]}}`. The server always sends the
/// extras in that order.
fn parse_members(command: &Command, reply: Value) -> Result<Response, Error> {
    let dist = command.has_flag("WITHDIST");
    let hash = command.has_flag("WITHHASH");
    let coord = command.has_flag("WITHCOORD");
    if !(dist || hash || coord) || command.has_flag("STORE") || command.has_flag("STOREDIST") {
        return Ok(Response::from(reply));
    }
    let mut members = Vec::new();
    for entry in to_vec(reply)? {
        let mut fields = to_vec(entry)?.into_iter();
        let member = fields
            .next()
            .ok_or(Error::UnexpectedResponse("expected a member name"))?;
        let mut details = Vec::new();
        let mut next = || {
            fields
                .next()
                .ok_or(Error::UnexpectedResponse("missing geo detail"))
        };
        if dist {
            details.push((Response::from("dist"), to_float(next()?)?));
        }
        if hash {
            details.push((Response::from("hash"), to_int(next()?)?));
        }
        if coord {
            details.push((Response::from("coord"), to_list_with(next()?, to_float)?));
        }
        insert(&mut members, Response::from(member), Response::Map(details));
    }
    Ok(Response::Map(members))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::{args, opts, tokens, Response};
    use resp_proto::Value;

    #[test]
    fn test_geoadd() {
        assert_eq!(
            build("GEOADD", args!["Sicily", 13.361389, 38.115556, "Palermo"]).unwrap(),
            tokens!["Sicily", 13.361389, 38.115556, "Palermo"]
        );
        assert_eq!(
            build("GEOADD", args!["Sicily", "ch", vec![args![13.36, 38.11, "Palermo"], args![15.08, 37.5, "Catania"]]]).unwrap(),
            tokens!["Sicily", "CH", 13.36, 38.11, "Palermo", 15.08, 37.5, "Catania"]
        );
        assert!(build("GEOADD", args!["Sicily", 13.36, 38.11]).is_err());
        assert!(build("GEOADD", args!["Sicily", "NX", "XX", 1, 2, "m"]).is_err());
    }

    #[test]
    fn test_geodist() {
        assert_eq!(
            build("GEODIST", args!["Sicily", "Palermo", "Catania", "KM"]).unwrap(),
            tokens!["Sicily", "Palermo", "Catania", "km"]
        );
        assert!(build_err("GEODIST", args!["Sicily", "a", "b", "yd"]).contains("Accepted values: m, km, ft, mi"));
        assert_eq!(
            parse("GEODIST", args!["Sicily", "a", "b"], b("166274.1516")),
            Response::Float(166274.1516)
        );
    }

    #[test]
    fn test_geopos() {
        let reply = arr(vec![bulks(&["13.5", "38.1"]), Value::Null]);
        assert_eq!(
            parse("GEOPOS", args!["Sicily", "Palermo", "nowhere"], reply),
            Response::list([Response::list([13.5, 38.1]), Response::Nil])
        );
    }

    #[test]
    fn test_georadius_styles_agree() {
        let mapped = build(
            "GEORADIUS",
            args!["Sicily", 15, 37, 200, "km", opts! { "sort" => "asc", "count" => 5, "withdist" => true }],
        )
        .unwrap();
        let raw = build("GEORADIUS", args!["Sicily", 15, 37, 200, "km", "ASC", "COUNT", 5, "WITHDIST"]).unwrap();
        assert_eq!(mapped, tokens!["Sicily", 15.0, 37.0, 200.0, "km", "WITHDIST", "COUNT", 5, "ASC"]);
        assert_eq!(mapped, raw);
    }

    #[test]
    fn test_georadius_any_requires_count() {
        let err = build_err("GEORADIUS", args!["Sicily", 15, 37, 200, "km", opts! { "any" => true }]);
        assert!(err.contains("ANY requires COUNT"));
    }

    #[test]
    fn test_georadius_store_keys_are_prefixed() {
        let call = args!["Sicily", 15, 37, 200, "km", opts! { "store" => "dst", "storedist" => "dist" }];
        assert_eq!(
            prefixed("GEORADIUS", call),
            tokens!["p:Sicily", 15.0, 37.0, 200.0, "km", "STORE", "p:dst", "STOREDIST", "p:dist"]
        );
        let call = args!["Sicily", "Palermo", 200, "km", opts! { "store" => "dst" }];
        assert_eq!(
            prefixed("GEORADIUSBYMEMBER", call),
            tokens!["p:Sicily", "Palermo", 200.0, "km", "STORE", "p:dst"]
        );
    }

    #[test]
    fn test_georadius_ro_rejects_store() {
        assert!(build("GEORADIUS_RO", args!["Sicily", 15, 37, 200, "km", opts! { "store" => "dst" }]).is_err());
    }

    #[test]
    fn test_georadius_with_details() {
        let call = args!["Sicily", 15, 37, 200, "km", "WITHCOORD", "WITHDIST", "WITHHASH"];
        let reply = arr(vec![arr(vec![
            b("Palermo"),
            b("190.4424"),
            int(3479099956230698),
            bulks(&["13.36", "38.11"]),
        ])]);
        let expected = Response::map([(
            "Palermo",
            Response::map([
                ("dist", Response::Float(190.4424)),
                ("hash", Response::Int(3479099956230698)),
                ("coord", Response::list([13.36, 38.11])),
            ]),
        )]);
        assert_eq!(parse("GEORADIUS", call, reply), expected);
    }

    #[test]
    fn test_georadius_plain_members() {
        let call = args!["Sicily", 15, 37, 200, "km"];
        assert_eq!(
            parse("GEORADIUS", call, bulks(&["Palermo", "Catania"])),
            Response::list(["Palermo", "Catania"])
        );
    }

    #[test]
    fn test_member_named_like_flag_stays_plain() {
        let call = args!["withdist", "withcoord", 200, "km"];
        assert_eq!(
            parse("GEORADIUSBYMEMBER", call, bulks(&["store", "withhash"])),
            Response::list(["store", "withhash"])
        );
    }

    #[test]
    fn test_geosearch() {
        let call = args![
            "Sicily",
            opts! { "lonlat" => [15, 37] },
            opts! { "width" => 400, "height" => 400, "unit" => "km" },
            opts! { "sort" => "asc", "withcoord" => true }
        ];
        assert_eq!(
            build("GEOSEARCH", call).unwrap(),
            tokens!["Sicily", "FROMLONLAT", 15.0, 37.0, "BYBOX", 400.0, 400.0, "km", "ASC", "WITHCOORD"]
        );
        let err = build_err("GEOSEARCH", args!["Sicily", 5, args![200, "km"]]);
        assert!(err.contains("Invalid FROM argument value given"));
    }

    #[test]
    fn test_geosearchstore() {
        let call = args!["dst", "src", "Palermo", args![200, "km"], opts! { "storedist" => true }];
        assert_eq!(
            prefixed("GEOSEARCHSTORE", call),
            tokens!["p:dst", "p:src", "FROMMEMBER", "Palermo", "BYRADIUS", 200.0, "km", "STOREDIST"]
        );
    }
}
