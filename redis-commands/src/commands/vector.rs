//! Vector set commands.

use resp_proto::{Token, Value};

use super::passthrough;
use crate::arg::{Arg, Args};
use crate::builder::{Modifier, Modifiers, one_of};
use crate::command::{Command, CommandSpec};
use crate::error::Error;
use crate::options::{Render, VectorInput};
use crate::prefix::KeySpec;
use crate::reply::{boolean, identity, map, to_float, to_list_with, to_pairs, to_scores, to_vec};
use crate::response::{Response, insert};

pub(crate) static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("VADD", vadd, boolean).keys(KeySpec::First),
    CommandSpec::new("VCARD", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("VDIM", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("VEMB", vemb, parse_vemb).keys(KeySpec::First),
    CommandSpec::new("VGETATTR", passthrough, identity).keys(KeySpec::First),
    CommandSpec::new("VSETATTR", vsetattr, boolean).keys(KeySpec::First),
    CommandSpec::new("VINFO", passthrough, map).keys(KeySpec::First),
    CommandSpec::new("VISMEMBER", passthrough, boolean).keys(KeySpec::First),
    CommandSpec::new("VLINKS", vlinks, parse_vlinks).keys(KeySpec::First),
    CommandSpec::new("VRANDMEMBER", vrandmember, identity).keys(KeySpec::First),
    CommandSpec::new("VREM", passthrough, boolean).keys(KeySpec::First),
    CommandSpec::new("VSIM", vsim, parse_vsim).keys(KeySpec::First),
];

const QUANTIZATION: &[&str] = &["NOQUANT", "Q8", "BIN"];

/// Attributes are sent as a JSON object; strings are taken as already encoded.
fn attributes(command: &str, arg: &Arg) -> Result<Token, Error> {
    match arg {
        Arg::Bytes(json) => Ok(Token::Bulk(json.clone())),
        Arg::Map(_) => {
            let json = serde_json::to_string(&to_json(arg))
                .map_err(|e| Error::invalid(command, format!("attributes are not valid JSON: {e}")))?;
            Ok(Token::from(json))
        }
        _ => Err(Error::invalid(command, "attributes must be a JSON string or a map")),
    }
}

pub(crate) fn to_json(arg: &Arg) -> serde_json::Value {
    use serde_json::Value as Json;
    match arg {
        Arg::Null => Json::Null,
        Arg::Bool(b) => Json::Bool(*b),
        Arg::Int(n) => Json::from(*n),
        Arg::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Arg::Bytes(b) => Json::String(String::from_utf8_lossy(b).into_owned()),
        Arg::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Arg::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (String::from_utf8_lossy(k).into_owned(), to_json(v)))
                .collect(),
        ),
    }
}

/// `key [REDUCE dim] FP32 blob|VALUES n v.. element [CAS] [NOQUANT|Q8|BIN]
/// [EF n] [SETATTR json] [M n]`.
fn vadd(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let vector = VectorInput::from_arg(command, args.required("vector")?)?;
    let element = args.token("element")?;
    let options = args.options()?;
    options.check(&["reduce", "cas", "quant", "ef", "setattr", "m"])?;
    args.finish()?;

    if let Some(dim) = options.int("reduce")? {
        if dim <= 0 {
            return Err(args.invalid("REDUCE must be positive"));
        }
        out.extend([Token::from_static("REDUCE"), Token::Int(dim)]);
    }
    vector.render(&mut out);
    out.push(element);
    if options.flag("cas") {
        out.push(Token::from_static("CAS"));
    }
    if let Some(quant) = options.get("quant") {
        out.push(one_of(command, "quant", quant, QUANTIZATION)?);
    }
    if let Some(ef) = options.int("ef")? {
        out.extend([Token::from_static("EF"), Token::Int(ef)]);
    }
    if let Some(attrs) = options.get("setattr") {
        out.push(Token::from_static("SETATTR"));
        out.push(attributes(command, attrs)?);
    }
    if let Some(m) = options.int("m")? {
        out.extend([Token::from_static("M"), Token::Int(m)]);
    }
    Ok(out)
}

fn vemb(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("element")?];
    if args.flag("RAW")? {
        out.push(Token::from_static("RAW"));
        args.mark("RAW");
    }
    args.finish()?;
    Ok(out)
}

/// Floats without `RAW`; with `RAW` the `[quantization, blob, norm, range?]`
/// tuple, with the norm and range as floats.
fn parse_vemb(command: &Command, reply: Value) -> Result<Response, Error> {
    if !command.has_flag("RAW") {
        return to_list_with(reply, to_float);
    }
    if reply.is_null() {
        return Ok(Response::Nil);
    }
    let mut items = to_vec(reply)?.into_iter();
    let quant = items
        .next()
        .and_then(Value::into_bytes)
        .ok_or(Error::UnexpectedResponse("expected a quantization type"))?;
    let blob = items
        .next()
        .ok_or(Error::UnexpectedResponse("expected a raw vector"))?;
    let mut out = vec![Response::Bytes(quant), Response::from(blob)];
    for number in items {
        out.push(to_float(number)?);
    }
    Ok(Response::List(out))
}

fn vsetattr(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?, args.token("element")?];
    out.push(attributes(command, args.required("attributes")?)?);
    args.finish()?;
    Ok(out)
}

fn vlinks(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?, args.token("element")?];
    if args.flag("WITHSCORES")? {
        out.push(Token::from_static("WITHSCORES"));
        args.mark("WITHSCORES");
    }
    args.finish()?;
    Ok(out)
}

/// One entry per layer; with `WITHSCORES` each layer is `{neighbour: score}`.
fn parse_vlinks(command: &Command, reply: Value) -> Result<Response, Error> {
    if command.has_flag("WITHSCORES") {
        to_list_with(reply, to_scores)
    } else {
        Ok(Response::from(reply))
    }
}

fn vrandmember(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = vec![args.token("key")?];
    out.extend(args.opt_token("count")?);
    args.finish()?;
    Ok(out)
}

static VSIM_MODIFIERS: &[Modifier] = &[
    Modifier::flag("ELE"),
    Modifier::flag("WITHSCORES"),
    Modifier::flag("WITHATTRIBS"),
    Modifier::value("COUNT"),
    Modifier::value("EPSILON"),
    Modifier::value("EF"),
    Modifier::value("FILTER"),
    Modifier::value("FILTER-EF"),
    Modifier::flag("TRUTH"),
    Modifier::flag("NOTHREAD"),
];

/// `key ELE element|FP32 blob|VALUES n v.. [modifiers]`.
fn vsim(args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let command = args.command();
    let mut out = vec![args.token("key")?];
    let query = args.required("query")?;
    let mut modifiers = Modifiers::collect(VSIM_MODIFIERS, args)?;
    if modifiers.take("ELE").is_some() {
        let element = query
            .to_token()
            .ok_or_else(|| Error::invalid(command, "ELE expects an element name"))?;
        out.extend([Token::from_static("ELE"), element]);
    } else {
        VectorInput::from_arg(command, query)?.render(&mut out);
    }
    if let Some([count]) = modifiers.get("COUNT") {
        if count.as_int().is_none_or(|n| n <= 0) {
            return Err(Error::invalid(command, "COUNT must be a positive integer"));
        }
    }
    modifiers.mark(args, &["WITHSCORES", "WITHATTRIBS"]);
    modifiers.render(&mut out);
    Ok(out)
}

/// `WITHSCORES` yields `{element: score}`, `WITHATTRIBS` `{element: attrs}`
/// and both together `{element: [score, attrs]}`.
fn parse_vsim(command: &Command, reply: Value) -> Result<Response, Error> {
    let scores = command.has_flag("WITHSCORES");
    let attribs = command.has_flag("WITHATTRIBS");
    match (scores, attribs) {
        (false, false) => Ok(Response::from(reply)),
        (true, false) => to_scores(reply),
        (false, true) => map(command, reply),
        (true, true) => scored_attributes(reply),
    }
}

fn scored_attributes(reply: Value) -> Result<Response, Error> {
    let mut out = Vec::new();
    match reply {
        Value::Map(_) => {
            for (element, details) in to_pairs(reply)? {
                let mut details = to_vec(details)?.into_iter();
                let score = to_float(details.next().unwrap_or(Value::Null))?;
                let attrs = Response::from(details.next().unwrap_or(Value::Null));
                insert(&mut out, Response::from(element), Response::List(vec![score, attrs]));
            }
        }
        reply => {
            let items = to_vec(reply)?;
            if items.len() % 3 != 0 {
                return Err(Error::UnexpectedResponse("expected element, score, attributes triples"));
            }
            let mut items = items.into_iter();
            while let (Some(element), Some(score), Some(attrs)) =
                (items.next(), items.next(), items.next())
            {
                insert(
                    &mut out,
                    Response::from(element),
                    Response::List(vec![to_float(score)?, Response::from(attrs)]),
                );
            }
        }
    }
    Ok(Response::Map(out))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::options::fp32_blob;
    use crate::{args, opts, tokens, Arg, Response};
    use resp_proto::Value;

    #[test]
    fn test_vadd_values() {
        let call = args!["vs", [0.5, 1.0], "e1", opts! { "quant" => "q8", "reduce" => 2, "cas" => true, "ef" => 200 }];
        assert_eq!(
            build("VADD", call).unwrap(),
            tokens!["vs", "REDUCE", 2, "VALUES", 2, 0.5, 1.0, "e1", "CAS", "Q8", "EF", 200]
        );
    }

    #[test]
    fn test_vadd_fp32_and_attributes() {
        let blob = fp32_blob(&[1.0, 2.0]);
        let call = args!["vs", blob.clone(), "e1", opts! { "setattr" => opts! { "year" => 1984 } }];
        let mut expected = tokens!["vs", "FP32"];
        expected.push(resp_proto::Token::Bulk(blob));
        expected.extend(tokens!["e1", "SETATTR", r#"{"year":1984}"#]);
        assert_eq!(build("VADD", call).unwrap(), expected);
    }

    #[test]
    fn test_vadd_validation() {
        let err = build_err("VADD", args!["vs", [1.0], "e", opts! { "quant" => "q4" }]);
        assert!(err.contains("Accepted values: NOQUANT, Q8, BIN"));
        assert!(build("VADD", args!["vs", Arg::Int(3), "e"]).is_err());
        assert!(build("VADD", args!["vs", [1.0], "e", opts! { "reduce" => 0 }]).is_err());
    }

    #[test]
    fn test_vemb_raw_switch() {
        let reply = bulks(&["0.5", "-1"]);
        assert_eq!(parse("VEMB", args!["vs", "e"], reply), Response::list([0.5, -1.0]));

        let raw = arr(vec![
            Value::SimpleString("int8".into()),
            b("\x01\x02"),
            b("1.5"),
            b("0.25"),
        ]);
        assert_eq!(
            parse("VEMB", args!["vs", "e", true], raw),
            Response::list([
                Response::from("int8"),
                Response::from("\x01\x02"),
                Response::Float(1.5),
                Response::Float(0.25),
            ])
        );
    }

    #[test]
    fn test_element_named_like_flag() {
        assert_eq!(
            parse("VEMB", args!["vs", "raw"], bulks(&["0.5", "1.5"])),
            Response::list([0.5, 1.5])
        );
        assert_eq!(
            parse("VLINKS", args!["withscores", "withscores"], arr(vec![bulks(&["a", "b", "c"])])),
            Response::list([Response::list(["a", "b", "c"])])
        );
        let call = args!["vs", "withscores", opts! { "ele" => true }];
        assert_eq!(parse("VSIM", call, bulks(&["a", "b", "c"])), Response::list(["a", "b", "c"]));
    }

    #[test]
    fn test_vsetattr_map_becomes_json() {
        assert_eq!(
            build("VSETATTR", args!["vs", "e", opts! { "tags" => ["a", "b"] }]).unwrap(),
            tokens!["vs", "e", r#"{"tags":["a","b"]}"#]
        );
        assert_eq!(
            build("VSETATTR", args!["vs", "e", ""]).unwrap(),
            tokens!["vs", "e", ""]
        );
    }

    #[test]
    fn test_vlinks_withscores() {
        let reply = arr(vec![bulks(&["a", "0.9", "b", "0.8"])]);
        assert_eq!(
            parse("VLINKS", args!["vs", "e", "WITHSCORES"], reply),
            Response::list([Response::map([("a", 0.9), ("b", 0.8)])])
        );
    }

    #[test]
    fn test_vsim_element_query() {
        let call = args!["vs", "e1", opts! { "ele" => true, "withscores" => true, "count" => 5, "filter" => ".year > 1950" }];
        assert_eq!(
            build("VSIM", call).unwrap(),
            tokens!["vs", "ELE", "e1", "WITHSCORES", "COUNT", 5, "FILTER", ".year > 1950"]
        );
        assert!(build("VSIM", args!["vs", "e1", opts! { "ele" => true, "count" => 0 }]).is_err());
    }

    #[test]
    fn test_vsim_vector_query_raw_modifiers() {
        assert_eq!(
            build("VSIM", args!["vs", [1, 2], "WITHSCORES", "FILTER-EF", 10]).unwrap(),
            tokens!["vs", "VALUES", 2, 1.0, 2.0, "WITHSCORES", "FILTER-EF", 10]
        );
    }

    #[test]
    fn test_vsim_scores_resp2_resp3_agree() {
        let call = args!["vs", "e", "ELE", "WITHSCORES"];
        let resp2 = bulks(&["a", "1", "b", "0.5"]);
        let resp3 = Value::Map(vec![(b("a"), Value::Double(1.0)), (b("b"), Value::Double(0.5))]);
        let expected = Response::map([("a", 1.0), ("b", 0.5)]);
        assert_eq!(parse("VSIM", call.clone(), resp2), expected);
        assert_eq!(parse3("VSIM", call, resp3), expected);
    }

    #[test]
    fn test_vsim_scores_and_attributes() {
        let call = args!["vs", "e", "ELE", "WITHSCORES", "WITHATTRIBS"];
        let resp2 = arr(vec![b("a"), b("1"), b("{}"), b("b"), b("0.5"), Value::Null]);
        let resp3 = Value::Map(vec![
            (b("a"), arr(vec![Value::Double(1.0), b("{}")])),
            (b("b"), arr(vec![Value::Double(0.5), Value::Null])),
        ]);
        let expected = Response::map([
            ("a", Response::list([Response::Float(1.0), Response::from("{}")])),
            ("b", Response::list([Response::Float(0.5), Response::Nil])),
        ]);
        assert_eq!(parse("VSIM", call.clone(), resp2), expected);
        assert_eq!(parse3("VSIM", call, resp3), expected);
    }

    #[test]
    fn test_vinfo_map() {
        let reply = arr(vec![b("quant-type"), b("int8"), b("size"), int(3)]);
        assert_eq!(
            parse("VINFO", args!["vs"], reply),
            Response::map([("quant-type", Response::from("int8")), ("size", Response::Int(3))])
        );
    }
}
