//! Shared argument shaping used by command filters.
//!
//! Besides the flattening helpers, this module renders *modifier tables*: a
//! per-command list of optional modifiers in the order the server grammar
//! expects them. A caller can supply modifiers as an associative map
//! (`{withscores: true, limit: [0, 10]}`), as raw tokens in any order
//! (`"WITHSCORES", "LIMIT", 0, 10`), or as positional slots
//! (`true, [0, 10]`); all three render identically.

use bytes::Bytes;
use resp_proto::Token;

use crate::arg::{Arg, Args, option_name_eq};
use crate::error::Error;

// ── Flattening ──────────────────────────────────────────────────────────

/// Append `arg` to `out`, expanding nested lists in place and maps as
/// alternating key/value tokens. Nulls are skipped.
pub fn flatten(arg: &Arg, out: &mut Vec<Token>) {
    match arg {
        Arg::Null => {}
        Arg::List(items) => {
            for item in items {
                flatten(item, out);
            }
        }
        Arg::Map(entries) => {
            for (key, value) in entries {
                out.push(Token::Bulk(key.clone()));
                flatten(value, out);
            }
        }
        scalar => out.extend(scalar.to_token()),
    }
}

/// Flatten a sequence of arguments.
pub fn flatten_all(args: &[Arg]) -> Vec<Token> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        flatten(arg, &mut out);
    }
    out
}

/// Interpret `arg` as field/value pairs: either a map or a flat list with an
/// even number of elements.
pub fn pairs(command: &str, name: &str, arg: &Arg) -> Result<Vec<(Token, Token)>, Error> {
    if let Arg::Map(entries) = arg {
        let mut out = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let value = value.to_token().ok_or_else(|| {
                Error::invalid(command, format!("`{name}` values must be scalars"))
            })?;
            out.push((Token::Bulk(key.clone()), value));
        }
        return Ok(out);
    }
    let mut flat = Vec::new();
    flatten(arg, &mut flat);
    if flat.len() % 2 != 0 {
        return Err(Error::invalid(
            command,
            format!("`{name}` must contain an even number of elements"),
        ));
    }
    let mut out = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        out.push((k, v));
    }
    Ok(out)
}

/// Emit the number of items followed by the items.
pub fn count_prefixed(out: &mut Vec<Token>, items: Vec<Token>) {
    out.push(Token::Int(items.len() as i64));
    out.extend(items);
}

/// Emit `literal`, the item count, then the items (`FIELDS 2 a b`).
pub fn counted_block(out: &mut Vec<Token>, literal: &'static str, items: Vec<Token>) {
    out.push(Token::from_static(literal));
    count_prefixed(out, items);
}

/// Match `arg` against a fixed literal set, returning the canonical spelling.
pub fn one_of(
    command: &str,
    name: &str,
    arg: &Arg,
    accepted: &[&'static str],
) -> Result<Token, Error> {
    if let Arg::Bytes(b) = arg {
        if let Some(literal) = accepted
            .iter()
            .find(|l| b.eq_ignore_ascii_case(l.as_bytes()))
        {
            return Ok(Token::from_static(literal));
        }
    }
    Err(unsupported(command, name, accepted))
}

/// The error raised for a literal outside its accepted set.
pub fn unsupported(command: &str, name: &str, accepted: &[&str]) -> Error {
    Error::invalid(
        command,
        format!(
            "Unsupported {name} value. Accepted values: {}",
            accepted.join(", ")
        ),
    )
}

// ── Modifier tables ─────────────────────────────────────────────────────

/// How a modifier is written on the wire.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// `NAME` when set.
    Flag,
    /// `NAME value`.
    Value,
    /// `NAME v1 .. vn` with a fixed arity.
    Values(usize),
    /// `NAME v1 v2 ..` with every value the caller gives.
    Variadic,
    /// `NAME v` once per value (`GET a GET b`).
    Repeated,
    /// `NAME n v1 .. vn`.
    Counted,
    /// `LIMIT offset count`; accepts `[offset, count]` or `{offset, count}`.
    Limit,
    /// One literal out of a set; `NAME` is only the option key.
    Choice(&'static [&'static str]),
    /// `NAME literal` where the literal comes from a fixed set.
    Keyword(&'static [&'static str]),
}

/// One entry of a modifier table.
#[derive(Debug, Clone, Copy)]
pub struct Modifier {
    pub name: &'static str,
    pub kind: Kind,
}

impl Modifier {
    pub const fn flag(name: &'static str) -> Self {
        Self { name, kind: Kind::Flag }
    }

    pub const fn value(name: &'static str) -> Self {
        Self { name, kind: Kind::Value }
    }

    pub const fn values(name: &'static str, arity: usize) -> Self {
        Self { name, kind: Kind::Values(arity) }
    }

    pub const fn variadic(name: &'static str) -> Self {
        Self { name, kind: Kind::Variadic }
    }

    pub const fn repeated(name: &'static str) -> Self {
        Self { name, kind: Kind::Repeated }
    }

    pub const fn counted(name: &'static str) -> Self {
        Self { name, kind: Kind::Counted }
    }

    pub const fn limit() -> Self {
        Self { name: "LIMIT", kind: Kind::Limit }
    }

    pub const fn choice(name: &'static str, literals: &'static [&'static str]) -> Self {
        Self { name, kind: Kind::Choice(literals) }
    }

    pub const fn keyword(name: &'static str, literals: &'static [&'static str]) -> Self {
        Self { name, kind: Kind::Keyword(literals) }
    }

    fn matches_literal(&self, token: &Token) -> Option<&'static str> {
        match self.kind {
            Kind::Choice(literals) => literals
                .iter()
                .find(|l| token.eq_ignore_ascii_case(l))
                .copied(),
            _ if token.eq_ignore_ascii_case(self.name) => Some(self.name),
            _ => None,
        }
    }
}

/// Modifier values gathered from the caller, indexed like the table.
#[derive(Debug)]
pub struct Modifiers {
    table: &'static [Modifier],
    slots: Vec<Option<Vec<Token>>>,
}

impl Modifiers {
    /// Gather every remaining argument of `args` as modifiers for `table`.
    pub fn collect(table: &'static [Modifier], args: &mut Args<'_>) -> Result<Self, Error> {
        let command = args.command();
        let rest = args.take_rest();
        let mut modifiers = Self {
            table,
            slots: vec![None; table.len()],
        };
        match rest {
            [] => {}
            [Arg::Map(entries)] => modifiers.fill_from_map(command, entries)?,
            [first, ..] if is_literal_style(table, first) => {
                let tokens = flatten_all(rest);
                modifiers.fill_from_tokens(command, &tokens)?;
            }
            _ => modifiers.fill_from_slots(command, rest)?,
        }
        Ok(modifiers)
    }

    /// Gather modifiers from an options map.
    pub fn from_map(
        command: &str,
        table: &'static [Modifier],
        entries: &[(Bytes, Arg)],
    ) -> Result<Self, Error> {
        let mut modifiers = Self {
            table,
            slots: vec![None; table.len()],
        };
        modifiers.fill_from_map(command, entries)?;
        Ok(modifiers)
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.table.iter().position(|m| m.name == name)
    }

    /// Whether modifier `name` was given.
    pub fn has(&self, name: &str) -> bool {
        self.index(name)
            .is_some_and(|i| self.slots[i].is_some())
    }

    /// The values given for modifier `name`.
    pub fn get(&self, name: &str) -> Option<&[Token]> {
        self.index(name).and_then(|i| self.slots[i].as_deref())
    }

    /// Drop modifier `name`, returning its values.
    pub fn take(&mut self, name: &str) -> Option<Vec<Token>> {
        let i = self.index(name)?;
        self.slots[i].take()
    }

    /// Record on `args` each of `names` that was given, so the parser can
    /// branch on it.
    pub fn mark(&self, args: &mut Args<'_>, names: &[&'static str]) {
        for name in names {
            args.mark_if(self.has(name), *name);
        }
    }

    /// Fail if more than one of `names` was given.
    pub fn exclusive(&self, command: &str, names: &[&str]) -> Result<(), Error> {
        let given: Vec<&str> = names.iter().copied().filter(|n| self.has(n)).collect();
        if given.len() > 1 {
            return Err(Error::invalid(
                command,
                format!("{} are mutually exclusive", given.join(" and ")),
            ));
        }
        Ok(())
    }

    /// Fail if `dependent` was given without `required`.
    pub fn requires(&self, command: &str, dependent: &str, required: &str) -> Result<(), Error> {
        if self.has(dependent) && !self.has(required) {
            return Err(Error::invalid(
                command,
                format!("{dependent} requires {required}"),
            ));
        }
        Ok(())
    }

    /// Append the modifiers in table order.
    pub fn render(&self, out: &mut Vec<Token>) {
        for (modifier, slot) in self.table.iter().zip(&self.slots) {
            let Some(values) = slot else { continue };
            match modifier.kind {
                Kind::Flag => out.push(Token::from_static(modifier.name)),
                Kind::Choice(_) => out.extend(values.iter().cloned()),
                Kind::Repeated => {
                    for value in values {
                        out.push(Token::from_static(modifier.name));
                        out.push(value.clone());
                    }
                }
                Kind::Counted => {
                    out.push(Token::from_static(modifier.name));
                    out.push(Token::Int(values.len() as i64));
                    out.extend(values.iter().cloned());
                }
                Kind::Value | Kind::Values(_) | Kind::Variadic | Kind::Limit | Kind::Keyword(_) => {
                    out.push(Token::from_static(modifier.name));
                    out.extend(values.iter().cloned());
                }
            }
        }
    }

    fn fill_from_map(&mut self, command: &str, entries: &[(Bytes, Arg)]) -> Result<(), Error> {
        for (key, value) in entries {
            let Some(i) = self
                .table
                .iter()
                .position(|m| option_name_eq(key, m.name))
            else {
                return Err(unknown_option(command, self.table, &String::from_utf8_lossy(key)));
            };
            let modifier = self.table[i];
            self.slots[i] = map_value(command, &modifier, value)?;
        }
        Ok(())
    }

    fn fill_from_tokens(&mut self, command: &str, tokens: &[Token]) -> Result<(), Error> {
        let mut pos = 0;
        while pos < tokens.len() {
            let token = &tokens[pos];
            let found = self
                .table
                .iter()
                .enumerate()
                .find_map(|(i, m)| m.matches_literal(token).map(|lit| (i, lit)));
            let Some((i, literal)) = found else {
                return Err(unknown_option(command, self.table, &display_token(token)));
            };
            pos += 1;
            let modifier = self.table[i];
            let take = |pos: &mut usize, n: usize| -> Result<Vec<Token>, Error> {
                if *pos + n > tokens.len() {
                    return Err(Error::invalid(
                        command,
                        format!("{} expects {n} value(s)", modifier.name),
                    ));
                }
                let values = tokens[*pos..*pos + n].to_vec();
                *pos += n;
                Ok(values)
            };
            let values = match modifier.kind {
                Kind::Flag => Vec::new(),
                Kind::Choice(_) => vec![Token::from_static(literal)],
                Kind::Value => take(&mut pos, 1)?,
                Kind::Keyword(literals) => {
                    let value = Arg::from(take(&mut pos, 1)?.remove(0));
                    let name = modifier.name.to_ascii_lowercase();
                    vec![one_of(command, &name, &value, literals)?]
                }
                Kind::Values(n) => take(&mut pos, n)?,
                Kind::Limit => take(&mut pos, 2)?,
                Kind::Repeated => {
                    let mut values = self.slots[i].take().unwrap_or_default();
                    values.extend(take(&mut pos, 1)?);
                    values
                }
                Kind::Counted => {
                    let n = tokens
                        .get(pos)
                        .and_then(Token::as_int)
                        .ok_or_else(|| {
                            Error::invalid(command, format!("{} expects a count", modifier.name))
                        })?;
                    pos += 1;
                    take(&mut pos, n.max(0) as usize)?
                }
                Kind::Variadic => {
                    let start = pos;
                    while pos < tokens.len()
                        && !self.table.iter().any(|m| m.matches_literal(&tokens[pos]).is_some())
                    {
                        pos += 1;
                    }
                    tokens[start..pos].to_vec()
                }
            };
            self.slots[i] = Some(values);
        }
        Ok(())
    }

    fn fill_from_slots(&mut self, command: &str, items: &[Arg]) -> Result<(), Error> {
        if items.len() > self.table.len() {
            return Err(Error::invalid(
                command,
                format!(
                    "too many modifier arguments. Accepted modifiers: {}",
                    names(self.table)
                ),
            ));
        }
        for (i, item) in items.iter().enumerate() {
            let modifier = self.table[i];
            self.slots[i] = map_value(command, &modifier, item)?;
        }
        Ok(())
    }
}

fn is_literal_style(table: &[Modifier], first: &Arg) -> bool {
    match first.to_token() {
        Some(token @ Token::Bulk(_)) => table.iter().any(|m| m.matches_literal(&token).is_some()),
        _ => false,
    }
}

fn map_value(command: &str, modifier: &Modifier, value: &Arg) -> Result<Option<Vec<Token>>, Error> {
    let name = modifier.name;
    let invalid = |what: &str| Error::invalid(command, format!("{name} {what}"));
    if value.is_null() {
        return Ok(None);
    }
    let values = match modifier.kind {
        Kind::Flag => {
            if !value.truthy() {
                return Ok(None);
            }
            Vec::new()
        }
        Kind::Choice(literals) => {
            if matches!(value, Arg::Bool(false)) {
                return Ok(None);
            }
            vec![one_of(command, &name.to_ascii_lowercase(), value, literals)?]
        }
        Kind::Value => vec![value.to_token().ok_or_else(|| invalid("expects a scalar value"))?],
        Kind::Keyword(literals) => vec![one_of(command, &name.to_ascii_lowercase(), value, literals)?],
        Kind::Values(n) => {
            let mut values = Vec::new();
            flatten(value, &mut values);
            if values.len() != n {
                return Err(invalid(&format!("expects {n} value(s)")));
            }
            values
        }
        Kind::Variadic | Kind::Repeated | Kind::Counted => {
            let mut values = Vec::new();
            flatten(value, &mut values);
            if values.is_empty() {
                return Ok(None);
            }
            values
        }
        Kind::Limit => limit_values(value).ok_or_else(|| {
            Error::invalid(command, "Invalid LIMIT argument value given")
        })?,
    };
    Ok(Some(values))
}

/// Read `[offset, count]` or `{offset, count}`.
pub(crate) fn limit_values(value: &Arg) -> Option<Vec<Token>> {
    match value {
        Arg::List(items) if items.len() == 2 => Some(vec![
            Token::Int(items[0].as_int()?),
            Token::Int(items[1].as_int()?),
        ]),
        Arg::Map(_) => Some(vec![
            Token::Int(value.get("offset")?.as_int()?),
            Token::Int(value.get("count")?.as_int()?),
        ]),
        _ => None,
    }
}

fn names(table: &[Modifier]) -> String {
    let mut out = Vec::new();
    for m in table {
        match m.kind {
            Kind::Choice(literals) => out.extend(literals.iter().copied()),
            _ => out.push(m.name),
        }
    }
    out.join(", ")
}

fn unknown_option(command: &str, table: &[Modifier], given: &str) -> Error {
    Error::invalid(
        command,
        format!("Unsupported modifier `{given}`. Accepted values: {}", names(table)),
    )
}

fn display_token(token: &Token) -> String {
    String::from_utf8_lossy(&token.to_bytes()).into_owned()
}

/// Gather the remaining arguments as modifiers and render them in table order.
pub fn render(table: &'static [Modifier], args: &mut Args<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::new();
    Modifiers::collect(table, args)?.render(&mut out);
    Ok(out)
}
