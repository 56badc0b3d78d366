//! Token matching.
//!
//! A single left-to-right pass over the tokens. Each token is one of:
//! - `--` (everything after it is positional)
//! - a long option, `--name` or `--name=value`
//! - a short group, `-v` or `-abc`
//! - a positional (anything else, including a bare `-`)

use crate::error::ParseError;
use crate::schema::{NormalizedArg, NormalizedSchema};
use crate::value::{Value, ValueKind, Values};

/// Match `tokens` against `schema`.
///
/// Returns the first error found; nothing is returned on failure.
///
/// # Example
///
/// ```
/// use schemargs::{ArgSpec, Schema, parse};
///
/// let schema = Schema::new()
///     .arg(ArgSpec::string("name").positional())
///     .arg(ArgSpec::boolean("loud").short('l'))
///     .normalize()
///     .unwrap();
/// let values = parse(&schema, &["-l", "Bob"]).unwrap();
/// assert_eq!(values.string("name"), Some("Bob"));
/// assert!(values.flag("loud"));
/// ```
pub fn parse<S: AsRef<str>>(schema: &NormalizedSchema, tokens: &[S]) -> Result<Values, ParseError> {
    let mut values = Values::default();

    // Booleans start out false and ignore declared defaults.
    for arg in schema.iter() {
        if arg.value_kind().is_boolean() {
            values.insert(arg.key(), Value::Boolean(false));
        } else if let Some(default) = arg.default_value() {
            values.insert(arg.key(), default.clone());
        }
    }

    let mut pending = schema.positionals().iter();
    let mut after_separator = false;
    let mut i = 0usize;
    while i < tokens.len() {
        let token = tokens[i].as_ref();

        if !after_separator {
            if token == "--" {
                tracing::trace!("option parsing stopped at --");
                after_separator = true;
                i += 1;
                continue;
            }
            if let Some(body) = token.strip_prefix("--") {
                i = parse_long(schema, tokens, i, body, &mut values)?;
                continue;
            }
            if token.len() > 1 && token.starts_with('-') {
                i = parse_short_group(schema, tokens, i, token, &mut values)?;
                continue;
            }
        }

        let Some(arg) = pending.next() else {
            return Err(ParseError::UnexpectedPositional(token.to_string()));
        };
        tracing::trace!(token, key = arg.key(), "positional");
        let value = parse_value(arg, token, arg.target())?;
        values.insert(arg.key(), value);
        i += 1;
    }

    for arg in schema.iter() {
        if arg.is_required() && !values.contains(arg.key()) {
            return Err(ParseError::MissingRequired(arg.target()));
        }
    }

    tracing::debug!(tokens = tokens.len(), values = values.len(), "parsed arguments");
    Ok(values)
}

/// Handle `--name` / `--name=value` at `tokens[i]`; returns the next index.
fn parse_long<S: AsRef<str>>(
    schema: &NormalizedSchema,
    tokens: &[S],
    i: usize,
    body: &str,
    values: &mut Values,
) -> Result<usize, ParseError> {
    let (name, inline) = match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    };
    let flag = format!("--{name}");
    let Some(opt) = schema.find_long(name) else {
        return Err(ParseError::UnrecognizedOption(flag));
    };
    tracing::trace!(flag = %flag, key = opt.key(), "long option");

    if opt.value_kind().is_boolean() {
        if inline.is_some() {
            return Err(ParseError::BooleanValueRejected(flag));
        }
        values.insert(opt.key(), Value::Boolean(true));
        return Ok(i + 1);
    }

    if let Some(raw) = inline {
        let value = parse_value(opt, raw, format!("option {flag}"))?;
        values.insert(opt.key(), value);
        return Ok(i + 1);
    }

    let raw = take_value(tokens, i, &flag)?;
    let value = parse_value(opt, raw, format!("option {flag}"))?;
    values.insert(opt.key(), value);
    Ok(i + 2)
}

/// Handle `-abc` at `tokens[i]`; returns the next index.
///
/// Boolean flags may appear anywhere in the group. A value-taking flag must be
/// the last one and consumes the following token.
fn parse_short_group<S: AsRef<str>>(
    schema: &NormalizedSchema,
    tokens: &[S],
    i: usize,
    group: &str,
    values: &mut Values,
) -> Result<usize, ParseError> {
    let flags: Vec<char> = group.chars().skip(1).collect();
    let mut next = i + 1;

    for (pos, &c) in flags.iter().enumerate() {
        let flag = format!("-{c}");
        let Some(opt) = schema.find_short(c) else {
            return Err(ParseError::UnrecognizedOption(flag));
        };
        tracing::trace!(flag = %flag, key = opt.key(), "short option");

        if opt.value_kind().is_boolean() {
            values.insert(opt.key(), Value::Boolean(true));
            continue;
        }
        if pos + 1 != flags.len() {
            return Err(ParseError::ValueFlagNotLast {
                flag: c,
                group: group.to_string(),
            });
        }

        let raw = take_value(tokens, i, &flag)?;
        let value = parse_value(opt, raw, format!("option {flag}"))?;
        values.insert(opt.key(), value);
        next = i + 2;
    }

    Ok(next)
}

/// The token after `tokens[i]`, unless there is none or it looks like a flag.
fn take_value<'t, S: AsRef<str>>(tokens: &'t [S], i: usize, flag: &str) -> Result<&'t str, ParseError> {
    tokens
        .get(i + 1)
        .map(AsRef::as_ref)
        .filter(|v| !v.starts_with('-'))
        .ok_or_else(|| ParseError::MissingOptionValue(flag.to_string()))
}

fn parse_value(arg: &NormalizedArg, raw: &str, target: String) -> Result<Value, ParseError> {
    let parsed = match arg.value_kind() {
        ValueKind::String => Ok(Value::String(raw.to_string())),
        ValueKind::Number => parse_number(raw)
            .map(Value::Number)
            .ok_or_else(|| "Invalid number".to_string()),
        ValueKind::Boolean => unreachable!("boolean argument '{}' reached value parsing", arg.key()),
        ValueKind::Custom(parser) => parser.parse(raw),
    };
    parsed.map_err(|message| ParseError::InvalidValue { target, message })
}

/// Decimal, exponent and `0x`/`0o`/`0b` integer forms; surrounding
/// whitespace is ignored. Empty input, NaN and infinities are rejected.
fn parse_number(raw: &str) -> Option<f64> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    let radix = match t.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &t[2..];
        if digits.starts_with('+') {
            return None;
        }
        return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
    }
    t.parse::<f64>().ok().filter(|n| n.is_finite())
}
