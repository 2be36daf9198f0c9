//! JSON interchange for terms and reduction histories.
//!
//! | Term            | JSON                 |
//! |-----------------|----------------------|
//! | `Number(n)`     | number               |
//! | `Symbol(s)`     | string               |
//! | `Text(s)`       | `{"text": s}`        |
//! | `List(items)`   | array                |
//!
//! Whole numbers within the exactly representable range are written as JSON
//! integers. NaN and the infinities have no JSON form and are rejected.

use serde_json::{Map, Value, json};

use crate::ast::Term;
use crate::history::History;
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

const TEXT_KEY: &str = "text";

/// Largest magnitude below which every integer is an exact f64 (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Encode a term as a JSON value
pub fn term_to_json(term: &Term) -> Result<Value, Error> {
    match term {
        Term::Number(n) => number_to_json(*n),
        Term::Symbol(s) => Ok(Value::String(s.to_string())),
        Term::Text(s) => {
            let mut obj = Map::new();
            obj.insert(TEXT_KEY.to_owned(), Value::String(s.to_string()));
            Ok(Value::Object(obj))
        }
        Term::List(items) => items
            .iter()
            .map(term_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
    }
}

fn number_to_json(n: f64) -> Result<Value, Error> {
    // -0.0 keeps its sign only as a float
    let negative_zero = n == 0.0 && n.is_sign_negative();
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER && !negative_zero {
        return Ok(json!(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| Error::JsonError(format!("{n} has no JSON representation")))
}

/// Encode a term as compact JSON text
pub fn term_to_json_string(term: &Term) -> Result<String, Error> {
    let value = term_to_json(term)?;
    serde_json::to_string(&value).map_err(|e| Error::JsonError(e.to_string()))
}

/// Decode JSON text produced by [`term_to_json_string`]
pub fn parse_json_term(input: &str) -> Result<Term, Error> {
    let json_value: Value = serde_json::from_str(input).map_err(|e| {
        ParseError::from_message(ParseErrorKind::InvalidSyntax, format!("Invalid JSON: {e}"))
    })?;

    json_to_term(json_value, 0)
}

fn json_to_term(json: Value, depth: usize) -> Result<Term, Error> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(ParseError::from_message(
            ParseErrorKind::TooDeeplyNested,
            format!("JSON term too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
        )
        .into());
    }
    match json {
        Value::Number(n) => n
            .as_f64()
            .map(Term::Number)
            .ok_or_else(|| Error::JsonError(format!("Unsupported number: {n}"))),
        Value::String(s) => Ok(Term::Symbol(s.into())),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| json_to_term(v, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(|items| Term::List(items.into())),
        Value::Object(obj) => {
            let mut iter = obj.into_iter();
            match (iter.next(), iter.next()) {
                (Some((key, Value::String(s))), None) if key == TEXT_KEY => {
                    Ok(Term::Text(s.into()))
                }
                _ => Err(Error::JsonError(
                    "objects must have the form {\"text\": \"...\"}".into(),
                )),
            }
        }
        Value::Null => Err(Error::JsonError("null has no term representation".into())),
        Value::Bool(b) => Err(Error::JsonError(format!(
            "{b} has no term representation; use (quote true) or (quote ())"
        ))),
    }
}

/// Snapshot list and cursor of a [`History`] as one JSON document
pub fn history_to_json(history: &History) -> Result<Value, Error> {
    let snapshots = history
        .snapshots()
        .iter()
        .map(term_to_json)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(json!({
        "position": history.position(),
        "snapshots": snapshots,
    }))
}
