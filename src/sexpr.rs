//! S-expression reader producing [`Term`]s.
//!
//! ```text
//! 42  -1.5  6.02e23          ; numbers
//! +inf.0  -inf.0  +nan.0     ; non-finite numbers
//! "line\n"                   ; strings, escapes \n \t \r \\ \"
//! add  undefined-name  <=    ; symbols
//! (f 1 2)  ()                ; lists
//! 'x                         ; shorthand for (quote x)
//! ; comment to end of line
//! ```
//!
//! The reader knows nothing about special forms: `(quote x)`, `(lambda ...)`
//! and `'x` all come out as plain lists.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till, take_while1},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{not, opt, recognize, value},
    error::ErrorKind,
};

use crate::ast::{
    NEGATIVE_INFINITY, NOT_A_NUMBER, POSITIVE_INFINITY, Term, is_symbol_char, is_valid_symbol,
    list, quote,
};
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Reader options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Treat `;` to end of line as whitespace
    pub handle_comments: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            handle_comments: true,
        }
    }
}

/// Abort without letting `alt` try other branches
fn failure(input: &str, kind: ErrorKind) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Failure(nom::error::Error::new(input, kind))
}

/// Turn a recoverable error into a failure once a construct has been entered
fn commit(error: nom::Err<nom::error::Error<&str>>) -> nom::Err<nom::error::Error<&str>> {
    match error {
        nom::Err::Error(e) => nom::Err::Failure(e),
        other => other,
    }
}

/// Skip whitespace and, when enabled, comments
fn skip_space(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    let (mut input, _) = multispace0.parse(input)?;
    while config.handle_comments && input.starts_with(';') {
        let (rest, _) = (char(';'), take_till(|c: char| c == '\n')).parse(input)?;
        let (rest, _) = multispace0.parse(rest)?;
        input = rest;
    }
    Ok((input, ()))
}

fn parse_non_finite(input: &str) -> IResult<&str, f64> {
    let (rest, n) = alt((
        value(f64::INFINITY, tag(POSITIVE_INFINITY)),
        value(f64::NEG_INFINITY, tag(NEGATIVE_INFINITY)),
        value(f64::NAN, tag(NOT_A_NUMBER)),
    ))
    .parse(input)?;
    let (rest, _) = not(satisfy(is_symbol_char)).parse(rest)?;
    Ok((rest, n))
}

/// `-?digits(.digits)?([eE][+-]?digits)?` or a non-finite literal, not glued
/// to a following symbol character
fn parse_number(input: &str) -> IResult<&str, Term> {
    if let Ok((rest, n)) = parse_non_finite(input) {
        return Ok((rest, Term::Number(n)));
    }

    let (rest, number_str) = recognize((
        opt(char('-')),
        digit1,
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)?;
    let (rest, _) = not(satisfy(is_symbol_char)).parse(rest)?;

    match number_str.parse::<f64>() {
        Ok(n) => Ok((rest, Term::Number(n))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Float,
        ))),
    }
}

fn parse_symbol(input: &str) -> IResult<&str, Term> {
    let (remaining, candidate) = take_while1(is_symbol_char).parse(input)?;

    if is_valid_symbol(candidate) {
        Ok((remaining, Term::Symbol(candidate.into())))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

/// Double-quoted string literal
fn parse_string(input: &str) -> IResult<&str, Term> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut text = String::new();

    loop {
        let mut chars = remaining.chars();
        match chars.next() {
            Some('"') => return Ok((chars.as_str(), Term::Text(text.into()))),
            Some('\\') => {
                match chars.next() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some(_) => return Err(failure(remaining, ErrorKind::Escaped)),
                    None => return Err(failure(chars.as_str(), ErrorKind::Char)),
                }
                remaining = chars.as_str();
            }
            Some(ch) => {
                text.push(ch);
                remaining = chars.as_str();
            }
            None => return Err(failure(remaining, ErrorKind::Char)),
        }
    }
}

fn parse_list(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Term> {
    let (mut input, _) = char('(').parse(input)?;
    let mut elements = Vec::new();

    loop {
        let (rest, _) = skip_space(input, config)?;
        if let Some(after) = rest.strip_prefix(')') {
            return Ok((after, list(elements)));
        }
        if rest.is_empty() {
            return Err(failure(rest, ErrorKind::Char));
        }
        let (rest, element) = parse_term(rest, config, depth + 1).map_err(commit)?;
        elements.push(element);
        input = rest;
    }
}

/// `'expr` -> `(quote expr)`
fn parse_quote(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Term> {
    let (input, _) = char('\'').parse(input)?;
    let (input, _) = skip_space(input, config)?;
    let (input, datum) = parse_term(input, config, depth + 1).map_err(commit)?;
    Ok((input, quote(datum)))
}

fn parse_term(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Term> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(failure(input, ErrorKind::TooLarge));
    }
    alt((
        |input| parse_quote(input, config, depth),
        |input| parse_list(input, config, depth),
        parse_number,
        parse_string,
        parse_symbol,
    ))
    .parse(input)
}

/// Convert nom parsing errors to a structured [`ParseError`]
fn to_parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = input.len().saturating_sub(e.input.len());
            let found = e.input.chars().next().map(String::from);
            let (kind, message) = match e.code {
                ErrorKind::TooLarge => (
                    ParseErrorKind::TooDeeplyNested,
                    format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                ),
                _ if e.input.is_empty() => (
                    ParseErrorKind::Incomplete,
                    "Unexpected end of input".to_owned(),
                ),
                ErrorKind::Escaped => (
                    ParseErrorKind::InvalidSyntax,
                    format!("Invalid escape sequence at position {offset}"),
                ),
                _ => {
                    let near: String = e.input.chars().take(10).collect();
                    (
                        ParseErrorKind::InvalidSyntax,
                        format!("Invalid syntax near '{near}'"),
                    )
                }
            };
            ParseError::with_context(kind, message, input, offset, found)
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "Incomplete input")
        }
    }
}

/// One term surrounded by optional whitespace
fn parse_document(input: &str, config: ParseConfig) -> IResult<&str, Term> {
    let (input, _) = skip_space(input, config)?;
    let (input, term) = parse_term(input, config, 0)?;
    let (input, _) = skip_space(input, config)?;
    Ok((input, term))
}

/// Parse exactly one term, with comments enabled
pub fn parse_sexpr(input: &str) -> Result<Term, Error> {
    parse_sexpr_with_config(input, ParseConfig::default())
}

/// Parse exactly one term; anything but whitespace after it is an error
pub fn parse_sexpr_with_config(input: &str, config: ParseConfig) -> Result<Term, Error> {
    match parse_document(input, config) {
        Ok(("", term)) => Ok(term),
        Ok((remaining, _)) => {
            let offset = input.len() - remaining.len();
            Err(ParseError::with_context(
                ParseErrorKind::TrailingContent,
                format!("Unexpected remaining input: '{remaining}'"),
                input,
                offset,
                remaining.chars().next().map(String::from),
            )
            .into())
        }
        Err(e) => Err(to_parse_error(input, e).into()),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{lambda, nil, num, sym, text};

    #[derive(Debug)]
    enum ParseTestResult {
        /// Parsing should succeed with this term
        Success(Term),
        /// Parsing should fail with this kind of error
        Fails(ParseErrorKind),
    }
    use ParseTestResult::*;

    fn success<T: Into<Term>>(term: T) -> ParseTestResult {
        Success(term.into())
    }

    fn parse_error_kind(result: Result<Term, Error>) -> Option<ParseErrorKind> {
        match result {
            Err(Error::ParseError(e)) => Some(e.kind),
            _ => None,
        }
    }

    /// Run parse cases, checking that every successful parse survives
    /// display -> parse unchanged
    fn run_parse_tests(test_cases: Vec<(&str, ParseTestResult)>) {
        for (i, (input, expected)) in test_cases.into_iter().enumerate() {
            let test_id = format!("Parse test #{}", i + 1);
            match (parse_sexpr(input), expected) {
                (Ok(actual), Success(expected_term)) => {
                    assert_eq!(actual, expected_term, "{test_id}: term mismatch for '{input}'");

                    let displayed = format!("{actual}");
                    let reparsed = parse_sexpr(&displayed).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip parse failed for '{displayed}': {e}")
                    });
                    assert_eq!(reparsed, actual, "{test_id}: round-trip mismatch");
                }
                (Err(Error::ParseError(err)), Fails(kind)) => {
                    assert_eq!(err.kind, kind, "{test_id}: wrong error kind for '{input}': {err}");
                }
                (Ok(actual), Fails(kind)) => {
                    panic!("{test_id}: expected {kind:?} for '{input}', got {actual:?}")
                }
                (Err(err), expected) => {
                    panic!("{test_id}: expected {expected:?} for '{input}', got error {err}")
                }
            }
        }
    }

    #[test]
    fn test_parser_comprehensive() {
        use ParseErrorKind::*;

        let test_cases = vec![
            // Numbers
            ("42", success(42)),
            ("-5", success(-5)),
            ("0", success(0)),
            ("3.25", success(3.25)),
            ("-0.5", success(-0.5)),
            ("1e3", success(1000)),
            ("2.5E-1", success(0.25)),
            ("123abc", Fails(InvalidSyntax)),
            ("1e", Fails(InvalidSyntax)),
            ("-42name", Fails(InvalidSyntax)),
            // Symbols
            ("foo", success(sym("foo"))),
            ("undefined-name", success(sym("undefined-name"))),
            ("-", success(sym("-"))),
            ("-abc", success(sym("-abc"))),
            ("<=", success(sym("<="))),
            ("ok?", success(sym("ok?"))),
            ("var_1$", success(sym("var_1$"))),
            ("test@home", Fails(TrailingContent)),
            ("@invalid", Fails(InvalidSyntax)),
            ("#t", Fails(InvalidSyntax)),
            // Strings
            ("\"hello world\"", success("hello world")),
            (r#""line\nbreak""#, success("line\nbreak")),
            (r#""tab\t\"q\" \\""#, success("tab\t\"q\" \\")),
            ("\"\"", success("")),
            ("\"a;b\"", success("a;b")),
            (r#""bad\xescape""#, Fails(InvalidSyntax)),
            (r#""unterminated"#, Fails(Incomplete)),
            (r#""ends with backslash\"#, Fails(Incomplete)),
            // Lists
            ("()", success(list(Vec::new()))),
            ("(   )", success(list(Vec::new()))),
            ("(42)", success([42])),
            ("(1 2 3)", success([1, 2, 3])),
            (
                "(add 1 \"two\" x)",
                success(list([sym("add"), num(1), text("two"), sym("x")])),
            ),
            ("((1 2) (3 4))", success([[1, 2], [3, 4]])),
            ("(f(g 1))", success(list([sym("f"), list([sym("g"), num(1)])]))),
            ("( 1   2\t\n3 )", success([1, 2, 3])),
            (
                "(lambda (x) x)",
                success(lambda(&["x"], sym("x"))),
            ),
            // Quote
            ("'foo", success(quote(sym("foo")))),
            ("'()", success(nil())),
            ("(quote ())", success(nil())),
            ("' x", success(quote(sym("x")))),
            ("''x", success(quote(quote(sym("x"))))),
            ("'(1 2)", success(quote(list([num(1), num(2)])))),
            ("'", Fails(Incomplete)),
            // Whitespace and comments
            ("  42  ", success(42)),
            ("\r\n  foo  \t", success(sym("foo"))),
            ("; leading\n(add 1 2) ; trailing", success(list([sym("add"), num(1), num(2)]))),
            ("(add 1 ; inner\n 2)", success(list([sym("add"), num(1), num(2)]))),
            // Structural errors
            ("(1 2 3", Fails(Incomplete)),
            ("((1 2)", Fails(Incomplete)),
            ("(+ 1 (- 2", Fails(Incomplete)),
            ("", Fails(Incomplete)),
            ("   ", Fails(Incomplete)),
            ("; only a comment", Fails(Incomplete)),
            (")", Fails(InvalidSyntax)),
            ("(1 2))", Fails(TrailingContent)),
            ("1 2", Fails(TrailingContent)),
            ("(add 1 2) (add 3 4)", Fails(TrailingContent)),
            ("(1 #t)", Fails(InvalidSyntax)),
        ];

        run_parse_tests(test_cases);
    }

    #[test]
    fn test_comments_can_be_disabled() {
        let config = ParseConfig {
            handle_comments: false,
        };
        assert_eq!(
            parse_error_kind(parse_sexpr_with_config("1 ; note", config)),
            Some(ParseErrorKind::TrailingContent)
        );
        assert_eq!(
            parse_sexpr_with_config("(add 1 2)", config).unwrap(),
            list([sym("add"), num(1), num(2)])
        );
    }

    #[test]
    fn test_parser_depth_limits() {
        let parens_under_limit = format!(
            "{}x{}",
            "(".repeat(MAX_PARSE_DEPTH - 1),
            ")".repeat(MAX_PARSE_DEPTH - 1)
        );
        let quotes_under_limit = format!("{}x", "'".repeat(MAX_PARSE_DEPTH - 1));
        let parens_at_limit = format!(
            "{}1{}",
            "(".repeat(MAX_PARSE_DEPTH),
            ")".repeat(MAX_PARSE_DEPTH)
        );
        let quotes_at_limit = format!("{}x", "'".repeat(MAX_PARSE_DEPTH));

        assert!(parse_sexpr(&parens_under_limit).is_ok());
        assert!(parse_sexpr(&quotes_under_limit).is_ok());
        assert_eq!(
            parse_error_kind(parse_sexpr(&parens_at_limit)),
            Some(ParseErrorKind::TooDeeplyNested)
        );
        assert_eq!(
            parse_error_kind(parse_sexpr(&quotes_at_limit)),
            Some(ParseErrorKind::TooDeeplyNested)
        );
    }

    #[test]
    fn test_error_details() {
        let Err(Error::ParseError(err)) = parse_sexpr("(add 1 2))") else {
            panic!("expected a parse error");
        };
        assert_eq!(err.kind, ParseErrorKind::TrailingContent);
        assert_eq!(err.found.as_deref(), Some(")"));
        assert_eq!(err.context.as_deref(), Some("(add 1 2))"));

        let Err(Error::ParseError(err)) = parse_sexpr("(f \"a\\qb\")") else {
            panic!("expected a parse error");
        };
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
        assert_eq!(err.found.as_deref(), Some("\\"));
        assert!(err.message.contains("escape"));
    }

    #[test]
    fn test_printer_output_reads_back() {
        let terms = vec![
            nil(),
            list([sym("if"), quote(sym("true")), num(1), num(-2.5)]),
            lambda(&["x", "y"], list([sym("add"), sym("x"), sym("y")])),
            text("quote \" and \\ and \n"),
            list([text("a"), sym("a"), num(1e21), num(1e-7)]),
        ];
        for (i, term) in terms.into_iter().enumerate() {
            let reparsed = parse_sexpr(&term.to_string()).unwrap();
            assert_eq!(reparsed, term, "case #{}", i + 1);
        }
    }

    #[test]
    fn test_non_finite_numbers_read_back() {
        let terms = vec![
            num(f64::INFINITY),
            num(f64::NEG_INFINITY),
            list([sym("add"), num(f64::INFINITY), num(1)]),
        ];
        for (i, term) in terms.into_iter().enumerate() {
            let shown = term.to_string();
            assert_eq!(parse_sexpr(&shown).unwrap(), term, "case #{} ({shown})", i + 1);
        }

        let shown = num(f64::NAN).to_string();
        assert_eq!(shown, "+nan.0");
        assert!(matches!(parse_sexpr(&shown).unwrap(), Term::Number(n) if n.is_nan()));

        assert_eq!(num(f64::INFINITY).to_string(), "+inf.0");
        assert_eq!(num(f64::NEG_INFINITY).to_string(), "-inf.0");
        assert!(parse_sexpr("+inf.0x").is_err());
        assert_eq!(parse_sexpr("+inf").unwrap(), sym("+inf"));
    }
}
