//! smallstep - a small-step reducer for a minimal s-expression language
//!
//! This crate rewrites a program one elementary step at a time and hands every
//! intermediate program back to the caller. Nothing is evaluated "all at once":
//! a driver calls [`can_step`] and [`step`] until the term reaches normal form,
//! and each call returns a new term that differs from its input in exactly one
//! place.
//!
//! ## The language
//!
//! ```text
//! (add 2 3)                          ; builtins over numbers
//! (if (lt 1 2) "yes" "no")           ; short-circuiting special forms
//! ((lambda (x y) (mul x y)) 6 7)     ; substitution-based application
//! (car (cons 1 (quote ())))          ; eager pairs
//! (typeof (quote foo))               ; => (quote symbol)
//! ```
//!
//! `nil` is `(quote ())` and truth is `(quote true)`; every value other than
//! `nil` counts as true in `if`, `and`, and `or`.
//!
//! ## Stepping
//!
//! ```
//! use smallstep::ast::{list, num, sym};
//! use smallstep::{can_step, step};
//!
//! let mut term = list([sym("add"), list([sym("mul"), num(2), num(3)]), num(4)]);
//! let mut trace = vec![term.clone()];
//! while can_step(&term) {
//!     term = step(&term).unwrap();
//!     trace.push(term.clone());
//! }
//! assert_eq!(trace.len(), 3);
//! assert_eq!(term, num(10));
//! ```
//!
//! ## Modules
//!
//! - `ast`: the term model, predicates and printer
//! - `builtinops`: the table of native operations
//! - `evaluator`: the step engine and substitution
//! - `driver`: a reference driver that steps to normal form
//! - `history`: snapshot history for scrubbing forward and backward
//! - `sexpr`: s-expression reader (feature `sexpr`)
//! - `json`: JSON interchange for terms and histories (feature `json`)

use std::fmt;

/// Maximum reader nesting depth to prevent stack overflow on hostile input
pub const MAX_PARSE_DEPTH: usize = 128;

/// Why the reader rejected its input
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ParseErrorKind {
    /// A token that cannot start or continue a term, or a bad string escape
    InvalidSyntax,
    /// Input ran out inside a list, a string or after a `'`
    Incomplete,
    /// Expression nesting exceeded [`MAX_PARSE_DEPTH`]
    TooDeeplyNested,
    /// More input after the one term that was expected
    TrailingContent,
}

/// Reader failure with enough detail to point at the offending input.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Up to 100 characters of input around the failure, newlines escaped
    pub context: Option<String>,
    /// First character at the failure position, when there is one
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context extracted from input at a given byte offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
        found: Option<String>,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        let char_offset = input
            .char_indices()
            .take_while(|(i, _)| *i < error_offset)
            .count();
        let context_start = char_offset.saturating_sub(20);
        let total_chars = input.chars().count();

        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < total_chars {
            display_context.push_str("[...]");
        }

        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        Self::new(kind, message, Some(display_context), found)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(found) = &self.found {
            write!(f, "\nFound: {found}")?;
        }
        if let Some(context) = &self.context {
            write!(f, "\nContext: {context}")?;
        }
        Ok(())
    }
}

/// Every way a step (or a collaborator around it) can fail.
///
/// All of these are fatal to the evaluation in progress: the failed call
/// produces no term, and the caller keeps the last good one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(ParseError),
    #[error("Undefined symbol: {0}")]
    UndefinedSymbol(String),
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),
    #[error("Invalid lambda: {0}")]
    InvalidLambdaShape(String),
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("Arity error: {operator}: expected {expected} arguments, got {got}")]
    ArityError {
        operator: String,
        expected: String,
        got: usize,
    },
    #[error("Step limit exceeded after {0} steps")]
    StepLimitExceeded(usize),
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl Error {
    /// Create an ArityError for an operator that takes exactly `expected` operands
    pub fn arity_error(operator: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityError {
            operator: operator.into(),
            expected: expected.to_string(),
            got,
        }
    }

    /// Create an ArityError for an operator accepting an inclusive range of operands
    pub fn arity_range_error(
        operator: impl Into<String>,
        min: usize,
        max: usize,
        got: usize,
    ) -> Self {
        Error::ArityError {
            operator: operator.into(),
            expected: format!("{min} to {max}"),
            got,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::ParseError(err)
    }
}

pub mod ast;
pub mod builtinops;
pub mod driver;
pub mod evaluator;
pub mod history;
mod intooperation;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "sexpr")]
pub mod sexpr;

pub use ast::Term;
pub use driver::{DriverConfig, Stepper, evaluate};
pub use evaluator::{can_step, redex_path, step};
pub use history::History;
