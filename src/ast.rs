//! This module defines the [`Term`] type, the only kind of value the language
//! manipulates, together with the structural predicates the reducer uses to
//! recognize special shapes (`nil`, quoted symbols, lambdas, cons pairs).
//!
//! Terms are immutable. Symbols, strings and lists are reference counted, so
//! cloning a term is O(1) and a rewrite can share every subtree it does not
//! touch with its input. Ergonomic constructors such as [`sym`], [`num`],
//! [`list`] and [`nil`] are provided for building terms in code and tests.
//!
//! The `Display` implementation is the pretty-printer: it renders s-expression
//! text that the reader in `sexpr` parses back to an equal term.

use std::fmt;
use std::sync::{Arc, LazyLock};

/// Allowed non-alphanumeric characters in symbol names
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_$";

/// Printed forms of the non-finite numbers; `.` keeps them out of symbol space
pub(crate) const POSITIVE_INFINITY: &str = "+inf.0";
pub(crate) const NEGATIVE_INFINITY: &str = "-inf.0";
pub(crate) const NOT_A_NUMBER: &str = "+nan.0";

pub(crate) const QUOTE: &str = "quote";
pub(crate) const LAMBDA: &str = "lambda";
pub(crate) const CONS: &str = "cons";
pub(crate) const IF: &str = "if";
pub(crate) const AND: &str = "and";
pub(crate) const OR: &str = "or";

pub(crate) fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Check if a string is a valid symbol name
/// Valid: non-empty, no leading digit, no "-digit" prefix, alphanumeric + SYMBOL_SPECIAL_CHARS
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false,
        Some(first_char) => {
            if first_char.is_ascii_digit() {
                return false;
            }

            if first_char == '-'
                && let Some(second_char) = chars.next()
                && second_char.is_ascii_digit()
            {
                return false;
            }

            name.chars().all(is_symbol_char)
        }
    }
}

/// A value of the language.
///
/// The meaning of a `List` is decided by its head: `(quote X)` is literal
/// data, `(lambda (params...) body)` is a function value, `(cons h t)` is an
/// eager pair, `if`/`and`/`or` are special forms, and anything else is an
/// application.
#[derive(Clone, PartialEq)]
pub enum Term {
    /// Identifier; also the language's only atom (e.g. `true`)
    Symbol(Arc<str>),
    /// String literal, never equal to a Symbol with the same text
    Text(Arc<str>),
    /// IEEE-754 double
    Number(f64),
    /// Ordered sequence of terms, possibly empty
    List(Arc<[Term]>),
}

static NIL: LazyLock<Term> = LazyLock::new(|| quote(Term::List(Arc::from(Vec::new()))));
static TRUTH: LazyLock<Term> = LazyLock::new(|| quote(sym("true")));

/// The canonical false/empty value, `(quote ())`
pub fn nil() -> Term {
    NIL.clone()
}

/// The canonical truth value, `(quote true)`
pub fn truth() -> Term {
    TRUTH.clone()
}

/// Map a native boolean onto the canonical `truth()`/`nil()` terms
pub fn boolean(b: bool) -> Term {
    if b { truth() } else { nil() }
}

pub fn sym<S: AsRef<str>>(name: S) -> Term {
    Term::Symbol(Arc::from(name.as_ref()))
}

pub fn text<S: AsRef<str>>(s: S) -> Term {
    Term::Text(Arc::from(s.as_ref()))
}

pub fn num<N: Into<f64>>(n: N) -> Term {
    Term::Number(n.into())
}

pub fn list<I: IntoIterator<Item = Term>>(items: I) -> Term {
    Term::List(items.into_iter().collect())
}

/// `(quote datum)`
pub fn quote(datum: Term) -> Term {
    list([sym(QUOTE), datum])
}

/// The eager pair value `(cons head tail)`
pub fn cons(head: Term, tail: Term) -> Term {
    list([sym(CONS), head, tail])
}

/// `(lambda (params...) body)`
pub fn lambda<S: AsRef<str>>(params: &[S], body: Term) -> Term {
    list([sym(LAMBDA), list(params.iter().map(sym)), body])
}

impl From<f64> for Term {
    fn from(n: f64) -> Self {
        Term::Number(n)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Term {
            fn from(n: $int_type) -> Self {
                Term::Number(f64::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        text(s)
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Text(Arc::from(s))
    }
}

impl<T: Into<Term>> From<Vec<T>> for Term {
    fn from(v: Vec<T>) -> Self {
        list(v.into_iter().map(Into::into))
    }
}

impl<T: Into<Term>, const N: usize> From<[T; N]> for Term {
    fn from(arr: [T; N]) -> Self {
        list(arr.into_iter().map(Into::into))
    }
}

impl Term {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Term::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Term::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The symbol in head position of a non-empty list, if any
    pub fn head_symbol(&self) -> Option<&str> {
        self.as_list()?.first()?.as_symbol()
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Term::Symbol(_))
    }

    /// Exactly `(quote ())`; any other empty list is a different value
    pub fn is_nil(&self) -> bool {
        match self.as_list() {
            Some([head, datum]) => {
                head.as_symbol() == Some(QUOTE)
                    && datum.as_list().is_some_and(<[Term]>::is_empty)
            }
            _ => false,
        }
    }

    /// `(quote S)` with `S` a Symbol
    pub fn is_quoted_symbol(&self) -> bool {
        match self.as_list() {
            Some([head, datum]) => head.as_symbol() == Some(QUOTE) && datum.is_symbol(),
            _ => false,
        }
    }

    pub fn is_quote(&self) -> bool {
        self.head_symbol() == Some(QUOTE)
    }

    pub fn is_lambda(&self) -> bool {
        self.head_symbol() == Some(LAMBDA)
    }

    /// A three element list headed by `cons`
    pub fn is_cons(&self) -> bool {
        matches!(self.as_list(), Some([head, _, _]) if head.as_symbol() == Some(CONS))
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Symbol(s) => write!(f, "Symbol({s})"),
            Term::Text(s) => write!(f, "Text({s:?})"),
            Term::Number(n) => write!(f, "Number({n})"),
            Term::List(items) => {
                write!(f, "List(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Symbol(s) => write!(f, "{s}"),
            Term::Number(n) if n.is_nan() => write!(f, "{NOT_A_NUMBER}"),
            Term::Number(n) if n.is_infinite() && *n > 0.0 => write!(f, "{POSITIVE_INFINITY}"),
            Term::Number(n) if n.is_infinite() => write!(f, "{NEGATIVE_INFINITY}"),
            Term::Number(n) => write!(f, "{n}"),
            Term::Text(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Term::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}
