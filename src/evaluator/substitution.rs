//! Substitution of operands into a lambda body.
//!
//! Bindings live in a persistent map, so entering a nested `lambda` produces a
//! new map without its parameters while the caller's map stays intact.
//!
//! Shadowing is honored: an inner `lambda` re-binding a name hides the outer
//! substitution for that name. Bound variables are not renamed, though. If an
//! operand contains a free symbol that happens to match a parameter of some
//! lambda deeper in the body, that symbol ends up captured by the inner
//! lambda:
//!
//! ```text
//! ((lambda (x) (lambda (y) x)) y)   ; steps to (lambda (y) y)
//! ```

use crate::ast::{Term, list, nil};
use std::sync::Arc;

/// Symbol name to replacement term
pub type Bindings = im::HashMap<Arc<str>, Term>;

/// Pair parameters with operands by position.
///
/// Missing operands bind to `nil`, extra operands are ignored, and a name
/// listed twice takes the later operand.
pub fn bind_parameters(params: &[Arc<str>], operands: &[Term]) -> Bindings {
    params
        .iter()
        .enumerate()
        .map(|(i, name)| (Arc::clone(name), operands.get(i).cloned().unwrap_or_else(nil)))
        .collect()
}

/// Replace free occurrences of bound symbols in `term`.
///
/// Quoted data is left alone, and a nested lambda's own parameters are
/// removed from the bindings before its body is visited.
pub fn rewrite(term: &Term, bindings: &Bindings) -> Term {
    if bindings.is_empty() {
        return term.clone();
    }

    match term {
        Term::Number(_) | Term::Text(_) => term.clone(),
        Term::Symbol(name) => bindings
            .get(name.as_ref())
            .cloned()
            .unwrap_or_else(|| term.clone()),
        Term::List(_) if term.is_quote() => term.clone(),
        Term::List(items) if term.is_lambda() => {
            let inner = match items.get(1).and_then(Term::as_list) {
                Some(params) => params
                    .iter()
                    .filter_map(Term::as_symbol)
                    .fold(bindings.clone(), |acc, name| acc.without(name)),
                None => bindings.clone(),
            };
            // The `lambda` keyword and the parameter list are kept as-is
            list(items.iter().enumerate().map(|(i, item)| {
                if i < 2 {
                    item.clone()
                } else {
                    rewrite(item, &inner)
                }
            }))
        }
        Term::List(items) => list(items.iter().map(|item| rewrite(item, bindings))),
    }
}
