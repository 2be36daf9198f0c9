//! The step engine.
//!
//! [`can_step`] decides whether a term has work left; [`step`] performs
//! exactly one rewrite and returns the new term. Reduction order is fully
//! deterministic:
//!
//! - `if`, `and`, `or` reduce their first operand in place until it is in
//!   normal form, then pick a result without touching the other operands.
//! - Every other list is an application: the leftmost reducible element
//!   (operator first, then operands left to right) is stepped.
//! - Once every element is in normal form the operator is applied, either by
//!   substituting into a `lambda` body or by calling a builtin.
//!
//! Terms are never mutated. A step rebuilds only the spine leading to the
//! rewritten position and shares everything else with its input.

pub mod substitution;

use crate::Error;
use crate::ast::{AND, IF, OR, Term, nil};
use crate::builtinops::{find_builtin, is_builtin};
use std::sync::Arc;
use substitution::{bind_parameters, rewrite};
use tracing::trace;

/// Whether a call to [`step`] would change `term`.
///
/// Pure and cheap enough to call before every step.
pub fn can_step(term: &Term) -> bool {
    match term {
        Term::Number(_) | Term::Text(_) => false,
        // Unbound symbols report work so that stepping them raises the error.
        // A builtin name on its own is a value; builtins only run when applied.
        Term::Symbol(name) => !is_builtin(name),
        Term::List(items) => match &**items {
            [_, head, tail] if term.is_cons() => can_step(head) || can_step(tail),
            _ => !(term.is_nil() || term.is_quoted_symbol() || term.is_lambda()),
        },
    }
}

/// Perform exactly one rewrite.
///
/// A term in normal form is returned unchanged. Any failure aborts the step
/// as a whole; no partially rewritten term is produced.
pub fn step(term: &Term) -> Result<Term, Error> {
    if !can_step(term) {
        return Ok(term.clone());
    }

    match term {
        Term::Symbol(name) => Err(Error::UndefinedSymbol(name.to_string())),
        Term::List(items) => match term.head_symbol() {
            Some(IF) => step_if(items),
            Some(AND) => step_short_circuit(AND, items, |left, right| {
                if left.is_nil() { nil() } else { right.clone() }
            }),
            Some(OR) => step_short_circuit(OR, items, |left, right| {
                if left.is_nil() {
                    right.clone()
                } else {
                    left.clone()
                }
            }),
            _ => step_application(items),
        },
        Term::Number(_) | Term::Text(_) => Ok(term.clone()),
    }
}

/// Path of child indices to the sub-term the next [`step`] will rewrite.
///
/// `None` when `term` is in normal form; an empty path when the rewrite
/// happens at the root (a branch selection, an application, or an
/// undefined symbol).
pub fn redex_path(term: &Term) -> Option<Vec<usize>> {
    if !can_step(term) {
        return None;
    }

    let mut path = Vec::new();
    let mut current = term;
    while let Term::List(items) = current {
        let next = match current.head_symbol() {
            // A malformed special form fails at its root
            Some(IF) if !(3..=4).contains(&items.len()) => None,
            Some(AND | OR) if items.len() != 3 => None,
            Some(IF | AND | OR) => Some((1, &items[1])).filter(|(_, cond)| can_step(cond)),
            _ => items.iter().enumerate().find(|(_, item)| can_step(item)),
        };
        match next {
            Some((index, child)) => {
                path.push(index);
                current = child;
            }
            None => break,
        }
    }
    Some(path)
}

/// Copy `items` with the element at `index` swapped for `replacement`
fn replace_at(items: &[Term], index: usize, replacement: Term) -> Term {
    let mut replacement = Some(replacement);
    Term::List(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match replacement.take_if(|_| i == index) {
                Some(new_item) => new_item,
                None => item.clone(),
            })
            .collect(),
    )
}

fn operand_count(items: &[Term]) -> usize {
    items.len().saturating_sub(1)
}

/// `(if cond then [else])`
fn step_if(items: &[Term]) -> Result<Term, Error> {
    match items {
        [_, condition, then_branch, rest @ ..] if rest.len() <= 1 => {
            if can_step(condition) {
                return Ok(replace_at(items, 1, step(condition)?));
            }
            if condition.is_nil() {
                trace!(branch = "else", "if condition is nil");
                Ok(rest.first().cloned().unwrap_or_else(nil))
            } else {
                trace!(branch = "then", "if condition is not nil");
                Ok(then_branch.clone())
            }
        }
        _ => Err(Error::arity_range_error(IF, 2, 3, operand_count(items))),
    }
}

/// `(and a b)` / `(or a b)`: reduce `a` in place, then let `pick` decide
fn step_short_circuit(
    op: &'static str,
    items: &[Term],
    pick: impl Fn(&Term, &Term) -> Term,
) -> Result<Term, Error> {
    match items {
        [_, left, right] => {
            if can_step(left) {
                return Ok(replace_at(items, 1, step(left)?));
            }
            trace!(op, left_is_nil = left.is_nil(), "short-circuit resolved");
            Ok(pick(left, right))
        }
        _ => Err(Error::arity_error(op, 2, operand_count(items))),
    }
}

/// Leftmost-first reduction of an application, then the call itself
fn step_application(items: &[Term]) -> Result<Term, Error> {
    if let Some((index, item)) = items.iter().enumerate().find(|(_, item)| can_step(item)) {
        return Ok(replace_at(items, index, step(item)?));
    }

    let Some((operator, operands)) = items.split_first() else {
        return Err(Error::InvalidOperator("()".to_owned()));
    };

    if operator.is_lambda() {
        return apply_lambda(operator, operands);
    }

    match operator {
        Term::Symbol(name) => match find_builtin(name) {
            Some(op) => {
                trace!(builtin = op.id, operands = operands.len(), "invoking builtin");
                op.call(operands)
            }
            None => Err(Error::UndefinedSymbol(name.to_string())),
        },
        other => Err(Error::InvalidOperator(other.to_string())),
    }
}

/// Instantiate a lambda body with its operands.
///
/// Missing operands bind to `nil`; operands beyond the parameter count are
/// dropped.
fn apply_lambda(function: &Term, operands: &[Term]) -> Result<Term, Error> {
    let parts = function.as_list().unwrap_or_default();
    let (params, body) = match parts {
        [_, Term::List(params), body, ..] => (params, body),
        [_, Term::List(_)] => {
            return Err(Error::InvalidLambdaShape(format!(
                "missing body in {function}"
            )));
        }
        _ => {
            return Err(Error::InvalidLambdaShape(format!(
                "parameters must be a list in {function}"
            )));
        }
    };

    let names = params
        .iter()
        .map(|param| match param {
            Term::Symbol(name) => Ok(Arc::clone(name)),
            other => Err(Error::InvalidLambdaShape(format!(
                "parameter {other} is not a symbol in {function}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    trace!(
        params = names.len(),
        operands = operands.len(),
        "applying lambda"
    );
    Ok(rewrite(body, &bind_parameters(&names, operands)))
}
