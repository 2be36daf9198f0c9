//! Built-in operations registry.
//!
//! Builtins are native functions bound to reserved symbol names. They are
//! only ever invoked by the step engine, and only once every element of the
//! application is in normal form, so each function here maps fully reduced
//! operands straight to a final value.
//!
//! ```text
//! (add 2 3)            ; => 5
//! (shl 1 31)           ; => -2147483648   (32-bit two's complement)
//! (eql '(1) '(1))      ; => (quote true)  (deep structural equality)
//! (car (cons 1 2))     ; => 1
//! (typeof "hi")        ; => (quote string)
//! ```
//!
//! ## Operand rules
//!
//! - Arithmetic, bitwise and ordering operators require numbers; anything
//!   else fails with `TypeError`.
//! - Bitwise and shift operators truncate their operands to 32 bits first and
//!   use only the low five bits of a shift count.
//! - Comparison results are the canonical `(quote true)` / `(quote ())` terms.
//! - Every builtin has a fixed arity. A missing operand fails with
//!   `TypeError` like a wrongly typed one; extra operands are ignored.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** as a plain Rust function over `f64`, `i32`,
//!    `u32` or `Term` parameters
//! 2. **Add to BUILTIN_OPS** with its name and typed signature
//! 3. **Add test cases** to `test_builtin_function_implementations`

use crate::Error;
use crate::ast::{Term, cons, quote, sym};
use crate::intooperation::{IntoOperation, OperationFn};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Definition of a built-in operation
#[derive(Clone)]
pub struct BuiltinOp {
    /// The reserved symbol naming this operation
    pub id: &'static str,
    /// Exact number of operands
    pub arity: usize,
    func: Arc<OperationFn>,
}

impl std::fmt::Debug for BuiltinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuiltinOp({}/{})", self.id, self.arity)
    }
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl BuiltinOp {
    /// Invoke the operation on already-reduced operands
    pub fn call(&self, args: &[Term]) -> Result<Term, Error> {
        (self.func)(args)
    }
}

//
// Builtin Function Implementations
//

fn builtin_add(a: f64, b: f64) -> f64 {
    a + b
}

fn builtin_sub(a: f64, b: f64) -> f64 {
    a - b
}

fn builtin_mul(a: f64, b: f64) -> f64 {
    a * b
}

fn builtin_div(a: f64, b: f64) -> f64 {
    a / b
}

// Sign follows the dividend, like C fmod
fn builtin_rem(a: f64, b: f64) -> f64 {
    a % b
}

fn builtin_pow(a: f64, b: f64) -> f64 {
    a.powf(b)
}

fn builtin_band(a: i32, b: i32) -> i32 {
    a & b
}

fn builtin_bor(a: i32, b: i32) -> i32 {
    a | b
}

fn builtin_bxor(a: i32, b: i32) -> i32 {
    a ^ b
}

fn builtin_bnot(a: i32) -> i32 {
    !a
}

// wrapping_shl/wrapping_shr mask the count to its low five bits
fn builtin_shl(a: i32, count: u32) -> i32 {
    a.wrapping_shl(count)
}

fn builtin_shr(a: i32, count: u32) -> i32 {
    a.wrapping_shr(count)
}

fn builtin_shru(a: u32, count: u32) -> u32 {
    a.wrapping_shr(count)
}

fn builtin_eql(a: Term, b: Term) -> bool {
    a == b
}

fn builtin_neq(a: Term, b: Term) -> bool {
    a != b
}

fn builtin_lt(a: f64, b: f64) -> bool {
    a < b
}

fn builtin_lte(a: f64, b: f64) -> bool {
    a <= b
}

fn builtin_gt(a: f64, b: f64) -> bool {
    a > b
}

fn builtin_gte(a: f64, b: f64) -> bool {
    a >= b
}

fn builtin_not(value: Term) -> bool {
    value.is_nil()
}

fn builtin_cons(head: Term, tail: Term) -> Term {
    cons(head, tail)
}

fn pair_parts(op: &str, value: &Term) -> Result<(Term, Term), Error> {
    match value.as_list() {
        Some([_, head, tail]) if value.is_cons() => Ok((head.clone(), tail.clone())),
        _ => Err(Error::TypeError(format!(
            "{op}: expected cons pair, got {value}"
        ))),
    }
}

fn builtin_car(pair: Term) -> Result<Term, Error> {
    pair_parts("car", &pair).map(|(head, _)| head)
}

fn builtin_cdr(pair: Term) -> Result<Term, Error> {
    pair_parts("cdr", &pair).map(|(_, tail)| tail)
}

/// Name of the dynamic kind of a value, as a quoted symbol
fn builtin_typeof(value: Term) -> Term {
    let kind = match &value {
        _ if value.is_nil() => "nil",
        Term::Symbol(_) => "symbol",
        _ if value.is_quoted_symbol() => "symbol",
        Term::Text(_) => "string",
        Term::Number(_) => "number",
        Term::List(_) => "list",
    };
    quote(sym(kind))
}

/// Global registry of all built-in operations.
///
/// Each entry is wired through the typed adapter layer once, at first use.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    fn builtin<Args, R, F>(id: &'static str, f: F) -> BuiltinOp
    where
        F: IntoOperation<Args, R>,
    {
        BuiltinOp {
            id,
            arity: <F as IntoOperation<Args, R>>::ARITY,
            func: f.into_operation(id),
        }
    }

    vec![
        // Arithmetic
        builtin::<(f64, f64), f64, _>("add", builtin_add),
        builtin::<(f64, f64), f64, _>("sub", builtin_sub),
        builtin::<(f64, f64), f64, _>("mul", builtin_mul),
        builtin::<(f64, f64), f64, _>("div", builtin_div),
        builtin::<(f64, f64), f64, _>("rem", builtin_rem),
        builtin::<(f64, f64), f64, _>("pow", builtin_pow),
        // Bitwise and shifts
        builtin::<(i32, i32), i32, _>("band", builtin_band),
        builtin::<(i32, i32), i32, _>("bor", builtin_bor),
        builtin::<(i32, i32), i32, _>("bxor", builtin_bxor),
        builtin::<(i32,), i32, _>("bnot", builtin_bnot),
        builtin::<(i32, u32), i32, _>("shl", builtin_shl),
        builtin::<(i32, u32), i32, _>("shr", builtin_shr),
        builtin::<(u32, u32), u32, _>("shru", builtin_shru),
        // Comparison
        builtin::<(Term, Term), bool, _>("eql", builtin_eql),
        builtin::<(Term, Term), bool, _>("neq", builtin_neq),
        builtin::<(f64, f64), bool, _>("lt", builtin_lt),
        builtin::<(f64, f64), bool, _>("lte", builtin_lte),
        builtin::<(f64, f64), bool, _>("gt", builtin_gt),
        builtin::<(f64, f64), bool, _>("gte", builtin_gte),
        // Logical
        builtin::<(Term,), bool, _>("not", builtin_not),
        // Pairs
        builtin::<(Term, Term), Term, _>("cons", builtin_cons),
        builtin::<(Term,), Term, _>("car", builtin_car),
        builtin::<(Term,), Term, _>("cdr", builtin_cdr),
        // Reflection
        builtin::<(Term,), Term, _>("typeof", builtin_typeof),
    ]
});

/// Lazy static map from name to BuiltinOp (private - use find_builtin)
static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| {
        let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
        ops.iter().map(|op| (op.id, op)).collect()
    });

/// All builtin operations, in registry order
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

/// Find a builtin operation by its reserved name
pub fn find_builtin(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(id).copied()
}

/// Whether `name` is reserved for a builtin
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_INDEX.contains_key(name)
}

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_OPS.iter().map(|op| op.id)
}
