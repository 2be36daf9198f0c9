use crate::Error;
use crate::ast::{Term, boolean};
use std::sync::Arc;

// NOTE: This module is internal plumbing for the builtin table.
// It turns plain, strongly-typed Rust functions such as
// `fn(f64, f64) -> f64` into the erased `OperationFn` the step engine
// calls, checking operand kinds on the way in.

/// Canonical erased builtin function type used by the step engine.
///
/// Operands are always fully reduced terms; the function returns a final
/// value and never steps anything itself.
pub(crate) type OperationFn = dyn Fn(&[Term]) -> Result<Term, Error> + Send + Sync;

// =====================================================================
// Operand conversion
// =====================================================================

/// Turns one reduced operand into a typed Rust parameter.
///
/// `op` is the builtin's name, used in the `TypeError` message.
pub(crate) trait FromParam: Sized {
    /// What the parameter accepts, as named in error messages
    const KIND: &'static str;

    fn from_arg(op: &'static str, value: &Term) -> Result<Self, Error>;
}

fn expected(op: &str, kind: &str, found: &Term) -> Error {
    Error::TypeError(format!("{op}: expected {kind}, got {found}"))
}

fn missing(op: &str, kind: &str) -> Error {
    Error::TypeError(format!("{op}: expected {kind}, got nothing"))
}

impl FromParam for Term {
    const KIND: &'static str = "value";

    fn from_arg(_op: &'static str, value: &Term) -> Result<Self, Error> {
        Ok(value.clone())
    }
}

impl FromParam for f64 {
    const KIND: &'static str = "number";

    fn from_arg(op: &'static str, value: &Term) -> Result<Self, Error> {
        value.as_number().ok_or_else(|| expected(op, "number", value))
    }
}

/// Numbers narrowed with two's-complement truncation for bitwise operators
impl FromParam for i32 {
    const KIND: &'static str = "number";

    fn from_arg(op: &'static str, value: &Term) -> Result<Self, Error> {
        f64::from_arg(op, value).map(to_int32)
    }
}

/// Numbers narrowed to unsigned 32 bits for shift counts and `shru`
impl FromParam for u32 {
    const KIND: &'static str = "number";

    fn from_arg(op: &'static str, value: &Term) -> Result<Self, Error> {
        f64::from_arg(op, value).map(to_uint32)
    }
}

/// Truncate toward zero, then wrap modulo 2^32. Non-finite values become 0.
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

pub(crate) fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

// =====================================================================
// Result conversion
// =====================================================================

/// Converts a builtin's native return value back into a term.
pub(crate) trait IntoTerm {
    fn into_term(self) -> Term;
}

impl IntoTerm for Term {
    fn into_term(self) -> Term {
        self
    }
}

impl IntoTerm for f64 {
    fn into_term(self) -> Term {
        Term::Number(self)
    }
}

impl IntoTerm for i32 {
    fn into_term(self) -> Term {
        Term::Number(f64::from(self))
    }
}

impl IntoTerm for u32 {
    fn into_term(self) -> Term {
        Term::Number(f64::from(self))
    }
}

/// Booleans never leak into the language: they become `truth()` or `nil()`
impl IntoTerm for bool {
    fn into_term(self) -> Term {
        boolean(self)
    }
}

/// Normalize both plain values and `Result`-returning functions into `Result<T, Error>`.
pub(crate) trait IntoResult<T> {
    fn into_result(self) -> Result<T, Error>;
}

impl<T> IntoResult<T> for T {
    fn into_result(self) -> Result<T, Error> {
        Ok(self)
    }
}

impl<T> IntoResult<T> for Result<T, Error> {
    fn into_result(self) -> Result<T, Error> {
        self
    }
}

// =====================================================================
// Fixed-arity adapters
// =====================================================================

/// Convert a strongly-typed Rust function into the erased [`OperationFn`],
/// parameterized by an argument tuple type.
pub(crate) trait IntoOperation<Args, R> {
    /// Number of operands the function takes
    const ARITY: usize;

    fn into_operation(self, op: &'static str) -> Arc<OperationFn>;
}

/// Implements `IntoOperation` for one fixed arity. Each operand is converted
/// with `FromParam` before the call; a missing operand is a `TypeError` and
/// operands past the arity are ignored.
macro_rules! impl_into_operation_for_arity {
    ($arity:expr, $( $idx:literal => $p:ident : $A:ident ),+ ) => {
        impl<F, FR, R, $( $A ),+> IntoOperation<( $( $A, )+ ), R> for F
        where
            F: Fn( $( $A ),+ ) -> FR + Send + Sync + 'static,
            FR: IntoResult<R>,
            R: IntoTerm,
            $( $A: FromParam, )+
        {
            const ARITY: usize = $arity;

            fn into_operation(self, op: &'static str) -> Arc<OperationFn> {
                Arc::new(move |args: &[Term]| {
                    $(
                        let $p = match args.get($idx) {
                            Some(value) => <$A as FromParam>::from_arg(op, value)?,
                            None => return Err(missing(op, <$A as FromParam>::KIND)),
                        };
                    )+
                    let value: R = (self)( $( $p ),+ ).into_result()?;
                    Ok(value.into_term())
                })
            }
        }
    };
}

impl_into_operation_for_arity!(1, 0 => p0: A1);
impl_into_operation_for_arity!(2, 0 => p0: A1, 1 => p1: A2);

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, num, sym, truth};

    fn wrap<Args, R, F: IntoOperation<Args, R>>(op: &'static str, f: F) -> Arc<OperationFn> {
        f.into_operation(op)
    }

    #[test]
    fn test_truncation_matches_32_bit_semantics() {
        let cases: Vec<(f64, i32, u32)> = vec![
            (0.0, 0, 0),
            (1.9, 1, 1),
            (-1.9, -1, 4_294_967_295),
            (-1.0, -1, 4_294_967_295),
            (2_147_483_648.0, i32::MIN, 2_147_483_648),
            (4_294_967_296.0, 0, 0),
            (4_294_967_297.5, 1, 1),
            (f64::NAN, 0, 0),
            (f64::INFINITY, 0, 0),
            (f64::NEG_INFINITY, 0, 0),
        ];

        for (i, (input, signed, unsigned)) in cases.iter().enumerate() {
            assert_eq!(to_int32(*input), *signed, "case #{} (int32)", i + 1);
            assert_eq!(to_uint32(*input), *unsigned, "case #{} (uint32)", i + 1);
        }
    }

    #[test]
    fn test_adapter_converts_operands_and_results() {
        fn plus(a: f64, b: f64) -> f64 {
            a + b
        }
        fn is_number(t: Term) -> bool {
            t.as_number().is_some()
        }

        let add = wrap::<(f64, f64), f64, _>("plus", plus);
        assert_eq!(add(&[num(2), num(3)]).unwrap(), num(5));

        let check = wrap::<(Term,), bool, _>("is-number", is_number);
        assert_eq!(check(&[num(1)]).unwrap(), truth());
        assert_eq!(check(&[sym("x")]).unwrap(), nil());
    }

    #[test]
    fn test_adapter_errors() {
        fn plus(a: f64, b: f64) -> f64 {
            a + b
        }
        fn fails(_t: Term) -> Result<Term, Error> {
            Err(Error::TypeError("nope".into()))
        }

        let add = wrap::<(f64, f64), f64, _>("plus", plus);
        assert_eq!(
            add(&[num(1)]).unwrap_err(),
            Error::TypeError("plus: expected number, got nothing".into())
        );
        assert_eq!(
            add(&[]).unwrap_err(),
            Error::TypeError("plus: expected number, got nothing".into())
        );
        assert_eq!(add(&[num(1), num(2), sym("extra")]).unwrap(), num(3));
        assert_eq!(
            add(&[num(1), sym("x")]).unwrap_err(),
            Error::TypeError("plus: expected number, got x".into())
        );

        let failing = wrap::<(Term,), Term, _>("fails", fails);
        assert_eq!(
            failing(&[num(1)]).unwrap_err(),
            Error::TypeError("nope".into())
        );
    }
}
