//! The algebra/calculus engine (§4.7): simplification, factoring, equation
//! solving, and calculus operations over the expression kernel.

pub mod calculus;
pub mod polynomial;
pub mod simplify;
pub mod solve;

pub use calculus::{diff, integrate, limit, series, subs};
pub use simplify::Simplify;
pub use solve::solve;

use crate::core::Expression;

/// `expand(expr)` (§4.7): fully distribute products over sums.
pub fn expand(expr: &Expression) -> Expression {
    polynomial::expand(expr).simplify()
}

/// `factor(expr, var)` (§4.7): factor a univariate polynomial over the
/// rationals using the rational root theorem, falling back to the
/// expanded expression unchanged when no rational factorization is found.
pub fn factor(expr: &Expression, var: &str) -> Expression {
    polynomial::factor(expr, var)
}
