//! `simplify` (§4.7): algebraic, trigonometric, and rational simplification.
//!
//! Most canonicalization (flattening, numeric folding, like-term and
//! like-base collection) already happens in the `Expression::add`/`mul`/
//! `pow` smart constructors; this module layers the identities those
//! constructors can't express on their own: the Pythagorean identity and
//! cancelling a common polynomial factor out of a quotient.

use super::polynomial;
use crate::core::{Expression, MathConstant, Number};

/// Blanket trait matching the teacher corpus's convention of a `Simplify`
/// seam rather than a bare free function, so call sites read `expr.simplify()`.
pub trait Simplify {
    fn simplify(&self) -> Expression;
}

impl Simplify for Expression {
    fn simplify(&self) -> Expression {
        simplify_expr(self)
    }
}

fn simplify_expr(expr: &Expression) -> Expression {
    match expr {
        Expression::Number(_) | Expression::Constant(_) | Expression::Symbol(_) => expr.clone(),
        Expression::Add(terms) => {
            let simplified: Vec<Expression> = terms.iter().map(simplify_expr).collect();
            fold_pythagorean(Expression::add(simplified))
        }
        Expression::Mul(factors) => {
            let simplified: Vec<Expression> = factors.iter().map(simplify_expr).collect();
            cancel_common_polynomial_factor(Expression::mul(simplified))
        }
        Expression::Pow(base, exp) => Expression::pow(simplify_expr(base), simplify_expr(exp)),
        Expression::Function { name, args } => {
            let args: Vec<Expression> = args.iter().map(simplify_expr).collect();
            simplify_function(name, args)
        }
        Expression::Matrix(rows) => {
            Expression::matrix(rows.iter().map(|row| row.iter().map(simplify_expr).collect()).collect())
        }
        Expression::Equation { lhs, rhs } => Expression::equation(simplify_expr(lhs), simplify_expr(rhs)),
        Expression::Derivative { expr, var, order } => Expression::derivative(simplify_expr(expr), var.clone(), *order),
        Expression::Integral { integrand, var, bounds } => Expression::Integral {
            integrand: Box::new(simplify_expr(integrand)),
            var: var.clone(),
            bounds: bounds.as_ref().map(|(a, b)| (Box::new(simplify_expr(a)), Box::new(simplify_expr(b)))),
        },
        Expression::Limit { expr, var, point } => Expression::limit(simplify_expr(expr), var.clone(), simplify_expr(point)),
        Expression::Series { expr, var, point, order } => {
            Expression::series(simplify_expr(expr), var.clone(), simplify_expr(point), *order)
        }
    }
}

/// `sin(v)^2 + cos(v)^2 → 1` for a shared argument `v` (§4.7).
fn fold_pythagorean(expr: Expression) -> Expression {
    let Expression::Add(terms) = &expr else { return expr };
    for i in 0..terms.len() {
        let Some(sin_arg) = squared_trig_arg(&terms[i], "sin") else { continue };
        for j in 0..terms.len() {
            if i == j {
                continue;
            }
            let Some(cos_arg) = squared_trig_arg(&terms[j], "cos") else { continue };
            if sin_arg == cos_arg {
                let mut rest: Vec<Expression> =
                    terms.iter().enumerate().filter(|(k, _)| *k != i && *k != j).map(|(_, t)| t.clone()).collect();
                rest.push(Expression::one());
                return Expression::add(rest);
            }
        }
    }
    expr
}

fn squared_trig_arg<'a>(expr: &'a Expression, fname: &str) -> Option<&'a Expression> {
    if let Expression::Pow(base, exp) = expr {
        if exp.is_number_equal_to(2) {
            if let Expression::Function { name, args } = base.as_ref() {
                if name == fname && args.len() == 1 {
                    return Some(&args[0]);
                }
            }
        }
    }
    None
}

/// Cancel a single reciprocal polynomial factor against the rest of a
/// product when division is exact — e.g. `(x^2-1)*(x-1)^-1 → x+1`.
fn cancel_common_polynomial_factor(expr: Expression) -> Expression {
    let Expression::Mul(factors) = &expr else { return expr };
    let Some(den_idx) = factors.iter().position(is_simple_reciprocal) else { return expr };
    let Expression::Pow(den_base, _) = &factors[den_idx] else { unreachable!() };

    let vars = den_base.free_symbol_names();
    if vars.len() != 1 {
        return expr;
    }
    let var = &vars[0];
    let Some(den_coeffs) = polynomial::to_coeffs(den_base, var) else { return expr };

    let numerator_factors: Vec<Expression> =
        factors.iter().enumerate().filter(|(i, _)| *i != den_idx).map(|(_, f)| f.clone()).collect();
    let numerator = Expression::mul(numerator_factors);
    let Some(num_coeffs) = polynomial::to_coeffs(&numerator, var) else { return expr };
    let Some((quotient, remainder)) = polynomial::divmod(&num_coeffs, &den_coeffs) else { return expr };

    if remainder.iter().all(Number::is_zero) {
        polynomial::from_coeffs(&quotient, var)
    } else {
        expr
    }
}

fn is_simple_reciprocal(factor: &Expression) -> bool {
    matches!(factor, Expression::Pow(_, e) if e.as_number().map(Number::is_negative).unwrap_or(false))
}

fn simplify_function(name: &str, args: Vec<Expression>) -> Expression {
    if args.len() == 1 {
        if let Some(folded) = simplify_unary_function(name, &args[0]) {
            return folded;
        }
    }
    Expression::function(name, args)
}

fn simplify_unary_function(name: &str, arg: &Expression) -> Option<Expression> {
    if let Expression::Number(n) = arg {
        return match name {
            "sin" | "tan" | "sinh" | "tanh" if n.is_zero() => Some(Expression::zero()),
            "cos" | "cosh" | "exp" if n.is_zero() => Some(Expression::one()),
            "log" | "ln" if n.is_one() => Some(Expression::zero()),
            "sqrt" => exact_integer_sqrt(n).map(Expression::Number),
            "abs" => Some(Expression::Number(abs_number(n))),
            _ => None,
        };
    }
    if let Expression::Constant(MathConstant::Pi) = arg {
        return match name {
            "sin" => Some(Expression::zero()),
            "cos" => Some(Expression::neg(Expression::one())),
            _ => None,
        };
    }
    None
}

fn exact_integer_sqrt(n: &Number) -> Option<Number> {
    use num_integer::Roots;
    let i = n.to_bigint()?;
    if i.sign() == num_bigint::Sign::Minus {
        return None;
    }
    let root = i.sqrt();
    (&root * &root == i).then(|| Number::int(root))
}

fn abs_number(n: &Number) -> Number {
    if n.is_negative() {
        n.neg()
    } else {
        n.clone()
    }
}

impl Expression {
    fn is_number_equal_to(&self, value: i64) -> bool {
        matches!(self.as_number(), Some(n) if *n == Number::int(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pythagorean_identity_folds_to_one() {
        let x = Expression::symbol("x");
        let expr = Expression::add(vec![
            Expression::pow(Expression::function("sin", vec![x.clone()]), Expression::integer(2)),
            Expression::pow(Expression::function("cos", vec![x]), Expression::integer(2)),
        ]);
        assert_eq!(expr.simplify(), Expression::one());
    }

    #[test]
    fn rational_function_cancels_common_factor() {
        let x = Expression::symbol("x");
        let numerator = Expression::add(vec![Expression::pow(x.clone(), Expression::integer(2)), Expression::integer(-1)]);
        let denominator = Expression::add(vec![x.clone(), Expression::integer(-1)]);
        let expr = Expression::mul(vec![numerator, Expression::pow(denominator, Expression::integer(-1))]);
        let expected = Expression::add(vec![x, Expression::integer(1)]);
        assert_eq!(expr.simplify(), expected);
    }

    #[test]
    fn sin_of_zero_is_zero() {
        let expr = Expression::function("sin", vec![Expression::integer(0)]);
        assert_eq!(expr.simplify(), Expression::zero());
    }

    #[test]
    fn sqrt_of_perfect_square_is_exact() {
        let expr = Expression::function("sqrt", vec![Expression::integer(9)]);
        assert_eq!(expr.simplify(), Expression::integer(3));
    }
}
