//! `solve` (§4.7): find the roots of a polynomial equation in one variable.

use super::polynomial::{degree, to_coeffs};
use crate::core::{Expression, Number};
use crate::error::{CasError, CasResult};
use num_bigint::BigInt;
use num_integer::Roots;
use num_traits::Signed;

/// `solve(expr, var)`: accepts an `Equation` (moved to `lhs - rhs = 0`) or a
/// bare expression (implicit `= 0`).
pub fn solve(expr: &Expression, var: &str) -> CasResult<Vec<Expression>> {
    let normalized = match expr {
        Expression::Equation { lhs, rhs } => Expression::sub((**lhs).clone(), (**rhs).clone()),
        other => other.clone(),
    };

    let coeffs = to_coeffs(&normalized, var)
        .ok_or_else(|| CasError::Engine(format!("'{var}' does not appear as a polynomial in this expression")))?;

    log::debug!("solve: degree {} polynomial in {var}", degree(&coeffs));
    match degree(&coeffs) {
        0 => {
            if coeffs.first().map(Number::is_zero).unwrap_or(true) {
                Err(CasError::Engine("every value solves this equation".to_string()))
            } else {
                Ok(Vec::new())
            }
        }
        1 => Ok(vec![solve_linear(&coeffs)]),
        2 => Ok(solve_quadratic(&coeffs)),
        _ => solve_higher_degree(&coeffs, var),
    }
}

fn solve_linear(coeffs: &[Number]) -> Expression {
    let a = &coeffs[1];
    let b = &coeffs[0];
    let root = b.neg().div(a).expect("linear leading coefficient is nonzero");
    Expression::Number(root)
}

/// Quadratic formula, producing complex roots (via `Expression::i()`) when
/// the discriminant is negative.
fn solve_quadratic(coeffs: &[Number]) -> Vec<Expression> {
    let c = &coeffs[0];
    let b = &coeffs[1];
    let a = &coeffs[2];
    let discriminant = b.mul(b).add(&a.mul(c).mul(&Number::int(-4)));
    let two_a = a.mul(&Number::int(2));
    let neg_b = b.neg();

    if let Some(disc_f) = discriminant.to_f64() {
        if disc_f >= 0.0 {
            if let Some(sqrt_disc) = exact_sqrt(&discriminant) {
                let r1 = neg_b.add(&sqrt_disc).div(&two_a).expect("leading coefficient nonzero");
                let r2 = neg_b.add(&sqrt_disc.neg()).div(&two_a).expect("leading coefficient nonzero");
                return dedup_numeric(vec![Expression::Number(r1), Expression::Number(r2)]);
            }
            let sqrt_expr = Expression::function("sqrt", vec![Expression::Number(discriminant)]);
            return build_quadratic_roots(&neg_b, &two_a, sqrt_expr, false);
        }
        let pos_disc = discriminant.neg();
        let sqrt_expr = match exact_sqrt(&pos_disc) {
            Some(s) => Expression::Number(s),
            None => Expression::function("sqrt", vec![Expression::Number(pos_disc)]),
        };
        return build_quadratic_roots(&neg_b, &two_a, sqrt_expr, true);
    }
    Vec::new()
}

fn build_quadratic_roots(neg_b: &Number, two_a: &Number, sqrt_term: Expression, imaginary: bool) -> Vec<Expression> {
    let sqrt_term = if imaginary { Expression::mul(vec![sqrt_term, Expression::i()]) } else { sqrt_term };
    let inv_two_a = Expression::pow(Expression::Number(two_a.clone()), Expression::integer(-1));
    let r1 = Expression::mul(vec![
        Expression::add(vec![Expression::Number(neg_b.clone()), sqrt_term.clone()]),
        inv_two_a.clone(),
    ]);
    let r2 = Expression::mul(vec![
        Expression::add(vec![Expression::Number(neg_b.clone()), Expression::neg(sqrt_term)]),
        inv_two_a,
    ]);
    vec![r1, r2]
}

/// Returns `Some(sqrt)` when `n` is a perfect-square rational.
fn exact_sqrt(n: &Number) -> Option<Number> {
    if n.is_negative() {
        return None;
    }
    let as_rational = n.as_rational();
    let numer_sqrt = isqrt_exact(as_rational.numer())?;
    let denom_sqrt = isqrt_exact(as_rational.denom())?;
    Some(Number::rational(numer_sqrt, denom_sqrt))
}

fn isqrt_exact(n: &BigInt) -> Option<BigInt> {
    if n.is_negative() {
        return None;
    }
    let root = n.sqrt();
    if &root * &root == *n {
        Some(root)
    } else {
        None
    }
}

/// Degree ≥ 3: peel off rational roots, then fall back to the quadratic
/// formula if a degree-2 remainder is left (textbook-CAS scope, §4.7).
fn solve_higher_degree(coeffs: &[Number], var: &str) -> CasResult<Vec<Expression>> {
    let roots = rational_roots(coeffs);
    let mut remaining = coeffs.to_vec();
    let mut found: Vec<Expression> = Vec::new();

    for root in &roots {
        let divisor = vec![root.neg(), Number::one()];
        if let Some((q, r)) = super::polynomial::divmod(&remaining, &divisor) {
            if r.iter().all(Number::is_zero) {
                found.push(Expression::Number(root.clone()));
                remaining = q;
            }
        }
    }

    match degree(&remaining) {
        0 => {}
        1 => found.push(solve_linear(&remaining)),
        2 => found.extend(solve_quadratic(&remaining)),
        _ => {
            log::warn!("solve: degree {} remainder has no rational roots; reporting partial results", degree(&remaining));
            if found.is_empty() {
                let _ = var;
                return Err(CasError::Engine(
                    "no rational roots found for this degree ≥ 3 polynomial".to_string(),
                ));
            }
        }
    }
    Ok(dedup_numeric(found))
}

/// Rational root theorem: every candidate `p/q` with `p | constant term`
/// and `q | leading coefficient`.
pub fn rational_roots(coeffs: &[Number]) -> Vec<Number> {
    let int_coeffs: Option<Vec<BigInt>> = coeffs.iter().map(Number::to_bigint).collect();
    let Some(int_coeffs) = int_coeffs else { return Vec::new() };
    let deg = degree(coeffs);
    if deg == 0 {
        return Vec::new();
    }
    let constant = &int_coeffs[0];
    let leading = &int_coeffs[deg];
    if constant.is_zero() {
        // x divides; x=0 is a root. Continue searching the rest via the
        // deflated polynomial is handled by the caller re-invoking divmod;
        // here we just report 0 plus divisors of the next nonzero term.
    }
    let p_candidates = divisors(constant);
    let q_candidates = divisors(leading);

    let mut roots = Vec::new();
    if constant.is_zero() {
        roots.push(Number::zero());
    }
    for p in &p_candidates {
        for q in &q_candidates {
            for sign in [1, -1] {
                let candidate = Number::rational(p * sign, q.clone());
                if !roots.contains(&candidate) && evaluates_to_zero(coeffs, &candidate) {
                    roots.push(candidate);
                }
            }
        }
    }
    roots
}

fn divisors(n: &BigInt) -> Vec<BigInt> {
    let n = n.abs();
    if n.is_zero() {
        return vec![BigInt::from(1)];
    }
    let mut out = Vec::new();
    let mut i = BigInt::from(1);
    while &i * &i <= n {
        if (&n % &i).is_zero() {
            out.push(i.clone());
            let complement = &n / &i;
            if complement != i {
                out.push(complement);
            }
        }
        i += 1;
    }
    out
}

fn evaluates_to_zero(coeffs: &[Number], x: &Number) -> bool {
    let mut acc = Number::zero();
    let mut power = Number::one();
    for c in coeffs {
        acc = acc.add(&c.mul(&power));
        power = power.mul(x);
    }
    acc.is_zero()
}

fn dedup_numeric(roots: Vec<Expression>) -> Vec<Expression> {
    let mut out: Vec<Expression> = Vec::new();
    for r in roots {
        if !out.contains(&r) {
            out.push(r);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_linear_equation() {
        let x = Expression::symbol("x");
        let expr = Expression::sub(Expression::mul(vec![Expression::integer(2), x]), Expression::integer(4));
        let roots = solve(&expr, "x").unwrap();
        assert_eq!(roots, vec![Expression::integer(2)]);
    }

    #[test]
    fn solves_factorable_quadratic() {
        let x = Expression::symbol("x");
        let expr = Expression::add(vec![
            Expression::pow(x.clone(), Expression::integer(2)),
            Expression::neg(Expression::mul(vec![Expression::integer(5), x])),
            Expression::integer(6),
        ]);
        let roots = solve(&expr, "x").unwrap();
        assert_eq!(roots.len(), 2);
        assert!(roots.contains(&Expression::integer(2)));
        assert!(roots.contains(&Expression::integer(3)));
    }

    #[test]
    fn negative_discriminant_yields_complex_roots() {
        let x = Expression::symbol("x");
        let expr = Expression::add(vec![Expression::pow(x, Expression::integer(2)), Expression::integer(1)]);
        let roots = solve(&expr, "x").unwrap();
        assert_eq!(roots.len(), 2);
    }

    #[test]
    fn rational_roots_finds_divisor_candidates() {
        let coeffs = vec![Number::int(-6), Number::int(-1), Number::int(1)];
        let roots = rational_roots(&coeffs);
        assert!(roots.contains(&Number::int(3)));
        assert!(roots.contains(&Number::int(-2)));
    }
}
