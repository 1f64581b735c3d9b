//! Polynomial manipulation: expansion, factoring, and the univariate dense
//! representation the calculus and linear-algebra engines share.

use crate::core::{Expression, Number};

/// Expand products and powers: `(x+1)*(x+2)` → `x^2+3x+2`, `(x+1)^2` →
/// `x^2+2x+1` (§4.7, "expand").
pub fn expand(expr: &Expression) -> Expression {
    match expr {
        Expression::Add(terms) => Expression::add(terms.iter().map(expand).collect()),
        Expression::Mul(factors) => {
            let expanded: Vec<Expression> = factors.iter().map(expand).collect();
            expanded.into_iter().fold(Expression::one(), |acc, f| distribute(&acc, &f))
        }
        Expression::Pow(base, exp) => {
            let base = expand(base);
            if let Some(n) = exp.as_number().and_then(Number::to_bigint).and_then(|i| num_traits::ToPrimitive::to_u32(&i)) {
                if n > 0 && n <= 64 {
                    let mut acc = Expression::one();
                    for _ in 0..n {
                        acc = distribute(&acc, &base);
                    }
                    return acc;
                }
            }
            Expression::pow(base, (**exp).clone())
        }
        Expression::Function { name, args } => Expression::function(name.clone(), args.iter().map(expand).collect()),
        other => other.clone(),
    }
}

/// Multiply two already-expanded expressions, distributing over any `Add`.
fn distribute(lhs: &Expression, rhs: &Expression) -> Expression {
    let lhs_terms = additive_terms(lhs);
    let rhs_terms = additive_terms(rhs);
    let mut products = Vec::with_capacity(lhs_terms.len() * rhs_terms.len());
    for l in &lhs_terms {
        for r in &rhs_terms {
            products.push(Expression::mul(vec![l.clone(), r.clone()]));
        }
    }
    Expression::add(products)
}

fn additive_terms(expr: &Expression) -> Vec<Expression> {
    match expr {
        Expression::Add(terms) => terms.clone(),
        other => vec![other.clone()],
    }
}

/// Dense univariate coefficient vector, lowest degree first.
pub type Coeffs = Vec<Number>;

/// Convert an (already expanded) expression into dense coefficients in
/// `var`, or `None` if it is not a polynomial in that single variable
/// (non-integer exponents, a second free variable, etc).
pub fn to_coeffs(expr: &Expression, var: &str) -> Option<Coeffs> {
    let expanded = expand(expr);
    let mut coeffs: Coeffs = vec![Number::zero()];
    for term in additive_terms(&expanded) {
        let (coeff, degree) = term_coefficient_and_degree(&term, var)?;
        if coeffs.len() <= degree {
            coeffs.resize(degree + 1, Number::zero());
        }
        coeffs[degree] = coeffs[degree].add(&coeff);
    }
    Some(coeffs)
}

fn term_coefficient_and_degree(term: &Expression, var: &str) -> Option<(Number, usize)> {
    match term {
        Expression::Number(n) => Some((n.clone(), 0)),
        Expression::Symbol(s) if s.name() == var => Some((Number::one(), 1)),
        Expression::Symbol(_) | Expression::Constant(_) | Expression::Function { .. } => None,
        Expression::Pow(base, exp) => {
            if let Expression::Symbol(s) = base.as_ref() {
                if s.name() == var {
                    let degree = exp.as_number()?.to_bigint().and_then(|b| num_traits::ToPrimitive::to_usize(&b))?;
                    return Some((Number::one(), degree));
                }
            }
            None
        }
        Expression::Mul(factors) => {
            let mut coeff = Number::one();
            let mut degree = 0usize;
            for f in factors {
                match f {
                    Expression::Number(n) => coeff = coeff.mul(n),
                    Expression::Symbol(s) if s.name() == var => degree += 1,
                    Expression::Pow(base, exp) => {
                        if let Expression::Symbol(s) = base.as_ref() {
                            if s.name() == var {
                                let d = exp.as_number()?.to_bigint().and_then(|b| num_traits::ToPrimitive::to_usize(&b))?;
                                degree += d;
                                continue;
                            }
                        }
                        return None;
                    }
                    _ => return None,
                }
            }
            Some((coeff, degree))
        }
        _ => None,
    }
}

/// Rebuild an expression from dense coefficients.
pub fn from_coeffs(coeffs: &[Number], var: &str) -> Expression {
    let x = Expression::symbol(var);
    let terms: Vec<Expression> = coeffs
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_zero())
        .map(|(degree, c)| {
            let power = if degree == 0 {
                Expression::one()
            } else if degree == 1 {
                x.clone()
            } else {
                Expression::pow(x.clone(), Expression::integer(degree as i64))
            };
            Expression::mul(vec![Expression::Number(c.clone()), power])
        })
        .collect();
    Expression::add(terms)
}

pub fn degree(coeffs: &[Number]) -> usize {
    coeffs.iter().rposition(|c| !c.is_zero()).unwrap_or(0)
}

/// Exact polynomial long division over the rationals; `None` only if the
/// divisor is the zero polynomial.
pub fn divmod(num: &[Number], den: &[Number]) -> Option<(Coeffs, Coeffs)> {
    let den_degree = degree(den);
    if den.iter().all(Number::is_zero) {
        return None;
    }
    let mut remainder = num.to_vec();
    let mut quotient = vec![Number::zero(); num.len()];
    let leading_den = den[den_degree].clone();

    loop {
        let rem_degree = degree(&remainder);
        if remainder.iter().all(Number::is_zero) || rem_degree < den_degree {
            break;
        }
        let factor = remainder[rem_degree].div(&leading_den)?;
        let shift = rem_degree - den_degree;
        if quotient.len() <= shift {
            quotient.resize(shift + 1, Number::zero());
        }
        quotient[shift] = quotient[shift].add(&factor);
        for (i, d) in den.iter().enumerate() {
            let idx = i + shift;
            remainder[idx] = remainder[idx].add(&d.mul(&factor).neg());
        }
    }
    Some((quotient, remainder))
}

/// Factor a univariate polynomial over the rationals using the rational
/// root theorem, to the depth a textbook CAS is expected to reach (§4.7,
/// "factor"). Irreducible quadratic/cubic remainders are left as-is.
pub fn factor(expr: &Expression, var: &str) -> Expression {
    let Some(coeffs) = to_coeffs(expr, var) else {
        return expr.clone();
    };
    let roots = super::solve::rational_roots(&coeffs);
    if roots.is_empty() {
        return expand(expr);
    }

    let mut remaining = coeffs;
    let mut factors = Vec::new();
    for root in roots {
        let divisor = vec![root.neg(), Number::one()];
        if let Some((q, r)) = divmod(&remaining, &divisor) {
            if r.iter().all(Number::is_zero) {
                let x = Expression::symbol(var);
                let root_expr = if root.is_zero() {
                    x.clone()
                } else {
                    Expression::add(vec![x.clone(), Expression::Number(root.neg())])
                };
                factors.push(root_expr);
                remaining = q;
            }
        }
    }

    if factors.is_empty() {
        return expand(expr);
    }
    let remainder_expr = from_coeffs(&remaining, var);
    if remainder_expr != Expression::one() {
        factors.push(remainder_expr);
    }
    Expression::mul(factors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_distributes_a_square() {
        let x = Expression::symbol("x");
        let expr = Expression::pow(Expression::add(vec![x.clone(), Expression::integer(1)]), Expression::integer(2));
        let expanded = expand(&expr);
        let expected = Expression::add(vec![
            Expression::pow(x.clone(), Expression::integer(2)),
            Expression::mul(vec![Expression::integer(2), x]),
            Expression::integer(1),
        ]);
        assert_eq!(expanded, expected);
    }

    #[test]
    fn to_coeffs_reads_off_degree_and_coefficient() {
        let x = Expression::symbol("x");
        let expr = Expression::add(vec![
            Expression::pow(x.clone(), Expression::integer(2)),
            Expression::mul(vec![Expression::integer(3), x]),
            Expression::integer(2),
        ]);
        let coeffs = to_coeffs(&expr, "x").unwrap();
        assert_eq!(coeffs, vec![Number::int(2), Number::int(3), Number::int(1)]);
    }

    #[test]
    fn divmod_divides_exactly_when_remainder_is_zero() {
        // x^2 - 1 divided by x - 1 => x + 1, remainder 0
        let num = vec![Number::int(-1), Number::int(0), Number::int(1)];
        let den = vec![Number::int(-1), Number::int(1)];
        let (q, r) = divmod(&num, &den).unwrap();
        assert_eq!(q, vec![Number::int(1), Number::int(1)]);
        assert!(r.iter().all(Number::is_zero));
    }

    #[test]
    fn factor_finds_linear_factors_of_a_quadratic() {
        let x = Expression::symbol("x");
        // x^2 - 5x + 6 = (x-2)(x-3)
        let expr = Expression::add(vec![
            Expression::pow(x.clone(), Expression::integer(2)),
            Expression::neg(Expression::mul(vec![Expression::integer(5), x])),
            Expression::integer(6),
        ]);
        let factored = factor(&expr, "x");
        assert!(matches!(factored, Expression::Mul(ref fs) if fs.len() == 2));
    }
}
