//! Differentiation, integration, limits, and series (§4.7).

use super::simplify::Simplify;
use crate::core::{Expression, Number, Symbol};
use crate::error::{CasError, CasResult};

/// `diff(expr, var, order)`: repeated structural differentiation.
pub fn diff(expr: &Expression, var: &str, order: u32) -> Expression {
    let mut current = expr.clone();
    for _ in 0..order {
        current = diff_once(&current, var).simplify();
    }
    current
}

fn diff_once(expr: &Expression, var: &str) -> Expression {
    match expr {
        Expression::Number(_) | Expression::Constant(_) => Expression::zero(),
        Expression::Symbol(s) => {
            if s.name() == var {
                Expression::one()
            } else {
                Expression::zero()
            }
        }
        Expression::Add(terms) => Expression::add(terms.iter().map(|t| diff_once(t, var)).collect()),
        Expression::Mul(factors) => {
            let terms: Vec<Expression> = (0..factors.len())
                .map(|i| {
                    let mut parts = factors.clone();
                    parts[i] = diff_once(&factors[i], var);
                    Expression::mul(parts)
                })
                .collect();
            Expression::add(terms)
        }
        Expression::Pow(base, exp) => diff_pow(base, exp, var),
        Expression::Function { name, args } if args.len() == 1 => diff_unary_function(name, &args[0], var),
        Expression::Matrix(rows) => {
            Expression::matrix(rows.iter().map(|row| row.iter().map(|c| diff_once(c, var)).collect()).collect())
        }
        Expression::Equation { lhs, rhs } => Expression::equation(diff_once(lhs, var), diff_once(rhs, var)),
        other => Expression::derivative(other.clone(), Symbol::new(var), 1),
    }
}

/// Generalized power/exponential/logarithmic differentiation rule:
/// `d/dx base^exp = base^exp * (exp' * ln(base) + exp * base'/base)`.
/// Reduces to the ordinary power rule when `exp` is constant (its
/// derivative term vanishes) and to the exponential rule when `base` is
/// constant (its derivative term vanishes).
fn diff_pow(base: &Expression, exp: &Expression, var: &str) -> Expression {
    let d_base = diff_once(base, var);
    let d_exp = diff_once(exp, var);
    if d_exp.is_zero() {
        // Plain power rule: n * base^(n-1) * base'.
        let lowered = Expression::pow(base.clone(), Expression::add(vec![exp.clone(), Expression::integer(-1)]));
        return Expression::mul(vec![exp.clone(), lowered, d_base]);
    }
    if d_base.is_zero() {
        // Exponential rule: base^exp * ln(base) * exp'.
        let whole = Expression::pow(base.clone(), exp.clone());
        return Expression::mul(vec![whole, Expression::function("log", vec![base.clone()]), d_exp]);
    }
    let whole = Expression::pow(base.clone(), exp.clone());
    let log_term = Expression::mul(vec![d_exp, Expression::function("log", vec![base.clone()])]);
    let ratio_term = Expression::mul(vec![exp.clone(), d_base, Expression::pow(base.clone(), Expression::integer(-1))]);
    Expression::mul(vec![whole, Expression::add(vec![log_term, ratio_term])])
}

fn diff_unary_function(name: &str, arg: &Expression, var: &str) -> Expression {
    let du = diff_once(arg, var);
    let chain = |f: Expression| Expression::mul(vec![f, du.clone()]);
    match name {
        "sin" => chain(Expression::function("cos", vec![arg.clone()])),
        "cos" => chain(Expression::neg(Expression::function("sin", vec![arg.clone()]))),
        "tan" => chain(Expression::pow(Expression::function("cos", vec![arg.clone()]), Expression::integer(-2))),
        "cot" => chain(Expression::neg(Expression::pow(Expression::function("sin", vec![arg.clone()]), Expression::integer(-2)))),
        "sec" => chain(Expression::mul(vec![
            Expression::function("sec", vec![arg.clone()]),
            Expression::function("tan", vec![arg.clone()]),
        ])),
        "csc" => chain(Expression::neg(Expression::mul(vec![
            Expression::function("csc", vec![arg.clone()]),
            Expression::function("cot", vec![arg.clone()]),
        ]))),
        "exp" => chain(Expression::function("exp", vec![arg.clone()])),
        "log" | "ln" => chain(Expression::pow(arg.clone(), Expression::integer(-1))),
        "sqrt" => chain(Expression::pow(
            Expression::mul(vec![Expression::integer(2), Expression::function("sqrt", vec![arg.clone()])]),
            Expression::integer(-1),
        )),
        "arcsin" => chain(Expression::pow(
            Expression::function("sqrt", vec![Expression::sub(Expression::one(), Expression::pow(arg.clone(), Expression::integer(2)))]),
            Expression::integer(-1),
        )),
        "arccos" => chain(Expression::neg(Expression::pow(
            Expression::function("sqrt", vec![Expression::sub(Expression::one(), Expression::pow(arg.clone(), Expression::integer(2)))]),
            Expression::integer(-1),
        ))),
        "arctan" => chain(Expression::pow(
            Expression::add(vec![Expression::one(), Expression::pow(arg.clone(), Expression::integer(2))]),
            Expression::integer(-1),
        )),
        "sinh" => chain(Expression::function("cosh", vec![arg.clone()])),
        "cosh" => chain(Expression::function("sinh", vec![arg.clone()])),
        "tanh" => chain(Expression::sub(
            Expression::one(),
            Expression::pow(Expression::function("tanh", vec![arg.clone()]), Expression::integer(2)),
        )),
        _ => Expression::derivative(Expression::function(name, vec![arg.clone()]), Symbol::new(var), 1),
    }
}

/// `integrate(expr, var)` / `integrate(expr, var, a, b)` (§4.7). Best
/// effort: terms the engine doesn't recognize are left as an unevaluated
/// `Integral` node rather than failing the whole command.
pub fn integrate(expr: &Expression, var: &str, bounds: Option<(&Expression, &Expression)>) -> CasResult<Expression> {
    let antiderivative = integrate_indefinite(expr, var).simplify();
    match bounds {
        None => Ok(antiderivative),
        Some((a, b)) => {
            let at_b = antiderivative.substitute(var, b).simplify();
            let at_a = antiderivative.substitute(var, a).simplify();
            Ok(Expression::sub(at_b, at_a).simplify())
        }
    }
}

fn integrate_indefinite(expr: &Expression, var: &str) -> Expression {
    match expr {
        Expression::Add(terms) => Expression::add(terms.iter().map(|t| integrate_term(t, var)).collect()),
        other => integrate_term(other, var),
    }
}

fn integrate_term(term: &Expression, var: &str) -> Expression {
    if !term.free_symbol_names().iter().any(|n| n == var) {
        return Expression::mul(vec![term.clone(), Expression::symbol(var)]);
    }

    if let Expression::Mul(factors) = term {
        let (constants, variable_part): (Vec<Expression>, Vec<Expression>) =
            factors.iter().cloned().partition(|f| !f.free_symbol_names().iter().any(|n| n == var));
        if !constants.is_empty() {
            let inner = Expression::mul(variable_part);
            return Expression::mul({
                let mut v = constants;
                v.push(integrate_term(&inner, var));
                v
            });
        }
    }

    match term {
        Expression::Symbol(s) if s.name() == var => {
            Expression::mul(vec![Expression::rational(1, 2), Expression::pow(term.clone(), Expression::integer(2))])
        }
        Expression::Pow(base, exp) if matches!(base.as_ref(), Expression::Symbol(s) if s.name() == var) => {
            integrate_power(base, exp, var, term)
        }
        Expression::Function { name, args } if args.len() == 1 => integrate_unary_function(name, &args[0], var, term),
        _ => {
            log::warn!("integrate: no closed form recognized, leaving unevaluated");
            Expression::integral(term.clone(), Symbol::new(var))
        }
    }
}

fn integrate_power(base: &Expression, exp: &Expression, var: &str, fallback: &Expression) -> Expression {
    if let Some(n) = exp.as_number() {
        if *n == Number::int(-1) {
            return Expression::function("log", vec![base.clone()]);
        }
        let new_exp_num = n.add(&Number::one());
        let inv = Number::one().div(&new_exp_num).expect("exponent + 1 is nonzero");
        let new_exp = Expression::Number(new_exp_num);
        return Expression::mul(vec![Expression::pow(base.clone(), new_exp), Expression::Number(inv)]);
    }
    log::warn!("integrate: non-constant exponent, leaving unevaluated");
    Expression::integral(fallback.clone(), Symbol::new(var))
}

/// Linear-argument trig/exp/log integrals via the substitution `u = a*x+b`,
/// scaling the antiderivative by `1/a`.
fn integrate_unary_function(name: &str, arg: &Expression, var: &str, fallback: &Expression) -> Expression {
    let Some(slope) = linear_slope(arg, var) else {
        log::warn!("integrate: unsupported function argument, leaving unevaluated");
        return Expression::integral(fallback.clone(), Symbol::new(var));
    };
    let scale = Expression::pow(slope, Expression::integer(-1));
    let antiderivative = match name {
        "sin" => Expression::neg(Expression::function("cos", vec![arg.clone()])),
        "cos" => Expression::function("sin", vec![arg.clone()]),
        "exp" => Expression::function("exp", vec![arg.clone()]),
        "log" | "ln" => Expression::sub(
            Expression::mul(vec![arg.clone(), Expression::function("log", vec![arg.clone()])]),
            arg.clone(),
        ),
        _ => {
            log::warn!("integrate: no rule for '{name}', leaving unevaluated");
            return Expression::integral(fallback.clone(), Symbol::new(var));
        }
    };
    Expression::mul(vec![scale, antiderivative])
}

/// If `expr` is `a*var + b` (or just `var`), return the constant slope `a`.
fn linear_slope(expr: &Expression, var: &str) -> Option<Expression> {
    match expr {
        Expression::Symbol(s) if s.name() == var => Some(Expression::one()),
        Expression::Mul(factors) => {
            let has_var = factors.iter().any(|f| matches!(f, Expression::Symbol(s) if s.name() == var));
            if has_var && factors.iter().all(|f| matches!(f, Expression::Symbol(s) if s.name() == var) || f.as_number().is_some()) {
                let coeff: Vec<Expression> = factors.iter().filter(|f| f.as_number().is_some()).cloned().collect();
                Some(if coeff.is_empty() { Expression::one() } else { Expression::mul(coeff) })
            } else {
                None
            }
        }
        Expression::Add(terms) => {
            let var_terms: Vec<&Expression> = terms.iter().filter(|t| t.free_symbol_names().iter().any(|n| n == var)).collect();
            if var_terms.len() == 1 {
                linear_slope(var_terms[0], var)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// `limit(expr, var, point)` (§4.7): direct substitution, with a small
/// L'Hopital fallback for `0/0` forms.
pub fn limit(expr: &Expression, var: &str, point: &Expression) -> CasResult<Expression> {
    const MAX_LHOPITAL_ROUNDS: u32 = 4;
    let mut numerator = expr.clone();
    let mut denominator = Expression::one();
    if let Expression::Mul(factors) = expr {
        let (recip, rest): (Vec<Expression>, Vec<Expression>) =
            factors.iter().cloned().partition(|f| matches!(f, Expression::Pow(_, e) if e.as_number().map(|n| n.is_negative()).unwrap_or(false)));
        if recip.len() == 1 {
            if let Expression::Pow(base, _) = &recip[0] {
                denominator = (**base).clone();
                numerator = Expression::mul(rest);
            }
        }
    }

    for _ in 0..=MAX_LHOPITAL_ROUNDS {
        let num_at_point = numerator.substitute(var, point).simplify();
        let den_at_point = denominator.substitute(var, point).simplify();
        if den_at_point.is_zero() && num_at_point.is_zero() {
            numerator = diff(&numerator, var, 1);
            denominator = diff(&denominator, var, 1);
            continue;
        }
        if den_at_point.is_zero() {
            return Err(CasError::Engine(format!("limit diverges as {var} -> {}", crate::render::to_plain(point))));
        }
        let value = Expression::mul(vec![num_at_point, Expression::pow(den_at_point, Expression::integer(-1))]);
        return Ok(value.simplify());
    }

    log::warn!("limit: L'Hopital did not resolve after {MAX_LHOPITAL_ROUNDS} rounds, leaving unevaluated");
    Ok(Expression::limit(expr.clone(), Symbol::new(var), point.clone()))
}

/// `series(expr, var, point, order)` (§4.7): Taylor expansion via
/// repeated differentiation.
pub fn series(expr: &Expression, var: &str, point: &Expression, order: u32) -> Expression {
    let mut terms = Vec::with_capacity(order as usize + 1);
    let mut derivative = expr.clone();
    let mut factorial = Number::one();
    for k in 0..=order {
        if k > 0 {
            derivative = diff(&derivative, var, 1);
            factorial = factorial.mul(&Number::int(k as i64));
        }
        let coefficient = derivative.substitute(var, point).simplify();
        if coefficient.is_zero() {
            continue;
        }
        let power_term = if k == 0 {
            Expression::one()
        } else {
            Expression::pow(Expression::sub(Expression::symbol(var), point.clone()), Expression::integer(k as i64))
        };
        let inv_factorial = Expression::Number(Number::one().div(&factorial).expect("factorial is nonzero"));
        terms.push(Expression::mul(vec![coefficient, inv_factorial, power_term]));
    }
    Expression::add(terms)
}

/// `subs(expr, old, new)` (§4.7): literal substitution then simplification.
pub fn subs(expr: &Expression, old: &str, new: &Expression) -> Expression {
    expr.substitute(old, new).simplify()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_of_power_applies_power_rule() {
        let x = Expression::symbol("x");
        let expr = Expression::pow(x.clone(), Expression::integer(2));
        assert_eq!(diff(&expr, "x", 1), Expression::mul(vec![Expression::integer(2), x]));
    }

    #[test]
    fn diff_of_sin_is_cos() {
        let x = Expression::symbol("x");
        let expr = Expression::function("sin", vec![x.clone()]);
        assert_eq!(diff(&expr, "x", 1), Expression::function("cos", vec![x]));
    }

    #[test]
    fn definite_integral_of_5x_over_0_to_5_is_125_over_2() {
        let x = Expression::symbol("x");
        let expr = Expression::mul(vec![Expression::integer(5), x]);
        let result = integrate(&expr, "x", Some((&Expression::integer(0), &Expression::integer(5)))).unwrap();
        assert_eq!(result, Expression::rational(125, 2));
    }

    #[test]
    fn limit_of_sin_x_over_x_at_zero_is_one() {
        let x = Expression::symbol("x");
        let expr = Expression::mul(vec![
            Expression::function("sin", vec![x.clone()]),
            Expression::pow(x, Expression::integer(-1)),
        ]);
        let result = limit(&expr, "x", &Expression::zero()).unwrap();
        assert_eq!(result, Expression::one());
    }

    #[test]
    fn subs_replaces_and_simplifies() {
        let x = Expression::symbol("x");
        let expr = Expression::add(vec![x.clone(), Expression::integer(1)]);
        assert_eq!(subs(&expr, "x", &Expression::integer(4)), Expression::integer(5));
    }
}
