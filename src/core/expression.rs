//! The expression kernel — the algebraic data model every other module
//! operates on.
//!
//! `Expression` is a sum type (§3 of the spec): every variant is immutable
//! and carries no mutable state, so sharing a subtree between a session
//! binding and a working value is always safe. The smart constructors
//! (`add`, `mul`, `pow`, …) keep Add/Mul/Pow canonical — flattened,
//! like-terms combined, numeric parts folded, operands sorted — so that
//! structural equality (`PartialEq`, which Rust derives member-wise here)
//! doubles as "is this the same expression up to canonical reordering".

use crate::core::{Number, Symbol};
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Distinguished mathematical constants, kept apart from `Symbol` so the
/// renderer and engine never have to special-case a symbol literally named
/// "pi" (see §3, "Known constants never appear as raw symbols").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MathConstant {
    Pi,
    E,
    I,
    Infinity,
}

impl MathConstant {
    pub fn approx(self) -> f64 {
        match self {
            MathConstant::Pi => std::f64::consts::PI,
            MathConstant::E => std::f64::consts::E,
            MathConstant::I => f64::NAN,
            MathConstant::Infinity => f64::INFINITY,
        }
    }
}

/// The expression tree. See module docs and §3 for the invariants each
/// variant must uphold.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(Number),
    Constant(MathConstant),
    Symbol(Symbol),
    /// Variadic, flattened, canonically ordered sum.
    Add(Vec<Expression>),
    /// Variadic, flattened, canonically ordered product.
    Mul(Vec<Expression>),
    Pow(Box<Expression>, Box<Expression>),
    /// An applied function — a builtin (`sin`, `det`, …) or a user-defined
    /// name from the session's function table.
    Function { name: String, args: Vec<Expression> },
    /// Row-major rectangular matrix; invariant: every row has the same
    /// length and there is at least one row.
    Matrix(Vec<Vec<Expression>>),
    Equation { lhs: Box<Expression>, rhs: Box<Expression> },
    Derivative { expr: Box<Expression>, var: Symbol, order: u32 },
    Integral {
        integrand: Box<Expression>,
        var: Symbol,
        bounds: Option<(Box<Expression>, Box<Expression>)>,
    },
    Limit { expr: Box<Expression>, var: Symbol, point: Box<Expression> },
    Series { expr: Box<Expression>, var: Symbol, point: Box<Expression>, order: u32 },
}

impl Expression {
    // ---- leaf constructors ----

    pub fn integer<T: Into<BigInt>>(value: T) -> Self {
        Expression::Number(Number::Integer(value.into()))
    }

    pub fn rational(numer: i64, denom: i64) -> Self {
        Expression::Number(Number::rational(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn float(value: f64, precision: u32) -> Self {
        Expression::Number(Number::Float(value, precision))
    }

    pub fn number(n: Number) -> Self {
        Expression::Number(n)
    }

    pub fn symbol<S: Into<Symbol>>(symbol: S) -> Self {
        Expression::Symbol(symbol.into())
    }

    pub fn pi() -> Self {
        Expression::Constant(MathConstant::Pi)
    }

    pub fn e() -> Self {
        Expression::Constant(MathConstant::E)
    }

    pub fn i() -> Self {
        Expression::Constant(MathConstant::I)
    }

    pub fn infinity() -> Self {
        Expression::Constant(MathConstant::Infinity)
    }

    pub fn zero() -> Self {
        Expression::integer(0)
    }

    pub fn one() -> Self {
        Expression::integer(1)
    }

    // ---- structural predicates ----

    pub fn is_zero(&self) -> bool {
        matches!(self, Expression::Number(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expression::Number(n) if n.is_one())
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Expression::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expression::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Expression::Matrix(_))
    }

    /// Collect every free symbol name appearing in this expression.
    pub fn free_symbols(&self, out: &mut std::collections::BTreeSet<String>) {
        match self {
            Expression::Symbol(s) => {
                out.insert(s.name().to_string());
            }
            Expression::Number(_) | Expression::Constant(_) => {}
            Expression::Add(terms) | Expression::Mul(terms) => {
                for t in terms {
                    t.free_symbols(out);
                }
            }
            Expression::Pow(b, e) => {
                b.free_symbols(out);
                e.free_symbols(out);
            }
            Expression::Function { args, .. } => {
                for a in args {
                    a.free_symbols(out);
                }
            }
            Expression::Matrix(rows) => {
                for row in rows {
                    for cell in row {
                        cell.free_symbols(out);
                    }
                }
            }
            Expression::Equation { lhs, rhs } => {
                lhs.free_symbols(out);
                rhs.free_symbols(out);
            }
            Expression::Derivative { expr, .. } => expr.free_symbols(out),
            Expression::Integral { integrand, bounds, .. } => {
                integrand.free_symbols(out);
                if let Some((a, b)) = bounds {
                    a.free_symbols(out);
                    b.free_symbols(out);
                }
            }
            Expression::Limit { expr, point, .. } => {
                expr.free_symbols(out);
                point.free_symbols(out);
            }
            Expression::Series { expr, point, .. } => {
                expr.free_symbols(out);
                point.free_symbols(out);
            }
        }
    }

    pub fn free_symbol_names(&self) -> Vec<String> {
        let mut set = std::collections::BTreeSet::new();
        self.free_symbols(&mut set);
        set.into_iter().collect()
    }

    // ---- canonicalizing constructors ----

    /// Build a sum, flattening nested additions, folding numeric terms, and
    /// collecting like terms (so `x + x` becomes `2*x`).
    pub fn add(terms: Vec<Expression>) -> Self {
        let mut flat = Vec::with_capacity(terms.len());
        flatten_into(terms, &mut flat, |e| matches!(e, Expression::Add(_)));

        let mut numeric = Number::zero();
        let mut by_base: BTreeMap<String, (Expression, Number)> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();

        for term in flat {
            if let Expression::Number(n) = &term {
                numeric = numeric.add(n);
                continue;
            }
            let (base, coeff) = split_coefficient(&term);
            let key = canonical_key(&base);
            if let Some(existing) = by_base.get_mut(&key) {
                existing.1 = existing.1.add(&coeff);
            } else {
                order.push(key.clone());
                by_base.insert(key, (base, coeff));
            }
        }

        let mut result_terms: Vec<Expression> = Vec::new();
        if !numeric.is_zero() {
            result_terms.push(Expression::Number(numeric));
        }
        for key in order {
            let (base, coeff) = by_base.remove(&key).expect("key tracked in order");
            if coeff.is_zero() {
                continue;
            }
            if coeff.is_one() {
                result_terms.push(base);
            } else {
                result_terms.push(Expression::Mul(vec![Expression::Number(coeff), base]));
            }
        }

        sort_terms(&mut result_terms);
        match result_terms.len() {
            0 => Expression::zero(),
            1 => result_terms.into_iter().next().expect("len == 1"),
            _ => Expression::Add(result_terms),
        }
    }

    /// Build a product, flattening nested products, folding numeric factors,
    /// and collecting repeated bases into powers (so `x * x` becomes `x^2`).
    pub fn mul(factors: Vec<Expression>) -> Self {
        let mut flat = Vec::with_capacity(factors.len());
        flatten_into(factors, &mut flat, |e| matches!(e, Expression::Mul(_)));

        let mut numeric = Number::one();
        let mut by_base: BTreeMap<String, (Expression, Expression)> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();

        for factor in flat {
            if let Expression::Number(n) = &factor {
                if n.is_zero() {
                    return Expression::zero();
                }
                numeric = numeric.mul(n);
                continue;
            }
            let (base, exponent) = split_power(&factor);
            let key = canonical_key(&base);
            if let Some(existing) = by_base.get_mut(&key) {
                existing.1 = Expression::add(vec![existing.1.clone(), exponent]);
            } else {
                order.push(key.clone());
                by_base.insert(key, (base, exponent));
            }
        }

        if numeric.is_zero() {
            return Expression::zero();
        }

        let mut result_factors: Vec<Expression> = Vec::new();
        if !numeric.is_one() {
            result_factors.push(Expression::Number(numeric));
        }
        for key in order {
            let (base, exponent) = by_base.remove(&key).expect("key tracked in order");
            if exponent.is_zero() {
                continue;
            }
            if exponent.is_one() {
                result_factors.push(base);
            } else {
                result_factors.push(Expression::Pow(Box::new(base), Box::new(exponent)));
            }
        }

        sort_terms(&mut result_factors);
        match result_factors.len() {
            0 => Expression::one(),
            1 => result_factors.into_iter().next().expect("len == 1"),
            _ => Expression::Mul(result_factors),
        }
    }

    pub fn neg(expr: Expression) -> Self {
        Expression::mul(vec![Expression::integer(-1), expr])
    }

    pub fn sub(lhs: Expression, rhs: Expression) -> Self {
        Expression::add(vec![lhs, Expression::neg(rhs)])
    }

    /// Build a power, folding trivial exponents (`x^0 = 1`, `x^1 = x`) and
    /// numeric bases raised to integer exponents.
    pub fn pow(base: Expression, exponent: Expression) -> Self {
        if let Expression::Number(e) = &exponent {
            if e.is_zero() {
                return Expression::one();
            }
            if e.is_one() {
                return base;
            }
            if let (Expression::Number(b), Some(e_int)) = (&base, e.to_bigint()) {
                if let Some(e_i64) = num_traits::ToPrimitive::to_i64(&e_int) {
                    if let Some(result) = b.pow_i64(e_i64) {
                        return Expression::Number(result);
                    }
                }
            }
            // (x^a)^b => x^(a*b)
            if let Expression::Pow(inner_base, inner_exp) = base {
                let new_exp = Expression::mul(vec![*inner_exp, exponent]);
                return Expression::pow(*inner_base, new_exp);
            }
        }
        Expression::Pow(Box::new(base), Box::new(exponent))
    }

    pub fn function<S: Into<String>>(name: S, args: Vec<Expression>) -> Self {
        Expression::Function { name: name.into(), args }
    }

    pub fn matrix(rows: Vec<Vec<Expression>>) -> Self {
        Expression::Matrix(rows)
    }

    pub fn equation(lhs: Expression, rhs: Expression) -> Self {
        Expression::Equation { lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn derivative(expr: Expression, var: Symbol, order: u32) -> Self {
        Expression::Derivative { expr: Box::new(expr), var, order }
    }

    pub fn integral(integrand: Expression, var: Symbol) -> Self {
        Expression::Integral { integrand: Box::new(integrand), var, bounds: None }
    }

    pub fn definite_integral(integrand: Expression, var: Symbol, a: Expression, b: Expression) -> Self {
        Expression::Integral {
            integrand: Box::new(integrand),
            var,
            bounds: Some((Box::new(a), Box::new(b))),
        }
    }

    pub fn limit(expr: Expression, var: Symbol, point: Expression) -> Self {
        Expression::Limit { expr: Box::new(expr), var, point: Box::new(point) }
    }

    pub fn series(expr: Expression, var: Symbol, point: Expression, order: u32) -> Self {
        Expression::Series { expr: Box::new(expr), var, point: Box::new(point), order }
    }

    /// Replace every free occurrence of the symbol named `name` with
    /// `value`, rebuilding through the canonicalizing constructors.
    pub fn substitute(&self, name: &str, value: &Expression) -> Self {
        match self {
            Expression::Symbol(s) if s.name() == name => value.clone(),
            Expression::Number(_) | Expression::Constant(_) | Expression::Symbol(_) => self.clone(),
            Expression::Add(terms) => Expression::add(terms.iter().map(|t| t.substitute(name, value)).collect()),
            Expression::Mul(factors) => Expression::mul(factors.iter().map(|f| f.substitute(name, value)).collect()),
            Expression::Pow(b, e) => Expression::pow(b.substitute(name, value), e.substitute(name, value)),
            Expression::Function { name: fname, args } => {
                Expression::function(fname.clone(), args.iter().map(|a| a.substitute(name, value)).collect())
            }
            Expression::Matrix(rows) => Expression::matrix(
                rows.iter().map(|row| row.iter().map(|c| c.substitute(name, value)).collect()).collect(),
            ),
            Expression::Equation { lhs, rhs } => {
                Expression::equation(lhs.substitute(name, value), rhs.substitute(name, value))
            }
            Expression::Derivative { expr, var, order } => {
                if var.name() == name {
                    Expression::derivative((**expr).clone(), var.clone(), *order)
                } else {
                    Expression::derivative(expr.substitute(name, value), var.clone(), *order)
                }
            }
            Expression::Integral { integrand, var, bounds } => {
                let integrand = if var.name() == name { (**integrand).clone() } else { integrand.substitute(name, value) };
                let bounds = bounds.as_ref().map(|(a, b)| (Box::new(a.substitute(name, value)), Box::new(b.substitute(name, value))));
                Expression::Integral { integrand: Box::new(integrand), var: var.clone(), bounds }
            }
            Expression::Limit { expr, var, point } => {
                let inner = if var.name() == name { (**expr).clone() } else { expr.substitute(name, value) };
                Expression::limit(inner, var.clone(), point.substitute(name, value))
            }
            Expression::Series { expr, var, point, order } => {
                let inner = if var.name() == name { (**expr).clone() } else { expr.substitute(name, value) };
                Expression::series(inner, var.clone(), point.substitute(name, value), *order)
            }
        }
    }
}

/// Peel a leading numeric coefficient off a `Mul` term, e.g. `3*x` → `(x,
/// 3)`, `x` → `(x, 1)`. Used by `Expression::add` to collect like terms.
fn split_coefficient(expr: &Expression) -> (Expression, Number) {
    if let Expression::Mul(factors) = expr {
        if let Some(Expression::Number(n)) = factors.first() {
            let rest = factors[1..].to_vec();
            let base = if rest.len() == 1 {
                rest.into_iter().next().expect("len == 1")
            } else {
                Expression::Mul(rest)
            };
            return (base, n.clone());
        }
    }
    (expr.clone(), Number::one())
}

/// Peel a power off a factor, e.g. `x^2` → `(x, 2)`, `x` → `(x, 1)`. Used by
/// `Expression::mul` to collect repeated bases.
fn split_power(expr: &Expression) -> (Expression, Expression) {
    if let Expression::Pow(base, exp) = expr {
        return ((**base).clone(), (**exp).clone());
    }
    (expr.clone(), Expression::one())
}

fn flatten_into(items: Vec<Expression>, out: &mut Vec<Expression>, is_same_variant: impl Fn(&Expression) -> bool + Copy) {
    for item in items {
        if is_same_variant(&item) {
            match item {
                Expression::Add(inner) | Expression::Mul(inner) => {
                    flatten_into(inner, out, is_same_variant);
                }
                other => out.push(other),
            }
        } else {
            out.push(item);
        }
    }
}

/// Rank used to keep canonical ordering deterministic: numbers first,
/// then constants, symbols, powers, products, sums, functions, matrices,
/// everything else last — ties broken by the rendered text.
fn canonical_rank(expr: &Expression) -> u8 {
    match expr {
        Expression::Number(_) => 0,
        Expression::Constant(_) => 1,
        Expression::Symbol(_) => 2,
        Expression::Pow(_, _) => 3,
        Expression::Mul(_) => 4,
        Expression::Function { .. } => 5,
        Expression::Add(_) => 6,
        Expression::Matrix(_) => 7,
        Expression::Equation { .. } => 8,
        Expression::Derivative { .. } => 9,
        Expression::Integral { .. } => 10,
        Expression::Limit { .. } => 11,
        Expression::Series { .. } => 12,
    }
}

pub(crate) fn canonical_key(expr: &Expression) -> String {
    format!("{}:{}", canonical_rank(expr), render_debug(expr))
}

fn render_debug(expr: &Expression) -> String {
    // A stable textual key independent of Display (which is meant for
    // humans and may change); good enough for sorting and equality-of-base
    // comparisons within this textbook-scope CAS.
    match expr {
        Expression::Number(n) => n.to_string(),
        Expression::Constant(c) => format!("{c:?}"),
        Expression::Symbol(s) => s.name().to_string(),
        Expression::Add(terms) => {
            let mut parts: Vec<String> = terms.iter().map(render_debug).collect();
            parts.sort();
            format!("(+{})", parts.join(","))
        }
        Expression::Mul(factors) => {
            let mut parts: Vec<String> = factors.iter().map(render_debug).collect();
            parts.sort();
            format!("(*{})", parts.join(","))
        }
        Expression::Pow(b, e) => format!("({}^{})", render_debug(b), render_debug(e)),
        Expression::Function { name, args } => {
            let parts: Vec<String> = args.iter().map(render_debug).collect();
            format!("{name}({})", parts.join(","))
        }
        Expression::Matrix(rows) => {
            let parts: Vec<String> = rows
                .iter()
                .map(|row| row.iter().map(render_debug).collect::<Vec<_>>().join(","))
                .collect();
            format!("[{}]", parts.join(";"))
        }
        Expression::Equation { lhs, rhs } => format!("{}={}", render_debug(lhs), render_debug(rhs)),
        Expression::Derivative { expr, var, order } => {
            format!("d^{order}/d{}^{order}({})", var.name(), render_debug(expr))
        }
        Expression::Integral { integrand, var, bounds } => match bounds {
            None => format!("int({})d{}", render_debug(integrand), var.name()),
            Some((a, b)) => format!(
                "int[{},{}]({})d{}",
                render_debug(a),
                render_debug(b),
                render_debug(integrand),
                var.name()
            ),
        },
        Expression::Limit { expr, var, point } => {
            format!("lim[{}->{}]({})", var.name(), render_debug(point), render_debug(expr))
        }
        Expression::Series { expr, var, point, order } => format!(
            "series[{},{},{}]({})",
            var.name(),
            render_debug(point),
            order,
            render_debug(expr)
        ),
    }
}

fn sort_terms(terms: &mut [Expression]) {
    terms.sort_by(|a, b| {
        let ra = canonical_rank(a);
        let rb = canonical_rank(b);
        match ra.cmp(&rb) {
            Ordering::Equal => render_debug(a).cmp(&render_debug(b)),
            other => other,
        }
    });
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Expression::integer(value)
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Expression::integer(value)
    }
}

impl From<Symbol> for Expression {
    fn from(symbol: Symbol) -> Self {
        Expression::Symbol(symbol)
    }
}

impl From<&str> for Expression {
    fn from(name: &str) -> Self {
        Expression::Symbol(Symbol::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_collects_like_terms() {
        let x = Expression::symbol("x");
        let sum = Expression::add(vec![x.clone(), x.clone()]);
        assert_eq!(sum, Expression::mul(vec![Expression::integer(2), x]));
    }

    #[test]
    fn add_folds_numeric_terms() {
        let sum = Expression::add(vec![Expression::integer(2), Expression::integer(3)]);
        assert_eq!(sum, Expression::integer(5));
    }

    #[test]
    fn mul_collects_repeated_bases_into_a_power() {
        let x = Expression::symbol("x");
        let product = Expression::mul(vec![x.clone(), x.clone()]);
        assert_eq!(product, Expression::pow(x, Expression::integer(2)));
    }

    #[test]
    fn mul_by_zero_collapses_to_zero() {
        let x = Expression::symbol("x");
        let product = Expression::mul(vec![x, Expression::integer(0)]);
        assert_eq!(product, Expression::zero());
    }

    #[test]
    fn pow_zero_exponent_is_one() {
        let x = Expression::symbol("x");
        assert_eq!(Expression::pow(x, Expression::zero()), Expression::one());
    }

    #[test]
    fn pow_of_pow_multiplies_exponents() {
        let x = Expression::symbol("x");
        let inner = Expression::pow(x.clone(), Expression::integer(2));
        let outer = Expression::pow(inner, Expression::integer(3));
        assert_eq!(outer, Expression::pow(x, Expression::integer(6)));
    }

    #[test]
    fn addition_is_commutative_up_to_canonical_order() {
        let x = Expression::symbol("x");
        let y = Expression::symbol("y");
        let a = Expression::add(vec![x.clone(), y.clone()]);
        let b = Expression::add(vec![y, x]);
        assert_eq!(a, b);
    }

    #[test]
    fn free_symbols_walks_nested_structure() {
        let x = Expression::symbol("x");
        let y = Expression::symbol("y");
        let expr = Expression::pow(Expression::add(vec![x, y]), Expression::integer(2));
        assert_eq!(expr.free_symbol_names(), vec!["x".to_string(), "y".to_string()]);
    }
}
