//! The resolver (§4.5): substitutes bound variables and expands
//! user-defined function applications, with cycle detection.
//!
//! A pure transformation — it never mutates the [`Session`].

use crate::core::Expression;
use crate::error::{CasError, CasResult};
use crate::session::Session;
use std::collections::{BTreeSet, HashMap};

/// Resolve `expr` against `session`, substituting bound variables and
/// expanding user function calls. Names in `exclude` are never substituted
/// even if bound — used so `diff(expr, x)` doesn't replace `x` with an
/// earlier assignment to the same name.
pub fn resolve(expr: &Expression, session: &Session, exclude: &BTreeSet<String>) -> CasResult<Expression> {
    resolve_inner(expr, session, exclude, &BTreeSet::new())
}

fn resolve_inner(
    expr: &Expression,
    session: &Session,
    exclude: &BTreeSet<String>,
    visited: &BTreeSet<String>,
) -> CasResult<Expression> {
    match expr {
        Expression::Number(_) | Expression::Constant(_) => Ok(expr.clone()),
        Expression::Symbol(s) => resolve_symbol(s.name(), session, exclude, visited),
        Expression::Add(terms) => {
            let resolved = terms
                .iter()
                .map(|t| resolve_inner(t, session, exclude, visited))
                .collect::<CasResult<Vec<_>>>()?;
            Ok(Expression::add(resolved))
        }
        Expression::Mul(factors) => {
            let resolved = factors
                .iter()
                .map(|f| resolve_inner(f, session, exclude, visited))
                .collect::<CasResult<Vec<_>>>()?;
            Ok(Expression::mul(resolved))
        }
        Expression::Pow(base, exp) => {
            let base = resolve_inner(base, session, exclude, visited)?;
            let exp = resolve_inner(exp, session, exclude, visited)?;
            Ok(Expression::pow(base, exp))
        }
        Expression::Function { name, args } => resolve_function(name, args, session, exclude, visited),
        Expression::Matrix(rows) => {
            let resolved = rows
                .iter()
                .map(|row| row.iter().map(|c| resolve_inner(c, session, exclude, visited)).collect::<CasResult<Vec<_>>>())
                .collect::<CasResult<Vec<_>>>()?;
            Ok(Expression::matrix(resolved))
        }
        Expression::Equation { lhs, rhs } => {
            let lhs = resolve_inner(lhs, session, exclude, visited)?;
            let rhs = resolve_inner(rhs, session, exclude, visited)?;
            Ok(Expression::equation(lhs, rhs))
        }
        Expression::Derivative { expr, var, order } => {
            let mut inner_exclude = exclude.clone();
            inner_exclude.insert(var.name().to_string());
            let resolved = resolve_inner(expr, session, &inner_exclude, visited)?;
            Ok(Expression::derivative(resolved, var.clone(), *order))
        }
        Expression::Integral { integrand, var, bounds } => {
            let mut inner_exclude = exclude.clone();
            inner_exclude.insert(var.name().to_string());
            let resolved = resolve_inner(integrand, session, &inner_exclude, visited)?;
            let bounds = match bounds {
                None => None,
                Some((a, b)) => {
                    let a = resolve_inner(a, session, exclude, visited)?;
                    let b = resolve_inner(b, session, exclude, visited)?;
                    Some((Box::new(a), Box::new(b)))
                }
            };
            Ok(Expression::Integral { integrand: Box::new(resolved), var: var.clone(), bounds })
        }
        Expression::Limit { expr, var, point } => {
            let mut inner_exclude = exclude.clone();
            inner_exclude.insert(var.name().to_string());
            let resolved = resolve_inner(expr, session, &inner_exclude, visited)?;
            let point = resolve_inner(point, session, exclude, visited)?;
            Ok(Expression::limit(resolved, var.clone(), point))
        }
        Expression::Series { expr, var, point, order } => {
            let mut inner_exclude = exclude.clone();
            inner_exclude.insert(var.name().to_string());
            let resolved = resolve_inner(expr, session, &inner_exclude, visited)?;
            let point = resolve_inner(point, session, exclude, visited)?;
            Ok(Expression::series(resolved, var.clone(), point, *order))
        }
    }
}

fn resolve_symbol(
    name: &str,
    session: &Session,
    exclude: &BTreeSet<String>,
    visited: &BTreeSet<String>,
) -> CasResult<Expression> {
    if exclude.contains(name) {
        return Ok(Expression::symbol(session.symbols.intern(name)));
    }
    let Some(binding) = session.lookup_var(name) else {
        return Ok(Expression::symbol(session.symbols.intern(name)));
    };
    if visited.contains(name) {
        log::warn!("resolver: circular dependency involving '{name}'");
        return Err(CasError::CircularDependency(name.to_string()));
    }
    let mut next_visited = visited.clone();
    next_visited.insert(name.to_string());
    resolve_inner(&binding.body, session, exclude, &next_visited)
}

fn resolve_function(
    name: &str,
    args: &[Expression],
    session: &Session,
    exclude: &BTreeSet<String>,
    visited: &BTreeSet<String>,
) -> CasResult<Expression> {
    let resolved_args = args
        .iter()
        .map(|a| resolve_inner(a, session, exclude, visited))
        .collect::<CasResult<Vec<_>>>()?;

    let Some(binding) = session.lookup_fn(name) else {
        return Ok(Expression::function(name, resolved_args));
    };

    if binding.params.len() != resolved_args.len() {
        return Err(CasError::ArityMismatch {
            name: name.to_string(),
            expected: binding.params.len().to_string(),
            got: resolved_args.len(),
        });
    }

    if visited.contains(name) {
        log::warn!("resolver: circular dependency involving '{name}'");
        return Err(CasError::CircularDependency(name.to_string()));
    }

    let mapping: HashMap<String, Expression> = binding
        .params
        .iter()
        .map(|p| p.name().to_string())
        .zip(resolved_args)
        .collect();
    let substituted = substitute_symbols(&binding.body, &mapping);

    let mut next_visited = visited.clone();
    next_visited.insert(name.to_string());
    resolve_inner(&substituted, session, exclude, &next_visited)
}

/// Replace every free `Symbol` whose name is a key of `mapping` with the
/// corresponding expression. Used to substitute actuals for formals when
/// expanding a user function call.
fn substitute_symbols(expr: &Expression, mapping: &HashMap<String, Expression>) -> Expression {
    match expr {
        Expression::Symbol(s) => mapping.get(s.name()).cloned().unwrap_or_else(|| expr.clone()),
        Expression::Number(_) | Expression::Constant(_) => expr.clone(),
        Expression::Add(terms) => Expression::add(terms.iter().map(|t| substitute_symbols(t, mapping)).collect()),
        Expression::Mul(factors) => Expression::mul(factors.iter().map(|f| substitute_symbols(f, mapping)).collect()),
        Expression::Pow(b, e) => Expression::pow(substitute_symbols(b, mapping), substitute_symbols(e, mapping)),
        Expression::Function { name, args } => {
            Expression::function(name.clone(), args.iter().map(|a| substitute_symbols(a, mapping)).collect())
        }
        Expression::Matrix(rows) => Expression::matrix(
            rows.iter().map(|row| row.iter().map(|c| substitute_symbols(c, mapping)).collect()).collect(),
        ),
        Expression::Equation { lhs, rhs } => {
            Expression::equation(substitute_symbols(lhs, mapping), substitute_symbols(rhs, mapping))
        }
        Expression::Derivative { expr, var, order } => {
            Expression::derivative(substitute_symbols(expr, mapping), var.clone(), *order)
        }
        Expression::Integral { integrand, var, bounds } => Expression::Integral {
            integrand: Box::new(substitute_symbols(integrand, mapping)),
            var: var.clone(),
            bounds: bounds
                .as_ref()
                .map(|(a, b)| (Box::new(substitute_symbols(a, mapping)), Box::new(substitute_symbols(b, mapping)))),
        },
        Expression::Limit { expr, var, point } => {
            Expression::limit(substitute_symbols(expr, mapping), var.clone(), substitute_symbols(point, mapping))
        }
        Expression::Series { expr, var, point, order } => Expression::series(
            substitute_symbols(expr, mapping),
            var.clone(),
            substitute_symbols(point, mapping),
            *order,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Symbol;

    #[test]
    fn substitutes_a_bound_variable() {
        let mut session = Session::new();
        session.bind_var("x", Expression::integer(5), BTreeSet::new());
        let expr = Expression::symbol(Symbol::new("x"));
        assert_eq!(resolve(&expr, &session, &BTreeSet::new()).unwrap(), Expression::integer(5));
    }

    #[test]
    fn excluded_variable_is_left_alone() {
        let mut session = Session::new();
        session.bind_var("x", Expression::integer(5), BTreeSet::new());
        let expr = Expression::symbol(Symbol::new("x"));
        let mut exclude = BTreeSet::new();
        exclude.insert("x".to_string());
        assert_eq!(resolve(&expr, &session, &exclude).unwrap(), Expression::symbol(Symbol::new("x")));
    }

    #[test]
    fn chained_variables_resolve_transitively() {
        let mut session = Session::new();
        session.bind_var("a", Expression::integer(1), BTreeSet::new());
        session.bind_var("b", Expression::add(vec![Expression::symbol(Symbol::new("a")), Expression::integer(1)]), BTreeSet::new());
        let expr = Expression::symbol(Symbol::new("b"));
        assert_eq!(resolve(&expr, &session, &BTreeSet::new()).unwrap(), Expression::integer(2));
    }

    #[test]
    fn direct_cycle_is_detected() {
        let mut session = Session::new();
        session.bind_var("p", Expression::add(vec![Expression::symbol(Symbol::new("q")), Expression::integer(1)]), BTreeSet::new());
        session.bind_var("q", Expression::add(vec![Expression::symbol(Symbol::new("p")), Expression::integer(1)]), BTreeSet::new());
        let expr = Expression::symbol(Symbol::new("p"));
        let err = resolve(&expr, &session, &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, CasError::CircularDependency(name) if name == "p" || name == "q"));
    }

    #[test]
    fn sibling_branches_do_not_poison_each_other() {
        let mut session = Session::new();
        session.bind_var("a", Expression::integer(1), BTreeSet::new());
        let expr = Expression::add(vec![Expression::symbol(Symbol::new("a")), Expression::symbol(Symbol::new("a"))]);
        assert_eq!(resolve(&expr, &session, &BTreeSet::new()).unwrap(), Expression::integer(2));
    }

    #[test]
    fn function_call_expands_with_substitution() {
        let mut session = Session::new();
        let x = Symbol::new("x");
        session.bind_fn(
            "f",
            vec![x.clone()],
            Expression::add(vec![Expression::pow(Expression::symbol(x), Expression::integer(2)), Expression::integer(1)]),
            BTreeSet::new(),
        );
        let call = Expression::function("f", vec![Expression::integer(3)]);
        assert_eq!(resolve(&call, &session, &BTreeSet::new()).unwrap(), Expression::integer(10));
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let mut session = Session::new();
        session.bind_fn("f", vec![Symbol::new("x")], Expression::symbol(Symbol::new("x")), BTreeSet::new());
        let call = Expression::function("f", vec![Expression::integer(1), Expression::integer(2)]);
        let err = resolve(&call, &session, &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, CasError::ArityMismatch { .. }));
    }
}
