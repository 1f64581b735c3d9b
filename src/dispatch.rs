//! The command dispatcher (§4.2): tries, in fixed priority, a named
//! command, a LaTeX big-operator form, a matrix literal, a function
//! definition, a variable assignment, an equation, and finally a plain
//! expression.

use crate::config::CasConfig;
use crate::core::Expression;
use crate::engine;
use crate::error::{CasError, CasResult};
use crate::linalg;
use crate::parsing::{self, matrix, ParseContext};
use crate::preprocess;
use crate::render::{EvalRecord, RecordKind};
use crate::resolver;
use crate::session::Session;
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

const NAMED_COMMANDS: &[&str] = &[
    "solve", "factor", "expand", "simplify", "diff", "integrate", "limit", "series", "n", "subs",
    "det", "inv", "trace", "transpose", "eigenvals", "eigenvects", "rank", "rref", "charpoly",
    "nullspace", "colspace",
];

const RESERVED_NAMES: &[&str] = &["e", "i", "pi", "E", "I"];

static NAMED_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)^\\?([A-Za-z]+)\s*\((.*)\)$").unwrap());
static FN_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\s*\(([^()]*)\)\s*=\s*(.+)$").unwrap());
static VAR_ASSIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+)$").unwrap());
static INT_BOUNDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\\int\s*_\{(.+?)\}\^\{(.+?)\}\s*(.+)$").unwrap());
static SUM_BOUNDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\\sum\s*_\{(.+?)\}\^\{(.+?)\}\s*(.+)$").unwrap());
static PROD_BOUNDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\\prod\s*_\{(.+?)\}\^\{(.+?)\}\s*(.+)$").unwrap());
static LIM_BOUNDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\\lim\s*_\{(.+?)(?:\\to|\\rightarrow|→)(.+?)\}\s*(.+)$").unwrap());
static LIM_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\\lim\s+(.+)$").unwrap());
static TRAILING_DVAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*\S)\s*d([A-Za-z][A-Za-z0-9_]*)$").unwrap());

/// Evaluate one raw LaTeX (or plain) input against `session`, per the
/// priority chain in §4.2.
pub fn dispatch(raw: &str, session: &mut Session, config: &CasConfig) -> CasResult<EvalRecord> {
    let pre = preprocess::preprocess(raw);
    if pre.is_empty() {
        log::trace!("dispatch: empty input");
        return Ok(EvalRecord::empty());
    }

    if let Some(result) = try_named_command(&pre, session, config) {
        log::debug!("dispatch: routed '{raw}' to a named command");
        return result;
    }
    if let Some(result) = try_big_operator(&pre, session, config) {
        log::debug!("dispatch: routed '{raw}' to a big-operator form");
        return result;
    }
    if matrix::starts_with_matrix_env(&pre) {
        log::debug!("dispatch: routed '{raw}' to a matrix literal");
        let ctx = make_ctx(session);
        let expr = matrix::parse_matrix(&pre, &ctx)?;
        let resolved = resolver::resolve(&expr, session, &BTreeSet::new())?;
        return Ok(EvalRecord::value(&resolved.simplify(), RecordKind::Value, config));
    }
    if let Some(caps) = FN_DEF.captures(&pre) {
        log::debug!("dispatch: routed '{raw}' to a function definition");
        return handle_function_def(&caps, session, config);
    }
    if let Some(caps) = VAR_ASSIGN.captures(&pre) {
        let name = caps[1].to_string();
        if !RESERVED_NAMES.contains(&name.as_str()) {
            log::debug!("dispatch: routed '{raw}' to a variable assignment");
            return handle_variable_assignment(&name, &caps[2], session, config);
        }
    }
    if find_top_level(&pre, '=').is_some() {
        if let Some(result) = try_equation(&pre, session, config) {
            log::debug!("dispatch: routed '{raw}' to an equation form");
            return result;
        }
    }

    log::debug!("dispatch: routed '{raw}' to plain evaluation");
    evaluate_plain(&pre, session, config)
}

fn make_ctx(session: &Session) -> ParseContext<'_> {
    ParseContext::with_names(&session.symbols, session.var_names(), session.fn_names())
}

/// Parse `raw` (a matrix literal or an algebraic/LaTeX expression) without
/// resolving it against the session.
fn parse_unresolved(raw: &str, session: &Session) -> CasResult<Expression> {
    let pre = preprocess::preprocess(raw);
    let ctx = make_ctx(session);
    if matrix::starts_with_matrix_env(&pre) {
        matrix::parse_matrix(&pre, &ctx)
    } else {
        parsing::latex::parse(&pre, &ctx)
    }
}

fn parse_and_resolve(raw: &str, session: &Session, exclude: &BTreeSet<String>) -> CasResult<Expression> {
    let expr = parse_unresolved(raw, session)?;
    resolver::resolve(&expr, session, exclude)
}

/// Parse `raw` as a bare variable name (used for the `var` argument of
/// calculus/solve commands — never resolved against the session).
fn parse_var_name(raw: &str, session: &Session) -> CasResult<String> {
    let expr = parse_unresolved(raw, session)?;
    expr.as_symbol()
        .map(|s| s.name().to_string())
        .ok_or_else(|| CasError::Engine(format!("'{}' is not a valid variable name", raw.trim())))
}

fn infer_single_var(expr: &Expression) -> CasResult<String> {
    let free = expr.free_symbol_names();
    match free.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err(CasError::Engine("expression has no free variable to use".to_string())),
        _ => Err(CasError::Engine("expression has more than one free variable; specify which one".to_string())),
    }
}

use crate::engine::Simplify;

fn evaluate_plain(pre: &str, session: &mut Session, config: &CasConfig) -> CasResult<EvalRecord> {
    let ctx = make_ctx(session);
    let expr = if matrix::starts_with_matrix_env(pre) {
        matrix::parse_matrix(pre, &ctx)?
    } else {
        parsing::latex::parse(pre, &ctx)?
    };
    let resolved = resolver::resolve(&expr, session, &BTreeSet::new())?;
    Ok(EvalRecord::value(&resolved.simplify(), RecordKind::Value, config))
}

/// Scan for the first top-level occurrence of `target`, skipping over
/// content nested inside balanced `()`, `{}`, `[]`.
fn find_top_level(s: &str, target: char) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            _ if c == target && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split `s` on top-level commas, ignoring commas nested inside balanced
/// delimiters (§4.2, named-command argument splitting).
fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

fn parse_order(s: &str) -> CasResult<u32> {
    s.trim()
        .parse::<u32>()
        .map_err(|_| CasError::Engine(format!("'{}' is not a valid order", s.trim())))
}

fn try_named_command(pre: &str, session: &mut Session, config: &CasConfig) -> Option<CasResult<EvalRecord>> {
    let caps = NAMED_CALL.captures(pre)?;
    let name = caps[1].to_lowercase();
    if !NAMED_COMMANDS.contains(&name.as_str()) {
        return None;
    }
    let args = split_top_level_commas(&caps[2]);
    Some(run_named_command(&name, &args, session, config))
}

fn run_named_command(name: &str, args: &[String], session: &mut Session, config: &CasConfig) -> CasResult<EvalRecord> {
    log::debug!("command '{name}' with {} argument(s)", args.len());
    match name {
        "simplify" => {
            let expr = parse_and_resolve(arg(args, 0)?, session, &BTreeSet::new())?;
            Ok(EvalRecord::value(&expr.simplify(), RecordKind::Command, config))
        }
        "expand" => {
            let expr = parse_and_resolve(arg(args, 0)?, session, &BTreeSet::new())?;
            Ok(EvalRecord::value(&engine::expand(&expr), RecordKind::Command, config))
        }
        "factor" => {
            let var_name = args.get(1).map(String::as_str).unwrap_or_default();
            let exclude = var_exclude_set(var_name, session)?;
            let expr = parse_and_resolve(arg(args, 0)?, session, &exclude)?;
            let var = optional_var(args, 1, session, &expr)?;
            Ok(EvalRecord::value(&engine::factor(&expr, &var).simplify(), RecordKind::Command, config))
        }
        "solve" => {
            let var_name = args.get(1).map(String::as_str).unwrap_or_default();
            let exclude = var_exclude_set(var_name, session)?;
            let expr = parse_and_resolve(arg(args, 0)?, session, &exclude)?;
            let var = optional_var(args, 1, session, &expr)?;
            let roots = engine::solve(&expr, &var)?;
            Ok(EvalRecord::list(&roots, RecordKind::Command))
        }
        "diff" => {
            let var = parse_var_name(arg(args, 1)?, session)?;
            let order = args.get(2).map(|s| parse_order(s)).transpose()?.unwrap_or(1);
            let mut exclude = BTreeSet::new();
            exclude.insert(var.clone());
            let expr = parse_and_resolve(arg(args, 0)?, session, &exclude)?;
            Ok(EvalRecord::value(&engine::diff(&expr, &var, order), RecordKind::Command, config))
        }
        "integrate" => {
            let var = parse_var_name(arg(args, 1)?, session)?;
            let mut exclude = BTreeSet::new();
            exclude.insert(var.clone());
            let expr = parse_and_resolve(arg(args, 0)?, session, &exclude)?;
            let bounds = match (args.get(2), args.get(3)) {
                (Some(a), Some(b)) => {
                    let a = parse_and_resolve(a, session, &exclude)?;
                    let b = parse_and_resolve(b, session, &exclude)?;
                    Some((a, b))
                }
                _ => None,
            };
            let result = engine::integrate(&expr, &var, bounds.as_ref().map(|(a, b)| (a, b)))?;
            Ok(EvalRecord::value(&result, RecordKind::Command, config))
        }
        "limit" => {
            let var = parse_var_name(arg(args, 1)?, session)?;
            let mut exclude = BTreeSet::new();
            exclude.insert(var.clone());
            let expr = parse_and_resolve(arg(args, 0)?, session, &exclude)?;
            let point = parse_and_resolve(arg(args, 2)?, session, &exclude)?;
            let result = engine::limit(&expr, &var, &point)?;
            Ok(EvalRecord::value(&result, RecordKind::Command, config))
        }
        "series" => {
            let var_name = args.get(1).map(String::as_str).unwrap_or_default();
            let exclude = var_exclude_set(var_name, session)?;
            let expr = parse_and_resolve(arg(args, 0)?, session, &exclude)?;
            let var = optional_var(args, 1, session, &expr)?;
            let point = match args.get(2) {
                Some(p) if !p.is_empty() => parse_and_resolve(p, session, &exclude)?,
                _ => Expression::integer(config.default_series_point),
            };
            let order = args.get(3).map(|s| parse_order(s)).transpose()?.unwrap_or(config.default_series_order);
            let result = engine::series(&expr, &var, &point, order);
            Ok(EvalRecord::value(&result.simplify(), RecordKind::Command, config))
        }
        "n" => {
            let expr = parse_and_resolve(arg(args, 0)?, session, &BTreeSet::new())?;
            let prec = args.get(1).map(|s| parse_order(s)).transpose()?.unwrap_or(config.default_precision);
            let value = crate::render::numeric_value(&expr, prec)
                .ok_or_else(|| CasError::Engine("expression has no numeric value".to_string()))?;
            Ok(EvalRecord::value(&value, RecordKind::Command, config))
        }
        "subs" => {
            let expr = parse_and_resolve(arg(args, 0)?, session, &BTreeSet::new())?;
            let old = parse_var_name(arg(args, 1)?, session)?;
            let new = parse_and_resolve(arg(args, 2)?, session, &BTreeSet::new())?;
            Ok(EvalRecord::value(&engine::subs(&expr, &old, &new), RecordKind::Command, config))
        }
        "det" => matrix_command(args, session, config, linalg::det),
        "inv" => matrix_command(args, session, config, linalg::inv),
        "trace" => matrix_command(args, session, config, linalg::trace),
        "transpose" => matrix_command(args, session, config, linalg::transpose),
        "charpoly" => matrix_command(args, session, config, linalg::charpoly),
        "rank" => matrix_command(args, session, config, linalg::rank),
        "rref" => {
            let m = matrix_arg(args, session)?;
            let (reduced, pivots) = linalg::rref(&m)?;
            Ok(EvalRecord::value(&reduced, RecordKind::Command, config).with_pivots(pivots))
        }
        "nullspace" => {
            let m = matrix_arg(args, session)?;
            Ok(EvalRecord::list(&linalg::nullspace(&m)?, RecordKind::Command))
        }
        "colspace" => {
            let m = matrix_arg(args, session)?;
            Ok(EvalRecord::list(&linalg::colspace(&m)?, RecordKind::Command))
        }
        "eigenvals" => {
            let m = matrix_arg(args, session)?;
            let values = linalg::eigenvals(&m, config.max_exact_eigen_dim)?;
            let exprs: Vec<Expression> = values.into_iter().map(|(v, _)| v).collect();
            Ok(EvalRecord::list(&exprs, RecordKind::Command))
        }
        "eigenvects" => {
            let m = matrix_arg(args, session)?;
            let values = linalg::eigenvects(&m, config.max_exact_eigen_dim)?;
            let exprs: Vec<Expression> = values.into_iter().flat_map(|(_, _, basis)| basis).collect();
            Ok(EvalRecord::list(&exprs, RecordKind::Command))
        }
        _ => Err(CasError::UnknownCommand(name.to_string())),
    }
}

fn arg<'a>(args: &'a [String], index: usize) -> CasResult<&'a str> {
    args.get(index)
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CasError::ArityMismatch { name: "command".to_string(), expected: format!("at least {}", index + 1), got: args.len() })
}

fn var_exclude_set(var_name: &str, session: &Session) -> CasResult<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    if !var_name.is_empty() {
        set.insert(parse_var_name(var_name, session)?);
    }
    Ok(set)
}

/// `var` argument that, when omitted, falls back to the expression's lone
/// free symbol (§4.7, `solve`/`series`'s optional `var`).
fn optional_var(args: &[String], index: usize, session: &Session, expr: &Expression) -> CasResult<String> {
    match args.get(index).map(String::as_str).filter(|s| !s.is_empty()) {
        Some(raw) => parse_var_name(raw, session),
        None => infer_single_var(expr),
    }
}

fn matrix_arg(args: &[String], session: &Session) -> CasResult<Expression> {
    parse_and_resolve(arg(args, 0)?, session, &BTreeSet::new())
}

fn matrix_command(
    args: &[String],
    session: &Session,
    config: &CasConfig,
    f: impl Fn(&Expression) -> CasResult<Expression>,
) -> CasResult<EvalRecord> {
    let m = matrix_arg(args, session)?;
    Ok(EvalRecord::value(&f(&m)?, RecordKind::Command, config))
}

fn try_big_operator(pre: &str, session: &mut Session, config: &CasConfig) -> Option<CasResult<EvalRecord>> {
    if let Some(caps) = INT_BOUNDS.captures(pre) {
        return Some(handle_integral(&caps[1], &caps[2], &caps[3], session, config));
    }
    if let Some(caps) = SUM_BOUNDS.captures(pre) {
        return Some(handle_big_sum_or_prod(&caps[1], &caps[2], &caps[3], session, config, true));
    }
    if let Some(caps) = PROD_BOUNDS.captures(pre) {
        return Some(handle_big_sum_or_prod(&caps[1], &caps[2], &caps[3], session, config, false));
    }
    if let Some(caps) = LIM_BOUNDS.captures(pre) {
        return Some(handle_limit(&caps[1], &caps[2], &caps[3], session, config));
    }
    if let Some(caps) = LIM_BARE.captures(pre) {
        return Some(handle_bare_limit(&caps[1], session, config));
    }
    None
}

fn strip_trailing_dvar<'a>(body: &'a str) -> (&'a str, Option<String>) {
    match TRAILING_DVAR.captures(body) {
        Some(caps) => {
            let stripped = caps.get(1).unwrap().as_str();
            let var = caps.get(2).unwrap().as_str().to_string();
            (stripped, Some(var))
        }
        None => (body, None),
    }
}

fn handle_integral(lo: &str, hi: &str, body: &str, session: &mut Session, config: &CasConfig) -> CasResult<EvalRecord> {
    let (stripped_body, dvar) = strip_trailing_dvar(body.trim());
    let body_expr_probe = parse_unresolved(stripped_body, session)?;
    let var = match dvar {
        Some(v) => v,
        None => {
            let free = body_expr_probe.free_symbol_names();
            if free.iter().any(|n| n == "x") {
                "x".to_string()
            } else if let Some(first) = free.first() {
                first.clone()
            } else {
                "t".to_string()
            }
        }
    };
    let mut exclude = BTreeSet::new();
    exclude.insert(var.clone());
    let body_expr = parse_and_resolve(stripped_body, session, &exclude)?;
    let a = parse_and_resolve(lo, session, &exclude)?;
    let b = parse_and_resolve(hi, session, &exclude)?;
    let result = engine::integrate(&body_expr, &var, Some((&a, &b)))?;
    Ok(EvalRecord::value(&result, RecordKind::Command, config))
}

fn handle_big_sum_or_prod(
    lower: &str,
    upper: &str,
    body: &str,
    session: &mut Session,
    config: &CasConfig,
    is_sum: bool,
) -> CasResult<EvalRecord> {
    let (var, start) = match lower.split_once('=') {
        Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
        None => {
            let probe = parse_unresolved(body.trim(), session)?;
            let var = infer_single_var(&probe)?;
            (var, lower.trim().to_string())
        }
    };
    let mut exclude = BTreeSet::new();
    exclude.insert(var.clone());
    let start_expr = parse_and_resolve(&start, session, &exclude)?;
    let end_expr = parse_and_resolve(upper, session, &exclude)?;
    let start_n = start_expr
        .as_number()
        .and_then(crate::core::Number::to_bigint)
        .and_then(|b| b.to_i64())
        .ok_or_else(|| CasError::Engine("big-operator lower bound must be an integer".to_string()))?;
    let end_n = end_expr
        .as_number()
        .and_then(crate::core::Number::to_bigint)
        .and_then(|b| b.to_i64())
        .ok_or_else(|| CasError::Engine("big-operator upper bound must be an integer".to_string()))?;

    let mut terms = Vec::new();
    let mut k = start_n;
    while k <= end_n {
        let term_expr = parse_and_resolve(body.trim(), session, &exclude)?;
        terms.push(engine::subs(&term_expr, &var, &Expression::integer(k)));
        k += 1;
    }
    let combined = if is_sum { Expression::add(terms) } else { Expression::mul(terms) };
    Ok(EvalRecord::value(&combined.simplify(), RecordKind::Command, config))
}

fn handle_limit(var_raw: &str, point_raw: &str, body: &str, session: &mut Session, config: &CasConfig) -> CasResult<EvalRecord> {
    let var = parse_var_name(var_raw, session)?;
    let mut exclude = BTreeSet::new();
    exclude.insert(var.clone());
    let point = parse_and_resolve(point_raw, session, &exclude)?;
    let expr = parse_and_resolve(body.trim(), session, &exclude)?;
    let result = engine::limit(&expr, &var, &point)?;
    Ok(EvalRecord::value(&result, RecordKind::Command, config))
}

/// Bare `\lim body` (no bound variable given): keep the literal `\lim `
/// prefix and simplify the body only (§4.2, §10.5).
fn handle_bare_limit(body: &str, session: &mut Session, config: &CasConfig) -> CasResult<EvalRecord> {
    let expr = parse_and_resolve(body.trim(), session, &BTreeSet::new())?;
    let simplified = expr.simplify();
    let wrapped = Expression::function("lim", vec![simplified]);
    Ok(EvalRecord::value(&wrapped, RecordKind::Command, config))
}

fn handle_function_def(caps: &regex::Captures, session: &mut Session, config: &CasConfig) -> CasResult<EvalRecord> {
    let name = caps[1].to_string();
    let param_names: Vec<String> = split_top_level_commas(&caps[2]).into_iter().filter(|s| !s.is_empty()).collect();
    let params: Vec<crate::core::Symbol> = param_names.iter().map(|p| session.symbols.intern(p)).collect();
    let body = parse_unresolved(&caps[3], session)?;
    let param_set: BTreeSet<String> = param_names.iter().cloned().collect();
    let deps: BTreeSet<String> =
        body.free_symbol_names().into_iter().filter(|n| !param_set.contains(n)).collect();
    let signature = Expression::function(name.clone(), param_names.iter().map(|p| Expression::symbol(p.as_str())).collect());
    let definition = Expression::equation(signature, body.clone());
    session.bind_fn(&name, params, body, deps);
    let record = EvalRecord::value(&definition, RecordKind::FunctionDef, config);
    Ok(EvalRecord { name: Some(name), params: Some(param_names), ..record })
}

fn handle_variable_assignment(name: &str, body_raw: &str, session: &mut Session, config: &CasConfig) -> CasResult<EvalRecord> {
    let body = parse_unresolved(body_raw, session)?;
    let resolved = resolver::resolve(&body, session, &BTreeSet::new())?.simplify();
    let deps: BTreeSet<String> = body.free_symbol_names().into_iter().collect();
    // Variable bodies are stored exactly as parsed, not resolved, so a
    // later reassignment of a dependency still propagates on next read.
    session.bind_var(name, body, deps);
    let record = EvalRecord::value(&resolved, RecordKind::Assignment, config);
    Ok(EvalRecord { name: Some(name.to_string()), ..record })
}

fn try_equation(pre: &str, session: &mut Session, config: &CasConfig) -> Option<CasResult<EvalRecord>> {
    let eq_pos = find_top_level(pre, '=')?;
    let (lhs_raw, rhs_raw) = (&pre[..eq_pos], &pre[eq_pos + 1..]);
    if lhs_raw.trim().is_empty() || rhs_raw.trim().is_empty() {
        return None;
    }
    let ctx = make_ctx(session);
    let lhs = if matrix::starts_with_matrix_env(lhs_raw) {
        matrix::parse_matrix(lhs_raw, &ctx)
    } else {
        parsing::latex::parse(lhs_raw, &ctx)
    };
    let rhs = if matrix::starts_with_matrix_env(rhs_raw) {
        matrix::parse_matrix(rhs_raw, &ctx)
    } else {
        parsing::latex::parse(rhs_raw, &ctx)
    };
    let (lhs, rhs) = match (lhs, rhs) {
        (Ok(l), Ok(r)) => (l, r),
        _ => return None,
    };
    Some((|| {
        let eq = Expression::equation(lhs, rhs);
        let resolved = resolver::resolve(&eq, session, &BTreeSet::new())?;
        Ok(EvalRecord::value(&resolved.simplify(), RecordKind::Equation, config))
    })())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (Session, CasConfig) {
        (Session::new(), CasConfig::default())
    }

    #[test]
    fn assignment_then_read_is_reactive() {
        let (mut session, config) = fresh();
        let result = dispatch("x = 5", &mut session, &config).unwrap();
        assert_eq!(result.kind, RecordKind::Assignment);
        let result = dispatch("x", &mut session, &config).unwrap();
        assert!(result.plain.contains('5'));
    }

    #[test]
    fn chained_variable_reassignment_propagates() {
        let (mut session, config) = fresh();
        dispatch("a = 1", &mut session, &config).unwrap();
        dispatch("b = a+1", &mut session, &config).unwrap();
        dispatch("c = b+1", &mut session, &config).unwrap();
        dispatch("d = c+1", &mut session, &config).unwrap();
        let result = dispatch("d", &mut session, &config).unwrap();
        assert!(result.plain.contains('4'));
        dispatch("a = 10", &mut session, &config).unwrap();
        let result = dispatch("d", &mut session, &config).unwrap();
        assert!(result.plain.contains("13"));
    }

    #[test]
    fn circular_assignment_is_detected_on_read() {
        let (mut session, config) = fresh();
        dispatch("p = q+1", &mut session, &config).unwrap();
        dispatch("q = p+1", &mut session, &config).unwrap();
        let err = dispatch("p", &mut session, &config).unwrap_err();
        assert!(err.to_string().contains("ircular"));
    }

    #[test]
    fn function_definition_then_call() {
        let (mut session, config) = fresh();
        dispatch("f(x) = x^2+1", &mut session, &config).unwrap();
        let result = dispatch("f(3)", &mut session, &config).unwrap();
        assert!(result.plain.contains("10"));
    }

    #[test]
    fn named_solve_lists_both_roots() {
        let (mut session, config) = fresh();
        let result = dispatch("solve(x^2 - 5*x + 6, x)", &mut session, &config).unwrap();
        assert!(result.plain.contains('2') && result.plain.contains('3'));
    }

    #[test]
    fn named_simplify_folds_pythagorean_identity() {
        let (mut session, config) = fresh();
        let result = dispatch("simplify(sin(x)^2 + cos(x)^2)", &mut session, &config).unwrap();
        assert_eq!(result.plain, "1");
    }

    #[test]
    fn named_limit_of_sinc_at_zero() {
        let (mut session, config) = fresh();
        let result = dispatch("limit(sin(x)/x, x, 0)", &mut session, &config).unwrap();
        assert_eq!(result.plain, "1");
    }

    #[test]
    fn matrix_assignment_then_determinant() {
        let (mut session, config) = fresh();
        dispatch(r"M = \begin{pmatrix}1&2\\3&4\end{pmatrix}", &mut session, &config).unwrap();
        let result = dispatch("det(M)", &mut session, &config).unwrap();
        assert!(result.plain.contains("-2"));
    }

    #[test]
    fn empty_input_is_the_empty_record() {
        let (mut session, config) = fresh();
        let result = dispatch("   ", &mut session, &config).unwrap();
        assert_eq!(result.kind, RecordKind::Empty);
    }

    #[test]
    fn bare_limit_keeps_the_lim_prefix_and_does_not_read_as_product() {
        let (mut session, config) = fresh();
        let result = dispatch(r"\lim x+2", &mut session, &config).unwrap();
        assert!(result.latex.starts_with("\\lim "));
        assert!(!result.plain.contains('·'));
    }

    #[test]
    fn definite_integral_of_5x() {
        let (mut session, config) = fresh();
        let result = dispatch(r"\int_{0}^{5} 5x", &mut session, &config).unwrap();
        assert!(result.plain.contains("125"));
    }
}
