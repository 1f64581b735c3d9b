//! The renderer (§4.9): formats an expression as LaTeX and as unicode
//! pretty-print, and packages evaluation results.

use crate::config::CasConfig;
use crate::core::{Expression, MathConstant, Number};
use serde::Serialize;

/// The classification tag attached to every successful evaluation (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Value,
    Assignment,
    FunctionDef,
    Command,
    Equation,
    Empty,
}

/// The result of one successful evaluation (§6, §4.9).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalRecord {
    pub ok: bool,
    pub latex: String,
    pub plain: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_latex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_plain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_matrix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivots: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvalRecord {
    pub fn empty() -> Self {
        Self {
            ok: true,
            latex: String::new(),
            plain: String::new(),
            kind: RecordKind::Empty,
            numeric_latex: None,
            numeric_plain: None,
            is_matrix: None,
            rows: None,
            cols: None,
            name: None,
            params: None,
            pivots: None,
            error: None,
        }
    }

    /// `{ ok: false, error: <str> }` (§7): the shape a failed evaluation
    /// serializes to at the API boundary.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            latex: String::new(),
            plain: String::new(),
            kind: RecordKind::Empty,
            numeric_latex: None,
            numeric_plain: None,
            is_matrix: None,
            rows: None,
            cols: None,
            name: None,
            params: None,
            pivots: None,
            error: Some(message.into()),
        }
    }

    /// Build the record for a plain value, attaching the numeric pair only
    /// when it differs from the symbolic rendering and the value is not
    /// already an integer (§4.9, §10.5's note on `_make_result`).
    pub fn value(expr: &Expression, kind: RecordKind, config: &CasConfig) -> Self {
        let latex = to_latex(expr);
        let plain = to_plain(expr);
        let mut record = Self {
            ok: true,
            latex,
            plain,
            kind,
            numeric_latex: None,
            numeric_plain: None,
            is_matrix: None,
            rows: None,
            cols: None,
            name: None,
            params: None,
            pivots: None,
            error: None,
        };

        if let Expression::Matrix(rows) = expr {
            record.is_matrix = Some(true);
            record.rows = Some(rows.len());
            record.cols = Some(rows.first().map(Vec::len).unwrap_or(0));
        } else if !matches!(expr, Expression::Number(Number::Integer(_))) {
            if let Some(numeric) = numeric_approximation(expr, config.default_precision) {
                if numeric != record.plain {
                    record.numeric_plain = Some(numeric.clone());
                    record.numeric_latex = Some(numeric);
                }
            }
        }
        record
    }

    /// Build a record from already-rendered LaTeX/plain text, for results
    /// that aren't a single `Expression` — a solution list, an eigenvalue
    /// table, a basis of vectors.
    pub fn raw(latex: impl Into<String>, plain: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            ok: true,
            latex: latex.into(),
            plain: plain.into(),
            kind,
            numeric_latex: None,
            numeric_plain: None,
            is_matrix: None,
            rows: None,
            cols: None,
            name: None,
            params: None,
            pivots: None,
            error: None,
        }
    }

    /// Render a list of expressions as a brace-delimited set, the shape
    /// `solve`/`eigenvals`-style commands return (§4.7: "numeric form is
    /// suppressed in the result record" for these).
    pub fn list(exprs: &[Expression], kind: RecordKind) -> Self {
        let plain = format!("{{{}}}", exprs.iter().map(to_plain).collect::<Vec<_>>().join(", "));
        let latex = format!("\\{{{}\\}}", exprs.iter().map(to_latex).collect::<Vec<_>>().join(", "));
        Self::raw(latex, plain, kind)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_params(mut self, params: Vec<String>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_pivots(mut self, pivots: Vec<usize>) -> Self {
        let note = format!("Pivot columns: {pivots:?}");
        self.plain = format!("{}\n{note}", self.plain);
        self.pivots = Some(pivots);
        self
    }
}

/// Best-effort decimal approximation of `expr` at `precision` significant
/// digits, or `None` if it has no numeric value (free symbols, etc).
fn numeric_approximation(expr: &Expression, precision: u32) -> Option<String> {
    let value = evaluate_numeric(expr)?;
    Some(Number::float(value, precision).to_decimal_string(precision))
}

fn evaluate_numeric(expr: &Expression) -> Option<f64> {
    match expr {
        Expression::Number(n) => n.to_f64(),
        Expression::Constant(c) => Some(c.approx()),
        Expression::Add(terms) => terms.iter().try_fold(0.0, |acc, t| Some(acc + evaluate_numeric(t)?)),
        Expression::Mul(factors) => factors.iter().try_fold(1.0, |acc, f| Some(acc * evaluate_numeric(f)?)),
        Expression::Pow(base, exp) => Some(evaluate_numeric(base)?.powf(evaluate_numeric(exp)?)),
        Expression::Function { name, args } if args.len() == 1 => {
            let x = evaluate_numeric(&args[0])?;
            match name.as_str() {
                "sin" => Some(x.sin()),
                "cos" => Some(x.cos()),
                "tan" => Some(x.tan()),
                "exp" => Some(x.exp()),
                "log" | "ln" => Some(x.ln()),
                "sqrt" => Some(x.sqrt()),
                "abs" => Some(x.abs()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// `N(expr, prec)` (§4.7): force a numeric approximation regardless of
/// whether it differs from the symbolic form.
pub fn numeric_value(expr: &Expression, precision: u32) -> Option<Expression> {
    evaluate_numeric(expr).map(|v| Expression::float(v, precision))
}

pub fn to_plain(expr: &Expression) -> String {
    render_plain(expr, 0)
}

pub fn to_latex(expr: &Expression) -> String {
    render_latex(expr, 0)
}

fn render_plain(expr: &Expression, parent_prec: u8) -> String {
    match expr {
        Expression::Number(n) => n.to_string(),
        Expression::Constant(c) => constant_plain(*c).to_string(),
        Expression::Symbol(s) => s.name().to_string(),
        Expression::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    out.push_str(" + ");
                }
                out.push_str(&render_plain(term, 1));
            }
            paren_if(out, 1, parent_prec)
        }
        Expression::Mul(factors) => {
            let parts: Vec<String> = factors.iter().map(|f| render_plain(f, 2)).collect();
            paren_if(parts.join("*"), 2, parent_prec)
        }
        Expression::Pow(base, exp) => {
            let s = format!("{}^{}", render_plain(base, 4), render_plain(exp, 3));
            paren_if(s, 3, parent_prec)
        }
        Expression::Function { name, args } if name == "lim" && args.len() == 1 => {
            format!("lim {}", render_plain(&args[0], 0))
        }
        Expression::Function { name, args } => {
            let parts: Vec<String> = args.iter().map(|a| render_plain(a, 0)).collect();
            format!("{name}({})", parts.join(", "))
        }
        Expression::Matrix(rows) => render_matrix_plain(rows),
        Expression::Equation { lhs, rhs } => format!("{} = {}", render_plain(lhs, 0), render_plain(rhs, 0)),
        Expression::Derivative { expr, var, order } => {
            format!("d^{order}/d{}^{order} [{}]", var.name(), render_plain(expr, 0))
        }
        Expression::Integral { integrand, var, bounds } => match bounds {
            None => format!("∫ {} d{}", render_plain(integrand, 0), var.name()),
            Some((a, b)) => format!(
                "∫[{}, {}] {} d{}",
                render_plain(a, 0),
                render_plain(b, 0),
                render_plain(integrand, 0),
                var.name()
            ),
        },
        Expression::Limit { expr, var, point } => {
            format!("lim({} -> {}) {}", var.name(), render_plain(point, 0), render_plain(expr, 0))
        }
        Expression::Series { expr, var, point, order } => {
            format!("series({}, {}, {}, {order})", render_plain(expr, 0), var.name(), render_plain(point, 0))
        }
    }
}

fn render_matrix_plain(rows: &[Vec<Expression>]) -> String {
    let row_strs: Vec<String> =
        rows.iter().map(|row| row.iter().map(|c| render_plain(c, 0)).collect::<Vec<_>>().join(", ")).collect();
    format!("[{}]", row_strs.join("; "))
}

fn render_latex(expr: &Expression, parent_prec: u8) -> String {
    match expr {
        Expression::Number(n) => match n {
            Number::Rational(r) => format!("\\frac{{{}}}{{{}}}", r.numer(), r.denom()),
            _ => n.to_string(),
        },
        Expression::Constant(c) => constant_latex(*c).to_string(),
        Expression::Symbol(s) => s.name().to_string(),
        Expression::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    out.push('+');
                }
                out.push_str(&render_latex(term, 1));
            }
            paren_if(out, 1, parent_prec)
        }
        Expression::Mul(factors) => {
            let parts: Vec<String> = factors.iter().map(|f| render_latex(f, 2)).collect();
            paren_if(parts.join(" \\cdot "), 2, parent_prec)
        }
        Expression::Pow(base, exp) => {
            let s = format!("{{{}}}^{{{}}}", render_latex(base, 4), render_latex(exp, 0));
            paren_if(s, 3, parent_prec)
        }
        Expression::Function { name, args } if name == "lim" && args.len() == 1 => {
            format!("\\lim {}", render_latex(&args[0], 0))
        }
        Expression::Function { name, args } => {
            let parts: Vec<String> = args.iter().map(|a| render_latex(a, 0)).collect();
            format!("\\{name}({})", parts.join(", "))
        }
        Expression::Matrix(rows) => render_matrix_latex(rows),
        Expression::Equation { lhs, rhs } => format!("{} = {}", render_latex(lhs, 0), render_latex(rhs, 0)),
        Expression::Derivative { expr, var, order } => {
            format!("\\frac{{d^{order}}}{{d{}^{order}}} {}", var.name(), render_latex(expr, 0))
        }
        Expression::Integral { integrand, var, bounds } => match bounds {
            None => format!("\\int {} \\, d{}", render_latex(integrand, 0), var.name()),
            Some((a, b)) => {
                format!("\\int_{{{}}}^{{{}}} {} \\, d{}", render_latex(a, 0), render_latex(b, 0), render_latex(integrand, 0), var.name())
            }
        },
        Expression::Limit { expr, var, point } => {
            format!("\\lim_{{{} \\to {}}} {}", var.name(), render_latex(point, 0), render_latex(expr, 0))
        }
        Expression::Series { expr, .. } => render_latex(expr, parent_prec),
    }
}

fn render_matrix_latex(rows: &[Vec<Expression>]) -> String {
    let row_strs: Vec<String> =
        rows.iter().map(|row| row.iter().map(|c| render_latex(c, 0)).collect::<Vec<_>>().join(" & ")).collect();
    format!("\\begin{{pmatrix}}{}\\end{{pmatrix}}", row_strs.join(" \\\\ "))
}

fn constant_plain(c: MathConstant) -> &'static str {
    match c {
        MathConstant::Pi => "π",
        MathConstant::E => "e",
        MathConstant::I => "i",
        MathConstant::Infinity => "∞",
    }
}

fn constant_latex(c: MathConstant) -> &'static str {
    match c {
        MathConstant::Pi => "\\pi",
        MathConstant::E => "e",
        MathConstant::I => "i",
        MathConstant::Infinity => "\\infty",
    }
}

fn paren_if(s: String, own_prec: u8, parent_prec: u8) -> String {
    if own_prec < parent_prec {
        format!("({s})")
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_sum() {
        let x = Expression::symbol("x");
        let expr = Expression::add(vec![x, Expression::integer(1)]);
        assert_eq!(to_plain(&expr), "1 + x");
    }

    #[test]
    fn integer_results_never_carry_numeric_fields() {
        let config = CasConfig::default();
        let record = EvalRecord::value(&Expression::integer(5), RecordKind::Value, &config);
        assert!(record.numeric_plain.is_none());
    }

    #[test]
    fn non_integer_numeric_result_carries_numeric_pair_when_it_differs() {
        let config = CasConfig::default();
        let third = Expression::rational(1, 3);
        let record = EvalRecord::value(&third, RecordKind::Value, &config);
        assert!(record.numeric_plain.is_some());
    }

    #[test]
    fn matrix_records_carry_dimensions() {
        let config = CasConfig::default();
        let m = Expression::matrix(vec![vec![Expression::integer(1), Expression::integer(2)]]);
        let record = EvalRecord::value(&m, RecordKind::Value, &config);
        assert_eq!(record.rows, Some(1));
        assert_eq!(record.cols, Some(2));
    }

    #[test]
    fn bare_lim_keeps_literal_prefix() {
        let x = Expression::symbol("x");
        let expr = Expression::function("lim", vec![Expression::add(vec![x, Expression::integer(2)])]);
        assert!(to_latex(&expr).starts_with("\\lim "));
    }
}
