//! Matrix environment parsing (§4.4).

use super::latex;
use super::ParseContext;
use crate::core::Expression;
use crate::error::{CasError, CasResult};

/// `\begin{...}` environment names recognized as matrix literals (§4.2
/// step 3).
pub const MATRIX_ENVIRONMENTS: &[&str] =
    &["pmatrix", "bmatrix", "vmatrix", "Vmatrix", "Bmatrix", "smallmatrix", "matrix"];

/// Does `s` (already preprocessed, whitespace-trimmed) open a recognized
/// matrix environment?
pub fn starts_with_matrix_env(s: &str) -> bool {
    MATRIX_ENVIRONMENTS.iter().any(|env| s.starts_with(&format!(r"\begin{{{env}}}")))
}

/// Parse a `\begin{env}...\end{env}` matrix literal into an
/// `Expression::Matrix`.
pub fn parse_matrix(input: &str, ctx: &ParseContext) -> CasResult<Expression> {
    let env = MATRIX_ENVIRONMENTS
        .iter()
        .find(|env| input.starts_with(&format!(r"\begin{{{env}}}")))
        .ok_or_else(|| CasError::ParseError(input.to_string()))?;

    let begin = format!(r"\begin{{{env}}}");
    let end = format!(r"\end{{{env}}}");
    let body_start = begin.len();
    let body_end = input
        .find(&end)
        .ok_or_else(|| CasError::ParseError(format!("unterminated {begin}")))?;
    let body = &input[body_start..body_end];

    let raw_rows: Vec<&str> = body.split(r"\\").map(str::trim).filter(|r| !r.is_empty()).collect();
    if raw_rows.is_empty() {
        return Err(CasError::ParseError("empty matrix".to_string()));
    }

    let mut rows = Vec::with_capacity(raw_rows.len());
    let mut expected_width = None;
    for (row_idx, raw_row) in raw_rows.iter().enumerate() {
        let mut cells = Vec::new();
        for raw_cell in raw_row.split('&') {
            let trimmed = raw_cell.trim();
            let cell = if trimmed.is_empty() {
                Expression::zero()
            } else {
                latex::parse(trimmed, ctx)?
            };
            cells.push(cell);
        }
        match expected_width {
            None => expected_width = Some(cells.len()),
            Some(w) if w != cells.len() => {
                return Err(CasError::JaggedMatrix { row: row_idx, expected: w, got: cells.len() });
            }
            Some(_) => {}
        }
        rows.push(cells);
    }

    log::trace!("parse_matrix: {} rows x {} cols", rows.len(), expected_width.unwrap_or(0));
    Ok(Expression::matrix(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SymbolCache;

    fn ctx(cache: &SymbolCache) -> ParseContext<'_> {
        ParseContext::new(cache)
    }

    #[test]
    fn recognizes_pmatrix() {
        assert!(starts_with_matrix_env(r"\begin{pmatrix}1&2\\3&4\end{pmatrix}"));
        assert!(!starts_with_matrix_env(r"1+2"));
    }

    #[test]
    fn parses_two_by_two() {
        let cache = SymbolCache::new();
        let expr = parse_matrix(r"\begin{pmatrix}1&2\\3&4\end{pmatrix}", &ctx(&cache)).unwrap();
        let expected = Expression::matrix(vec![
            vec![Expression::integer(1), Expression::integer(2)],
            vec![Expression::integer(3), Expression::integer(4)],
        ]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn empty_cells_become_zero() {
        let cache = SymbolCache::new();
        let expr = parse_matrix(r"\begin{pmatrix}1&\\&1\end{pmatrix}", &ctx(&cache)).unwrap();
        let expected = Expression::matrix(vec![
            vec![Expression::integer(1), Expression::zero()],
            vec![Expression::zero(), Expression::integer(1)],
        ]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn jagged_rows_are_rejected() {
        let cache = SymbolCache::new();
        let err = parse_matrix(r"\begin{pmatrix}1&2\\3\end{pmatrix}", &ctx(&cache)).unwrap_err();
        assert!(matches!(err, CasError::JaggedMatrix { .. }));
    }
}
