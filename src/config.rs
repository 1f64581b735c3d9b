//! Engine-wide tunables.
//!
//! The distilled algebraic spec leaves several knobs as bare literals
//! (`N(expr, prec=15)`, `series(expr, var, 0, 6)`, …). Collecting them here
//! keeps the engine modules free of magic numbers and gives an embedding
//! host one place to override defaults.

/// Tunable defaults for a [`crate::Workspace`].
#[derive(Debug, Clone, PartialEq)]
pub struct CasConfig {
    /// Default significant digits for `N(expr)` when no precision is given.
    pub default_precision: u32,
    /// Default Taylor series truncation order for `series(expr, var)`.
    pub default_series_order: u32,
    /// Default Taylor series expansion point for `series(expr, var)`.
    pub default_series_point: i64,
    /// Upper bound on resolver recursion depth, guarding against
    /// pathological (but acyclic) dependency chains.
    pub max_resolution_depth: usize,
    /// Largest square matrix for which `eigenvals`/`eigenvects` attempt an
    /// exact characteristic-polynomial root search (see the Non-goal on
    /// BLAS-scale numeric linear algebra).
    pub max_exact_eigen_dim: usize,
}

impl Default for CasConfig {
    fn default() -> Self {
        Self {
            default_precision: 15,
            default_series_order: 6,
            default_series_point: 0,
            max_resolution_depth: 256,
            max_exact_eigen_dim: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_literals() {
        let cfg = CasConfig::default();
        assert_eq!(cfg.default_precision, 15);
        assert_eq!(cfg.default_series_order, 6);
        assert_eq!(cfg.default_series_point, 0);
    }
}
