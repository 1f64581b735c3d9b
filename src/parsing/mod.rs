//! Parsing: the LaTeX-aware parser and its algebraic-surface fallback
//! (§4.3), plus the matrix environment parser (§4.4).
//!
//! Both parsers bottom out in the same [`algebraic`] expression grammar —
//! the LaTeX parser's job is purely to rewrite LaTeX-only notation
//! (`\frac`, `\sqrt`, braced superscripts) into the algebraic surface form
//! first.

pub mod algebraic;
pub mod latex;
pub mod matrix;

use crate::core::SymbolCache;
use std::collections::HashSet;

/// Function names the parser resolves as applied functions rather than
/// treating as unknown symbols (§4.3, "Known function names … are not
/// added; the engine resolves them as applied functions").
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh", "tanh",
    "log", "ln", "exp", "sqrt", "abs", "det",
];

/// Multi-character Greek letter names that bind to themselves as symbols
/// (§4.3, "Multi-character names in the reserved set of Greek letters bind
/// to themselves as symbols").
pub const GREEK_LETTERS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omicron", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi",
    "omega",
];

/// Names substituted for `Constant` nodes rather than kept as symbols
/// (§3, "Known constants never appear as raw symbols in parsed output").
pub const CONSTANT_NAMES: &[&str] = &["pi", "e", "i", "inf", "infty", "oo"];

/// The per-parse name table described in §4.3: which multi-character names
/// the tokenizer should treat as atomic symbols/function heads rather than
/// splitting into single-letter products.
pub struct ParseContext<'a> {
    pub symbols: &'a SymbolCache,
    pub var_names: HashSet<String>,
    pub fn_names: HashSet<String>,
}

impl<'a> ParseContext<'a> {
    pub fn new(symbols: &'a SymbolCache) -> Self {
        Self { symbols, var_names: HashSet::new(), fn_names: HashSet::new() }
    }

    pub fn with_names(symbols: &'a SymbolCache, var_names: HashSet<String>, fn_names: HashSet<String>) -> Self {
        Self { symbols, var_names, fn_names }
    }

    fn is_known_multichar(&self, name: &str) -> bool {
        self.var_names.contains(name)
            || self.fn_names.contains(name)
            || GREEK_LETTERS.contains(&name)
            || CONSTANT_NAMES.contains(&name)
    }

    fn is_function_head(&self, name: &str) -> bool {
        BUILTIN_FUNCTIONS.contains(&name) || self.fn_names.contains(name)
    }
}
