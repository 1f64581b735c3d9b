//! LaTeX preprocessor (§4.1): normalizes editor-emitted LaTeX into a
//! canonical form the parser can rely on.

use once_cell::sync::Lazy;
use regex::Regex;

/// Known function names that get a backslash inserted in front of them when
/// the input is LaTeX-flavored (contains a backslash command already) and
/// the name is immediately followed by `(` or `{`. Bare-plain inputs skip
/// this step entirely since the algebraic parser knows these names anyway.
const BACKSLASH_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh", "tanh",
    "log", "ln", "exp", "sqrt", "det", "lim",
];

static LEFT_RIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\left|\\right").unwrap());
static CDOT_TIMES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\cdot|\\times").unwrap());
static DIV: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\div").unwrap());
static PM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\pm").unwrap());
static OPERATORNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\operatorname\{([A-Za-z]+)\}").unwrap());
static LN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\ln\b").unwrap());
static SUPERSCRIPT_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^([^{\\\s])").unwrap());
static SUBSCRIPT_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_([A-Za-z0-9])").unwrap());
static HAS_BACKSLASH_CMD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[A-Za-z]+").unwrap());

/// Sentinel returned for empty input per §4.1 step 1. Kept internal;
/// callers compare against `preprocess("").is_empty()` rather than this
/// constant directly.
const EMPTY_SENTINEL: &str = "";

/// Normalize a raw LaTeX (or plain) input string. See §4.1 for the numbered
/// steps this mirrors.
pub fn preprocess(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        log::trace!("preprocess: empty input");
        return EMPTY_SENTINEL.to_string();
    }

    // Decide LaTeX-flavor from the untouched input: `\operatorname{det}(M)`
    // unwraps to a bare `det(M)` below and would otherwise look plain by the
    // time this flag gets checked.
    let is_latex_flavored = HAS_BACKSLASH_CMD.is_match(trimmed);

    let mut s = trimmed.to_string();
    s = LEFT_RIGHT.replace_all(&s, "").to_string();
    s = CDOT_TIMES.replace_all(&s, "*").to_string();
    s = DIV.replace_all(&s, "/").to_string();
    s = PM.replace_all(&s, "+").to_string();
    s = OPERATORNAME.replace_all(&s, "$1").to_string();
    s = LN.replace_all(&s, r"\log").to_string();

    if is_latex_flavored {
        s = insert_backslash_before_bare_functions(&s);
    }

    s = normalize_superscript_braces(&s);
    s = normalize_subscript_braces(&s);

    log::trace!("preprocess: {raw:?} -> {s:?}");
    s
}

/// §4.1 step 6: insert a backslash before bare function names immediately
/// followed by `(` or `{`, but only when the input already looks like LaTeX.
fn insert_backslash_before_bare_functions(s: &str) -> String {
    let mut result = s.to_string();
    for name in BACKSLASH_FUNCTIONS {
        // `regex` has no lookbehind; capture the preceding character instead
        // of asserting it.
        let re = Regex::new(&format!(r"(^|[^A-Za-z\\]){name}(?=[({{])", name = regex::escape(name))).unwrap();
        result = re.replace_all(&result, |caps: &regex::Captures| format!("{}\\{}", &caps[1], name)).to_string();
    }
    result
}

/// §4.1 step 7: `^x` (single non-brace char) becomes `^{x}`.
fn normalize_superscript_braces(s: &str) -> String {
    SUPERSCRIPT_BARE.replace_all(s, "^{$1}").to_string()
}

/// §4.1 step 8: `_x` after whitespace/`)`/`}` or after a big-operator name
/// becomes `_{x}`; bare identifiers like `e_var` are left alone because the
/// regex only ever matches a single trailing character, and multi-char
/// subscripts (`_var`) never match `[A-Za-z0-9]` as a *whole* token here —
/// they're handled by the parser, not the preprocessor.
fn normalize_subscript_braces(s: &str) -> String {
    static AFTER_BOUNDARY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"([\s)}]|\\int|\\sum|\\prod|\\lim|\\log)_([A-Za-z0-9])(?![A-Za-z0-9])").unwrap());
    AFTER_BOUNDARY.replace_all(s, "$1_{$2}").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_empty_sentinel() {
        assert_eq!(preprocess("   "), "");
    }

    #[test]
    fn strips_left_right() {
        assert_eq!(preprocess(r"\left(x\right)"), "(x)");
    }

    #[test]
    fn maps_cdot_and_times_to_star() {
        assert_eq!(preprocess(r"2\cdot x"), "2*x");
        assert_eq!(preprocess(r"2\times x"), "2*x");
    }

    #[test]
    fn maps_pm_to_plus() {
        assert_eq!(preprocess(r"x\pm 1"), "x+1");
    }

    #[test]
    fn operatorname_unwraps_to_bare_name() {
        assert_eq!(preprocess(r"\operatorname{det}(M)"), r"\det(M)");
    }

    #[test]
    fn ln_normalizes_to_log() {
        assert_eq!(preprocess(r"\ln(x)"), r"\log(x)");
    }

    #[test]
    fn bare_superscript_gets_braced() {
        assert_eq!(preprocess(r"\int_0^55x"), r"\int_{0}^{5}5x");
    }

    #[test]
    fn plain_input_does_not_gain_backslashes() {
        assert_eq!(preprocess("sin(x)"), "sin(x)");
    }

    #[test]
    fn latex_flavored_input_gets_bare_function_backslashed() {
        assert_eq!(preprocess(r"sin(x)+\cos(x)"), r"\sin(x)+\cos(x)");
    }
}
