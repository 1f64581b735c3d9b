//! LaTeX parsing (§4.3): rewrites LaTeX-only notation into the algebraic
//! surface form, then delegates to [`super::algebraic`].
//!
//! There is no separate LaTeX-native expression builder here — unlike the
//! two-path description in §4.3 ("primary path … fallback path"), every
//! input in this port goes through the rewrite once preprocessing has
//! already normalized braces and backslash spacing; the "primary path" and
//! "fallback path" collapse into the same rewrite-then-parse pipeline
//! because the algebraic grammar is a strict superset of what the rewrite
//! produces.

use super::algebraic;
use super::ParseContext;
use crate::core::Expression;
use crate::error::{CasError, CasResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Parse a preprocessed LaTeX fragment into an expression tree.
pub fn parse(latex: &str, ctx: &ParseContext) -> CasResult<Expression> {
    let algebraic_form = to_algebraic(latex)?;
    let algebraic_form = rewrite_subscript_braces(&algebraic_form);
    log::trace!("latex::parse: {latex:?} -> {algebraic_form:?}");
    algebraic::parse(&algebraic_form, ctx)
}

/// Rewrite `\frac`, `\sqrt`, and bare `\command` tokens into the algebraic
/// surface grammar, recursing into braced arguments so nested LaTeX-only
/// forms are handled too.
fn to_algebraic(latex: &str) -> CasResult<String> {
    let chars: Vec<char> = latex.chars().collect();
    let mut i = 0usize;
    let mut out = String::new();

    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let cmd_start = i + 1;
        let mut j = cmd_start;
        while j < chars.len() && chars[j].is_alphabetic() {
            j += 1;
        }
        let cmd: String = chars[cmd_start..j].iter().collect();

        match cmd.as_str() {
            "frac" => {
                let (num, after_num) = extract_braced(&chars, j)?;
                let (den, after_den) = extract_braced(&chars, after_num)?;
                out.push('(');
                out.push_str(&to_algebraic(&num)?);
                out.push_str(")/(");
                out.push_str(&to_algebraic(&den)?);
                out.push(')');
                i = after_den;
            }
            "sqrt" => {
                if j < chars.len() && chars[j] == '[' {
                    let (root, after_root) = extract_bracketed(&chars, j)?;
                    let (radicand, after_rad) = extract_braced(&chars, after_root)?;
                    out.push_str("((");
                    out.push_str(&to_algebraic(&radicand)?);
                    out.push_str(")^(1/(");
                    out.push_str(&to_algebraic(&root)?);
                    out.push_str(")))");
                    i = after_rad;
                } else {
                    out.push_str("sqrt");
                    i = j;
                }
            }
            "" => {
                // Lone backslash with no command name following — copy
                // through so the later parse fails with a clear diagnostic
                // rather than silently swallowing it.
                out.push('\\');
                i += 1;
            }
            _ => {
                out.push_str(&cmd);
                i = j;
            }
        }
    }
    Ok(out)
}

/// `chars[pos]` must be `{`; returns the balanced content and the index
/// just past the matching `}`.
fn extract_braced(chars: &[char], pos: usize) -> CasResult<(String, usize)> {
    extract_delimited(chars, pos, '{', '}')
}

/// `chars[pos]` must be `[`; returns the balanced content and the index
/// just past the matching `]`.
fn extract_bracketed(chars: &[char], pos: usize) -> CasResult<(String, usize)> {
    extract_delimited(chars, pos, '[', ']')
}

fn extract_delimited(chars: &[char], pos: usize, open: char, close: char) -> CasResult<(String, usize)> {
    if chars.get(pos) != Some(&open) {
        return Err(CasError::ParseError(format!("expected '{open}'")));
    }
    let mut depth = 0i32;
    let mut i = pos;
    let content_start = pos + 1;
    loop {
        match chars.get(i) {
            Some(&c) if c == open => { depth += 1; i += 1; }
            Some(&c) if c == close => {
                depth -= 1;
                if depth == 0 {
                    let content: String = chars[content_start..i].iter().collect();
                    return Ok((content, i + 1));
                }
                i += 1;
            }
            Some(_) => i += 1,
            None => return Err(CasError::ParseError(format!("unbalanced '{open}'"))),
        }
    }
}

static SUBSCRIPT_BRACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\{([A-Za-z0-9]+)\}").unwrap());

/// §4.3, "Rewrites subscript braces `_{k}` back to `_k` so identifiers are
/// legal".
fn rewrite_subscript_braces(s: &str) -> String {
    SUBSCRIPT_BRACE.replace_all(s, "_$1").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SymbolCache;
    use crate::preprocess::preprocess;

    fn ctx(cache: &SymbolCache) -> ParseContext<'_> {
        ParseContext::new(cache)
    }

    #[test]
    fn frac_becomes_division() {
        let latex = preprocess(r"\frac{1}{2}");
        let cache = SymbolCache::new();
        let expr = parse(&latex, &ctx(&cache)).unwrap();
        assert_eq!(expr, Expression::rational(1, 2));
    }

    #[test]
    fn nested_frac_recurses() {
        let latex = preprocess(r"\frac{\frac{1}{2}}{3}");
        let cache = SymbolCache::new();
        let expr = parse(&latex, &ctx(&cache)).unwrap();
        assert_eq!(expr, Expression::rational(1, 6));
    }

    #[test]
    fn sqrt_without_root_is_a_function_call() {
        let latex = preprocess(r"\sqrt{4}");
        let cache = SymbolCache::new();
        let expr = parse(&latex, &ctx(&cache)).unwrap();
        assert_eq!(expr, Expression::function("sqrt", vec![Expression::integer(4)]));
    }

    #[test]
    fn sqrt_with_root_becomes_a_power() {
        let latex = preprocess(r"\sqrt[3]{8}");
        let cache = SymbolCache::new();
        let expr = parse(&latex, &ctx(&cache)).unwrap();
        assert_eq!(expr, Expression::integer(2));
    }

    #[test]
    fn subscripted_identifier_round_trips() {
        let latex = preprocess(r"x_{1}+1");
        let cache = SymbolCache::new();
        let expr = parse(&latex, &ctx(&cache)).unwrap();
        let x1 = Expression::symbol(cache.intern("x_1"));
        assert_eq!(expr, Expression::add(vec![x1, Expression::integer(1)]));
    }

    #[test]
    fn backslash_function_name_parses() {
        let latex = preprocess(r"\sin(x)");
        let cache = SymbolCache::new();
        let expr = parse(&latex, &ctx(&cache)).unwrap();
        let x = Expression::symbol(cache.intern("x"));
        assert_eq!(expr, Expression::function("sin", vec![x]));
    }
}
