//! The algebraic surface grammar (§4.3): the plain-text expression language
//! every LaTeX fragment is eventually rewritten into.
//!
//! Grammar, loosest to tightest binding:
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary | unary)*      -- trailing alt is implicit multiplication
//! unary  := '-' unary | pow
//! pow    := primary ('^' unary)?                     -- right-associative
//! primary:= number | function-call | identifier | '(' expr ')'
//! ```

use super::{ParseContext, CONSTANT_NAMES};
use crate::core::{Expression, MathConstant};
use crate::error::{CasError, CasResult};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

/// Parse an algebraic surface string into an expression tree.
pub fn parse(input: &str, ctx: &ParseContext) -> CasResult<Expression> {
    let toks = tokenize(input, ctx)?;
    let mut parser = Parser { toks, pos: 0, ctx };
    let expr = parser.parse_expr()?;
    if parser.pos != parser.toks.len() {
        return Err(CasError::ParseError(input.to_string()));
    }
    Ok(substitute_constants(expr))
}

fn substitute_constants(expr: Expression) -> Expression {
    match expr {
        Expression::Symbol(s) => match s.name() {
            "pi" => Expression::Constant(MathConstant::Pi),
            "e" => Expression::Constant(MathConstant::E),
            "i" => Expression::Constant(MathConstant::I),
            "inf" | "infty" | "oo" => Expression::Constant(MathConstant::Infinity),
            _ => Expression::Symbol(s),
        },
        Expression::Add(terms) => Expression::add(terms.into_iter().map(substitute_constants).collect()),
        Expression::Mul(factors) => Expression::mul(factors.into_iter().map(substitute_constants).collect()),
        Expression::Pow(b, e) => Expression::pow(substitute_constants(*b), substitute_constants(*e)),
        Expression::Function { name, args } => {
            Expression::function(name, args.into_iter().map(substitute_constants).collect())
        }
        Expression::Matrix(rows) => Expression::matrix(
            rows.into_iter()
                .map(|row| row.into_iter().map(substitute_constants).collect())
                .collect(),
        ),
        Expression::Equation { lhs, rhs } => {
            Expression::equation(substitute_constants(*lhs), substitute_constants(*rhs))
        }
        other => other,
    }
}

fn tokenize(input: &str, ctx: &ParseContext) -> CasResult<Vec<Tok>> {
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0usize;
    let mut out = Vec::new();

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '+' => { out.push(Tok::Plus); i += 1; }
            '-' => { out.push(Tok::Minus); i += 1; }
            '*' => { out.push(Tok::Star); i += 1; }
            '/' => { out.push(Tok::Slash); i += 1; }
            '^' => { out.push(Tok::Caret); i += 1; }
            '(' | '[' | '{' => { out.push(Tok::LParen); i += 1; }
            ')' | ']' | '}' => { out.push(Tok::RParen); i += 1; }
            ',' => { out.push(Tok::Comma); i += 1; }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                out.push(Tok::Num(chars[start..i].iter().collect()));
            }
            _ if c.is_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_alphabetic() {
                    i += 1;
                }
                // A trailing `_subscript` (e.g. `x_1`, `a_n`) is part of the
                // same identifier — subscripted names are always atomic,
                // never split by implicit multiplication.
                if i < chars.len() && chars[i] == '_' && chars.get(i + 1).is_some_and(|c| c.is_alphanumeric()) {
                    i += 1;
                    while i < chars.len() && chars[i].is_alphanumeric() {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    out.push(Tok::Ident(word));
                    continue;
                }
                let word: String = chars[start..i].iter().collect();
                push_identifier_tokens(&word, ctx, &mut out);
            }
            _ => return Err(CasError::ParseError(format!("unexpected character '{c}'"))),
        }
    }
    Ok(out)
}

/// Implements §4.3's name-table rules: a maximal alphabetic run is kept
/// whole if it is a builtin function, a known variable/function name, a
/// Greek letter, a reserved constant, or a single character; otherwise it
/// is split into one `Ident` token per character so implicit multiplication
/// turns `ab` into `a*b`.
fn push_identifier_tokens(word: &str, ctx: &ParseContext, out: &mut Vec<Tok>) {
    let lower_ok = ctx.is_function_head(word) || ctx.is_known_multichar(word) || word.chars().count() == 1;
    if lower_ok {
        out.push(Tok::Ident(word.to_string()));
    } else {
        for ch in word.chars() {
            out.push(Tok::Ident(ch.to_string()));
        }
    }
}

struct Parser<'a, 'b> {
    toks: Vec<Tok>,
    pos: usize,
    ctx: &'a ParseContext<'b>,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn advance(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, tok: &Tok) -> CasResult<()> {
        match self.advance() {
            Some(t) if &t == tok => Ok(()),
            other => Err(CasError::ParseError(format!("expected {tok:?}, got {other:?}"))),
        }
    }

    fn parse_expr(&mut self) -> CasResult<Expression> {
        let mut terms = vec![self.parse_term()?];
        loop {
            match self.peek() {
                Some(Tok::Plus) => {
                    self.advance();
                    terms.push(self.parse_term()?);
                }
                Some(Tok::Minus) => {
                    self.advance();
                    terms.push(Expression::neg(self.parse_term()?));
                }
                _ => break,
            }
        }
        Ok(Expression::add(terms))
    }

    fn parse_term(&mut self) -> CasResult<Expression> {
        let mut factors = vec![self.parse_unary()?];
        loop {
            match self.peek() {
                Some(Tok::Star) => {
                    self.advance();
                    factors.push(self.parse_unary()?);
                }
                Some(Tok::Slash) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    factors.push(Expression::pow(rhs, Expression::integer(-1)));
                }
                Some(Tok::Num(_)) | Some(Tok::Ident(_)) | Some(Tok::LParen) => {
                    factors.push(self.parse_unary()?);
                }
                _ => break,
            }
        }
        Ok(Expression::mul(factors))
    }

    fn parse_unary(&mut self) -> CasResult<Expression> {
        if matches!(self.peek(), Some(Tok::Minus)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expression::neg(inner));
        }
        if matches!(self.peek(), Some(Tok::Plus)) {
            self.advance();
            return self.parse_unary();
        }
        self.parse_pow()
    }

    fn parse_pow(&mut self) -> CasResult<Expression> {
        let base = self.parse_primary()?;
        if matches!(self.peek(), Some(Tok::Caret)) {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Expression::pow(base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> CasResult<Expression> {
        match self.advance() {
            Some(Tok::Num(s)) => parse_number(&s),
            Some(Tok::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Tok::RParen)?;
                Ok(inner)
            }
            Some(Tok::Ident(name)) => {
                if matches!(self.peek(), Some(Tok::LParen)) && self.ctx.is_function_head(&name) {
                    self.advance();
                    let args = self.parse_arg_list()?;
                    self.expect(&Tok::RParen)?;
                    Ok(Expression::function(name, args))
                } else {
                    Ok(Expression::symbol(self.ctx.symbols.intern(&name)))
                }
            }
            other => Err(CasError::ParseError(format!("unexpected token {other:?}"))),
        }
    }

    fn parse_arg_list(&mut self) -> CasResult<Vec<Expression>> {
        if matches!(self.peek(), Some(Tok::RParen)) {
            return Ok(Vec::new());
        }
        let mut args = vec![self.parse_expr()?];
        while matches!(self.peek(), Some(Tok::Comma)) {
            self.advance();
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }
}

fn parse_number(s: &str) -> CasResult<Expression> {
    if let Some((whole, frac)) = s.split_once('.') {
        if frac.is_empty() {
            return whole
                .parse::<i64>()
                .map(Expression::integer)
                .map_err(|_| CasError::ParseError(s.to_string()));
        }
        let denom = 10i64.pow(frac.len() as u32);
        let combined = format!("{whole}{frac}");
        let numer: i64 = combined.parse().map_err(|_| CasError::ParseError(s.to_string()))?;
        return Ok(Expression::rational(numer, denom));
    }
    s.parse::<i64>()
        .map(Expression::integer)
        .map_err(|_| CasError::ParseError(s.to_string()))
}

/// Does this name resolve to a reserved constant? Exposed for the
/// dispatcher, which must not treat constant names as assignable variables
/// (§4.2 step 5).
pub fn is_constant_name(name: &str) -> bool {
    CONSTANT_NAMES.contains(&name) || matches!(name, "E" | "I")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SymbolCache;

    fn ctx(cache: &SymbolCache) -> ParseContext<'_> {
        ParseContext::new(cache)
    }

    #[test]
    fn parses_simple_sum() {
        let cache = SymbolCache::new();
        let expr = parse("1+2", &ctx(&cache)).unwrap();
        assert_eq!(expr, Expression::integer(3));
    }

    #[test]
    fn implicit_multiplication_splits_unknown_multichar_names() {
        let cache = SymbolCache::new();
        let expr = parse("3ab", &ctx(&cache)).unwrap();
        let a = Expression::symbol(cache.intern("a"));
        let b = Expression::symbol(cache.intern("b"));
        assert_eq!(expr, Expression::mul(vec![Expression::integer(3), a, b]));
    }

    #[test]
    fn implicit_multiplication_handles_parens() {
        let cache = SymbolCache::new();
        let expr = parse("2(x+1)", &ctx(&cache)).unwrap();
        let x = Expression::symbol(cache.intern("x"));
        let expected = Expression::mul(vec![Expression::integer(2), Expression::add(vec![x, Expression::integer(1)])]);
        assert_eq!(expr, expected);
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let cache = SymbolCache::new();
        let expr = parse("-x^2", &ctx(&cache)).unwrap();
        let x = Expression::symbol(cache.intern("x"));
        let expected = Expression::neg(Expression::pow(x, Expression::integer(2)));
        assert_eq!(expr, expected);
    }

    #[test]
    fn power_is_right_associative() {
        let cache = SymbolCache::new();
        let expr = parse("2^3^2", &ctx(&cache)).unwrap();
        assert_eq!(expr, Expression::integer(512));
    }

    #[test]
    fn known_function_name_parses_as_application() {
        let cache = SymbolCache::new();
        let expr = parse("sin(x)", &ctx(&cache)).unwrap();
        let x = Expression::symbol(cache.intern("x"));
        assert_eq!(expr, Expression::function("sin", vec![x]));
    }

    #[test]
    fn constants_are_substituted() {
        let cache = SymbolCache::new();
        let expr = parse("pi", &ctx(&cache)).unwrap();
        assert_eq!(expr, Expression::pi());
    }

    #[test]
    fn decimal_literal_parses_as_rational() {
        let cache = SymbolCache::new();
        let expr = parse("0.5", &ctx(&cache)).unwrap();
        assert_eq!(expr, Expression::rational(1, 2));
    }
}
