//! Exact and approximate numeric leaves of an [`Expression`](super::Expression).

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

/// A number in the algebra system.
///
/// `Rational` is always kept in lowest terms with a positive denominator —
/// `num_rational::BigRational` maintains that invariant for us on every
/// constructor and arithmetic operation. `Float` carries a precision tag
/// (significant digits) because it is only ever produced on request (`N()`)
/// rather than appearing from ordinary parsing.
#[derive(Debug, Clone)]
pub enum Number {
    Integer(BigInt),
    Rational(BigRational),
    Float(f64, u32),
}

impl Number {
    pub fn int<T: Into<BigInt>>(value: T) -> Self {
        Number::Integer(value.into())
    }

    pub fn rational(numer: BigInt, denom: BigInt) -> Self {
        let r = BigRational::new(numer, denom);
        if r.is_integer() {
            Number::Integer(r.to_integer())
        } else {
            Number::Rational(r)
        }
    }

    pub fn float(value: f64, precision: u32) -> Self {
        Number::Float(value, precision)
    }

    pub fn zero() -> Self {
        Number::Integer(BigInt::zero())
    }

    pub fn one() -> Self {
        Number::Integer(BigInt::from(1))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(i) => i.is_zero(),
            Number::Rational(r) => r.is_zero(),
            Number::Float(f, _) => *f == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Number::Integer(i) => *i == BigInt::from(1),
            Number::Rational(r) => *r == BigRational::from_integer(BigInt::from(1)),
            Number::Float(f, _) => *f == 1.0,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Integer(i) => i.is_negative(),
            Number::Rational(r) => r.is_negative(),
            Number::Float(f, _) => *f < 0.0,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(..))
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Number::Integer(i) => i.to_f64(),
            Number::Rational(r) => r.to_f64(),
            Number::Float(f, _) => Some(*f),
        }
    }

    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Number::Integer(i) => Some(i.clone()),
            Number::Rational(r) if r.is_integer() => Some(r.to_integer()),
            Number::Float(f, _) if f.fract() == 0.0 => {
                Some(BigInt::from(*f as i64))
            }
            _ => None,
        }
    }

    pub fn as_rational(&self) -> BigRational {
        match self {
            Number::Integer(i) => BigRational::from_integer(i.clone()),
            Number::Rational(r) => r.clone(),
            Number::Float(f, _) => {
                BigRational::from_float(*f).unwrap_or_else(BigRational::zero)
            }
        }
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Integer(i) => Number::Integer(-i),
            Number::Rational(r) => Number::Rational(-r),
            Number::Float(f, p) => Number::Float(-f, *p),
        }
    }

    pub fn add(&self, other: &Number) -> Number {
        match (self, other) {
            (Number::Float(a, p), b) | (b, Number::Float(a, p)) => {
                Number::Float(a + b.to_f64().unwrap_or(0.0), *p)
            }
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a + b),
            _ => Number::rational_from(self.as_rational() + other.as_rational()),
        }
    }

    pub fn mul(&self, other: &Number) -> Number {
        match (self, other) {
            (Number::Float(a, p), b) | (b, Number::Float(a, p)) => {
                Number::Float(a * b.to_f64().unwrap_or(0.0), *p)
            }
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a * b),
            _ => Number::rational_from(self.as_rational() * other.as_rational()),
        }
    }

    pub fn div(&self, other: &Number) -> Option<Number> {
        if other.is_zero() {
            return None;
        }
        Some(match (self, other) {
            (Number::Float(a, p), b) => Number::Float(a / b.to_f64().unwrap_or(1.0), *p),
            (a, Number::Float(b, p)) => Number::Float(a.to_f64().unwrap_or(0.0) / b, *p),
            _ => Number::rational_from(self.as_rational() / other.as_rational()),
        })
    }

    /// Raise to an integer power. Returns `None` for negative exponents on
    /// zero, deferring to symbolic handling upstream.
    pub fn pow_i64(&self, exponent: i64) -> Option<Number> {
        if exponent == 0 {
            return Some(Number::one());
        }
        if self.is_zero() && exponent < 0 {
            return None;
        }
        let mag = exponent.unsigned_abs() as u32;
        let result = match self {
            Number::Float(f, p) => Number::Float(f.powi(exponent as i32), *p),
            _ => {
                let r = self.as_rational();
                let powered = num_traits::pow::pow(r, mag as usize);
                Number::rational_from(powered)
            }
        };
        if exponent < 0 {
            Number::one().div(&result)
        } else {
            Some(result)
        }
    }

    fn rational_from(r: BigRational) -> Number {
        if r.is_integer() {
            Number::Integer(r.to_integer())
        } else {
            Number::Rational(r)
        }
    }

    /// Approximate decimal rendering to `precision` significant digits.
    pub fn to_decimal_string(&self, precision: u32) -> String {
        let value = match self.to_f64() {
            Some(v) => v,
            None => return self.to_string(),
        };
        if value == 0.0 {
            return "0".to_string();
        }
        let digits = precision.max(1) as i32;
        let magnitude = value.abs().log10().floor() as i32;
        let decimals = (digits - magnitude - 1).max(0) as usize;
        let formatted = format!("{value:.decimals$}");
        trim_trailing_zeros(&formatted)
    }
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0');
    let trimmed = trimmed.trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Number::Float(_, p) => write!(f, "{}", self.to_decimal_string(*p)),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Float(a, _), Number::Float(b, _)) => a == b,
            (Number::Float(_, _), _) | (_, Number::Float(_, _)) => false,
            _ => self.as_rational() == other.as_rational(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Float(a, _), Number::Float(b, _)) => a.partial_cmp(b),
            (Number::Float(a, _), b) => a.partial_cmp(&b.to_f64()?),
            (a, Number::Float(b, _)) => a.to_f64()?.partial_cmp(b),
            _ => self.as_rational().partial_cmp(&other.as_rational()),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(BigInt::from(value))
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::Integer(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_reduces_to_integer_when_whole() {
        let n = Number::rational(BigInt::from(10), BigInt::from(2));
        assert!(matches!(n, Number::Integer(_)));
        assert_eq!(n.to_string(), "5");
    }

    #[test]
    fn rational_stays_reduced() {
        let n = Number::rational(BigInt::from(6), BigInt::from(4));
        assert_eq!(n.to_string(), "3/2");
    }

    #[test]
    fn addition_promotes_to_float_when_either_side_is_float() {
        let a = Number::int(2);
        let b = Number::float(0.5, 15);
        let sum = a.add(&b);
        assert!(matches!(sum, Number::Float(..)));
        assert_eq!(sum.to_f64(), Some(2.5));
    }

    #[test]
    fn negative_power_divides() {
        let two = Number::int(2);
        let inv = two.pow_i64(-1).unwrap();
        assert_eq!(inv.to_string(), "1/2");
    }

    #[test]
    fn zero_to_zero_is_one() {
        let zero = Number::zero();
        assert_eq!(zero.pow_i64(0).unwrap(), Number::one());
    }

    #[test]
    fn decimal_string_respects_precision() {
        let third = Number::rational(BigInt::from(1), BigInt::from(3));
        assert_eq!(third.to_decimal_string(5), "0.33333");
    }
}
