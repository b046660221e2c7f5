use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use thiserror::Error;

/// Errors from rational time arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("zero denominator")]
    ZeroDenominator,
    #[error("fraction arithmetic overflowed")]
    Overflow,
}

/// Rational number representation for precise timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: i64,
    pub denominator: i64,
}

impl Fraction {
    /// Create a new fraction and simplify it
    ///
    /// Panics on a zero denominator; prefer [`Fraction::try_new`] at
    /// boundaries where the denominator comes from untrusted input.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self::try_new(numerator, denominator).expect("denominator cannot be zero")
    }

    /// Fallible constructor matching the spec's checked-arithmetic contract.
    pub fn try_new(numerator: i64, denominator: i64) -> Result<Self, TimeError> {
        if denominator == 0 {
            return Err(TimeError::ZeroDenominator);
        }
        let mut f = Fraction {
            numerator,
            denominator,
        };
        f.simplify();
        Ok(f)
    }

    /// Checked addition; `Err(TimeError::Overflow)` if the common denominator overflows.
    pub fn checked_add(self, other: Self) -> Result<Self, TimeError> {
        let lcm = Self::checked_lcm(self.denominator, other.denominator)?;
        let num1 = self
            .numerator
            .checked_mul(lcm / self.denominator)
            .ok_or(TimeError::Overflow)?;
        let num2 = other
            .numerator
            .checked_mul(lcm / other.denominator)
            .ok_or(TimeError::Overflow)?;
        let num = num1.checked_add(num2).ok_or(TimeError::Overflow)?;
        Self::try_new(num, lcm)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Self) -> Result<Self, TimeError> {
        self.checked_add(Fraction::new(-other.numerator, other.denominator))
    }

    /// Checked multiplication.
    pub fn checked_mul(self, other: Self) -> Result<Self, TimeError> {
        let num = self
            .numerator
            .checked_mul(other.numerator)
            .ok_or(TimeError::Overflow)?;
        let den = self
            .denominator
            .checked_mul(other.denominator)
            .ok_or(TimeError::Overflow)?;
        Self::try_new(num, den)
    }

    /// Checked division.
    pub fn checked_div(self, other: Self) -> Result<Self, TimeError> {
        if other.numerator == 0 {
            return Err(TimeError::ZeroDenominator);
        }
        self.checked_mul(other.reciprocal())
    }

    fn checked_lcm(a: i64, b: i64) -> Result<i64, TimeError> {
        let g = Self::gcd(a.abs(), b.abs());
        if g == 0 {
            return Err(TimeError::ZeroDenominator);
        }
        (a / g).checked_mul(b).ok_or(TimeError::Overflow)
    }

    /// Cycle position: `t - floor(t)`, always in `[0, 1)`.
    pub fn cycle_pos(self) -> Self {
        self - self.floor()
    }

    /// Create a fraction from a whole number
    pub fn from_int(n: i64) -> Self {
        Fraction {
            numerator: n,
            denominator: 1,
        }
    }

    /// Create a fraction from a float (approximation)
    pub fn from_float(f: f64) -> Self {
        // Simple approximation - use 1000000 as denominator
        let n = (f * 1_000_000.0).round() as i64;
        Fraction::new(n, 1_000_000)
    }

    /// Convert to float
    pub fn to_float(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Simplify the fraction
    fn simplify(&mut self) {
        let gcd = Self::gcd(self.numerator.abs(), self.denominator.abs());
        self.numerator /= gcd;
        self.denominator /= gcd;

        // Keep denominator positive
        if self.denominator < 0 {
            self.numerator = -self.numerator;
            self.denominator = -self.denominator;
        }
    }

    /// Greatest common divisor
    fn gcd(mut a: i64, mut b: i64) -> i64 {
        while b != 0 {
            let temp = b;
            b = a % b;
            a = temp;
        }
        a
    }

    /// Least common multiple
    pub fn lcm(a: i64, b: i64) -> i64 {
        (a * b) / Self::gcd(a, b)
    }

    /// Get the reciprocal
    pub fn reciprocal(self) -> Self {
        Fraction::new(self.denominator, self.numerator)
    }

    /// Check if fraction is zero
    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// Check if fraction is negative
    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    /// Absolute value
    pub fn abs(self) -> Self {
        Fraction::new(self.numerator.abs(), self.denominator)
    }

    /// Floor - round down to nearest integer
    ///
    /// Uses Euclidean division so negative values floor towards negative
    /// infinity (e.g. `(-1/2).floor() == -1`), matching cycle arithmetic.
    pub fn floor(self) -> Self {
        Fraction::from_int(self.numerator.div_euclid(self.denominator))
    }

    /// Ceiling - round up to nearest integer
    pub fn ceil(self) -> Self {
        let floor_div = self.numerator.div_euclid(self.denominator);
        let rem = self.numerator.rem_euclid(self.denominator);
        Fraction::from_int(if rem == 0 { floor_div } else { floor_div + 1 })
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl From<i64> for Fraction {
    fn from(n: i64) -> Self {
        Fraction::from_int(n)
    }
}

impl From<f64> for Fraction {
    fn from(f: f64) -> Self {
        Fraction::from_float(f)
    }
}

impl From<(i64, i64)> for Fraction {
    fn from((num, den): (i64, i64)) -> Self {
        Fraction::new(num, den)
    }
}

impl Add for Fraction {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let lcm = Self::lcm(self.denominator, other.denominator);
        let num1 = self.numerator * (lcm / self.denominator);
        let num2 = other.numerator * (lcm / other.denominator);
        Fraction::new(num1 + num2, lcm)
    }
}

impl Sub for Fraction {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        let lcm = Self::lcm(self.denominator, other.denominator);
        let num1 = self.numerator * (lcm / self.denominator);
        let num2 = other.numerator * (lcm / other.denominator);
        Fraction::new(num1 - num2, lcm)
    }
}

impl Mul for Fraction {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Fraction::new(
            self.numerator * other.numerator,
            self.denominator * other.denominator,
        )
    }
}

impl Div for Fraction {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, other: Self) -> Self {
        // Division is multiplication by the reciprocal
        self * other.reciprocal()
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lcm = Self::lcm(self.denominator, other.denominator);
        let num1 = self.numerator * (lcm / self.denominator);
        let num2 = other.numerator * (lcm / other.denominator);
        num1.cmp(&num2)
    }
}
