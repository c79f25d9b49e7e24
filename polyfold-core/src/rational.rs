//! Exact rational arithmetic.
//!
//! All scoring is performed over arbitrary-precision rationals; floating
//! point appears only at the display boundary and in the one-time
//! conversion of logarithmic loop extrapolations, which are rationalized
//! once and exact thereafter.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::types::PolyfoldError;

/// Exact rational number used for every energy and score component.
pub type Rational = BigRational;

/// Parse a rational from a decimal string (`3.4`, `-0.25`), a fraction
/// (`17/5`), or an integer.
pub fn parse_rational(text: &str) -> Result<Rational, PolyfoldError> {
    let trimmed = text.trim();
    let err = || PolyfoldError::InvalidRational(text.to_string());

    if let Some((num, den)) = trimmed.split_once('/') {
        let num: BigInt = num.trim().parse().map_err(|_| err())?;
        let den: BigInt = den.trim().parse().map_err(|_| err())?;
        if den.is_zero() {
            return Err(err());
        }
        return Ok(Rational::new(num, den));
    }

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(err());
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(err());
    }

    let mut numerator: BigInt = format!("{int_part}{frac_part}")
        .parse()
        .map_err(|_| err())?;
    if negative {
        numerator = -numerator;
    }
    let denominator = BigInt::from(10u32).pow(frac_part.len() as u32);
    Ok(Rational::new(numerator, denominator))
}

/// Exact rational equal to the given float (dyadic expansion).
///
/// Used once per oversized loop to rationalize the logarithmic size
/// extrapolation; NaN and infinities collapse to zero, which cannot occur
/// for the strictly positive ratios the energy model feeds in.
pub fn rational_from_f64(value: f64) -> Rational {
    Rational::from_float(value).unwrap_or_else(Rational::zero)
}

/// Build a rational from a machine integer.
pub fn rational_from_i64(value: i64) -> Rational {
    Rational::from_integer(BigInt::from(value))
}

/// Approximate a rational as `f64` for display purposes.
pub fn approx(value: &Rational) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// A rational energy extended with +∞ for unreachable states.
///
/// +∞ absorbs addition and compares greater than every finite energy, so
/// recurrence minima can be folded without special cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Energy {
    /// A reachable, exactly-known energy.
    Finite(Rational),
    /// Unreachable state.
    Infinite,
}

impl Energy {
    /// The zero energy.
    pub fn zero() -> Self {
        Energy::Finite(Rational::zero())
    }

    /// Whether this energy is reachable.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        matches!(self, Energy::Finite(_))
    }

    /// The finite value, if any.
    pub fn finite(&self) -> Option<&Rational> {
        match self {
            Energy::Finite(value) => Some(value),
            Energy::Infinite => None,
        }
    }

    /// The finite value of an energy known to be reachable.
    ///
    /// Panics on +∞; callers rely on a recurrence invariant that the
    /// entry was filled from at least one reachable case.
    pub fn expect_finite(&self) -> &Rational {
        match self {
            Energy::Finite(value) => value,
            Energy::Infinite => panic!("expected a finite energy"),
        }
    }

    /// Multiply by an exact scalar; +∞ stays +∞ regardless of the scalar.
    #[must_use]
    pub fn scale(&self, factor: &Rational) -> Energy {
        match self {
            Energy::Finite(value) => Energy::Finite(value * factor),
            Energy::Infinite => Energy::Infinite,
        }
    }

    /// Approximate as `f64`; +∞ maps to `f64::INFINITY`.
    pub fn to_f64(&self) -> f64 {
        match self {
            Energy::Finite(value) => approx(value),
            Energy::Infinite => f64::INFINITY,
        }
    }
}

impl PartialOrd for Energy {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Energy {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Energy::Infinite, Energy::Infinite) => Ordering::Equal,
            (Energy::Infinite, Energy::Finite(_)) => Ordering::Greater,
            (Energy::Finite(_), Energy::Infinite) => Ordering::Less,
            (Energy::Finite(a), Energy::Finite(b)) => a.cmp(b),
        }
    }
}

impl Add<&Energy> for &Energy {
    type Output = Energy;

    fn add(self, rhs: &Energy) -> Energy {
        match (self, rhs) {
            (Energy::Finite(a), Energy::Finite(b)) => Energy::Finite(a + b),
            _ => Energy::Infinite,
        }
    }
}

impl Add<&Rational> for &Energy {
    type Output = Energy;

    fn add(self, rhs: &Rational) -> Energy {
        match self {
            Energy::Finite(a) => Energy::Finite(a + rhs),
            Energy::Infinite => Energy::Infinite,
        }
    }
}

impl From<Rational> for Energy {
    fn from(value: Rational) -> Self {
        Energy::Finite(value)
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Energy::Finite(value) => write!(f, "{value}"),
            Energy::Infinite => write!(f, "inf"),
        }
    }
}

/// Format a rational with its decimal approximation, e.g. `17/5 ≈ 3.4`.
pub fn display_with_approx(value: &Rational) -> String {
    if value.denom().is_one() {
        format!("{value}")
    } else {
        format!("{value} ≈ {}", approx(value))
    }
}

/// Exact minimum of two rationals.
pub fn min_rational(a: Rational, b: Rational) -> Rational {
    if b < a {
        b
    } else {
        a
    }
}
