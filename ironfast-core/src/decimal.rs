/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Scaled decimal values.
//!
//! FAST transmits decimals as a pair of integers: a base-10 exponent and a
//! mantissa, with `value = mantissa * 10^exponent`. [`Decimal`] keeps that
//! representation exactly, so `1.50` (150, -2) and `1.5` (15, -1) are
//! distinct values for operator comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest exponent permitted on the wire.
pub const MIN_EXPONENT: i8 = -63;

/// Largest exponent permitted on the wire.
pub const MAX_EXPONENT: i8 = 63;

/// A decimal number stored as mantissa and base-10 exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Decimal {
    mantissa: i64,
    exponent: i8,
}

/// Error returned when a decimal cannot be represented in the target type.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("decimal value out of range")]
pub struct DecimalRangeError;

/// Error returned when parsing a decimal from text fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid decimal literal: {0:?}")]
pub struct ParseDecimalError(String);

impl Decimal {
    /// Creates a decimal from its mantissa and exponent.
    #[inline]
    #[must_use]
    pub const fn new(mantissa: i64, exponent: i8) -> Self {
        Self { mantissa, exponent }
    }

    /// Returns the mantissa.
    #[inline]
    #[must_use]
    pub const fn mantissa(&self) -> i64 {
        self.mantissa
    }

    /// Returns the exponent.
    #[inline]
    #[must_use]
    pub const fn exponent(&self) -> i8 {
        self.exponent
    }

    /// Returns true if the exponent is within the wire range.
    #[inline]
    #[must_use]
    pub const fn has_wire_exponent(&self) -> bool {
        self.exponent >= MIN_EXPONENT && self.exponent <= MAX_EXPONENT
    }

    /// Converts to a floating point approximation.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 * 10f64.powi(i32::from(self.exponent))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent >= 0 {
            write!(f, "{}", self.mantissa)?;
            for _ in 0..self.exponent {
                f.write_str("0")?;
            }
            return Ok(());
        }

        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = usize::from(self.exponent.unsigned_abs());
        if self.mantissa < 0 {
            f.write_str("-")?;
        }
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{int_part}.{frac_part}")
        } else {
            write!(f, "0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Parses `[-]digits[.digits][e[-]digits]` without normalizing, so
    /// `"1.50"` yields mantissa 150 and exponent -2.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let text = s.trim();
        let (number, exp_part) = match text.find(['e', 'E']) {
            Some(pos) => (&text[..pos], Some(&text[pos + 1..])),
            None => (text, None),
        };
        let mut exponent: i64 = match exp_part {
            Some(e) => e.parse().map_err(|_| err())?,
            None => 0,
        };

        let (negative, unsigned) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number.strip_prefix('+').unwrap_or(number)),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }

        let mut mantissa: i64 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c.to_digit(10).ok_or_else(err)?;
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i64::from(digit)))
                .ok_or_else(err)?;
        }
        exponent -= frac_part.len() as i64;
        if negative {
            mantissa = -mantissa;
        }

        let exponent = i8::try_from(exponent).map_err(|_| err())?;
        Ok(Self::new(mantissa, exponent))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::new(value, 0)
    }
}

impl TryFrom<Decimal> for rust_decimal::Decimal {
    type Error = DecimalRangeError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let mantissa = i128::from(value.mantissa);
        if value.exponent >= 0 {
            let scaled = 10i128
                .checked_pow(u32::from(value.exponent.unsigned_abs()))
                .and_then(|p| mantissa.checked_mul(p))
                .ok_or(DecimalRangeError)?;
            Self::try_from_i128_with_scale(scaled, 0).map_err(|_| DecimalRangeError)
        } else {
            Self::try_from_i128_with_scale(mantissa, u32::from(value.exponent.unsigned_abs()))
                .map_err(|_| DecimalRangeError)
        }
    }
}

impl TryFrom<rust_decimal::Decimal> for Decimal {
    type Error = DecimalRangeError;

    fn try_from(value: rust_decimal::Decimal) -> Result<Self, Self::Error> {
        let mantissa = i64::try_from(value.mantissa()).map_err(|_| DecimalRangeError)?;
        let scale = i8::try_from(value.scale()).map_err(|_| DecimalRangeError)?;
        Ok(Self::new(mantissa, -scale))
    }
}
