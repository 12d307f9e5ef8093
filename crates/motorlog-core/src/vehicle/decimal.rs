//! Exact decimal values for mileage, engine hours and costs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::MotorlogError;

/// A decimal number kept as its canonical text.
///
/// The value never passes through binary floating point, so what is written
/// to an export is bit-for-bit what was entered. Accepted form:
/// an optional `-`, one or more digits, and optionally `.` followed by one or
/// more digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    pub fn parse(value: &str) -> Result<Self, MotorlogError> {
        if is_decimal_literal(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(MotorlogError::Serialization {
                format: "decimal".to_string(),
                message: format!("'{}' is not a decimal number", value),
            })
        }
    }

    /// Builds a value from an integer mantissa and a count of fractional digits,
    /// e.g. `from_scaled(12345, 2)` is `123.45`.
    pub fn from_scaled(mantissa: i64, scale: u32) -> Self {
        let negative = mantissa < 0;
        let digits = mantissa.unsigned_abs().to_string();
        let scale = scale as usize;

        let body = if scale == 0 {
            digits
        } else if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            format!("{}.{}", int_part, frac_part)
        } else {
            format!("0.{}{}", "0".repeat(scale - digits.len()), digits)
        };

        if negative {
            Self(format!("-{}", body))
        } else {
            Self(body)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_decimal_literal(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.is_none_or(all_digits)
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Decimal {
    type Err = MotorlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
