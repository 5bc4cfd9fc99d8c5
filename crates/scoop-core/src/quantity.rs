//! # Quantity and Margin
//!
//! Fixed-point numeric types used next to [`Money`](crate::money::Money).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Type       Stored as        Example                                    │
//! │  ─────────  ───────────────  ─────────────────────────────────────────  │
//! │  Quantity   i64 hundredths   0.25 kg  → 25      7 cones → 700           │
//! │  Margin     u32 basis points 0.30     → 3000    (must be > 0)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the wire both serialize as decimal strings (`"0.25"`, `"0.30"`) and
//! accept either strings or JSON numbers on input. Input with more decimal
//! places than the type can hold is rejected, never silently rounded.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::DEFAULT_MARGIN_BPS;

const QUANTITY_PLACES: u32 = 2;
const MARGIN_PLACES: u32 = 4;

// =============================================================================
// Quantity
// =============================================================================

/// A quantity with two decimal places, stored as hundredths.
///
/// Raw-material stock and component amounts use the fractional part;
/// finished-good counts are whole units (`from_units`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Quantity(hundredths)
    }

    /// Whole units as hundredths, saturating at the i64 bounds.
    ///
    /// Request inputs are bounded before they get here; use
    /// [`checked_from_units`](Self::checked_from_units) where a caller needs
    /// to know about overflow.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units.saturating_mul(100))
    }

    #[inline]
    pub const fn checked_from_units(units: i64) -> Option<Self> {
        match units.checked_mul(100) {
            Some(hundredths) => Some(Quantity(hundredths)),
            None => None,
        }
    }

    #[inline]
    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Quantity)
    }

    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Whole units, truncating any fractional part.
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0 / 100
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, QUANTITY_PLACES)
            .map(Quantity)
            .map_err(|reason| ValidationError::InvalidFormat {
                field: "quantity".to_string(),
                reason,
            })
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = DecimalInput::deserialize(deserializer)?;
        input
            .scaled(QUANTITY_PLACES)
            .map(Quantity)
            .map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Margin
// =============================================================================

/// Markup applied to a raw material's base price, in basis points.
///
/// 1 basis point = 0.01% = 1/10000, so `0.30` is 3000 bps.
/// A margin is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margin(u32);

impl Margin {
    /// Creates a margin from basis points, rejecting zero.
    pub fn from_bps(bps: u32) -> ValidationResult<Self> {
        if bps == 0 {
            return Err(ValidationError::MustBePositive {
                field: "margin".to_string(),
            });
        }
        Ok(Margin(bps))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

impl Default for Margin {
    fn default() -> Self {
        Margin(DEFAULT_MARGIN_BPS)
    }
}

impl fmt::Display for Margin {
    /// Renders as a fraction with at least two decimals: 3000 → "0.30",
    /// 1250 → "0.125".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 10_000;
        let mut frac = format!("{:04}", self.0 % 10_000);
        while frac.len() > 2 && frac.ends_with('0') {
            frac.pop();
        }
        write!(f, "{}.{}", whole, frac)
    }
}

impl FromStr for Margin {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bps = parse_fixed(s, MARGIN_PLACES).map_err(|reason| ValidationError::InvalidFormat {
            field: "margin".to_string(),
            reason,
        })?;
        margin_from_scaled(bps)
    }
}

impl Serialize for Margin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Margin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = DecimalInput::deserialize(deserializer)?;
        let bps = input
            .scaled(MARGIN_PLACES)
            .map_err(serde::de::Error::custom)?;
        margin_from_scaled(bps).map_err(serde::de::Error::custom)
    }
}

fn margin_from_scaled(bps: i64) -> ValidationResult<Margin> {
    if bps <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "margin".to_string(),
        });
    }
    let bps = u32::try_from(bps).map_err(|_| ValidationError::OutOfRange {
        field: "margin".to_string(),
        min: 1,
        max: u32::MAX as i64,
    })?;
    Margin::from_bps(bps)
}

// =============================================================================
// Decimal parsing
// =============================================================================

/// Accepts `"0.25"`, `0.25` or `3` from JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalInput {
    Int(i64),
    Float(f64),
    Text(String),
}

impl DecimalInput {
    fn scaled(&self, places: u32) -> Result<i64, String> {
        let scale = 10_i64.pow(places);
        match self {
            DecimalInput::Int(value) => value
                .checked_mul(scale)
                .ok_or_else(|| "value is too large".to_string()),
            DecimalInput::Float(value) => {
                let scaled = value * scale as f64;
                if !scaled.is_finite() || scaled.abs() > i64::MAX as f64 {
                    return Err("value is too large".to_string());
                }
                let rounded = scaled.round();
                if (scaled - rounded).abs() > 1e-6 {
                    return Err(format!("at most {} decimal places allowed", places));
                }
                Ok(rounded as i64)
            }
            DecimalInput::Text(text) => parse_fixed(text, places),
        }
    }
}

/// Parses a decimal string into an integer scaled by `10^places`.
///
/// `parse_fixed("0.5", 2) == Ok(50)`, `parse_fixed("1.234", 2)` is an error.
pub(crate) fn parse_fixed(text: &str, places: u32) -> Result<i64, String> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (digits, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err("expected a decimal number".to_string());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("'{}' is not a decimal number", text));
    }
    if frac.len() > places as usize {
        return Err(format!("at most {} decimal places allowed", places));
    }

    let scale = 10_i64.pow(places);
    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| "value is too large".to_string())?
    };
    let frac_value: i64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = places as usize);
        padded.parse().map_err(|_| "value is too large".to_string())?
    };

    let value = whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| "value is too large".to_string())?;

    Ok(if negative { -value } else { value })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixed() {
        assert_eq!(parse_fixed("0.5", 2), Ok(50));
        assert_eq!(parse_fixed("0.25", 2), Ok(25));
        assert_eq!(parse_fixed("10", 2), Ok(1000));
        assert_eq!(parse_fixed(".75", 2), Ok(75));
        assert_eq!(parse_fixed("-1.5", 2), Ok(-150));
        assert!(parse_fixed("1.234", 2).is_err());
        assert!(parse_fixed("abc", 2).is_err());
        assert!(parse_fixed("", 2).is_err());
        assert!(parse_fixed(".", 2).is_err());
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!(Quantity::from_hundredths(25).to_string(), "0.25");
        assert_eq!(Quantity::from_units(7).to_string(), "7.00");
        assert_eq!(Quantity::from_hundredths(-150).to_string(), "-1.50");
    }

    #[test]
    fn test_from_units_never_overflows() {
        assert_eq!(Quantity::from_units(i64::MAX).hundredths(), i64::MAX);
        assert_eq!(Quantity::from_units(i64::MIN).hundredths(), i64::MIN);
        assert_eq!(Quantity::checked_from_units(100_000_000_000_000_000), None);
        assert_eq!(Quantity::checked_from_units(7), Some(Quantity::from_hundredths(700)));
        assert_eq!(Quantity::from_hundredths(i64::MAX).checked_add(Quantity::from_hundredths(1)), None);
    }

    #[test]
    fn test_quantity_serde() {
        let q: Quantity = serde_json::from_str("\"0.50\"").unwrap();
        assert_eq!(q.hundredths(), 50);

        let q: Quantity = serde_json::from_str("0.25").unwrap();
        assert_eq!(q.hundredths(), 25);

        let q: Quantity = serde_json::from_str("3").unwrap();
        assert_eq!(q.hundredths(), 300);

        assert!(serde_json::from_str::<Quantity>("0.125").is_err());
        assert_eq!(serde_json::to_string(&q).unwrap(), "\"3.00\"");
    }

    #[test]
    fn test_margin_rejects_zero() {
        assert!(Margin::from_bps(0).is_err());
        assert!(serde_json::from_str::<Margin>("0").is_err());
        assert!(serde_json::from_str::<Margin>("\"-0.1\"").is_err());
        assert!("0.00".parse::<Margin>().is_err());
    }

    #[test]
    fn test_margin_parse_and_display() {
        let margin: Margin = serde_json::from_str("0.30").unwrap();
        assert_eq!(margin.bps(), 3000);
        assert_eq!(margin.to_string(), "0.30");

        let margin: Margin = "0.125".parse().unwrap();
        assert_eq!(margin.bps(), 1250);
        assert_eq!(margin.to_string(), "0.125");

        assert_eq!(Margin::default().bps(), 3000);
    }
}
