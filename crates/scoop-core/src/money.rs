//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    4.00 × 1.30 = 5.2000000000000002  ❌ WRONG!                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    400 cents × 13000 / 10000 = 520 cents                               │
//! │    Every price, subtotal and order total is an exact i64               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use scoop_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // $10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;            // $21.98
//! let total = price + Money::from_cents(500); // $15.99
//! assert_eq!(total.cents(), 1599);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::quantity::{Margin, Quantity};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Subtraction stays closed; validation rejects negatives
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  CatalogItem.base_price ──► LineItem.unit_price ──► LineItem.subtotal   │
/// │                                                                         │
/// │  RawMaterial.base_price ──► apply_margin ──► Component.unit_price       │
/// │                                   │                                     │
/// │                    times_quantity ▼                                     │
/// │                          Component.subtotal ──Σ──► LineItem.unit_price  │
/// │                                                                         │
/// │  Σ LineItem.subtotal ──► Order.total (reconciled)                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use scoop_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use scoop_core::money::Money;
    ///
    /// let price = Money::from_major_minor(4, 0); // $4.00
    /// assert_eq!(price.cents(), 400);
    ///
    /// let negative = Money::from_major_minor(-5, 50); // -$5.50
    /// assert_eq!(negative.cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major_units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Marks a base price up by a margin: `price × (1 + margin)`.
    ///
    /// ## Rounding
    /// Half away from zero at cent precision, computed on i128:
    /// `(cents × (10000 + bps) ± 5000) / 10000`. A result outside i64 cents
    /// is a validation error.
    ///
    /// ## Example
    /// ```rust
    /// use scoop_core::money::Money;
    /// use scoop_core::quantity::Margin;
    ///
    /// let base = Money::from_cents(400); // $4.00 per kg
    /// let margin = Margin::from_bps(3000).unwrap(); // 30%
    /// assert_eq!(base.apply_margin(margin).unwrap().cents(), 520); // $5.20
    /// ```
    pub fn apply_margin(&self, margin: Margin) -> CoreResult<Money> {
        let factor = 10_000_i128 + margin.bps() as i128;
        round_div(self.0 as i128 * factor, 10_000).map(Money::from_cents)
    }

    /// Multiplies a unit price by a fractional quantity.
    ///
    /// ## Example
    /// ```rust
    /// use scoop_core::money::Money;
    /// use scoop_core::quantity::Quantity;
    ///
    /// let unit_price = Money::from_cents(520);
    /// let half_kilo = Quantity::from_hundredths(50);
    /// assert_eq!(unit_price.times_quantity(half_kilo).unwrap().cents(), 260);
    /// ```
    pub fn times_quantity(&self, quantity: Quantity) -> CoreResult<Money> {
        round_div(self.0 as i128 * quantity.hundredths() as i128, 100).map(Money::from_cents)
    }

    /// Multiplies money by a whole quantity.
    ///
    /// ## Example
    /// ```rust
    /// use scoop_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).unwrap().cents(), 897);
    /// assert!(Money::from_cents(i64::MAX).multiply_quantity(2).is_err());
    /// ```
    pub fn multiply_quantity(&self, qty: i64) -> CoreResult<Money> {
        self.0.checked_mul(qty).map(Money).ok_or_else(amount_too_large)
    }

    /// Adds two amounts, rejecting a sum outside i64 cents.
    pub fn checked_add(self, other: Money) -> CoreResult<Money> {
        self.0.checked_add(other.0).map(Money).ok_or_else(amount_too_large)
    }

    /// Sums subtotals, rejecting a total outside i64 cents.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> CoreResult<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }
}

fn amount_too_large() -> crate::error::CoreError {
    ValidationError::TooLarge {
        field: "amount".to_string(),
        max: Money(i64::MAX).to_string(),
    }
    .into()
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> CoreResult<i64> {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    i64::try_from(rounded).map_err(|_| amount_too_large())
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and error messages. Clients format amounts themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.major_units().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing subtotals into a total.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major_units(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(520)), "$5.20");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_margin_on_base_price() {
        let base = Money::from_cents(400);
        let margin = Margin::from_bps(3000).unwrap();
        assert_eq!(base.apply_margin(margin).unwrap().cents(), 520);
    }

    #[test]
    fn test_margin_rounds_half_away_from_zero() {
        // 0.15 × 1.30 = 0.195 → 0.20
        let base = Money::from_cents(15);
        assert_eq!(base.apply_margin(Margin::default()).unwrap().cents(), 20);

        // 0.11 × 1.25 = 0.1375 → 0.14
        let margin = Margin::from_bps(2500).unwrap();
        assert_eq!(Money::from_cents(11).apply_margin(margin).unwrap().cents(), 14);
    }

    #[test]
    fn test_times_fractional_quantity() {
        let unit_price = Money::from_cents(520);
        assert_eq!(unit_price.times_quantity(Quantity::from_hundredths(50)).unwrap().cents(), 260);

        // 3.33 × 0.25 = 0.8325 → 0.83
        let unit_price = Money::from_cents(333);
        assert_eq!(unit_price.times_quantity(Quantity::from_hundredths(25)).unwrap().cents(), 83);

        // 1.30 × 0.05 = 0.065 → 0.07
        let unit_price = Money::from_cents(130);
        assert_eq!(unit_price.times_quantity(Quantity::from_hundredths(5)).unwrap().cents(), 7);
    }

    #[test]
    fn test_round_div_negative() {
        assert_eq!(round_div(-15, 10).unwrap(), -2);
        assert_eq!(round_div(-14, 10).unwrap(), -1);
        assert_eq!(round_div(15, 10).unwrap(), 2);
    }

    #[test]
    fn test_out_of_range_products_are_rejected() {
        let base = Money::from_cents(400);
        let huge = Quantity::from_hundredths(90_000_000_000_000_000);
        let err = base.times_quantity(huge).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Validation(ValidationError::TooLarge { .. })
        ));

        assert!(Money::from_cents(i64::MAX).apply_margin(Margin::default()).is_err());
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_err());
        assert!(Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]).is_err());
        assert_eq!(
            Money::checked_sum([Money::from_cents(260), Money::from_cents(40)]).unwrap().cents(),
            300
        );
    }

    #[test]
    fn test_sum_of_subtotals() {
        let subtotals = [Money::from_cents(260), Money::from_cents(150), Money::from_cents(90)];
        let total: Money = subtotals.iter().sum();
        assert_eq!(total.cents(), 500);

        let empty: Vec<Money> = vec![];
        assert!(empty.into_iter().sum::<Money>().is_zero());
    }
}
