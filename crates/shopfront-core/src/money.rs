//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    9.99 × 3 = 29.970000000000002   ❌ WRONG!                            │
//! │                                                                         │
//! │  Cart totals built from floats drift by fractions of a cent and the    │
//! │  amount charged no longer matches the amount displayed.                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    999 cents × 3 = 2997 cents, exactly                                 │
//! │    Decimal input is converted ONCE, at the boundary                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfront_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(999); // 9.99
//!
//! // Arithmetic operations
//! let line = price * 3i64;                     // 29.97
//! let total = line + Money::from_cents(500);   // 34.97
//! assert_eq!(total.to_decimal_string(), "34.97");
//!
//! // Decimal input from admin forms and seed data
//! assert_eq!(Money::from_decimal(19.99), Some(Money::from_cents(1999)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percentage;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Differences (subtotal − discount) stay representable
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Serializes as a bare integer of cents
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Product.price_cents ──► CartItem.unit_price ──► line total            │
/// │                                                                         │
/// │  Σ lines ──► subtotal ──► eligible subtotal ──► discount ──► total     │
/// │                                                                         │
/// │  total ──► payment provider order amount ──► Order.total_cents         │
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
    /// use shopfront_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal amount (e.g. `19.99`) to cents, rounding half away
    /// from zero to the nearest cent.
    ///
    /// Returns `None` for NaN, infinities, and values outside the i64 cent
    /// range. This is the only place a float becomes Money.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(9.99), Some(Money::from_cents(999)));
    /// assert_eq!(Money::from_decimal(0.005), Some(Money::from_cents(1)));
    /// assert_eq!(Money::from_decimal(f64::NAN), None);
    /// ```
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return None;
        }
        Some(Money(cents as i64))
    }

    /// Parses a decimal string such as `"45.00"` (as returned by payment
    /// providers) into cents.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("45.00"), Some(Money::from_cents(4500)));
    /// assert_eq!(Money::parse_decimal("abc"), None);
    /// ```
    pub fn parse_decimal(value: &str) -> Option<Self> {
        value.trim().parse::<f64>().ok().and_then(Money::from_decimal)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).dollars(), 10);
    /// assert_eq!(Money::from_cents(-550).dollars(), -5);
    /// ```
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates `rate` of this amount, rounded half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`
    /// The +5000 provides rounding (5000/10000 = 0.5)
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    /// use shopfront_core::types::Percentage;
    ///
    /// let eligible = Money::from_cents(5000);   // 50.00
    /// let rate = Percentage::from_bps(1000);    // 10%
    /// assert_eq!(eligible.percentage_of(rate).cents(), 500);
    ///
    /// // 9.99 × 15% = 1.4985 → 1.50
    /// let odd = Money::from_cents(999);
    /// assert_eq!(odd.percentage_of(Percentage::from_bps(1500)).cents(), 150);
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Eligible subtotal: 50.00
    ///      │
    ///      ▼
    /// percentage_of(10%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Raw discount: 5.00 ──► clamped to eligible subtotal ──► total 45.00
    /// ```
    pub fn percentage_of(&self, rate: Percentage) -> Money {
        // i128 keeps large carts from overflowing the intermediate product
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Multiplies money by a quantity, saturating at the i64 bounds.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(999);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 2997);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Formats the amount with exactly two decimals and no currency symbol.
    ///
    /// This is the representation handed to the payment provider and shown
    /// in cart summaries.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(4500).to_decimal_string(), "45.00");
    /// assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
    /// assert_eq!(Money::from_cents(-550).to_decimal_string(), "-5.50");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. Frontends format with the store currency.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

/// Summing line totals: `lines.iter().map(|l| l.line_total()).sum()`
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
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
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_decimal() {
        assert_eq!(Money::from_decimal(9.99), Some(Money::from_cents(999)));
        assert_eq!(Money::from_decimal(29.99), Some(Money::from_cents(2999)));
        assert_eq!(Money::from_decimal(0.0), Some(Money::zero()));
        assert_eq!(Money::from_decimal(-1.5), Some(Money::from_cents(-150)));
        assert_eq!(Money::from_decimal(f64::INFINITY), None);
        assert_eq!(Money::from_decimal(f64::NAN), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("45.00"), Some(Money::from_cents(4500)));
        assert_eq!(Money::parse_decimal(" 0.10 "), Some(Money::from_cents(10)));
        assert_eq!(Money::parse_decimal(""), None);
        assert_eq!(Money::parse_decimal("NaN"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_to_decimal_string() {
        assert_eq!(Money::from_cents(4500).to_decimal_string(), "45.00");
        assert_eq!(Money::from_cents(0).to_decimal_string(), "0.00");
        assert_eq!(Money::from_cents(7).to_decimal_string(), "0.07");
        assert_eq!(Money::from_cents(-42).to_decimal_string(), "-0.42");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percentage_of() {
        let amount = Money::from_cents(5000);
        assert_eq!(amount.percentage_of(Percentage::from_bps(1000)).cents(), 500);
        assert_eq!(amount.percentage_of(Percentage::zero()).cents(), 0);
        assert_eq!(amount.percentage_of(Percentage::from_bps(10000)).cents(), 5000);
    }

    #[test]
    fn test_percentage_of_rounds_half_up() {
        // 10.00 × 8.25% = 0.825 → 0.83
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percentage_of(Percentage::from_bps(825)).cents(), 83);

        // 0.33 × 10% = 0.033 → 0.03
        let small = Money::from_cents(33);
        assert_eq!(small.percentage_of(Percentage::from_bps(1000)).cents(), 3);
    }

    #[test]
    fn test_percentage_of_large_amount_does_not_overflow() {
        let huge = Money::from_cents(i64::MAX / 2);
        let half = huge.percentage_of(Percentage::from_bps(5000));
        assert!(half.is_positive());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max + Money::from_cents(1), max);
        assert_eq!(Money::from_cents(i64::MAX / 2).multiply_quantity(3), max);
        assert_eq!(Money::from_cents(i64::MIN) - Money::from_cents(1), Money::from_cents(i64::MIN));

        let total: Money = vec![max, max].into_iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_serializes_as_bare_cents() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "1999");
        let back: Money = serde_json::from_str("250").unwrap();
        assert_eq!(back, Money::from_cents(250));
    }
}
