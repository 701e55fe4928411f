//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Cents
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount is a whole number of cents.                               │
//! │                                                                         │
//! │    Beer 4.50 × 3        = 450 × 3       = 1350 cents                    │
//! │    Service fee 10%      = 1350 × 1000 / 10000 = 135 cents               │
//! │    VAT inside 15%       = total × 1500 / 11500 (one rounding step)      │
//! │                                                                         │
//! │  Rounding happens exactly once per derived amount, at the point where  │
//! │  the amount is persisted or printed. Sums of line values never round.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use taproom_core::money::Money;
//!
//! let price = Money::from_cents(450); // 4.50
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 1350);
//! assert_eq!(line.format_with_prefix("K"), "K13.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  StockedItem/Shot/Special.price ──► CartLine.unit_price (frozen)        │
/// │                                          │                              │
/// │                                          ▼                              │
/// │  Pricing: subtotal ──► service fee ──► total ──► VAT-inclusive portion  │
/// │                                          │                              │
/// │                                          ▼                              │
/// │  Order.total / OrderLine.price_at_time ──► Receipt                      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies a unit price by a quantity, saturating at the `i64` bounds.
    ///
    /// Capped prices and line quantities keep real line values far below
    /// the bound.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `rate` of this amount, rounded half-up to the cent.
    ///
    /// Used for the service fee: `subtotal × fee_bps / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use taproom_core::money::Money;
    /// use taproom_core::types::Rate;
    ///
    /// let subtotal = Money::from_cents(1005);
    /// // 10% of 10.05 = 1.005 → 1.01
    /// assert_eq!(subtotal.apply_rate(Rate::from_bps(1000)).cents(), 101);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        // i128 so large totals cannot overflow the intermediate product
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money::from_cents(round_half_up_div(scaled, 10_000) as i64)
    }

    /// Returns the part of this amount that is tax under an inclusive `rate`.
    ///
    /// For a gross amount `g` and rate `r`: `g - g / (1 + r)`, which is
    /// `g × r / (1 + r)`. Computed in a single integer step so the only
    /// rounding is the final one.
    ///
    /// ## Example
    /// ```rust
    /// use taproom_core::money::Money;
    /// use taproom_core::types::Rate;
    ///
    /// // 110.00 at 15% inclusive → 110 - 110/1.15 = 14.3478… → 14.35
    /// let total = Money::from_cents(11_000);
    /// assert_eq!(total.inclusive_portion(Rate::from_bps(1500)).cents(), 1435);
    /// ```
    pub fn inclusive_portion(&self, rate: Rate) -> Money {
        let bps = rate.bps() as i128;
        let scaled = self.0 as i128 * bps;
        Money::from_cents(round_half_up_div(scaled, 10_000 + bps) as i64)
    }

    /// Formats the amount with a fixed prefix and two decimals, e.g. `K13.50`.
    pub fn format_with_prefix(&self, prefix: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, prefix, self.major().abs(), self.minor())
    }
}

/// Integer division rounding half away from zero.
fn round_half_up_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal rendering without a currency prefix.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

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
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display_and_prefix() {
        assert_eq!(Money::from_cents(1350).to_string(), "13.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(1350).format_with_prefix("K"), "K13.50");
        assert_eq!(Money::from_cents(-550).format_with_prefix("K"), "-K5.50");
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        let subtotal = Money::from_cents(10_000);
        assert_eq!(subtotal.apply_rate(Rate::from_bps(1000)).cents(), 1000);

        // 10% of 0.05 = 0.005 → 0.01
        assert_eq!(Money::from_cents(5).apply_rate(Rate::from_bps(1000)).cents(), 1);
        // 10% of 0.04 = 0.004 → 0.00
        assert_eq!(Money::from_cents(4).apply_rate(Rate::from_bps(1000)).cents(), 0);
    }

    #[test]
    fn test_inclusive_portion() {
        let total = Money::from_cents(11_000);
        assert_eq!(total.inclusive_portion(Rate::from_bps(1500)).cents(), 1435);

        // 115.00 at 15% inclusive is exactly 15.00
        let total = Money::from_cents(11_500);
        assert_eq!(total.inclusive_portion(Rate::from_bps(1500)).cents(), 1500);

        assert_eq!(Money::zero().inclusive_portion(Rate::from_bps(1500)).cents(), 0);
    }

    #[test]
    fn test_sum() {
        let total: Money = [450, 300, 1250]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 2000);
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
    fn test_multiply_saturates_instead_of_wrapping() {
        let price = Money::from_cents(450);
        assert_eq!(price.multiply_quantity(i64::MAX).cents(), i64::MAX);
        assert_eq!((price * i64::MIN).cents(), i64::MIN);
    }
}
