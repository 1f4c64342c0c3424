//! # Quantity Module
//!
//! Provides the `Quantity` type for stock amounts with two fractional digits.
//!
//! ## Why Fixed-Point Quantities?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Cable is stocked in meters with 2 decimals:                            │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ availability check drifts       │
//! │                                                                         │
//! │  Warehouse holds 30.30 m, crew asks for 10.10 m three times:           │
//! │    binary float may leave -0.0000001 m → "insufficient stock"          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Hundredths                                       │
//! │    3030 - 1010 - 1010 - 1010 = 0 exactly                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use obrador_core::quantity::Quantity;
//!
//! let stock: Quantity = "30.30".parse().unwrap();
//! let taken = Quantity::from_hundredths(1010) * 3;
//!
//! assert!((stock - taken).is_zero());
//! assert_eq!(stock.to_string(), "30.30");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

/// Number of hundredths in one unit.
const SCALE: i64 = 100;

// =============================================================================
// Quantity Type
// =============================================================================

/// A stock quantity stored as an integer number of hundredths.
///
/// ## Design Decisions
/// - **i64 (signed)**: Differences can go negative during checks; stored
///   ledger rows never do (enforced by the ledger and a CHECK constraint)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **String on the wire**: `"30.00"` survives JSON without float rounding
///
/// ## Where Quantity is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  MovementLine.quantity ──► aggregated per material ──► Stock Ledger     │
/// │                                                                         │
/// │  StockEntry.quantity ──► availability check ──► Shortfall report        │
/// │                                                                         │
/// │  Serialized lines are always exactly Quantity::ONE                      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Quantity(i64);

impl Quantity {
    /// One whole unit (the quantity of every serialized line).
    pub const ONE: Quantity = Quantity(SCALE);

    /// Creates a quantity from hundredths.
    ///
    /// ## Example
    /// ```rust
    /// use obrador_core::quantity::Quantity;
    ///
    /// let q = Quantity::from_hundredths(1250); // 12.50
    /// assert_eq!(q.to_string(), "12.50");
    /// ```
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Quantity(hundredths)
    }

    /// Creates a quantity from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * SCALE)
    }

    /// Returns the raw value in hundredths.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / SCALE
    }

    /// Returns the fractional portion in hundredths (always 0-99).
    #[inline]
    pub const fn fraction_part(&self) -> i64 {
        (self.0 % SCALE).abs()
    }

    /// Returns zero quantity.
    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two quantities, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Quantity) -> Option<Quantity> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Quantity(v)),
            None => None,
        }
    }

    /// Subtracts two quantities, returning `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Quantity) -> Option<Quantity> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Quantity(v)),
            None => None,
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal string with at most two fractional digits.
///
/// ## Accepted Forms
/// ```text
/// "30"      → 30.00
/// "30.5"    → 30.50
/// "30.25"   → 30.25
/// "-1.5"    → -1.50   (sign is accepted; positivity is a validation rule)
/// "30.255"  → error   (more than 2 fractional digits)
/// "3e2"     → error   (no exponents)
/// ```
impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("must be a decimal number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a decimal number"));
        }
        if fraction.len() > 2 {
            return Err(invalid("must have at most 2 decimal places"));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("is out of range"))?
        };
        let fraction_value: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("is out of range"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("is out of range"))?,
        };

        let magnitude = whole_value
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(fraction_value))
            .ok_or_else(|| invalid("is out of range"))?;

        Ok(Quantity(if negative { -magnitude } else { magnitude }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Always two fractional digits: `30.00`, `-1.50`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.units().abs(),
            self.fraction_part()
        )
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
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

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a whole count.
impl Mul<i64> for Quantity {
    type Output = Self;

    #[inline]
    fn mul(self, count: i64) -> Self {
        Quantity(self.0 * count)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts `"30.25"`, `30`, or `30.25`.
///
/// JSON numbers with a fraction arrive as `f64`; they are re-read through
/// their shortest round-trip decimal text, so `30.1` becomes exactly 30.10
/// and `30.123` is rejected instead of silently rounded.
impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal quantity with at most 2 fractional digits")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                v.checked_mul(SCALE)
                    .map(Quantity)
                    .ok_or_else(|| E::custom("quantity is out of range"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom("quantity is out of range"))
                    .and_then(|v| self.visit_i64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
                if !v.is_finite() {
                    return Err(E::custom("quantity must be finite"));
                }
                v.to_string().parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
