//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Human-scaled values (token amounts, prices, principal, profit) live here.
//! Raw chain integers are converted exactly through [`Decimal::from_ratio`].

use alloy_primitives::{U256, U512};
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Significant digits a rust_decimal mantissa can always hold.
const MAX_DIGITS: u32 = 28;

/// Lossless decimal numeric type for financial calculations.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to a JSON string so persisted records round-trip exactly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// The multiplicative identity (1).
    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    /// Returns the value 100.
    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Division that yields zero for a zero divisor (or an unrepresentable quotient).
    ///
    /// Zero principal and zero totals are legitimate initial states, so every
    /// ratio in the accounting engine goes through here.
    pub fn safe_div(self, rhs: Decimal) -> Decimal {
        self.0.checked_div(rhs.0).map(Decimal).unwrap_or_default()
    }

    /// Addition, `None` when the sum leaves the 96-bit mantissa range.
    pub fn checked_add(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_add(rhs.0).map(Decimal)
    }

    /// Subtraction, `None` on overflow.
    pub fn checked_sub(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_sub(rhs.0).map(Decimal)
    }

    /// Multiplication, `None` on overflow.
    pub fn checked_mul(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }

    /// Exact conversion of `numerator / denominator` into a Decimal.
    ///
    /// Keeps up to 28 significant digits, truncating the rest. Returns `None`
    /// when the denominator is zero or the whole part needs more than 28 digits.
    pub fn from_ratio(numerator: U512, denominator: U512) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }

        let whole = numerator / denominator;
        if whole >= pow10(MAX_DIGITS) {
            return None;
        }
        let scale = MAX_DIGITS - digit_count(low_u128(&whole)?);

        let scaled = numerator.checked_mul(pow10(scale))? / denominator;
        let mantissa = i128::try_from(low_u128(&scaled)?).ok()?;

        RustDecimal::try_from_i128_with_scale(mantissa, scale)
            .ok()
            .map(|d| Decimal(d.normalize()))
    }

    /// Convert a raw on-chain token amount into whole-token units.
    pub fn from_raw_amount(amount: U256, decimals: u8) -> Option<Self> {
        Self::from_ratio(U512::from(amount), pow10(u32::from(decimals)))
    }
}

/// 10^exp as a 512-bit integer.
pub(crate) fn pow10(exp: u32) -> U512 {
    let ten = U512::from(10u64);
    (0..exp).fold(U512::from(1u64), |acc, _| acc * ten)
}

fn low_u128(value: &U512) -> Option<u128> {
    let limbs = value.as_limbs();
    if limbs[2..].iter().any(|limb| *limb != 0) {
        return None;
    }
    Some((u128::from(limbs[1]) << 64) | u128::from(limbs[0]))
}

fn digit_count(mut value: u128) -> u32 {
    let mut digits = 0;
    while value > 0 {
        value /= 10;
        digits += 1;
    }
    digits
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

// Arithmetic operations
impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::SubAssign for Decimal {
    fn sub_assign(&mut self, rhs: Decimal) {
        self.0 -= rhs.0;
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}
