//! Whole-unit money amounts.

use serde::{Deserialize, Serialize};

/// Money amount in whole currency units.
///
/// The storefront prices in a currency without a minor unit in practice, so
/// amounts are plain integers (e.g. `1_800_000` is one million eight hundred
/// thousand).
///
/// Arithmetic saturates at the `i64` bounds instead of wrapping or panicking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a money amount from whole units.
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in whole units.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }
}

impl std::fmt::Display for Money {
    /// Formats with comma thousands separators, e.g. `-1,800,000`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-{grouped}")
        } else {
            write!(f, "{grouped}")
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display_groups_thousands() {
        assert_eq!(Money::new(0).to_string(), "0");
        assert_eq!(Money::new(999).to_string(), "999");
        assert_eq!(Money::new(1_000).to_string(), "1,000");
        assert_eq!(Money::new(1_800_000).to_string(), "1,800,000");
        assert_eq!(Money::new(-50_000).to_string(), "-50,000");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(1000);
        let b = Money::new(500);

        assert_eq!((a + b).amount(), 1500);
        assert_eq!((a - b).amount(), 500);
        assert_eq!(a.multiply(3).amount(), 3000);
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::new(1), Money::new(2), Money::new(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::new(6));

        let empty: Money = std::iter::empty().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_money_sign() {
        assert!(Money::new(100).is_positive());
        assert!(Money::zero().is_zero());
        assert!(Money::new(-100).is_negative());
    }

    #[test]
    fn test_money_saturates_instead_of_overflowing() {
        let huge = Money::new(i64::MAX / 2 + 1);
        assert_eq!(huge.multiply(2), Money::new(i64::MAX));
        assert_eq!(huge + huge, Money::new(i64::MAX));
        assert_eq!(Money::new(i64::MIN) - Money::new(1), Money::new(i64::MIN));

        let total: Money = [huge, huge, huge].into_iter().sum();
        assert_eq!(total, Money::new(i64::MAX));
    }

    #[test]
    fn test_money_assign_ops() {
        let mut money = Money::new(100);
        money += Money::new(50);
        money -= Money::new(30);
        assert_eq!(money.amount(), 120);
    }
}
