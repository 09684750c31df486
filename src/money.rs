//! Fixed-point money arithmetic.
//!
//! Every amount is a `rust_decimal::Decimal` held at [`MONEY_SCALE`] decimal
//! places. Sums and differences are exact; products and quotients are rounded
//! back to the scale, midpoint away from zero. Amounts cross serialization
//! boundaries as decimal strings, never as floats.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::currency::Currency;

/// Number of decimal places kept on every stored amount.
pub const MONEY_SCALE: u32 = 4;

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// A currency-agnostic monetary amount.
///
/// Negative values are valid and meaningful (deductions, over-collected
/// balances); nothing saturates at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount, rounding to [`MONEY_SCALE`].
    pub fn new(amount: Decimal) -> Self {
        Money(amount.round_dp_with_strategy(MONEY_SCALE, ROUNDING))
    }

    pub fn from_int(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// Builds an amount from a provider's smallest currency unit
    /// (e.g. cents with a factor of 100).
    pub fn from_minor_units(units: i64, smallest_unit_factor: i64) -> Option<Self> {
        Decimal::from(units)
            .checked_div(Decimal::from(smallest_unit_factor))
            .map(Money::new)
    }

    pub fn amount(self) -> Decimal {
        self.0
    }

    /// Returns `None` when the product overflows.
    pub fn multiply_by_int(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(factor)).map(Money)
    }

    /// Returns `None` when the sum overflows.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Multiplies by a fraction such as a card fee rate (`0.029`).
    pub fn multiply_by_rate(self, rate: Decimal) -> Money {
        Money::new(self.0 * rate)
    }

    /// `self × percentage / 100`, rounded once.
    pub fn apply_percentage(self, percentage: Decimal) -> Money {
        Money::new(self.0 * percentage / Decimal::ONE_HUNDRED)
    }

    /// Returns `None` when `divisor` is zero.
    pub fn divide_by_int(self, divisor: i64) -> Option<Money> {
        self.0.checked_div(Decimal::from(divisor)).map(Money::new)
    }

    pub fn abs(self) -> Money {
        Money(self.0.abs())
    }

    pub fn greater_than(self, threshold: Money) -> bool {
        self > threshold
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Adds an optional amount, treating absence as zero.
    pub fn add_opt(self, other: Option<Money>) -> Money {
        self + other.or_zero()
    }

    /// Subtracts an optional amount, treating absence as zero.
    pub fn sub_opt(self, other: Option<Money>) -> Money {
        self - other.or_zero()
    }

    /// Rounds to `decimal_places` for display or settlement.
    pub fn round_to(self, decimal_places: u32) -> Money {
        Money(self.0.round_dp_with_strategy(decimal_places, ROUNDING))
    }

    /// Converts to a payment provider's smallest unit, e.g. `12.345 USD` with
    /// a factor of 100 becomes `1235`.
    pub fn to_minor_units(self, smallest_unit_factor: i64) -> Option<i64> {
        self.0
            .checked_mul(Decimal::from(smallest_unit_factor))?
            .round_dp_with_strategy(0, ROUNDING)
            .to_i64()
    }

    /// Human readable amount with the currency symbol and thousands
    /// separators, e.g. `$11,311.40` or `-₫25,000`.
    pub fn format(self, currency: Currency) -> String {
        let precision = currency.precision();
        let rounded = self.0.abs().round_dp_with_strategy(precision, ROUNDING);
        let digits = format!("{:.*}", precision as usize, rounded);
        let (integer, fraction) = match digits.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (digits.as_str(), None),
        };

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (idx, ch) in integer.chars().enumerate() {
            if idx > 0 && (integer.len() - idx) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.is_negative() && !rounded.is_zero() { "-" } else { "" };
        match fraction {
            Some(fraction) => format!("{}{}{}.{}", sign, currency.symbol(), grouped, fraction),
            None => format!("{}{}{}", sign, currency.symbol(), grouped),
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// Helpers for amounts that may not have been computed yet.
///
/// Absent is not zero: `None` means "not yet quoted". These helpers only read
/// absence as zero when an absent amount is used as an operand.
pub trait OptionalMoney {
    fn or_zero(self) -> Money;

    fn is_zero_or_absent(&self) -> bool;

    /// Sums two optional amounts, staying absent only when both are absent.
    fn combine(self, other: Option<Money>) -> Option<Money>;
}

impl OptionalMoney for Option<Money> {
    fn or_zero(self) -> Money {
        self.unwrap_or(Money::ZERO)
    }

    fn is_zero_or_absent(&self) -> bool {
        self.map_or(true, Money::is_zero)
    }

    fn combine(self, other: Option<Money>) -> Option<Money> {
        match (self, other) {
            (None, None) => None,
            (lhs, rhs) => Some(lhs.or_zero() + rhs.or_zero()),
        }
    }
}
