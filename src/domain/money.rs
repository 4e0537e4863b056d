use crate::error::OrderError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative monetary value.
///
/// Wraps `rust_decimal::Decimal` so prices, subtotals and payment amounts are
/// exact. Construction rejects negative values; subtraction saturates at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, OrderError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(OrderError::ValidationError(format!(
                "Amount must not be negative, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Price of `quantity` units. Fails instead of overflowing.
    pub fn times(self, quantity: u32) -> Result<Self, OrderError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or_else(|| overflow(format!("{} x {quantity}", self.0)))
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, OrderError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| overflow(format!("{} + {}", self.0, rhs.0)))
    }

    /// Adds up `amounts`, failing on overflow.
    pub fn total(amounts: impl IntoIterator<Item = Money>) -> Result<Self, OrderError> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, Money::checked_add)
    }

    /// `percent` of this amount, unrounded. `percent` is expected in `0..=100`.
    pub fn percent(self, percent: Decimal) -> Result<Self, OrderError> {
        let share = (self.0 / Decimal::ONE_HUNDRED)
            .checked_mul(percent)
            .ok_or_else(|| overflow(format!("{percent}% of {}", self.0)))?;
        Ok(Self(share.max(Decimal::ZERO)))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self((self.0 - rhs.0).max(Decimal::ZERO))
    }

    /// Rounds to the policy's minor units and pads the scale, so `5` becomes `5.00`.
    pub fn round(self, policy: &RoundingPolicy) -> Self {
        let mut rounded = self
            .0
            .round_dp_with_strategy(policy.minor_units, policy.mode.strategy());
        rounded.rescale(policy.minor_units);
        Self(rounded)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = OrderError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| OrderError::ValidationError(format!("invalid amount `{s}`: {e}")))?;
        Self::new(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn overflow(expression: String) -> OrderError {
    OrderError::ValidationError(format!("amount out of range: {expression}"))
}

/// ISO-4217 style three-letter currency code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, OrderError> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(OrderError::ValidationError(format!(
                "invalid currency code `{code}`"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("USD".to_string())
    }
}

impl TryFrom<String> for Currency {
    type Error = OrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    #[default]
    HalfUp,
    HalfEven,
    Down,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::Down => RoundingStrategy::ToZero,
        }
    }
}

impl FromStr for RoundingMode {
    type Err = OrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "half_up" => Ok(Self::HalfUp),
            "half_even" => Ok(Self::HalfEven),
            "down" => Ok(Self::Down),
            other => Err(OrderError::ValidationError(format!(
                "unsupported rounding mode `{other}` (expected half_up|half_even|down)"
            ))),
        }
    }
}

/// How computed amounts are rounded to the currency's minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingPolicy {
    pub minor_units: u32,
    pub mode: RoundingMode,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            minor_units: 2,
            mode: RoundingMode::HalfUp,
        }
    }
}
