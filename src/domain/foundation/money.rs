//! Chip amount value object.
//!
//! Bet and settlement amounts use exact decimal arithmetic; floats never
//! touch money in this crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A non-negative amount of chips, in the casino's accounting currency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ChipAmount(Decimal);

impl ChipAmount {
    /// Zero chips.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Creates a chip amount, rejecting negative values.
    pub fn new(amount: Decimal) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() {
            return Err(ValidationError::invalid_format(
                "chip_amount",
                format!("amount cannot be negative, got {}", amount),
            ));
        }
        Ok(Self(amount))
    }

    /// Creates a chip amount from whole currency units. Convenience for
    /// call sites that deal in round numbers (minimum bets, test data).
    pub fn from_major(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns the inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for ChipAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
