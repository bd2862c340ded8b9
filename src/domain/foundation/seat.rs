//! Seat number value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A seat position at a gaming table, 1-based.
///
/// Constructed through [`SeatNumber::new`], which bounds the value against
/// the owning table's seat count. A `SeatNumber` on its own is just a
/// position; whether it is occupied is the seat occupancy index's business.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SeatNumber(u8);

impl SeatNumber {
    /// Creates a seat number bounded by the table's seat count.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `number` is zero or exceeds `seat_count`
    pub fn new(number: u8, seat_count: u8) -> Result<Self, ValidationError> {
        if number == 0 || number > seat_count {
            return Err(ValidationError::out_of_range(
                "seat_number",
                1,
                seat_count as i32,
                number as i32,
            ));
        }
        Ok(Self(number))
    }

    /// Returns the raw 1-based seat position.
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
