//! Table aggregate entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CasinoId, ChipAmount, DomainError, SeatNumber, StateMachine, TableId, ValidationError,
};
use crate::domain::table::TableStatus;

/// Maximum length for a table label.
pub const MAX_LABEL_LENGTH: usize = 50;

/// Game dealt at a table. Drives downstream rating math, not lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Blackjack,
    Baccarat,
    Craps,
    Roulette,
    PaiGow,
    Poker,
}

/// A physical gaming table on the floor.
///
/// # Invariants
///
/// - `seat_count` is at least 1 and never changes after creation
/// - `min_bet <= max_bet`
/// - status changes only through [`Table::change_status`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Unique identifier for this table.
    id: TableId,

    /// Casino property the table belongs to.
    casino_id: CasinoId,

    /// Floor label, e.g. "BJ-14".
    label: String,

    /// Game dealt at this table.
    game_type: GameType,

    /// Current lifecycle status.
    status: TableStatus,

    /// Number of physical seats. Fixed at creation.
    seat_count: u8,

    /// Table minimum bet.
    min_bet: ChipAmount,

    /// Table maximum bet.
    max_bet: ChipAmount,
}

impl Table {
    /// Create a new table in `Inactive` status.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the label is empty or too long, the seat
    ///   count is zero, or `min_bet > max_bet`
    pub fn new(
        id: TableId,
        casino_id: CasinoId,
        label: String,
        game_type: GameType,
        seat_count: u8,
        min_bet: ChipAmount,
        max_bet: ChipAmount,
    ) -> Result<Self, DomainError> {
        Self::validate_label(&label)?;
        if seat_count == 0 {
            return Err(ValidationError::out_of_range("seat_count", 1, u8::MAX as i32, 0).into());
        }
        if min_bet > max_bet {
            return Err(DomainError::validation(
                "min_bet",
                format!("min_bet {} exceeds max_bet {}", min_bet, max_bet),
            ));
        }

        Ok(Self {
            id,
            casino_id,
            label,
            game_type,
            status: TableStatus::Inactive,
            seat_count,
            min_bet,
            max_bet,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the table ID.
    pub fn id(&self) -> &TableId {
        &self.id
    }

    /// Returns the owning casino ID.
    pub fn casino_id(&self) -> &CasinoId {
        &self.casino_id
    }

    /// Returns the floor label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the game dealt at this table.
    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    /// Returns the current status.
    pub fn status(&self) -> TableStatus {
        self.status
    }

    /// Returns the number of physical seats.
    pub fn seat_count(&self) -> u8 {
        self.seat_count
    }

    /// Returns the table minimum bet.
    pub fn min_bet(&self) -> ChipAmount {
        self.min_bet
    }

    /// Returns the table maximum bet.
    pub fn max_bet(&self) -> ChipAmount {
        self.max_bet
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates a raw seat position against this table's seat count.
    pub fn seat(&self, number: u8) -> Result<SeatNumber, DomainError> {
        SeatNumber::new(number, self.seat_count).map_err(Into::into)
    }

    /// Change the table status through the state machine.
    ///
    /// The "no non-terminal slips when closing" rule lives in the
    /// operation layer, which can see the slips; this method enforces the
    /// transition table only.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the transition is not allowed
    pub fn change_status(&mut self, target: TableStatus) -> Result<TableStatus, DomainError> {
        let previous = self.status;
        self.status = self.status.transition_to(target)?;
        Ok(previous)
    }

    /// Validates the table label.
    fn validate_label(label: &str) -> Result<(), DomainError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("label", "Label cannot be empty"));
        }
        if trimmed.len() > MAX_LABEL_LENGTH {
            return Err(DomainError::validation(
                "label",
                format!("Label must be {} characters or less", MAX_LABEL_LENGTH),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_table() -> Table {
        Table::new(
            TableId::new(),
            CasinoId::new(),
            "BJ-14".to_string(),
            GameType::Blackjack,
            7,
            ChipAmount::from_major(25),
            ChipAmount::from_major(1000),
        )
        .unwrap()
    }

    #[test]
    fn new_table_is_inactive() {
        assert_eq!(test_table().status(), TableStatus::Inactive);
    }

    #[test]
    fn new_table_rejects_empty_label() {
        let result = Table::new(
            TableId::new(),
            CasinoId::new(),
            "  ".to_string(),
            GameType::Baccarat,
            7,
            ChipAmount::zero(),
            ChipAmount::zero(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_table_rejects_zero_seats() {
        let result = Table::new(
            TableId::new(),
            CasinoId::new(),
            "BJ-15".to_string(),
            GameType::Blackjack,
            0,
            ChipAmount::zero(),
            ChipAmount::zero(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_table_rejects_inverted_limits() {
        let result = Table::new(
            TableId::new(),
            CasinoId::new(),
            "BJ-16".to_string(),
            GameType::Blackjack,
            7,
            ChipAmount::from_major(500),
            ChipAmount::from_major(100),
        );
        assert!(result.is_err());
    }

    #[test]
    fn seat_validates_against_seat_count() {
        let table = test_table();
        assert!(table.seat(7).is_ok());
        assert!(table.seat(8).is_err());
        assert!(table.seat(0).is_err());
    }

    #[test]
    fn change_status_follows_state_machine() {
        let mut table = test_table();
        let previous = table.change_status(TableStatus::Active).unwrap();
        assert_eq!(previous, TableStatus::Inactive);
        assert_eq!(table.status(), TableStatus::Active);
    }

    #[test]
    fn change_status_rejects_reopening_closed_table() {
        let mut table = test_table();
        table.change_status(TableStatus::Closed).unwrap();
        assert!(table.change_status(TableStatus::Active).is_err());
    }
}
