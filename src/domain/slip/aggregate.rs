//! Rating slip aggregate entity.
//!
//! A rating slip is the timed record of one player session at one seat.
//! Slips are created seated; a "move" never mutates a slip's seat in place,
//! it closes the slip and opens a linked successor at the destination.
//!
//! # Ownership
//!
//! Slips reference their table and visit by ID but do not own them. Seat
//! claims live in the seat occupancy index, not here; this aggregate only
//! records which seat the slip was rated at.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ChipAmount, DomainError, PlayerId, SeatNumber, SlipId, StateMachine, TableId, Timestamp,
    VisitId,
};
use crate::domain::gaming_day::GamingDay;
use crate::domain::slip::SlipStatus;

/// Why a slip reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Normal end of play, settled at the seat.
    Settled,
    /// Closed as the source half of a move; a successor slip exists.
    Moved,
}

/// Rating slip aggregate.
///
/// # Invariants
///
/// - `Closed` is terminal: `ended_at` and `close_reason` are set exactly
///   when status is `Closed`, and no transition leaves `Closed`
/// - `predecessor_slip_id` is set exactly when the slip was opened as the
///   destination half of a move
/// - among non-terminal slips, `(table_id, seat_number)` is unique — that
///   invariant is enforced by the seat occupancy index, not locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSlip {
    /// Unique identifier for this slip.
    id: SlipId,

    /// Table the session is rated at.
    table_id: TableId,

    /// Seat the session is rated at.
    seat_number: SeatNumber,

    /// Visit this slip belongs to.
    visit_id: VisitId,

    /// Tracked player, if known. `None` is a ghost session: play observed
    /// at a seat before the player's card is swiped.
    player_id: Option<PlayerId>,

    /// Current lifecycle status.
    status: SlipStatus,

    /// When rating started.
    started_at: Timestamp,

    /// When the slip closed. Set exactly on transition to `Closed`.
    ended_at: Option<Timestamp>,

    /// Supervisor's estimate of the player's average bet.
    average_bet: ChipAmount,

    /// Chips the player left the seat with, recorded at close.
    chips_taken: Option<ChipAmount>,

    /// Source slip, when this slip was opened by a move.
    predecessor_slip_id: Option<SlipId>,

    /// Why the slip closed. Set exactly on transition to `Closed`.
    close_reason: Option<CloseReason>,

    /// Gaming day the slip was opened under.
    gaming_day: GamingDay,
}

impl RatingSlip {
    /// Open a new slip at a seat.
    pub fn open(
        id: SlipId,
        table_id: TableId,
        seat_number: SeatNumber,
        visit_id: VisitId,
        player_id: Option<PlayerId>,
        average_bet: ChipAmount,
        gaming_day: GamingDay,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            table_id,
            seat_number,
            visit_id,
            player_id,
            status: SlipStatus::Open,
            started_at: now,
            ended_at: None,
            average_bet,
            chips_taken: None,
            predecessor_slip_id: None,
            close_reason: None,
            gaming_day,
        }
    }

    /// Open the destination half of a move.
    ///
    /// Carries the source slip's visit, player, and average bet, and links
    /// back to it through `predecessor_slip_id`.
    pub fn open_from_move(
        id: SlipId,
        source: &RatingSlip,
        table_id: TableId,
        seat_number: SeatNumber,
        gaming_day: GamingDay,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            table_id,
            seat_number,
            visit_id: source.visit_id,
            player_id: source.player_id,
            status: SlipStatus::Open,
            started_at: now,
            ended_at: None,
            average_bet: source.average_bet,
            chips_taken: None,
            predecessor_slip_id: Some(source.id),
            close_reason: None,
            gaming_day,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the slip ID.
    pub fn id(&self) -> &SlipId {
        &self.id
    }

    /// Returns the table the slip is rated at.
    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    /// Returns the seat the slip is rated at.
    pub fn seat_number(&self) -> SeatNumber {
        self.seat_number
    }

    /// Returns the owning visit ID.
    pub fn visit_id(&self) -> &VisitId {
        &self.visit_id
    }

    /// Returns the tracked player, if known.
    pub fn player_id(&self) -> Option<&PlayerId> {
        self.player_id.as_ref()
    }

    /// Returns the current status.
    pub fn status(&self) -> SlipStatus {
        self.status
    }

    /// Returns when rating started.
    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    /// Returns when the slip closed, if it has.
    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    /// Returns the recorded average bet.
    pub fn average_bet(&self) -> ChipAmount {
        self.average_bet
    }

    /// Returns the settlement chips, if recorded.
    pub fn chips_taken(&self) -> Option<ChipAmount> {
        self.chips_taken
    }

    /// Returns the source slip, when this slip was opened by a move.
    pub fn predecessor_slip_id(&self) -> Option<&SlipId> {
        self.predecessor_slip_id.as_ref()
    }

    /// Returns why the slip closed, if it has.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    /// Returns the gaming day the slip was opened under.
    pub fn gaming_day(&self) -> GamingDay {
        self.gaming_day
    }

    /// Whether the slip still claims its seat.
    pub fn holds_seat(&self) -> bool {
        self.status.holds_seat()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Pause rating. The seat stays claimed.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` unless the slip is `Open`
    pub fn pause(&mut self) -> Result<SlipStatus, DomainError> {
        let previous = self.status;
        self.status = self.status.transition_to(SlipStatus::Paused)?;
        Ok(previous)
    }

    /// Resume rating after a pause.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` unless the slip is `Paused`
    pub fn resume(&mut self) -> Result<SlipStatus, DomainError> {
        let previous = self.status;
        self.status = self.status.transition_to(SlipStatus::Open)?;
        Ok(previous)
    }

    /// Close the slip at its seat, optionally recording settlement chips.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the slip is already `Closed`
    pub fn close(
        &mut self,
        chips_taken: Option<ChipAmount>,
        now: Timestamp,
    ) -> Result<SlipStatus, DomainError> {
        let previous = self.status;
        self.status = self.status.transition_to(SlipStatus::Closed)?;
        self.ended_at = Some(now);
        self.chips_taken = chips_taken;
        self.close_reason = Some(CloseReason::Settled);
        Ok(previous)
    }

    /// Close the slip as the source half of a move.
    ///
    /// Settlement chips stay with the player, so none are recorded here.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the slip is already `Closed`
    pub fn close_for_move(&mut self, now: Timestamp) -> Result<SlipStatus, DomainError> {
        let previous = self.status;
        self.status = self.status.transition_to(SlipStatus::Closed)?;
        self.ended_at = Some(now);
        self.close_reason = Some(CloseReason::Moved);
        Ok(previous)
    }
}
