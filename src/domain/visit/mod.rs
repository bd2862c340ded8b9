//! Visit aggregate - a player's presence on the floor within one gaming day.
//!
//! Visits group rating slips. A player has at most one open visit per
//! casino per gaming day; ending a visit and coming back before the
//! cutoff reopens the same visit with `resumed` set.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CasinoId, DomainError, ErrorCode, PlayerId, Timestamp, VisitId,
};
use crate::domain::gaming_day::GamingDay;

/// Visit aggregate.
///
/// # Invariants
///
/// - `ended_at` is `None` exactly while the visit is open
/// - `resumed` is set once the visit has been reopened at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// Unique identifier for this visit.
    id: VisitId,

    /// The visiting player.
    player_id: PlayerId,

    /// Casino property being visited.
    casino_id: CasinoId,

    /// Gaming day the visit belongs to.
    gaming_day: GamingDay,

    /// When the visit started.
    started_at: Timestamp,

    /// When the visit ended, if it has.
    ended_at: Option<Timestamp>,

    /// Whether the visit has been reopened after ending.
    resumed: bool,
}

impl Visit {
    /// Start a new visit.
    pub fn start(
        id: VisitId,
        player_id: PlayerId,
        casino_id: CasinoId,
        gaming_day: GamingDay,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            player_id,
            casino_id,
            gaming_day,
            started_at: now,
            ended_at: None,
            resumed: false,
        }
    }

    /// Returns the visit ID.
    pub fn id(&self) -> &VisitId {
        &self.id
    }

    /// Returns the visiting player.
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// Returns the casino property.
    pub fn casino_id(&self) -> &CasinoId {
        &self.casino_id
    }

    /// Returns the gaming day the visit belongs to.
    pub fn gaming_day(&self) -> GamingDay {
        self.gaming_day
    }

    /// Returns when the visit started.
    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    /// Returns when the visit ended, if it has.
    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    /// Whether the visit has been reopened after ending.
    pub fn resumed(&self) -> bool {
        self.resumed
    }

    /// Whether the visit is currently open.
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// End the visit.
    ///
    /// The "no open slips" rule lives in the operation layer, which can
    /// see the slips.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the visit is already ended
    pub fn end(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if !self.is_open() {
            return Err(DomainError::new(
                ErrorCode::InvalidTransition,
                "Visit is already ended",
            ));
        }
        self.ended_at = Some(now);
        Ok(())
    }

    /// Reopen an ended visit within the same gaming day.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the visit is still open
    pub fn reopen(&mut self) -> Result<(), DomainError> {
        if self.is_open() {
            return Err(DomainError::new(
                ErrorCode::InvalidTransition,
                "Visit is already open",
            ));
        }
        self.ended_at = None;
        self.resumed = true;
        Ok(())
    }
}
