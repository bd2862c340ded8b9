//! Rating slip status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a rating slip.
///
/// `Open` and `Paused` slips hold their seat; `Closed` is terminal and
/// releases it. Pause/resume toggles freely; close is reachable from both
/// non-terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlipStatus {
    /// Player is seated and play is being rated.
    Open,
    /// Player stepped away; the seat stays claimed.
    Paused,
    /// Session ended. Terminal.
    Closed,
}

impl SlipStatus {
    /// Whether a slip in this status still claims its seat.
    pub fn holds_seat(&self) -> bool {
        !matches!(self, SlipStatus::Closed)
    }
}

impl StateMachine for SlipStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SlipStatus::*;
        matches!(
            (self, target),
            (Open, Paused) | (Paused, Open) | (Open, Closed) | (Paused, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SlipStatus::*;
        match self {
            Open => vec![Paused, Closed],
            Paused => vec![Open, Closed],
            Closed => vec![],
        }
    }
}
