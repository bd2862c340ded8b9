//! Table status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a gaming table.
///
/// Only an `Active` table accepts new rating slips. `Closed` is terminal;
/// the transition into it is additionally gated on the table having no
/// non-terminal slips (checked at the operation layer, which can see them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Table exists on the floor plan but is not dealing.
    Inactive,
    /// Table is dealing; slips may be opened.
    Active,
    /// Table is retired for the day. Terminal.
    Closed,
}

impl TableStatus {
    /// Whether new slips may be created at a table in this status.
    pub fn accepts_slips(&self) -> bool {
        matches!(self, TableStatus::Active)
    }
}

impl StateMachine for TableStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TableStatus::*;
        matches!(
            (self, target),
            (Inactive, Active) | (Active, Inactive) | (Active, Closed) | (Inactive, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TableStatus::*;
        match self {
            Inactive => vec![Active, Closed],
            Active => vec![Inactive, Closed],
            Closed => vec![],
        }
    }
}
