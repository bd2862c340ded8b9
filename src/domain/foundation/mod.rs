//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the floor-tracking domain.

mod actor;
mod errors;
mod ids;
mod money;
mod seat;
mod state_machine;
mod timestamp;

pub use actor::ActorContext;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    CasinoId, EventId, IdempotencyKey, PlayerId, SlipId, StaffId, TableId, VisitId,
};
pub use money::ChipAmount;
pub use seat::SeatNumber;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
