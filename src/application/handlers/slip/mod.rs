//! Slip operation handlers.

mod close_slip;
mod create_slip;
mod get_active_slips;
mod move_slip;
mod pause_slip;
mod resume_slip;

pub use close_slip::{CloseSlipCommand, CloseSlipHandler};
pub use create_slip::{CreateSlipCommand, CreateSlipHandler};
pub use get_active_slips::GetActiveSlipsHandler;
pub use move_slip::{MoveOutcome, MoveSlipCommand, MoveSlipHandler};
pub use pause_slip::{PauseSlipCommand, PauseSlipHandler};
pub use resume_slip::{ResumeSlipCommand, ResumeSlipHandler};
