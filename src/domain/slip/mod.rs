//! Rating slip module - play session lifecycle.

mod aggregate;
mod status;

pub use aggregate::{CloseReason, RatingSlip};
pub use status::SlipStatus;
