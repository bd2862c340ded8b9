//! Table module - physical tables and their lifecycle status.

mod aggregate;
mod status;

pub use aggregate::{GameType, Table, MAX_LABEL_LENGTH};
pub use status::TableStatus;
