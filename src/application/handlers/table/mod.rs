//! Table operation handlers.

mod set_table_status;

pub use set_table_status::{SetTableStatusCommand, SetTableStatusHandler};
