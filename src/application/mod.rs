//! Application layer - operations composed from domain and ports.

pub mod error;
pub mod handlers;
pub mod idempotency;

pub use error::FloorError;
pub use idempotency::{IdempotencyGuard, KeyedRequest};
