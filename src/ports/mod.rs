//! Ports - contracts the core requires from infrastructure.

mod floor_store;

pub use floor_store::{FloorStore, FloorWrite, StoreError};
