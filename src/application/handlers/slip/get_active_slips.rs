//! GetActiveSlipsHandler - read the live slips at a table.
//!
//! Reads are naturally idempotent and are not keyed.

use std::sync::Arc;

use crate::application::error::FloorError;
use crate::domain::foundation::TableId;
use crate::domain::slip::RatingSlip;
use crate::ports::FloorStore;

/// Handler for listing a table's non-terminal slips.
pub struct GetActiveSlipsHandler {
    store: Arc<dyn FloorStore>,
}

impl GetActiveSlipsHandler {
    pub fn new(store: Arc<dyn FloorStore>) -> Self {
        Self { store }
    }

    /// Non-terminal slips at the table, ordered by seat.
    pub async fn handle(&self, table_id: &TableId) -> Result<Vec<RatingSlip>, FloorError> {
        self.store
            .table(table_id)
            .await
            .map_err(FloorError::from_store)?
            .ok_or(FloorError::TableNotFound(*table_id))?;

        self.store
            .active_slips_for_table(table_id)
            .await
            .map_err(FloorError::from_store)
    }
}
