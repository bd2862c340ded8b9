//! Seat occupancy index - the single gate for seat claims.
//!
//! At most one non-terminal slip may claim a given (table, seat). The
//! claim map itself lives in the floor store, where `Reserve` is a
//! transactional conditional write; this service is the only place that
//! constructs claim and release writes, so every mutation path funnels
//! through one component instead of scattering seat checks across call
//! sites.
//!
//! `probe` is informational: it lets an orchestrator fail fast with a
//! useful error, but the binding check is always the `Reserve` inside the
//! operation's own batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::foundation::{SeatNumber, SlipId, TableId};
use crate::ports::{FloorStore, FloorWrite, StoreError};

/// Read model plus write-builder for seat claims.
#[derive(Clone)]
pub struct SeatOccupancyIndex {
    store: Arc<dyn FloorStore>,
}

impl SeatOccupancyIndex {
    /// Creates an index over the given store.
    pub fn new(store: Arc<dyn FloorStore>) -> Self {
        Self { store }
    }

    /// Build the conditional write that claims a seat for a slip.
    ///
    /// The claim binds inside the batch it is applied with: if the seat is
    /// taken by another slip at commit time, the whole batch aborts with
    /// `SeatConflict`.
    pub fn claim(&self, table_id: TableId, seat: SeatNumber, slip_id: SlipId) -> FloorWrite {
        FloorWrite::Reserve {
            table_id,
            seat,
            slip_id,
        }
    }

    /// Build the write that releases a seat held by a slip.
    pub fn release(&self, table_id: TableId, seat: SeatNumber, slip_id: SlipId) -> FloorWrite {
        FloorWrite::Release {
            table_id,
            seat,
            slip_id,
        }
    }

    /// Which slip currently claims a seat, if any. Informational only;
    /// the answer can be stale by the time a batch commits.
    pub async fn probe(
        &self,
        table_id: &TableId,
        seat: SeatNumber,
    ) -> Result<Option<SlipId>, StoreError> {
        Ok(self.store.occupancy(table_id).await?.get(&seat).copied())
    }

    /// The full seat → slip claim map for a table.
    pub async fn lookup(
        &self,
        table_id: &TableId,
    ) -> Result<BTreeMap<SeatNumber, SlipId>, StoreError> {
        self.store.occupancy(table_id).await
    }
}
