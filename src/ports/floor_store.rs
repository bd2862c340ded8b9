//! Floor store port - the transactional persistence primitive.
//!
//! Every mutating operation in the core builds exactly one [`FloorWrite`]
//! batch and submits it through [`FloorStore::apply`]. The store commits
//! the batch atomically or not at all: if any conditional write fails
//! (seat already claimed, stale status, duplicate idempotency key), no
//! write in the batch is applied and the typed [`StoreError`] surfaces to
//! the caller. No observable intermediate state exists for other callers.
//!
//! # Design
//!
//! - **Conditional writes carry their own guards**: `Reserve` fails unless
//!   the seat is free, `UpdateSlip`/`UpdateTable` fail unless the current
//!   status matches the one the caller loaded. This keeps check and write
//!   in one transaction instead of two round trips.
//! - **Serialization point**: concurrent batches touching the same
//!   (table, seat) are serialized by the implementation so that exactly
//!   one `Reserve` succeeds. That is the only ordering contract the core
//!   needs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::audit::{AuditEvent, AuditSubject};
use crate::domain::foundation::{
    CasinoId, IdempotencyKey, PlayerId, SeatNumber, SlipId, TableId, Timestamp, VisitId,
};
use crate::domain::gaming_day::GamingDay;
use crate::domain::idempotency::IdempotencyRecord;
use crate::domain::slip::{RatingSlip, SlipStatus};
use crate::domain::table::{Table, TableStatus};
use crate::domain::visit::Visit;

/// One write in an atomic batch.
///
/// `Reserve` and `Release` are constructed only by the seat occupancy
/// index; handlers never build them directly.
#[derive(Debug, Clone)]
pub enum FloorWrite {
    /// Insert a new slip. Fails on duplicate id.
    InsertSlip(RatingSlip),

    /// Replace a slip, guarded by the status the caller loaded.
    /// Fails with `StaleSlip` if the stored status has since changed.
    UpdateSlip {
        slip: RatingSlip,
        expected_status: SlipStatus,
    },

    /// Insert a new table. Fails on duplicate id.
    InsertTable(Table),

    /// Replace a table, guarded by the status the caller loaded.
    UpdateTable {
        table: Table,
        expected_status: TableStatus,
    },

    /// Insert a new visit. Fails on duplicate id.
    InsertVisit(Visit),

    /// Replace a visit.
    UpdateVisit(Visit),

    /// Assert a table is in the expected status without writing it.
    /// Fails with `StaleTable` on mismatch. Lets a batch that only reads
    /// a table (slip creation) still abort if the table changed.
    CheckTableStatus {
        table_id: TableId,
        expected_status: TableStatus,
    },

    /// Assert a table has no non-terminal slips without writing anything.
    /// Fails with `OpenSlipsRemain`.
    CheckNoActiveSlips { table_id: TableId },

    /// Assert a visit has no non-terminal slips without writing anything.
    /// Fails with `OpenSlipsRemainForVisit`.
    CheckNoActiveSlipsForVisit { visit_id: VisitId },

    /// Claim a seat for a slip. Fails with `SeatConflict` if another slip
    /// holds the seat. Claiming a seat already held by the same slip is a
    /// no-op.
    Reserve {
        table_id: TableId,
        seat: SeatNumber,
        slip_id: SlipId,
    },

    /// Release a seat held by a slip. Fails with `ReleaseMismatch` if the
    /// seat is not held by that slip.
    Release {
        table_id: TableId,
        seat: SeatNumber,
        slip_id: SlipId,
    },

    /// Append one audit event. Unconditional.
    AppendAudit(AuditEvent),

    /// Store an idempotency record. Fails with `DuplicateIdempotencyKey`
    /// if a live record already exists under the key.
    PutIdempotency(IdempotencyRecord),
}

/// Typed failures from the store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("seat {seat} at table {table_id} is already claimed")]
    SeatConflict { table_id: TableId, seat: SeatNumber },

    #[error("seat {seat} at table {table_id} is not held by the releasing slip")]
    ReleaseMismatch { table_id: TableId, seat: SeatNumber },

    #[error("slip {0} was modified concurrently")]
    StaleSlip(SlipId),

    #[error("table {0} was modified concurrently")]
    StaleTable(TableId),

    #[error("slip {0} already exists")]
    DuplicateSlip(SlipId),

    #[error("table {0} already exists")]
    DuplicateTable(TableId),

    #[error("visit {0} already exists")]
    DuplicateVisit(VisitId),

    #[error("slip {0} does not exist")]
    SlipMissing(SlipId),

    #[error("table {0} does not exist")]
    TableMissing(TableId),

    #[error("visit {0} does not exist")]
    VisitMissing(VisitId),

    #[error("table {0} still has non-terminal slips")]
    OpenSlipsRemain(TableId),

    #[error("visit {0} still has non-terminal slips")]
    OpenSlipsRemainForVisit(VisitId),

    #[error("idempotency key {0} already holds a stored result")]
    DuplicateIdempotencyKey(IdempotencyKey),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Port for the transactional floor state store.
///
/// Implementations must guarantee:
/// - `apply` is all-or-nothing: a failed conditional write aborts the
///   whole batch with no partial effects
/// - concurrent `Reserve` writes for the same (table, seat) are
///   serialized: exactly one succeeds
/// - audit events are append-only
#[async_trait]
pub trait FloorStore: Send + Sync {
    /// Atomically apply a batch of writes.
    async fn apply(&self, writes: Vec<FloorWrite>) -> Result<(), StoreError>;

    /// Load a slip by id.
    async fn slip(&self, id: &SlipId) -> Result<Option<RatingSlip>, StoreError>;

    /// Load a table by id.
    async fn table(&self, id: &TableId) -> Result<Option<Table>, StoreError>;

    /// Load a visit by id.
    async fn visit(&self, id: &VisitId) -> Result<Option<Visit>, StoreError>;

    /// All non-terminal slips at a table, ordered by seat.
    async fn active_slips_for_table(
        &self,
        table_id: &TableId,
    ) -> Result<Vec<RatingSlip>, StoreError>;

    /// All non-terminal slips belonging to a visit.
    async fn active_slips_for_visit(
        &self,
        visit_id: &VisitId,
    ) -> Result<Vec<RatingSlip>, StoreError>;

    /// The seat → slip claim map for a table.
    async fn occupancy(
        &self,
        table_id: &TableId,
    ) -> Result<BTreeMap<SeatNumber, SlipId>, StoreError>;

    /// A player's visit for a casino and gaming day, if one exists.
    async fn find_visit(
        &self,
        player_id: &PlayerId,
        casino_id: &CasinoId,
        gaming_day: GamingDay,
    ) -> Result<Option<Visit>, StoreError>;

    /// The live idempotency record under a key, if any. Records past
    /// their expiry behave as absent.
    async fn idempotency(
        &self,
        key: &IdempotencyKey,
        now: Timestamp,
    ) -> Result<Option<IdempotencyRecord>, StoreError>;

    /// Audit events about a subject, in append order.
    async fn audit_for_subject(
        &self,
        subject: &AuditSubject,
    ) -> Result<Vec<AuditEvent>, StoreError>;

    /// Audit events sharing a correlation id, in append order.
    async fn audit_for_correlation(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<AuditEvent>, StoreError>;
}
