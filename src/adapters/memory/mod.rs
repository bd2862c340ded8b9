//! In-memory floor store.
//!
//! Reference implementation of [`FloorStore`] used by tests and embedded
//! deployments. All floor state lives behind one async lock; a batch is
//! validated and applied against a copy of the state, and the copy is
//! swapped in only when every write succeeds. A failed conditional write
//! therefore aborts the whole batch with no partial effects, and batches
//! are serialized, which realizes the per-(table, seat) ordering contract:
//! of two concurrent claims for the same free seat, exactly one commits.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::domain::audit::{AuditEvent, AuditSubject};
use crate::domain::foundation::{
    CasinoId, IdempotencyKey, PlayerId, SeatNumber, SlipId, TableId, Timestamp, VisitId,
};
use crate::domain::gaming_day::GamingDay;
use crate::domain::idempotency::IdempotencyRecord;
use crate::domain::slip::RatingSlip;
use crate::domain::table::Table;
use crate::domain::visit::Visit;
use crate::ports::{FloorStore, FloorWrite, StoreError};

/// Everything the store knows, cloned per batch for all-or-nothing apply.
#[derive(Debug, Clone, Default)]
struct FloorState {
    tables: HashMap<TableId, Table>,
    slips: HashMap<SlipId, RatingSlip>,
    visits: HashMap<VisitId, Visit>,
    seats: HashMap<(TableId, SeatNumber), SlipId>,
    audit: Vec<AuditEvent>,
    idempotency: HashMap<IdempotencyKey, IdempotencyRecord>,
}

impl FloorState {
    /// Apply one write, mutating this (working-copy) state.
    fn apply_write(&mut self, write: FloorWrite, now: Timestamp) -> Result<(), StoreError> {
        match write {
            FloorWrite::InsertSlip(slip) => {
                let id = *slip.id();
                if self.slips.contains_key(&id) {
                    return Err(StoreError::DuplicateSlip(id));
                }
                self.slips.insert(id, slip);
            }
            FloorWrite::UpdateSlip {
                slip,
                expected_status,
            } => {
                let id = *slip.id();
                let current = self.slips.get(&id).ok_or(StoreError::SlipMissing(id))?;
                if current.status() != expected_status {
                    return Err(StoreError::StaleSlip(id));
                }
                self.slips.insert(id, slip);
            }
            FloorWrite::InsertTable(table) => {
                let id = *table.id();
                if self.tables.contains_key(&id) {
                    return Err(StoreError::DuplicateTable(id));
                }
                self.tables.insert(id, table);
            }
            FloorWrite::UpdateTable {
                table,
                expected_status,
            } => {
                let id = *table.id();
                let current = self.tables.get(&id).ok_or(StoreError::TableMissing(id))?;
                if current.status() != expected_status {
                    return Err(StoreError::StaleTable(id));
                }
                self.tables.insert(id, table);
            }
            FloorWrite::InsertVisit(visit) => {
                let id = *visit.id();
                if self.visits.contains_key(&id) {
                    return Err(StoreError::DuplicateVisit(id));
                }
                self.visits.insert(id, visit);
            }
            FloorWrite::UpdateVisit(visit) => {
                let id = *visit.id();
                if !self.visits.contains_key(&id) {
                    return Err(StoreError::VisitMissing(id));
                }
                self.visits.insert(id, visit);
            }
            FloorWrite::CheckTableStatus {
                table_id,
                expected_status,
            } => {
                let current = self
                    .tables
                    .get(&table_id)
                    .ok_or(StoreError::TableMissing(table_id))?;
                if current.status() != expected_status {
                    return Err(StoreError::StaleTable(table_id));
                }
            }
            FloorWrite::CheckNoActiveSlips { table_id } => {
                let occupied = self
                    .slips
                    .values()
                    .any(|slip| slip.table_id() == &table_id && slip.holds_seat());
                if occupied {
                    return Err(StoreError::OpenSlipsRemain(table_id));
                }
            }
            FloorWrite::CheckNoActiveSlipsForVisit { visit_id } => {
                let open = self
                    .slips
                    .values()
                    .any(|slip| slip.visit_id() == &visit_id && slip.holds_seat());
                if open {
                    return Err(StoreError::OpenSlipsRemainForVisit(visit_id));
                }
            }
            FloorWrite::Reserve {
                table_id,
                seat,
                slip_id,
            } => match self.seats.get(&(table_id, seat)) {
                Some(holder) if *holder != slip_id => {
                    return Err(StoreError::SeatConflict { table_id, seat });
                }
                _ => {
                    self.seats.insert((table_id, seat), slip_id);
                }
            },
            FloorWrite::Release {
                table_id,
                seat,
                slip_id,
            } => match self.seats.get(&(table_id, seat)) {
                Some(holder) if *holder == slip_id => {
                    self.seats.remove(&(table_id, seat));
                }
                _ => return Err(StoreError::ReleaseMismatch { table_id, seat }),
            },
            FloorWrite::AppendAudit(event) => {
                self.audit.push(event);
            }
            FloorWrite::PutIdempotency(record) => {
                let live = self
                    .idempotency
                    .get(&record.key)
                    .map(|existing| !existing.is_expired(now))
                    .unwrap_or(false);
                if live {
                    return Err(StoreError::DuplicateIdempotencyKey(record.key.clone()));
                }
                self.idempotency.insert(record.key.clone(), record);
            }
        }
        Ok(())
    }
}

/// In-memory [`FloorStore`].
#[derive(Default)]
pub struct InMemoryFloorStore {
    state: RwLock<FloorState>,
}

impl InMemoryFloorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of audit events appended so far. Test observability.
    pub async fn audit_len(&self) -> usize {
        self.state.read().await.audit.len()
    }
}

#[async_trait]
impl FloorStore for InMemoryFloorStore {
    async fn apply(&self, writes: Vec<FloorWrite>) -> Result<(), StoreError> {
        let now = Timestamp::now();
        let mut state = self.state.write().await;

        // Work on a copy so intra-batch writes see each other while a
        // failure anywhere leaves the committed state untouched.
        let mut next = state.clone();
        for write in writes {
            next.apply_write(write, now)?;
        }
        *state = next;
        Ok(())
    }

    async fn slip(&self, id: &SlipId) -> Result<Option<RatingSlip>, StoreError> {
        Ok(self.state.read().await.slips.get(id).cloned())
    }

    async fn table(&self, id: &TableId) -> Result<Option<Table>, StoreError> {
        Ok(self.state.read().await.tables.get(id).cloned())
    }

    async fn visit(&self, id: &VisitId) -> Result<Option<Visit>, StoreError> {
        Ok(self.state.read().await.visits.get(id).cloned())
    }

    async fn active_slips_for_table(
        &self,
        table_id: &TableId,
    ) -> Result<Vec<RatingSlip>, StoreError> {
        let state = self.state.read().await;
        let mut slips: Vec<RatingSlip> = state
            .slips
            .values()
            .filter(|slip| slip.table_id() == table_id && slip.holds_seat())
            .cloned()
            .collect();
        slips.sort_by_key(|slip| slip.seat_number());
        Ok(slips)
    }

    async fn active_slips_for_visit(
        &self,
        visit_id: &VisitId,
    ) -> Result<Vec<RatingSlip>, StoreError> {
        let state = self.state.read().await;
        let mut slips: Vec<RatingSlip> = state
            .slips
            .values()
            .filter(|slip| slip.visit_id() == visit_id && slip.holds_seat())
            .cloned()
            .collect();
        slips.sort_by_key(|slip| *slip.started_at());
        Ok(slips)
    }

    async fn occupancy(
        &self,
        table_id: &TableId,
    ) -> Result<BTreeMap<SeatNumber, SlipId>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .seats
            .iter()
            .filter(|((table, _), _)| table == table_id)
            .map(|((_, seat), slip_id)| (*seat, *slip_id))
            .collect())
    }

    async fn find_visit(
        &self,
        player_id: &PlayerId,
        casino_id: &CasinoId,
        gaming_day: GamingDay,
    ) -> Result<Option<Visit>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .visits
            .values()
            .find(|visit| {
                visit.player_id() == player_id
                    && visit.casino_id() == casino_id
                    && visit.gaming_day() == gaming_day
            })
            .cloned())
    }

    async fn idempotency(
        &self,
        key: &IdempotencyKey,
        now: Timestamp,
    ) -> Result<Option<IdempotencyRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .idempotency
            .get(key)
            .filter(|record| !record.is_expired(now))
            .cloned())
    }

    async fn audit_for_subject(
        &self,
        subject: &AuditSubject,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .audit
            .iter()
            .filter(|event| event.subject == *subject)
            .cloned()
            .collect())
    }

    async fn audit_for_correlation(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .audit
            .iter()
            .filter(|event| event.correlation_id == correlation_id)
            .cloned()
            .collect())
    }
}
