//! CreateSlipHandler - open a rating slip at a free seat.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::error::FloorError;
use crate::application::handlers::{record_rejection, snapshot};
use crate::application::idempotency::IdempotencyGuard;
use crate::domain::audit::{AuditAction, AuditEvent, AuditSubject};
use crate::domain::foundation::{
    ActorContext, ChipAmount, IdempotencyKey, PlayerId, SlipId, TableId, Timestamp, VisitId,
};
use crate::domain::gaming_day::GamingDayConfig;
use crate::domain::occupancy::SeatOccupancyIndex;
use crate::domain::slip::RatingSlip;
use crate::domain::table::TableStatus;
use crate::ports::{FloorStore, FloorWrite, StoreError};

const OPERATION: &str = "slip.create";

/// Command to open a slip at a seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlipCommand {
    pub table_id: TableId,
    pub seat_number: u8,
    pub visit_id: VisitId,
    pub player_id: Option<PlayerId>,
    pub average_bet: Option<ChipAmount>,
    pub idempotency_key: IdempotencyKey,
}

/// Handler for opening slips.
pub struct CreateSlipHandler {
    store: Arc<dyn FloorStore>,
    occupancy: SeatOccupancyIndex,
    guard: IdempotencyGuard,
    gaming_day: GamingDayConfig,
}

impl CreateSlipHandler {
    pub fn new(
        store: Arc<dyn FloorStore>,
        occupancy: SeatOccupancyIndex,
        guard: IdempotencyGuard,
        gaming_day: GamingDayConfig,
    ) -> Self {
        Self {
            store,
            occupancy,
            guard,
            gaming_day,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSlipCommand,
        ctx: ActorContext,
    ) -> Result<RatingSlip, FloorError> {
        let payload = serde_json::to_value(&cmd)
            .map_err(|e| FloorError::storage(format!("command not serializable: {}", e)))?;
        let request = self
            .guard
            .keyed(cmd.idempotency_key.clone(), OPERATION, &payload);

        // 1. Replay a committed result for this key.
        if let Some(stored) = self.guard.check::<RatingSlip>(&request).await? {
            debug!(key = %request.key(), "replaying stored slip.create result");
            return Ok(stored);
        }

        let correlation = ctx.correlation_id();

        // 2. Table must exist and be dealing.
        let table = self
            .store
            .table(&cmd.table_id)
            .await
            .map_err(FloorError::from_store)?
            .ok_or(FloorError::TableNotFound(cmd.table_id))?;
        if !table.status().accepts_slips() {
            return Err(self
                .reject(
                    &ctx,
                    &correlation,
                    AuditSubject::Table(cmd.table_id),
                    FloorError::TableNotActive(cmd.table_id),
                )
                .await);
        }
        let seat = table.seat(cmd.seat_number)?;

        // 3. Visit must exist and be open.
        let visit = self
            .store
            .visit(&cmd.visit_id)
            .await
            .map_err(FloorError::from_store)?
            .ok_or(FloorError::VisitNotFound(cmd.visit_id))?;
        if !visit.is_open() {
            return Err(self
                .reject(
                    &ctx,
                    &correlation,
                    AuditSubject::Visit(cmd.visit_id),
                    FloorError::invalid_transition(format!(
                        "visit {} has already ended",
                        cmd.visit_id
                    )),
                )
                .await);
        }

        // 4. Build the slip and commit it with its seat claim in one batch.
        //    The table-status guard re-binds inside the batch; the read in
        //    step 2 only shapes the error.
        let now = Timestamp::now();
        let slip = RatingSlip::open(
            SlipId::new(),
            *table.id(),
            seat,
            *visit.id(),
            cmd.player_id,
            cmd.average_bet.unwrap_or_else(ChipAmount::zero),
            self.gaming_day.resolve(now),
            now,
        );
        let slip_id = *slip.id();

        let audit = AuditEvent::transition(
            &ctx,
            &correlation,
            AuditAction::SlipCreated,
            AuditSubject::Slip(slip_id),
            None,
            snapshot(&slip),
            now,
        );
        let writes = vec![
            FloorWrite::CheckTableStatus {
                table_id: *table.id(),
                expected_status: TableStatus::Active,
            },
            FloorWrite::InsertSlip(slip.clone()),
            self.occupancy.claim(*table.id(), seat, slip_id),
            FloorWrite::AppendAudit(audit),
            self.guard.record(&request, &slip, now)?,
        ];

        match self.store.apply(writes).await {
            Ok(()) => {
                info!(%slip_id, table_id = %table.id(), %seat, "rating slip opened");
                Ok(slip)
            }
            Err(StoreError::SeatConflict { table_id, seat }) => Err(self
                .reject(
                    &ctx,
                    &correlation,
                    AuditSubject::Table(table_id),
                    FloorError::SeatConflict { table_id, seat },
                )
                .await),
            Err(StoreError::StaleTable(table_id)) => Err(self
                .reject(
                    &ctx,
                    &correlation,
                    AuditSubject::Table(table_id),
                    FloorError::TableNotActive(table_id),
                )
                .await),
            Err(StoreError::DuplicateIdempotencyKey(_)) => {
                // Lost a same-key race; the winner's result stands.
                self.guard.replay(&request).await
            }
            Err(other) => Err(FloorError::from_store(other)),
        }
    }

    async fn reject(
        &self,
        ctx: &ActorContext,
        correlation: &str,
        subject: AuditSubject,
        error: FloorError,
    ) -> FloorError {
        record_rejection(
            self.store.as_ref(),
            ctx,
            correlation,
            OPERATION,
            subject,
            error.code(),
        )
        .await;
        error
    }
}
