//! CloseSlipHandler - end a session and release its seat.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::error::FloorError;
use crate::application::handlers::{record_rejection, snapshot};
use crate::application::idempotency::IdempotencyGuard;
use crate::domain::audit::{AuditAction, AuditEvent, AuditSubject};
use crate::domain::foundation::{ActorContext, ChipAmount, IdempotencyKey, SlipId, Timestamp};
use crate::domain::occupancy::SeatOccupancyIndex;
use crate::domain::slip::RatingSlip;
use crate::ports::{FloorStore, FloorWrite, StoreError};

const OPERATION: &str = "slip.close";

/// Command to close a slip, optionally recording settlement chips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSlipCommand {
    pub slip_id: SlipId,
    pub chips_taken: Option<ChipAmount>,
    pub idempotency_key: IdempotencyKey,
}

/// Handler for closing slips.
pub struct CloseSlipHandler {
    store: Arc<dyn FloorStore>,
    occupancy: SeatOccupancyIndex,
    guard: IdempotencyGuard,
}

impl CloseSlipHandler {
    pub fn new(
        store: Arc<dyn FloorStore>,
        occupancy: SeatOccupancyIndex,
        guard: IdempotencyGuard,
    ) -> Self {
        Self {
            store,
            occupancy,
            guard,
        }
    }

    pub async fn handle(
        &self,
        cmd: CloseSlipCommand,
        ctx: ActorContext,
    ) -> Result<RatingSlip, FloorError> {
        let payload = serde_json::to_value(&cmd)
            .map_err(|e| FloorError::storage(format!("command not serializable: {}", e)))?;
        let request = self
            .guard
            .keyed(cmd.idempotency_key.clone(), OPERATION, &payload);

        if let Some(stored) = self.guard.check::<RatingSlip>(&request).await? {
            debug!(key = %request.key(), "replaying stored slip.close result");
            return Ok(stored);
        }

        let correlation = ctx.correlation_id();
        let subject = AuditSubject::Slip(cmd.slip_id);

        let mut slip = self
            .store
            .slip(&cmd.slip_id)
            .await
            .map_err(FloorError::from_store)?
            .ok_or(FloorError::SlipNotFound(cmd.slip_id))?;

        let before = snapshot(&slip);
        let now = Timestamp::now();
        let previous_status = match slip.close(cmd.chips_taken, now) {
            Ok(status) => status,
            Err(err) => {
                return Err(self.reject(&ctx, &correlation, subject, err.into()).await);
            }
        };

        let audit = AuditEvent::transition(
            &ctx,
            &correlation,
            AuditAction::SlipClosed,
            subject,
            before,
            snapshot(&slip),
            now,
        );
        let writes = vec![
            FloorWrite::UpdateSlip {
                slip: slip.clone(),
                expected_status: previous_status,
            },
            self.occupancy
                .release(*slip.table_id(), slip.seat_number(), *slip.id()),
            FloorWrite::AppendAudit(audit),
            self.guard.record(&request, &slip, now)?,
        ];

        match self.store.apply(writes).await {
            Ok(()) => {
                info!(slip_id = %cmd.slip_id, "rating slip closed");
                Ok(slip)
            }
            Err(StoreError::DuplicateIdempotencyKey(_)) => self.guard.replay(&request).await,
            Err(StoreError::StaleSlip(id)) => {
                let err = FloorError::invalid_transition(format!(
                    "slip {} changed concurrently; reload and retry",
                    id
                ));
                Err(self.reject(&ctx, &correlation, subject, err).await)
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
