//! PauseSlipHandler - pause rating while the player steps away.
//!
//! The seat stays claimed; only the slip status changes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::error::FloorError;
use crate::application::handlers::{record_rejection, snapshot};
use crate::application::idempotency::IdempotencyGuard;
use crate::domain::audit::{AuditAction, AuditEvent, AuditSubject};
use crate::domain::foundation::{ActorContext, IdempotencyKey, SlipId, Timestamp};
use crate::domain::slip::RatingSlip;
use crate::ports::{FloorStore, FloorWrite, StoreError};

const OPERATION: &str = "slip.pause";

/// Command to pause an open slip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseSlipCommand {
    pub slip_id: SlipId,
    pub idempotency_key: IdempotencyKey,
}

/// Handler for pausing slips.
pub struct PauseSlipHandler {
    store: Arc<dyn FloorStore>,
    guard: IdempotencyGuard,
}

impl PauseSlipHandler {
    pub fn new(store: Arc<dyn FloorStore>, guard: IdempotencyGuard) -> Self {
        Self { store, guard }
    }

    pub async fn handle(
        &self,
        cmd: PauseSlipCommand,
        ctx: ActorContext,
    ) -> Result<RatingSlip, FloorError> {
        let payload = serde_json::to_value(&cmd)
            .map_err(|e| FloorError::storage(format!("command not serializable: {}", e)))?;
        let request = self
            .guard
            .keyed(cmd.idempotency_key.clone(), OPERATION, &payload);

        if let Some(stored) = self.guard.check::<RatingSlip>(&request).await? {
            debug!(key = %request.key(), "replaying stored slip.pause result");
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
        let previous_status = match slip.pause() {
            Ok(status) => status,
            Err(err) => {
                return Err(self.reject(&ctx, &correlation, subject, err.into()).await);
            }
        };

        let now = Timestamp::now();
        let audit = AuditEvent::transition(
            &ctx,
            &correlation,
            AuditAction::SlipPaused,
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
            FloorWrite::AppendAudit(audit),
            self.guard.record(&request, &slip, now)?,
        ];

        match self.store.apply(writes).await {
            Ok(()) => {
                info!(slip_id = %cmd.slip_id, "rating slip paused");
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
