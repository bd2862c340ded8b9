//! ResumeSlipHandler - resume rating after a pause.

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

const OPERATION: &str = "slip.resume";

/// Command to resume a paused slip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSlipCommand {
    pub slip_id: SlipId,
    pub idempotency_key: IdempotencyKey,
}

/// Handler for resuming slips.
pub struct ResumeSlipHandler {
    store: Arc<dyn FloorStore>,
    guard: IdempotencyGuard,
}

impl ResumeSlipHandler {
    pub fn new(store: Arc<dyn FloorStore>, guard: IdempotencyGuard) -> Self {
        Self { store, guard }
    }

    pub async fn handle(
        &self,
        cmd: ResumeSlipCommand,
        ctx: ActorContext,
    ) -> Result<RatingSlip, FloorError> {
        let payload = serde_json::to_value(&cmd)
            .map_err(|e| FloorError::storage(format!("command not serializable: {}", e)))?;
        let request = self
            .guard
            .keyed(cmd.idempotency_key.clone(), OPERATION, &payload);

        if let Some(stored) = self.guard.check::<RatingSlip>(&request).await? {
            debug!(key = %request.key(), "replaying stored slip.resume result");
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
        let previous_status = match slip.resume() {
            Ok(status) => status,
            Err(err) => {
                return Err(self.reject(&ctx, &correlation, subject, err.into()).await);
            }
        };

        let now = Timestamp::now();
        let audit = AuditEvent::transition(
            &ctx,
            &correlation,
            AuditAction::SlipResumed,
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
                info!(slip_id = %cmd.slip_id, "rating slip resumed");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryFloorStore;
    use crate::domain::foundation::{ChipAmount, SeatNumber, TableId, VisitId};
    use crate::domain::gaming_day::GamingDay;
    use crate::domain::slip::SlipStatus;
    use chrono::NaiveDate;

    async fn seeded_paused_slip(store: &Arc<InMemoryFloorStore>) -> RatingSlip {
        let mut slip = RatingSlip::open(
            SlipId::new(),
            TableId::new(),
            SeatNumber::new(2, 7).unwrap(),
            VisitId::new(),
            None,
            ChipAmount::from_major(25),
            GamingDay::from_date(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()),
            Timestamp::now(),
        );
        slip.pause().unwrap();
        store
            .apply(vec![FloorWrite::InsertSlip(slip.clone())])
            .await
            .unwrap();
        slip
    }

    fn handler(store: &Arc<InMemoryFloorStore>) -> ResumeSlipHandler {
        ResumeSlipHandler::new(store.clone(), IdempotencyGuard::new(store.clone(), 3600))
    }

    fn command(slip_id: SlipId, key: &str) -> ResumeSlipCommand {
        ResumeSlipCommand {
            slip_id,
            idempotency_key: IdempotencyKey::new(key).unwrap(),
        }
    }

    #[tokio::test]
    async fn resumes_a_paused_slip() {
        let store = Arc::new(InMemoryFloorStore::new());
        let slip = seeded_paused_slip(&store).await;

        let resumed = handler(&store)
            .handle(command(*slip.id(), "req-1"), ActorContext::test_fixture())
            .await
            .unwrap();

        assert_eq!(resumed.status(), SlipStatus::Open);
    }

    #[tokio::test]
    async fn resume_of_open_slip_is_invalid() {
        let store = Arc::new(InMemoryFloorStore::new());
        let slip = seeded_paused_slip(&store).await;
        let handler = handler(&store);
        handler
            .handle(command(*slip.id(), "req-1"), ActorContext::test_fixture())
            .await
            .unwrap();

        // Slip is open now; a resume with a fresh key must be rejected.
        let result = handler
            .handle(command(*slip.id(), "req-2"), ActorContext::test_fixture())
            .await;

        assert!(matches!(result, Err(FloorError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn unknown_slip_is_not_found() {
        let store = Arc::new(InMemoryFloorStore::new());

        let result = handler(&store)
            .handle(command(SlipId::new(), "req-1"), ActorContext::test_fixture())
            .await;

        assert!(matches!(result, Err(FloorError::SlipNotFound(_))));
    }

    #[tokio::test]
    async fn pause_resume_cycle_keeps_seat_claimed() {
        let store = Arc::new(InMemoryFloorStore::new());
        let slip = seeded_paused_slip(&store).await;

        let resumed = handler(&store)
            .handle(command(*slip.id(), "req-1"), ActorContext::test_fixture())
            .await
            .unwrap();

        assert!(resumed.holds_seat());
        assert_eq!(resumed.seat_number(), slip.seat_number());
    }
}
