//! EndVisitHandler - end a player's visit.
//!
//! A visit with non-terminal slips cannot end; the seats must settle
//! first. The check binds inside the commit batch, so a slip opened
//! concurrently aborts the end.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::error::FloorError;
use crate::application::handlers::{record_rejection, snapshot};
use crate::application::idempotency::IdempotencyGuard;
use crate::domain::audit::{AuditAction, AuditEvent, AuditSubject};
use crate::domain::foundation::{ActorContext, IdempotencyKey, Timestamp, VisitId};
use crate::domain::visit::Visit;
use crate::ports::{FloorStore, FloorWrite, StoreError};

const OPERATION: &str = "visit.end";

/// Command to end a visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndVisitCommand {
    pub visit_id: VisitId,
    pub idempotency_key: IdempotencyKey,
}

/// Handler for ending visits.
pub struct EndVisitHandler {
    store: Arc<dyn FloorStore>,
    guard: IdempotencyGuard,
}

impl EndVisitHandler {
    pub fn new(store: Arc<dyn FloorStore>, guard: IdempotencyGuard) -> Self {
        Self { store, guard }
    }

    pub async fn handle(
        &self,
        cmd: EndVisitCommand,
        ctx: ActorContext,
    ) -> Result<Visit, FloorError> {
        let payload = serde_json::to_value(&cmd)
            .map_err(|e| FloorError::storage(format!("command not serializable: {}", e)))?;
        let request = self
            .guard
            .keyed(cmd.idempotency_key.clone(), OPERATION, &payload);

        if let Some(stored) = self.guard.check::<Visit>(&request).await? {
            debug!(key = %request.key(), "replaying stored visit.end result");
            return Ok(stored);
        }

        let correlation = ctx.correlation_id();
        let subject = AuditSubject::Visit(cmd.visit_id);

        let mut visit = self
            .store
            .visit(&cmd.visit_id)
            .await
            .map_err(FloorError::from_store)?
            .ok_or(FloorError::VisitNotFound(cmd.visit_id))?;

        let before = snapshot(&visit);
        let now = Timestamp::now();
        if let Err(err) = visit.end(now) {
            return Err(self.reject(&ctx, &correlation, subject, err.into()).await);
        }

        let audit = AuditEvent::transition(
            &ctx,
            &correlation,
            AuditAction::VisitEnded,
            subject,
            before,
            snapshot(&visit),
            now,
        );
        let writes = vec![
            FloorWrite::CheckNoActiveSlipsForVisit {
                visit_id: cmd.visit_id,
            },
            FloorWrite::UpdateVisit(visit.clone()),
            FloorWrite::AppendAudit(audit),
            self.guard.record(&request, &visit, now)?,
        ];

        match self.store.apply(writes).await {
            Ok(()) => {
                info!(visit_id = %cmd.visit_id, "visit ended");
                Ok(visit)
            }
            Err(StoreError::DuplicateIdempotencyKey(_)) => self.guard.replay(&request).await,
            Err(StoreError::OpenSlipsRemainForVisit(id)) => Err(self
                .reject(
                    &ctx,
                    &correlation,
                    subject,
                    FloorError::VisitHasOpenSlips(id),
                )
                .await),
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
