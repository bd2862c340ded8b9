//! SetTableStatusHandler - open, idle, or retire a table.
//!
//! Closing a table never cascade-closes its slips: while any non-terminal
//! slip remains, the close is rejected and a supervisor has to settle the
//! seats first.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::error::FloorError;
use crate::application::handlers::{record_rejection, snapshot};
use crate::application::idempotency::IdempotencyGuard;
use crate::domain::audit::{AuditAction, AuditEvent, AuditSubject};
use crate::domain::foundation::{ActorContext, IdempotencyKey, TableId, Timestamp};
use crate::domain::table::{Table, TableStatus};
use crate::ports::{FloorStore, FloorWrite, StoreError};

const OPERATION: &str = "table.set_status";

/// Command to change a table's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTableStatusCommand {
    pub table_id: TableId,
    pub status: TableStatus,
    pub idempotency_key: IdempotencyKey,
}

/// Handler for table status changes.
pub struct SetTableStatusHandler {
    store: Arc<dyn FloorStore>,
    guard: IdempotencyGuard,
}

impl SetTableStatusHandler {
    pub fn new(store: Arc<dyn FloorStore>, guard: IdempotencyGuard) -> Self {
        Self { store, guard }
    }

    pub async fn handle(
        &self,
        cmd: SetTableStatusCommand,
        ctx: ActorContext,
    ) -> Result<Table, FloorError> {
        let payload = serde_json::to_value(&cmd)
            .map_err(|e| FloorError::storage(format!("command not serializable: {}", e)))?;
        let request = self
            .guard
            .keyed(cmd.idempotency_key.clone(), OPERATION, &payload);

        if let Some(stored) = self.guard.check::<Table>(&request).await? {
            debug!(key = %request.key(), "replaying stored table.set_status result");
            return Ok(stored);
        }

        let correlation = ctx.correlation_id();
        let subject = AuditSubject::Table(cmd.table_id);

        let mut table = self
            .store
            .table(&cmd.table_id)
            .await
            .map_err(FloorError::from_store)?
            .ok_or(FloorError::TableNotFound(cmd.table_id))?;

        let before = snapshot(&table);
        let previous_status = match table.change_status(cmd.status) {
            Ok(status) => status,
            Err(err) => {
                return Err(self.reject(&ctx, &correlation, subject, err.into()).await);
            }
        };

        let now = Timestamp::now();
        let audit = AuditEvent::transition(
            &ctx,
            &correlation,
            AuditAction::TableStatusChanged,
            subject,
            before,
            snapshot(&table),
            now,
        );
        let mut writes = Vec::new();
        if cmd.status == TableStatus::Closed {
            // The open-slip check binds in the same transaction as the
            // status write, so a slip created concurrently aborts it.
            writes.push(FloorWrite::CheckNoActiveSlips {
                table_id: cmd.table_id,
            });
        }
        writes.push(FloorWrite::UpdateTable {
            table: table.clone(),
            expected_status: previous_status,
        });
        writes.push(FloorWrite::AppendAudit(audit));
        writes.push(self.guard.record(&request, &table, now)?);

        match self.store.apply(writes).await {
            Ok(()) => {
                info!(table_id = %cmd.table_id, status = ?cmd.status, "table status changed");
                Ok(table)
            }
            Err(StoreError::DuplicateIdempotencyKey(_)) => self.guard.replay(&request).await,
            Err(StoreError::OpenSlipsRemain(id)) => Err(self
                .reject(&ctx, &correlation, subject, FloorError::TableHasOpenSlips(id))
                .await),
            Err(StoreError::StaleTable(id)) => {
                let err = FloorError::invalid_transition(format!(
                    "table {} changed concurrently; reload and retry",
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
