//! Command and query handlers - one per floor operation.

pub mod slip;
pub mod table;
pub mod visit;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::domain::audit::{AuditEvent, AuditSubject};
use crate::domain::foundation::{ActorContext, ErrorCode, Timestamp};
use crate::ports::{FloorStore, FloorWrite};

/// Append the single rejection record for a refused operation.
///
/// The original error always reaches the caller; a failure to write the
/// rejection record is logged and swallowed so it cannot mask the cause.
pub(crate) async fn record_rejection(
    store: &dyn FloorStore,
    ctx: &ActorContext,
    correlation_id: &str,
    operation: &str,
    subject: AuditSubject,
    code: ErrorCode,
) {
    let event = AuditEvent::rejection(ctx, correlation_id, operation, subject, code, Timestamp::now());
    if let Err(error) = store.apply(vec![FloorWrite::AppendAudit(event)]).await {
        tracing::warn!(%error, operation, "failed to append rejection audit record");
    }
}

/// Serialize an entity for an audit snapshot. Snapshot loss is tolerable;
/// transition loss is not, so serialization failure degrades to `None`.
pub(crate) fn snapshot<T: Serialize>(value: &T) -> Option<JsonValue> {
    serde_json::to_value(value).ok()
}
