//! Audit events - the append-only compliance trail.
//!
//! Every committed transition appends exactly one event; rejected
//! operations append exactly one rejection record. Events are immutable
//! once appended and are never deleted by this crate. The two halves of a
//! move share one correlation id.
//!
//! Compliance reporting consumes these records downstream; this module
//! only defines and constructs them.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::domain::foundation::{
    ActorContext, ErrorCode, EventId, SlipId, TableId, Timestamp, VisitId,
};

/// What happened, as an enum rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ Slip lifecycle ═══
    /// Slip opened at a seat.
    SlipCreated,
    /// Rating paused.
    SlipPaused,
    /// Rating resumed.
    SlipResumed,
    /// Slip closed at its seat.
    SlipClosed,
    /// Slip closed as the source half of a move.
    SlipMovedOut,
    /// Slip opened as the destination half of a move.
    SlipMovedIn,

    // ═══ Tables ═══
    /// Table status changed.
    TableStatusChanged,

    // ═══ Visits ═══
    /// Visit started.
    VisitStarted,
    /// Ended visit reopened within its gaming day.
    VisitResumed,
    /// Visit ended.
    VisitEnded,

    // ═══ Rejections ═══
    /// A mutating operation was rejected; no state changed.
    OperationRejected,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The entity an audit event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AuditSubject {
    Slip(SlipId),
    Table(TableId),
    Visit(VisitId),
}

impl fmt::Display for AuditSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditSubject::Slip(id) => write!(f, "slip:{}", id),
            AuditSubject::Table(id) => write!(f, "table:{}", id),
            AuditSubject::Visit(id) => write!(f, "visit:{}", id),
        }
    }
}

/// One immutable entry in the compliance trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// Staff member who performed (or attempted) the operation.
    pub actor_id: String,

    /// What happened.
    pub action: AuditAction,

    /// The entity the event is about.
    pub subject: AuditSubject,

    /// Entity state before the transition, when one existed.
    pub before: Option<JsonValue>,

    /// Entity state after the transition; for rejections, the rejection
    /// code and operation name instead.
    pub after: Option<JsonValue>,

    /// Links the events of one logical operation. The two halves of a
    /// move carry the same value.
    pub correlation_id: String,

    /// When the event occurred.
    pub occurred_at: Timestamp,
}

impl AuditEvent {
    /// Record a committed transition.
    pub fn transition(
        ctx: &ActorContext,
        correlation_id: &str,
        action: AuditAction,
        subject: AuditSubject,
        before: Option<JsonValue>,
        after: Option<JsonValue>,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            actor_id: ctx.actor_id.as_str().to_string(),
            action,
            subject,
            before,
            after,
            correlation_id: correlation_id.to_string(),
            occurred_at,
        }
    }

    /// Record a rejected operation. No other state changed.
    pub fn rejection(
        ctx: &ActorContext,
        correlation_id: &str,
        operation: &str,
        subject: AuditSubject,
        code: ErrorCode,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            actor_id: ctx.actor_id.as_str().to_string(),
            action: AuditAction::OperationRejected,
            subject,
            before: None,
            after: Some(serde_json::json!({
                "operation": operation,
                "code": code.to_string(),
            })),
            correlation_id: correlation_id.to_string(),
            occurred_at,
        }
    }

    /// Whether this event records a rejection rather than a transition.
    pub fn is_rejection(&self) -> bool {
        self.action == AuditAction::OperationRejected
    }
}
