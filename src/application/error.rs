//! Operation-facing error type.
//!
//! Every handler returns `Result<_, FloorError>`; nothing else crosses the
//! core boundary. Conflict variants are retryable with fresh data,
//! invariant variants mean the caller's view is stale.

use crate::domain::foundation::{
    DomainError, ErrorCode, IdempotencyKey, SeatNumber, SlipId, TableId, VisitId,
};
use crate::ports::StoreError;

/// Errors returned by floor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorError {
    /// Slip does not exist.
    SlipNotFound(SlipId),
    /// Table does not exist.
    TableNotFound(TableId),
    /// Visit does not exist.
    VisitNotFound(VisitId),
    /// Table is not accepting slips.
    TableNotActive(TableId),
    /// Table still has non-terminal slips.
    TableHasOpenSlips(TableId),
    /// Visit still has non-terminal slips.
    VisitHasOpenSlips(VisitId),
    /// Requested transition is not allowed from the current state, or the
    /// state changed under the caller.
    InvalidTransition(String),
    /// Destination seat is claimed by another slip.
    SeatConflict { table_id: TableId, seat: SeatNumber },
    /// Key reused with a different request payload.
    IdempotencyKeyConflict(IdempotencyKey),
    /// Request failed validation before any state change.
    ValidationFailed { field: String, message: String },
    /// Persistence failure; the operation rolled back completely.
    Storage(String),
}

impl FloorError {
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        FloorError::InvalidTransition(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FloorError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        FloorError::Storage(message.into())
    }

    /// The wire-level error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            FloorError::SlipNotFound(_) => ErrorCode::SlipNotFound,
            FloorError::TableNotFound(_) => ErrorCode::TableNotFound,
            FloorError::VisitNotFound(_) => ErrorCode::VisitNotFound,
            FloorError::TableNotActive(_) => ErrorCode::TableNotActive,
            FloorError::TableHasOpenSlips(_) => ErrorCode::TableHasOpenSlips,
            FloorError::VisitHasOpenSlips(_) => ErrorCode::VisitHasOpenSlips,
            FloorError::InvalidTransition(_) => ErrorCode::InvalidTransition,
            FloorError::SeatConflict { .. } => ErrorCode::SeatConflict,
            FloorError::IdempotencyKeyConflict(_) => ErrorCode::IdempotencyKeyConflict,
            FloorError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            FloorError::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Whether a retry with the same inputs can ever succeed.
    pub fn is_retryable_conflict(&self) -> bool {
        matches!(
            self,
            FloorError::SeatConflict { .. } | FloorError::Storage(_)
        )
    }

    pub fn message(&self) -> String {
        match self {
            FloorError::SlipNotFound(id) => format!("Slip not found: {}", id),
            FloorError::TableNotFound(id) => format!("Table not found: {}", id),
            FloorError::VisitNotFound(id) => format!("Visit not found: {}", id),
            FloorError::TableNotActive(id) => {
                format!("Table {} is not accepting slips", id)
            }
            FloorError::TableHasOpenSlips(id) => {
                format!("Table {} still has open slips", id)
            }
            FloorError::VisitHasOpenSlips(id) => {
                format!("Visit {} still has open slips", id)
            }
            FloorError::InvalidTransition(msg) => format!("Invalid transition: {}", msg),
            FloorError::SeatConflict { table_id, seat } => {
                format!("Seat {} at table {} is already occupied", seat, table_id)
            }
            FloorError::IdempotencyKeyConflict(key) => {
                format!("Idempotency key {} was reused with a different request", key)
            }
            FloorError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            FloorError::Storage(msg) => format!("Storage error: {}", msg),
        }
    }

    /// Map a store failure that escaped the handler's own matching.
    ///
    /// `DuplicateIdempotencyKey` is not mapped here: handlers intercept it
    /// to replay the stored result before falling back to this.
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::SeatConflict { table_id, seat } => {
                FloorError::SeatConflict { table_id, seat }
            }
            StoreError::StaleSlip(id) => FloorError::invalid_transition(format!(
                "slip {} changed concurrently; reload and retry",
                id
            )),
            StoreError::StaleTable(id) => FloorError::invalid_transition(format!(
                "table {} changed concurrently; reload and retry",
                id
            )),
            StoreError::OpenSlipsRemain(id) => FloorError::TableHasOpenSlips(id),
            StoreError::OpenSlipsRemainForVisit(id) => FloorError::VisitHasOpenSlips(id),
            StoreError::DuplicateIdempotencyKey(key) => {
                FloorError::IdempotencyKeyConflict(key)
            }
            other => FloorError::storage(other.to_string()),
        }
    }
}

impl std::fmt::Display for FloorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for FloorError {}

impl From<DomainError> for FloorError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidTransition => FloorError::InvalidTransition(err.message),
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => FloorError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => FloorError::Storage(err.message),
        }
    }
}
