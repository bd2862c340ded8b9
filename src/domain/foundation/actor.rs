//! Actor context flowing through command processing.
//!
//! Every mutating operation is performed by an authenticated staff member;
//! `ActorContext` carries that identity plus correlation metadata into the
//! audit trail. The caller has already resolved authentication and casino
//! scope before the context reaches this crate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StaffId;

/// Metadata context for command handlers.
///
/// Carries the acting staff member and correlation context through the
/// command pipeline and into emitted audit events. The two halves of a
/// move share the correlation id generated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// The staff member executing this command.
    pub actor_id: StaffId,

    /// Links related operations across a single request.
    /// Generated at the boundary if not provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Source of this command (e.g., "pit-station", "supervisor-tablet").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl ActorContext {
    /// Creates a new actor context with the required staff identity.
    pub fn new(actor_id: StaffId) -> Self {
        Self {
            actor_id,
            correlation_id: None,
            source: None,
        }
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    ///
    /// Every command ends up with a correlation ID in the audit trail,
    /// even if the caller didn't provide one.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the correlation ID only if explicitly set.
    pub fn correlation_id_opt(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
impl ActorContext {
    /// Creates a test fixture with a fixed staff id and correlation id.
    ///
    /// Only available in test builds.
    pub fn test_fixture() -> Self {
        Self::new(StaffId::new("test-staff-1").unwrap())
            .with_correlation_id("test-correlation-id")
            .with_source("test")
    }
}
