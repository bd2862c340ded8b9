//! Idempotency records.
//!
//! A mutating request carries a client-chosen key; the committed result is
//! stored under that key so a retry replays the stored result instead of
//! re-executing. The fingerprint ties the key to one specific request:
//! reusing a key with a different payload is a caller bug, surfaced as
//! `IdempotencyKeyConflict`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::domain::foundation::{IdempotencyKey, Timestamp};

/// SHA-256 fingerprint of an operation name plus its payload.
///
/// `serde_json` keeps object keys sorted, so serializing the payload value
/// yields a canonical byte string for hashing.
pub fn request_fingerprint(operation: &str, payload: &JsonValue) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update(b"\n");
    hasher.update(payload.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// A stored (key → result) binding with a bounded lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// Client-supplied key.
    pub key: IdempotencyKey,

    /// Operation the key was used with, e.g. "slip.close".
    pub operation: String,

    /// Fingerprint of the original request.
    pub fingerprint: String,

    /// The committed result, replayed verbatim on retry.
    pub result: JsonValue,

    /// When the record was stored.
    pub stored_at: Timestamp,

    /// When the record stops shielding retries.
    pub expires_at: Timestamp,
}

impl IdempotencyRecord {
    /// Creates a record expiring `ttl_secs` after `now`.
    pub fn new(
        key: IdempotencyKey,
        operation: impl Into<String>,
        fingerprint: String,
        result: JsonValue,
        now: Timestamp,
        ttl_secs: u64,
    ) -> Self {
        Self {
            key,
            operation: operation.into(),
            fingerprint,
            result,
            stored_at: now,
            expires_at: now.plus_secs(ttl_secs),
        }
    }

    /// Whether the record has outlived its TTL.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }
}
