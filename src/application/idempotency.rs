//! Idempotency guard - exactly-once execution for mutating operations.
//!
//! Flow, per operation:
//!
//! 1. [`IdempotencyGuard::keyed`] fingerprints the request.
//! 2. [`IdempotencyGuard::check`] replays a stored result if the key has
//!    already committed (and rejects a reused key whose payload differs).
//! 3. The handler executes and includes [`IdempotencyGuard::record`] in
//!    its write batch, so the record commits atomically with the mutation.
//! 4. If two racers with the same key both pass the pre-check, the store
//!    admits one batch and fails the other with a duplicate-key error; the
//!    loser calls [`IdempotencyGuard::replay`] and returns the winner's
//!    stored result. Exactly one execution either way.
//!
//! Failed operations store nothing: a key only ever maps to a committed
//! result, so retrying a failed request with the same key is safe.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::application::error::FloorError;
use crate::domain::foundation::{IdempotencyKey, Timestamp};
use crate::domain::idempotency::{request_fingerprint, IdempotencyRecord};
use crate::ports::{FloorStore, FloorWrite};

/// A request bound to its idempotency key and fingerprint.
#[derive(Debug, Clone)]
pub struct KeyedRequest {
    key: IdempotencyKey,
    operation: &'static str,
    fingerprint: String,
}

impl KeyedRequest {
    /// Returns the idempotency key.
    pub fn key(&self) -> &IdempotencyKey {
        &self.key
    }

    /// Returns the operation name.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

/// Wraps mutating operations with at-most-once semantics.
#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn FloorStore>,
    ttl_secs: u64,
}

impl IdempotencyGuard {
    /// Creates a guard storing records for `ttl_secs` after commit.
    pub fn new(store: Arc<dyn FloorStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    /// Bind a request to its key by fingerprinting the payload.
    pub fn keyed(
        &self,
        key: IdempotencyKey,
        operation: &'static str,
        payload: &JsonValue,
    ) -> KeyedRequest {
        KeyedRequest {
            fingerprint: request_fingerprint(operation, payload),
            key,
            operation,
        }
    }

    /// Replay the stored result if this key already committed.
    ///
    /// # Errors
    ///
    /// - `IdempotencyKeyConflict` if the key exists with a different
    ///   fingerprint
    pub async fn check<T: DeserializeOwned>(
        &self,
        request: &KeyedRequest,
    ) -> Result<Option<T>, FloorError> {
        let stored = self
            .store
            .idempotency(request.key(), Timestamp::now())
            .await
            .map_err(FloorError::from_store)?;

        match stored {
            None => Ok(None),
            Some(record) => {
                if record.fingerprint != request.fingerprint {
                    return Err(FloorError::IdempotencyKeyConflict(request.key.clone()));
                }
                let result = serde_json::from_value(record.result).map_err(|e| {
                    FloorError::storage(format!("stored idempotent result unreadable: {}", e))
                })?;
                Ok(Some(result))
            }
        }
    }

    /// Build the record write for a result about to be committed.
    ///
    /// Must be included in the same batch as the mutation it shields.
    pub fn record<T: Serialize>(
        &self,
        request: &KeyedRequest,
        result: &T,
        now: Timestamp,
    ) -> Result<FloorWrite, FloorError> {
        let value = serde_json::to_value(result)
            .map_err(|e| FloorError::storage(format!("result not serializable: {}", e)))?;
        Ok(FloorWrite::PutIdempotency(IdempotencyRecord::new(
            request.key.clone(),
            request.operation,
            request.fingerprint.clone(),
            value,
            now,
            self.ttl_secs,
        )))
    }

    /// Fetch the winner's stored result after losing a same-key race.
    ///
    /// # Errors
    ///
    /// - `IdempotencyKeyConflict` if the winning request had a different
    ///   fingerprint
    /// - `Storage` if the record cannot be read back
    pub async fn replay<T: DeserializeOwned>(
        &self,
        request: &KeyedRequest,
    ) -> Result<T, FloorError> {
        match self.check(request).await? {
            Some(result) => Ok(result),
            None => Err(FloorError::storage(
                "idempotency record missing after duplicate-key abort",
            )),
        }
    }
}
