//! StartVisitHandler - begin or resume a player's visit.
//!
//! A player has at most one visit per casino per gaming day. Starting a
//! visit that is already open returns it unchanged; starting one that was
//! ended earlier the same gaming day reopens it with `resumed` set; only
//! after the cutoff rolls the day over does a fresh visit begin.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::error::FloorError;
use crate::application::handlers::snapshot;
use crate::application::idempotency::IdempotencyGuard;
use crate::domain::audit::{AuditAction, AuditEvent, AuditSubject};
use crate::domain::foundation::{
    ActorContext, CasinoId, IdempotencyKey, PlayerId, Timestamp, VisitId,
};
use crate::domain::gaming_day::GamingDayConfig;
use crate::domain::visit::Visit;
use crate::ports::{FloorStore, FloorWrite, StoreError};

const OPERATION: &str = "visit.start";

/// Command to start (or same-day resume) a visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartVisitCommand {
    pub player_id: PlayerId,
    pub casino_id: CasinoId,
    pub idempotency_key: IdempotencyKey,
}

/// Handler for starting visits.
pub struct StartVisitHandler {
    store: Arc<dyn FloorStore>,
    guard: IdempotencyGuard,
    gaming_day: GamingDayConfig,
}

impl StartVisitHandler {
    pub fn new(
        store: Arc<dyn FloorStore>,
        guard: IdempotencyGuard,
        gaming_day: GamingDayConfig,
    ) -> Self {
        Self {
            store,
            guard,
            gaming_day,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartVisitCommand,
        ctx: ActorContext,
    ) -> Result<Visit, FloorError> {
        let payload = serde_json::to_value(&cmd)
            .map_err(|e| FloorError::storage(format!("command not serializable: {}", e)))?;
        let request = self
            .guard
            .keyed(cmd.idempotency_key.clone(), OPERATION, &payload);

        if let Some(stored) = self.guard.check::<Visit>(&request).await? {
            debug!(key = %request.key(), "replaying stored visit.start result");
            return Ok(stored);
        }

        let correlation = ctx.correlation_id();
        let now = Timestamp::now();
        let today = self.gaming_day.resolve(now);

        let existing = self
            .store
            .find_visit(&cmd.player_id, &cmd.casino_id, today)
            .await
            .map_err(FloorError::from_store)?;

        match existing {
            // Already on the floor today: nothing to change.
            Some(visit) if visit.is_open() => {
                debug!(visit_id = %visit.id(), "visit already open for gaming day");
                Ok(visit)
            }
            // Came back before the cutoff: same visit, resumed.
            Some(mut visit) => {
                let before = snapshot(&visit);
                visit.reopen()?;
                let audit = AuditEvent::transition(
                    &ctx,
                    &correlation,
                    AuditAction::VisitResumed,
                    AuditSubject::Visit(*visit.id()),
                    before,
                    snapshot(&visit),
                    now,
                );
                let writes = vec![
                    FloorWrite::UpdateVisit(visit.clone()),
                    FloorWrite::AppendAudit(audit),
                    self.guard.record(&request, &visit, now)?,
                ];
                match self.store.apply(writes).await {
                    Ok(()) => {
                        info!(visit_id = %visit.id(), "visit resumed");
                        Ok(visit)
                    }
                    Err(StoreError::DuplicateIdempotencyKey(_)) => {
                        self.guard.replay(&request).await
                    }
                    Err(other) => Err(FloorError::from_store(other)),
                }
            }
            // First appearance this gaming day.
            None => {
                let visit = Visit::start(VisitId::new(), cmd.player_id, cmd.casino_id, today, now);
                let audit = AuditEvent::transition(
                    &ctx,
                    &correlation,
                    AuditAction::VisitStarted,
                    AuditSubject::Visit(*visit.id()),
                    None,
                    snapshot(&visit),
                    now,
                );
                let writes = vec![
                    FloorWrite::InsertVisit(visit.clone()),
                    FloorWrite::AppendAudit(audit),
                    self.guard.record(&request, &visit, now)?,
                ];
                match self.store.apply(writes).await {
                    Ok(()) => {
                        info!(visit_id = %visit.id(), gaming_day = %today, "visit started");
                        Ok(visit)
                    }
                    Err(StoreError::DuplicateIdempotencyKey(_)) => {
                        self.guard.replay(&request).await
                    }
                    Err(other) => Err(FloorError::from_store(other)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryFloorStore;
    use chrono::NaiveTime;

    fn setup() -> (Arc<InMemoryFloorStore>, StartVisitHandler) {
        let store = Arc::new(InMemoryFloorStore::new());
        let handler = StartVisitHandler::new(
            store.clone(),
            IdempotencyGuard::new(store.clone(), 3600),
            GamingDayConfig::new(
                NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                chrono_tz::America::Los_Angeles,
            ),
        );
        (store, handler)
    }

    fn command(player_id: PlayerId, casino_id: CasinoId, key: &str) -> StartVisitCommand {
        StartVisitCommand {
            player_id,
            casino_id,
            idempotency_key: IdempotencyKey::new(key).unwrap(),
        }
    }

    #[tokio::test]
    async fn starts_a_fresh_visit() {
        let (_, handler) = setup();
        let player = PlayerId::new();
        let casino = CasinoId::new();

        let visit = handler
            .handle(command(player, casino, "req-1"), ActorContext::test_fixture())
            .await
            .unwrap();

        assert!(visit.is_open());
        assert!(!visit.resumed());
        assert_eq!(visit.player_id(), &player);
    }

    #[tokio::test]
    async fn second_start_returns_the_open_visit() {
        let (_, handler) = setup();
        let player = PlayerId::new();
        let casino = CasinoId::new();

        let first = handler
            .handle(command(player, casino, "req-1"), ActorContext::test_fixture())
            .await
            .unwrap();
        let second = handler
            .handle(command(player, casino, "req-2"), ActorContext::test_fixture())
            .await
            .unwrap();

        assert_eq!(first.id(), second.id());
        assert!(!second.resumed());
    }

    #[tokio::test]
    async fn start_after_end_same_day_resumes_the_visit() {
        let (store, handler) = setup();
        let player = PlayerId::new();
        let casino = CasinoId::new();

        let mut visit = handler
            .handle(command(player, casino, "req-1"), ActorContext::test_fixture())
            .await
            .unwrap();
        visit.end(Timestamp::now()).unwrap();
        store
            .apply(vec![FloorWrite::UpdateVisit(visit.clone())])
            .await
            .unwrap();

        let resumed = handler
            .handle(command(player, casino, "req-2"), ActorContext::test_fixture())
            .await
            .unwrap();

        assert_eq!(resumed.id(), visit.id());
        assert!(resumed.is_open());
        assert!(resumed.resumed());
    }

    #[tokio::test]
    async fn different_players_get_independent_visits() {
        let (_, handler) = setup();
        let casino = CasinoId::new();

        let a = handler
            .handle(
                command(PlayerId::new(), casino, "req-1"),
                ActorContext::test_fixture(),
            )
            .await
            .unwrap();
        let b = handler
            .handle(
                command(PlayerId::new(), casino, "req-2"),
                ActorContext::test_fixture(),
            )
            .await
            .unwrap();

        assert_ne!(a.id(), b.id());
    }
}
