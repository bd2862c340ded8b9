//! End-to-end floor scenarios over the in-memory store.
//!
//! These tests wire the handlers together the way an embedding service
//! would and drive whole player journeys through them.

use std::sync::Arc;

use chrono::NaiveTime;

use pit_boss::adapters::memory::InMemoryFloorStore;
use pit_boss::application::handlers::slip::{
    CloseSlipCommand, CloseSlipHandler, CreateSlipCommand, CreateSlipHandler,
    GetActiveSlipsHandler, MoveSlipCommand, MoveSlipHandler, PauseSlipCommand,
    PauseSlipHandler, ResumeSlipCommand, ResumeSlipHandler,
};
use pit_boss::application::handlers::table::{SetTableStatusCommand, SetTableStatusHandler};
use pit_boss::application::handlers::visit::{
    EndVisitCommand, EndVisitHandler, StartVisitCommand, StartVisitHandler,
};
use pit_boss::application::{FloorError, IdempotencyGuard};
use pit_boss::domain::foundation::{
    ActorContext, CasinoId, ChipAmount, IdempotencyKey, PlayerId, SlipId, StaffId, TableId,
};
use pit_boss::domain::gaming_day::GamingDayConfig;
use pit_boss::domain::occupancy::SeatOccupancyIndex;
use pit_boss::domain::slip::{CloseReason, SlipStatus};
use pit_boss::domain::table::{GameType, Table, TableStatus};
use pit_boss::ports::{FloorStore, FloorWrite};

struct Floor {
    store: Arc<InMemoryFloorStore>,
    occupancy: SeatOccupancyIndex,
    create_slip: CreateSlipHandler,
    pause_slip: PauseSlipHandler,
    resume_slip: ResumeSlipHandler,
    close_slip: CloseSlipHandler,
    move_slip: MoveSlipHandler,
    set_table_status: SetTableStatusHandler,
    start_visit: StartVisitHandler,
    end_visit: EndVisitHandler,
    active_slips: GetActiveSlipsHandler,
    casino_id: CasinoId,
}

impl Floor {
    fn new() -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init()
            .ok();

        let store = Arc::new(InMemoryFloorStore::new());
        let occupancy = SeatOccupancyIndex::new(store.clone());
        let guard = IdempotencyGuard::new(store.clone(), 3600);
        let gaming_day = GamingDayConfig::new(
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            chrono_tz::America::Los_Angeles,
        );

        Self {
            occupancy: occupancy.clone(),
            create_slip: CreateSlipHandler::new(
                store.clone(),
                occupancy.clone(),
                guard.clone(),
                gaming_day,
            ),
            pause_slip: PauseSlipHandler::new(store.clone(), guard.clone()),
            resume_slip: ResumeSlipHandler::new(store.clone(), guard.clone()),
            close_slip: CloseSlipHandler::new(store.clone(), occupancy.clone(), guard.clone()),
            move_slip: MoveSlipHandler::new(
                store.clone(),
                occupancy,
                guard.clone(),
                gaming_day,
            ),
            set_table_status: SetTableStatusHandler::new(store.clone(), guard.clone()),
            start_visit: StartVisitHandler::new(store.clone(), guard.clone(), gaming_day),
            end_visit: EndVisitHandler::new(store.clone(), guard),
            active_slips: GetActiveSlipsHandler::new(store.clone()),
            store,
            casino_id: CasinoId::new(),
        }
    }

    async fn seed_active_table(&self, label: &str, seats: u8) -> TableId {
        let mut table = Table::new(
            TableId::new(),
            self.casino_id,
            label.to_string(),
            GameType::Blackjack,
            seats,
            ChipAmount::from_major(25),
            ChipAmount::from_major(2000),
        )
        .unwrap();
        table.change_status(TableStatus::Active).unwrap();
        let table_id = *table.id();
        self.store
            .apply(vec![FloorWrite::InsertTable(table)])
            .await
            .unwrap();
        table_id
    }

    fn ctx(&self) -> ActorContext {
        ActorContext::new(StaffId::new("floor-super-1").unwrap())
    }
}

fn key(s: &str) -> IdempotencyKey {
    IdempotencyKey::new(s).unwrap()
}

#[tokio::test]
async fn full_player_journey() {
    let floor = Floor::new();
    let table_a = floor.seed_active_table("BJ-1", 7).await;
    let table_b = floor.seed_active_table("BJ-2", 6).await;
    let player = PlayerId::new();

    // Player checks in.
    let visit = floor
        .start_visit
        .handle(
            StartVisitCommand {
                player_id: player,
                casino_id: floor.casino_id,
                idempotency_key: key("visit-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    assert!(visit.is_open());

    // Sits at BJ-1 seat 3.
    let slip = floor
        .create_slip
        .handle(
            CreateSlipCommand {
                table_id: table_a,
                seat_number: 3,
                visit_id: *visit.id(),
                player_id: Some(player),
                average_bet: Some(ChipAmount::from_major(100)),
                idempotency_key: key("create-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    assert_eq!(slip.status(), SlipStatus::Open);

    // Steps away, comes back.
    floor
        .pause_slip
        .handle(
            PauseSlipCommand {
                slip_id: *slip.id(),
                idempotency_key: key("pause-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    let resumed = floor
        .resume_slip
        .handle(
            ResumeSlipCommand {
                slip_id: *slip.id(),
                idempotency_key: key("resume-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    assert_eq!(resumed.status(), SlipStatus::Open);

    // Moves to BJ-2 seat 1.
    let outcome = floor
        .move_slip
        .handle(
            MoveSlipCommand {
                slip_id: *slip.id(),
                dest_table_id: table_b,
                dest_seat_number: 1,
                idempotency_key: key("move-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.closed_slip.close_reason(), Some(CloseReason::Moved));
    assert_eq!(
        outcome.new_slip.predecessor_slip_id(),
        Some(outcome.closed_slip.id())
    );
    assert!(floor.occupancy.lookup(&table_a).await.unwrap().is_empty());

    // Colors up and leaves.
    let closed = floor
        .close_slip
        .handle(
            CloseSlipCommand {
                slip_id: *outcome.new_slip.id(),
                chips_taken: Some(ChipAmount::from_major(450)),
                idempotency_key: key("close-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    assert_eq!(closed.status(), SlipStatus::Closed);
    assert!(floor.occupancy.lookup(&table_b).await.unwrap().is_empty());

    let ended = floor
        .end_visit
        .handle(
            EndVisitCommand {
                visit_id: *visit.id(),
                idempotency_key: key("end-visit-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    assert!(!ended.is_open());

    // Both tables show no active slips.
    assert!(floor.active_slips.handle(&table_a).await.unwrap().is_empty());
    assert!(floor.active_slips.handle(&table_b).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_creates_admit_one_per_seat() {
    let floor = Floor::new();
    let table = floor.seed_active_table("BJ-1", 7).await;

    // Eight staff terminals race eight players onto one seat.
    let mut handles = Vec::new();
    let floor = Arc::new(floor);
    for n in 0..8 {
        let floor = floor.clone();
        let player = PlayerId::new();
        handles.push(tokio::spawn(async move {
            let visit = floor
                .start_visit
                .handle(
                    StartVisitCommand {
                        player_id: player,
                        casino_id: floor.casino_id,
                        idempotency_key: key(&format!("visit-{}", n)),
                    },
                    floor.ctx(),
                )
                .await
                .unwrap();
            floor
                .create_slip
                .handle(
                    CreateSlipCommand {
                        table_id: table,
                        seat_number: 4,
                        visit_id: *visit.id(),
                        player_id: Some(player),
                        average_bet: None,
                        idempotency_key: key(&format!("create-{}", n)),
                    },
                    floor.ctx(),
                )
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(FloorError::SeatConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(floor.occupancy.lookup(&table).await.unwrap().len(), 1);
}

#[tokio::test]
async fn close_retry_is_idempotent_end_to_end() {
    let floor = Floor::new();
    let table = floor.seed_active_table("BJ-1", 7).await;
    let player = PlayerId::new();

    let visit = floor
        .start_visit
        .handle(
            StartVisitCommand {
                player_id: player,
                casino_id: floor.casino_id,
                idempotency_key: key("visit-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    let slip = floor
        .create_slip
        .handle(
            CreateSlipCommand {
                table_id: table,
                seat_number: 2,
                visit_id: *visit.id(),
                player_id: Some(player),
                average_bet: None,
                idempotency_key: key("create-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();

    let cmd = CloseSlipCommand {
        slip_id: *slip.id(),
        chips_taken: Some(ChipAmount::from_major(75)),
        idempotency_key: key("close-1"),
    };

    // The floor network hiccuped; the client sent close three times.
    let first = floor.close_slip.handle(cmd.clone(), floor.ctx()).await.unwrap();
    let second = floor.close_slip.handle(cmd.clone(), floor.ctx()).await.unwrap();
    let third = floor.close_slip.handle(cmd, floor.ctx()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);

    // Exactly one close transition in the audit trail.
    let events = floor
        .store
        .audit_for_subject(&pit_boss::domain::audit::AuditSubject::Slip(*slip.id()))
        .await
        .unwrap();
    let closes = events
        .iter()
        .filter(|e| e.action == pit_boss::domain::audit::AuditAction::SlipClosed)
        .count();
    assert_eq!(closes, 1);
}

#[tokio::test]
async fn table_cannot_close_over_a_live_session() {
    let floor = Floor::new();
    let table = floor.seed_active_table("BJ-1", 7).await;
    let player = PlayerId::new();

    let visit = floor
        .start_visit
        .handle(
            StartVisitCommand {
                player_id: player,
                casino_id: floor.casino_id,
                idempotency_key: key("visit-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    let slip = floor
        .create_slip
        .handle(
            CreateSlipCommand {
                table_id: table,
                seat_number: 1,
                visit_id: *visit.id(),
                player_id: Some(player),
                average_bet: None,
                idempotency_key: key("create-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();

    let refused = floor
        .set_table_status
        .handle(
            SetTableStatusCommand {
                table_id: table,
                status: TableStatus::Closed,
                idempotency_key: key("close-table-1"),
            },
            floor.ctx(),
        )
        .await;
    assert!(matches!(refused, Err(FloorError::TableHasOpenSlips(_))));

    // Settle the seat, then the close goes through.
    floor
        .close_slip
        .handle(
            CloseSlipCommand {
                slip_id: *slip.id(),
                chips_taken: None,
                idempotency_key: key("close-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    let closed = floor
        .set_table_status
        .handle(
            SetTableStatusCommand {
                table_id: table,
                status: TableStatus::Closed,
                idempotency_key: key("close-table-2"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    assert_eq!(closed.status(), TableStatus::Closed);
}

#[tokio::test]
async fn chained_moves_preserve_the_session_lineage() {
    let floor = Floor::new();
    let table_a = floor.seed_active_table("BJ-1", 7).await;
    let table_b = floor.seed_active_table("BJ-2", 7).await;
    let player = PlayerId::new();

    let visit = floor
        .start_visit
        .handle(
            StartVisitCommand {
                player_id: player,
                casino_id: floor.casino_id,
                idempotency_key: key("visit-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    let slip = floor
        .create_slip
        .handle(
            CreateSlipCommand {
                table_id: table_a,
                seat_number: 1,
                visit_id: *visit.id(),
                player_id: Some(player),
                average_bet: Some(ChipAmount::from_major(60)),
                idempotency_key: key("create-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();

    // A -> B, then back B -> A at a different seat.
    let hop1 = floor
        .move_slip
        .handle(
            MoveSlipCommand {
                slip_id: *slip.id(),
                dest_table_id: table_b,
                dest_seat_number: 5,
                idempotency_key: key("move-1"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();
    let hop2 = floor
        .move_slip
        .handle(
            MoveSlipCommand {
                slip_id: *hop1.new_slip.id(),
                dest_table_id: table_a,
                dest_seat_number: 6,
                idempotency_key: key("move-2"),
            },
            floor.ctx(),
        )
        .await
        .unwrap();

    // Lineage: slip -> hop1.new -> hop2.new
    assert_eq!(hop1.new_slip.predecessor_slip_id(), Some(slip.id()));
    assert_eq!(
        hop2.new_slip.predecessor_slip_id(),
        Some(hop1.new_slip.id())
    );
    // Average bet rides along the whole chain.
    assert_eq!(hop2.new_slip.average_bet(), ChipAmount::from_major(60));

    // Exactly one live slip, at table A seat 6.
    assert!(floor.occupancy.lookup(&table_b).await.unwrap().is_empty());
    let occupancy_a = floor.occupancy.lookup(&table_a).await.unwrap();
    assert_eq!(occupancy_a.len(), 1);
    let active = floor.active_slips.handle(&table_a).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].seat_number().as_u8(), 6);
}

mod seat_invariant_property {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// However creations land on a table, no two live slips ever share
        /// a seat, and every distinct requested seat gains at most one.
        #[test]
        fn no_two_live_slips_share_a_seat(seats in proptest::collection::vec(1u8..=7, 1..24)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                let floor = Floor::new();
                let table = floor.seed_active_table("BJ-1", 7).await;

                let mut granted: Vec<u8> = Vec::new();
                for (n, seat) in seats.iter().enumerate() {
                    let player = PlayerId::new();
                    let visit = floor
                        .start_visit
                        .handle(
                            StartVisitCommand {
                                player_id: player,
                                casino_id: floor.casino_id,
                                idempotency_key: key(&format!("visit-{}", n)),
                            },
                            floor.ctx(),
                        )
                        .await
                        .unwrap();
                    let result = floor
                        .create_slip
                        .handle(
                            CreateSlipCommand {
                                table_id: table,
                                seat_number: *seat,
                                visit_id: *visit.id(),
                                player_id: Some(player),
                                average_bet: None,
                                idempotency_key: key(&format!("create-{}", n)),
                            },
                            floor.ctx(),
                        )
                        .await;
                    match result {
                        Ok(slip) => granted.push(slip.seat_number().as_u8()),
                        Err(FloorError::SeatConflict { .. }) => {}
                        Err(other) => panic!("unexpected error: {:?}", other),
                    }
                }

                // Each requested seat was granted exactly once.
                let distinct: HashSet<u8> = seats.iter().copied().collect();
                prop_assert_eq!(granted.len(), distinct.len());
                let granted_distinct: HashSet<u8> = granted.iter().copied().collect();
                prop_assert_eq!(granted_distinct.len(), granted.len());

                // And the occupancy map agrees.
                let occupancy = floor.occupancy.lookup(&table).await.unwrap();
                prop_assert_eq!(occupancy.len(), distinct.len());
                let holders: HashSet<SlipId> = occupancy.values().copied().collect();
                prop_assert_eq!(holders.len(), occupancy.len());
                Ok(())
            })?;
        }
    }
}
