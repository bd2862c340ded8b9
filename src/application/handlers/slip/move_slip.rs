//! MoveSlipHandler - transfer a session to another seat or table.
//!
//! A move is one indivisible unit: close the source slip (reason `Moved`),
//! open a linked successor at the destination, claim the destination seat,
//! release the source seat. All four land in a single batch; if the
//! destination seat was taken between the informational probe and the
//! commit, the whole batch aborts and the source slip is untouched. No
//! other caller ever observes a half-moved player.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::error::FloorError;
use crate::application::handlers::{record_rejection, snapshot};
use crate::application::idempotency::IdempotencyGuard;
use crate::domain::audit::{AuditAction, AuditEvent, AuditSubject};
use crate::domain::foundation::{ActorContext, IdempotencyKey, SlipId, TableId, Timestamp};
use crate::domain::gaming_day::GamingDayConfig;
use crate::domain::occupancy::SeatOccupancyIndex;
use crate::domain::slip::RatingSlip;
use crate::domain::table::TableStatus;
use crate::ports::{FloorStore, FloorWrite, StoreError};

const OPERATION: &str = "slip.move";

/// Command to move an active slip to a destination seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveSlipCommand {
    pub slip_id: SlipId,
    pub dest_table_id: TableId,
    pub dest_seat_number: u8,
    pub idempotency_key: IdempotencyKey,
}

/// Both halves of a committed move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// The source slip, now closed with reason `Moved`.
    pub closed_slip: RatingSlip,
    /// The successor slip, open at the destination.
    pub new_slip: RatingSlip,
}

/// Handler for moving slips between seats and tables.
pub struct MoveSlipHandler {
    store: Arc<dyn FloorStore>,
    occupancy: SeatOccupancyIndex,
    guard: IdempotencyGuard,
    gaming_day: GamingDayConfig,
}

impl MoveSlipHandler {
    pub fn new(
        store: Arc<dyn FloorStore>,
        occupancy: SeatOccupancyIndex,
        guard: IdempotencyGuard,
        gaming_day: GamingDayConfig,
    ) -> Self {
        Self {
            store,
            occupancy,
            guard,
            gaming_day,
        }
    }

    pub async fn handle(
        &self,
        cmd: MoveSlipCommand,
        ctx: ActorContext,
    ) -> Result<MoveOutcome, FloorError> {
        let payload = serde_json::to_value(&cmd)
            .map_err(|e| FloorError::storage(format!("command not serializable: {}", e)))?;
        let request = self
            .guard
            .keyed(cmd.idempotency_key.clone(), OPERATION, &payload);

        if let Some(stored) = self.guard.check::<MoveOutcome>(&request).await? {
            debug!(key = %request.key(), "replaying stored slip.move result");
            return Ok(stored);
        }

        let correlation = ctx.correlation_id();
        let source_subject = AuditSubject::Slip(cmd.slip_id);

        // 1. Source slip must exist and still hold its seat.
        let source = self
            .store
            .slip(&cmd.slip_id)
            .await
            .map_err(FloorError::from_store)?
            .ok_or(FloorError::SlipNotFound(cmd.slip_id))?;
        if !source.holds_seat() {
            return Err(self
                .reject(
                    &ctx,
                    &correlation,
                    source_subject,
                    FloorError::invalid_transition(format!(
                        "slip {} is closed and cannot move",
                        cmd.slip_id
                    )),
                )
                .await);
        }
        let source_status = source.status();

        // 2. Destination table must exist, deal, and have that seat.
        let dest_table = self
            .store
            .table(&cmd.dest_table_id)
            .await
            .map_err(FloorError::from_store)?
            .ok_or(FloorError::TableNotFound(cmd.dest_table_id))?;
        if !dest_table.status().accepts_slips() {
            return Err(self
                .reject(
                    &ctx,
                    &correlation,
                    AuditSubject::Table(cmd.dest_table_id),
                    FloorError::TableNotActive(cmd.dest_table_id),
                )
                .await);
        }
        let dest_seat = dest_table.seat(cmd.dest_seat_number)?;

        if *source.table_id() == cmd.dest_table_id && source.seat_number() == dest_seat {
            return Err(FloorError::validation(
                "dest_seat_number",
                "destination is the slip's current seat",
            ));
        }

        // 3. Probe the destination. Informational only: it shapes the
        //    fast-path error, while the binding check is the Reserve in
        //    the batch below.
        if let Some(holder) = self
            .occupancy
            .probe(&cmd.dest_table_id, dest_seat)
            .await
            .map_err(FloorError::from_store)?
        {
            debug!(%holder, "destination seat probed as occupied");
            return Err(self
                .reject(
                    &ctx,
                    &correlation,
                    AuditSubject::Table(cmd.dest_table_id),
                    FloorError::SeatConflict {
                        table_id: cmd.dest_table_id,
                        seat: dest_seat,
                    },
                )
                .await);
        }

        // 4. Close source, open successor, swap the seat claims — one batch.
        let now = Timestamp::now();
        let source_before = snapshot(&source);
        let mut closed = source.clone();
        closed.close_for_move(now)?;
        let successor = RatingSlip::open_from_move(
            SlipId::new(),
            &closed,
            *dest_table.id(),
            dest_seat,
            self.gaming_day.resolve(now),
            now,
        );

        let moved_out = AuditEvent::transition(
            &ctx,
            &correlation,
            AuditAction::SlipMovedOut,
            source_subject,
            source_before,
            snapshot(&closed),
            now,
        );
        let moved_in = AuditEvent::transition(
            &ctx,
            &correlation,
            AuditAction::SlipMovedIn,
            AuditSubject::Slip(*successor.id()),
            None,
            snapshot(&successor),
            now,
        );

        let outcome = MoveOutcome {
            closed_slip: closed.clone(),
            new_slip: successor.clone(),
        };
        let writes = vec![
            FloorWrite::CheckTableStatus {
                table_id: *dest_table.id(),
                expected_status: TableStatus::Active,
            },
            FloorWrite::UpdateSlip {
                slip: closed,
                expected_status: source_status,
            },
            FloorWrite::InsertSlip(successor.clone()),
            self.occupancy
                .claim(*dest_table.id(), dest_seat, *successor.id()),
            self.occupancy
                .release(*source.table_id(), source.seat_number(), *source.id()),
            FloorWrite::AppendAudit(moved_out),
            FloorWrite::AppendAudit(moved_in),
            self.guard.record(&request, &outcome, now)?,
        ];

        match self.store.apply(writes).await {
            Ok(()) => {
                info!(
                    slip_id = %cmd.slip_id,
                    new_slip_id = %outcome.new_slip.id(),
                    dest_table_id = %cmd.dest_table_id,
                    dest_seat = %dest_seat,
                    "rating slip moved"
                );
                Ok(outcome)
            }
            Err(StoreError::SeatConflict { table_id, seat }) => {
                warn!(%table_id, %seat, "destination claimed between probe and commit");
                Err(self
                    .reject(
                        &ctx,
                        &correlation,
                        AuditSubject::Table(table_id),
                        FloorError::SeatConflict { table_id, seat },
                    )
                    .await)
            }
            Err(StoreError::DuplicateIdempotencyKey(_)) => self.guard.replay(&request).await,
            Err(StoreError::StaleSlip(id)) => {
                let err = FloorError::invalid_transition(format!(
                    "slip {} changed concurrently; reload and retry",
                    id
                ));
                Err(self.reject(&ctx, &correlation, source_subject, err).await)
            }
            Err(StoreError::StaleTable(table_id)) => Err(self
                .reject(
                    &ctx,
                    &correlation,
                    AuditSubject::Table(table_id),
                    FloorError::TableNotActive(table_id),
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
