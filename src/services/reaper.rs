use std::time::Duration;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    entity::{
        booking_sessions::{self, Column as SessionCol, Entity as BookingSessions},
        payment_orders::{Column as OrderCol, Entity as PaymentOrders},
    },
    error::AppResult,
    models::{OrderStatus, SessionState},
    services::{seat_lock_service, voucher_service},
    state::AppState,
};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub sessions_expired: u64,
    pub locks_released: u64,
    pub reservations_released: u64,
    pub orders_expired: u64,
}

/// One reaper pass: every ACTIVE/CHECKOUT session whose time box elapsed is
/// expired, its holds released and its pending order expired.
///
/// Each session is handled in its own transaction with the session row read
/// `FOR UPDATE`, so a sweep racing a payment confirmation resolves to
/// whichever transaction commits first; the loser's precondition check
/// fails cleanly.
pub async fn sweep_expired(state: &AppState) -> AppResult<SweepOutcome> {
    let now = state.now();
    let mut outcome = SweepOutcome::default();

    let stale: Vec<Uuid> = BookingSessions::find()
        .select_only()
        .column(SessionCol::Id)
        .filter(
            SessionCol::State
                .is_in([SessionState::Active, SessionState::Checkout]),
        )
        .filter(SessionCol::ExpiresAt.lte(DateTimeWithTimeZone::from(now)))
        .into_tuple()
        .all(&state.orm)
        .await?;

    for session_id in stale {
        let txn = state.orm.begin().await?;

        let Some(session) = BookingSessions::find_by_id(session_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            continue;
        };

        // The finalizer may have won the race since the candidate scan.
        if session.state.is_terminal() || session.expires_at.with_timezone(&Utc) > now {
            txn.rollback().await?;
            continue;
        }

        outcome.locks_released +=
            seat_lock_service::release_all_for_session(&txn, session.id).await?;

        if let Some(reservation_id) = session.voucher_reservation_id {
            voucher_service::release(&txn, now, reservation_id).await?;
            outcome.reservations_released += 1;
        }

        let expired_orders = PaymentOrders::update_many()
            .col_expr(OrderCol::Status, Expr::value(OrderStatus::Expired))
            .col_expr(
                OrderCol::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(now)),
            )
            .filter(OrderCol::SessionId.eq(session.id))
            .filter(OrderCol::Status.eq(OrderStatus::Pending))
            .exec(&txn)
            .await?;
        outcome.orders_expired += expired_orders.rows_affected;

        let version = session.version;
        let mut active: booking_sessions::ActiveModel = session.into();
        active.state = Set(SessionState::Expired);
        active.version = Set(version + 1);
        active.updated_at = Set(now.into());
        active.update(&txn).await?;

        txn.commit().await?;
        outcome.sessions_expired += 1;
    }

    if outcome.sessions_expired > 0 {
        tracing::info!(
            sessions = outcome.sessions_expired,
            locks = outcome.locks_released,
            reservations = outcome.reservations_released,
            orders = outcome.orders_expired,
            "expiry sweep reclaimed abandoned holds"
        );
        if let Err(err) = log_audit(
            &state.orm,
            now,
            None,
            "expiry_sweep",
            Some("booking_sessions"),
            Some(serde_json::json!({
                "sessions_expired": outcome.sessions_expired,
                "locks_released": outcome.locks_released,
            })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }
    }

    Ok(outcome)
}

/// Background loop driving [`sweep_expired`] on a fixed interval.
pub async fn run(state: AppState, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(err) = sweep_expired(&state).await {
            tracing::warn!(error = %err, "expiry sweep failed");
        }
    }
}
