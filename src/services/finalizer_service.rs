use chrono::{DateTime, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    entity::{
        booking_sessions::{self, Entity as BookingSessions},
        bookings,
        payment_orders::{self, Column as OrderCol, Entity as PaymentOrders},
        seats::{Column as SeatCol, Entity as Seats},
        session_items::{Column as ItemCol, Entity as SessionItems},
        tickets,
    },
    error::{AppError, AppResult},
    models::{BookingStatus, OrderStatus, SessionState, TicketStatus},
    services::{seat_lock_service, voucher_service},
    state::AppState,
};

pub fn build_booking_code(now: DateTime<Utc>, booking_id: Uuid) -> String {
    let date = now.format("%Y%m%d");
    let suffix = booking_id.to_string();
    format!("BK-{}-{}", date, &suffix[..8])
}

/// Convert a paid checkout session into a durable Booking with Tickets,
/// exactly once.
///
/// The whole conversion is one transaction: re-validate the session and its
/// holds, create the Booking and one Ticket per seat, convert the seat
/// locks, commit the voucher reservation, mark the order PAID and the
/// session CONVERTED. A re-delivered confirmation for an already-PAID order
/// returns the existing booking id without side effects.
pub async fn confirm_payment(
    state: &AppState,
    order_code: &str,
    transaction_id: Option<&str>,
) -> AppResult<Uuid> {
    let now = state.now();
    let txn = state.orm.begin().await?;

    let order = PaymentOrders::find()
        .filter(OrderCol::OrderCode.eq(order_code))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.status == OrderStatus::Paid {
        let booking_id = order.booking_id.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "paid order {} has no booking id",
                order.order_code
            ))
        })?;
        txn.commit().await?;
        tracing::info!(order_code, %booking_id, "duplicate payment confirmation ignored");
        return Ok(booking_id);
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::InvalidOrderState(order.status.as_str().to_string()));
    }

    let session = BookingSessions::find_by_id(order.session_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "order {} references missing session {}",
                order.order_code,
                order.session_id
            ))
        })?;

    // Inventory re-validation. Money may already have moved, so a failure
    // here rolls the whole transaction back and escalates to manual
    // reconciliation instead of guessing.
    if session.state != SessionState::Checkout || session.expires_at.with_timezone(&Utc) <= now {
        txn.rollback().await?;
        return Err(reconciliation_required(state, now, &order, AppError::SessionExpired(session.id)).await);
    }

    let seat_ids: Vec<Uuid> = SessionItems::find()
        .filter(ItemCol::SessionId.eq(session.id))
        .all(&txn)
        .await?
        .into_iter()
        .filter_map(|item| item.seat_id)
        .collect();
    if seat_ids.is_empty() {
        txn.rollback().await?;
        return Err(AppError::Internal(anyhow::anyhow!(
            "checkout session {} has no seats",
            session.id
        )));
    }

    if let Some(reservation_id) = session.voucher_reservation_id {
        let reservation = voucher_service::find_active(&txn, now, reservation_id).await?;
        if reservation.is_none() {
            txn.rollback().await?;
            return Err(reconciliation_required(
                state,
                now,
                &order,
                AppError::SessionExpired(session.id),
            )
            .await);
        }
    }

    match seat_lock_service::convert_locks(&txn, now, session.id, session.showtime_id, &seat_ids)
        .await
    {
        Ok(()) => {}
        Err(err @ AppError::SeatUnavailable { .. }) => {
            txn.rollback().await?;
            return Err(reconciliation_required(state, now, &order, err).await);
        }
        Err(err) => return Err(err),
    }

    let seats = Seats::find()
        .filter(SeatCol::Id.is_in(seat_ids.clone()))
        .all(&txn)
        .await?;

    let booking_id = Uuid::new_v4();
    let booking = bookings::ActiveModel {
        id: Set(booking_id),
        code: Set(build_booking_code(now, booking_id)),
        showtime_id: Set(session.showtime_id),
        customer_id: Set(session.user_id),
        voucher_id: Set(session.voucher_id),
        total_amount: Set(order.amount),
        status: Set(BookingStatus::Paid),
        payment_provider: Set(order.provider.clone()),
        payment_transaction_id: Set(transaction_id.map(str::to_string)),
        payment_status: Set(OrderStatus::Paid.as_str().to_string()),
        session_id: Set(session.id),
        pricing_snapshot: Set(session.pricing_snapshot.clone()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for seat in &seats {
        let insert = tickets::ActiveModel {
            id: Set(Uuid::new_v4()),
            showtime_id: Set(session.showtime_id),
            seat_id: Set(seat.id),
            booking_id: Set(booking.id),
            price: Set(seat.price),
            status: Set(TicketStatus::Active),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await;

        if let Err(err) = insert {
            let err = match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::SeatUnavailable {
                    showtime_id: session.showtime_id,
                    seat_id: seat.id,
                },
                _ => AppError::DbError(err),
            };
            txn.rollback().await?;
            return Err(reconciliation_required(state, now, &order, err).await);
        }
    }

    if let Some(reservation_id) = session.voucher_reservation_id {
        voucher_service::commit(&txn, now, reservation_id).await?;
    }

    let order_code = order.order_code.clone();
    let order_user = order.user_id;
    let mut order_active: payment_orders::ActiveModel = order.into();
    order_active.status = Set(OrderStatus::Paid);
    order_active.booking_id = Set(Some(booking.id));
    order_active.updated_at = Set(now.into());
    order_active.update(&txn).await?;

    let session_id = session.id;
    let version = session.version;
    let mut session_active: booking_sessions::ActiveModel = session.into();
    session_active.state = Set(SessionState::Converted);
    session_active.version = Set(version + 1);
    session_active.updated_at = Set(now.into());
    session_active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_code = %order_code, booking_id = %booking.id, "session converted");
    if let Err(err) = log_audit(
        &state.orm,
        now,
        order_user,
        "booking_converted",
        Some("bookings"),
        Some(serde_json::json!({
            "booking_id": booking.id,
            "session_id": session_id,
            "order_code": order_code,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(booking.id)
}

/// Mark the order FAILED and leave the session alone so the client may try
/// checkout again within the session TTL.
pub async fn confirm_payment_failed(state: &AppState, order_code: &str) -> AppResult<()> {
    let now = state.now();
    let txn = state.orm.begin().await?;

    let order = PaymentOrders::find()
        .filter(OrderCol::OrderCode.eq(order_code))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    match order.status {
        OrderStatus::Pending => {
            let mut active: payment_orders::ActiveModel = order.into();
            active.status = Set(OrderStatus::Failed);
            active.updated_at = Set(now.into());
            active.update(&txn).await?;
            txn.commit().await?;
            Ok(())
        }
        OrderStatus::Paid => Err(AppError::InvalidOrderState(
            OrderStatus::Paid.as_str().to_string(),
        )),
        // Failure callbacks for orders that already reached a terminal
        // state are redeliveries; acknowledge them.
        OrderStatus::Failed | OrderStatus::Expired | OrderStatus::Cancelled => {
            txn.commit().await?;
            Ok(())
        }
    }
}

async fn reconciliation_required(
    state: &AppState,
    now: DateTime<Utc>,
    order: &payment_orders::Model,
    err: AppError,
) -> AppError {
    tracing::error!(
        order_code = %order.order_code,
        session_id = %order.session_id,
        error = %err,
        "payment confirmed but inventory validation failed; manual reconciliation required"
    );

    if let Err(audit_err) = log_audit(
        &state.orm,
        now,
        order.user_id,
        "reconciliation_required",
        Some("payment_orders"),
        Some(serde_json::json!({
            "order_code": order.order_code,
            "session_id": order.session_id,
            "amount": order.amount,
            "reason": err.to_string(),
        })),
    )
    .await
    {
        tracing::warn!(error = %audit_err, "audit log failed");
    }

    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_code_carries_date_and_id_prefix() {
        let now = DateTime::parse_from_rfc3339("2026-08-07T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = Uuid::parse_str("deadbeef-0000-0000-0000-000000000000").unwrap();

        assert_eq!(build_booking_code(now, id), "BK-20260807-deadbeef");
    }
}
