use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::sessions::{ApplyVoucherRequest, CreateSessionRequest, SessionDetail, SetItemsRequest},
    entity::{
        booking_sessions::{self, Entity as BookingSessions},
        payment_orders::{Column as OrderCol, Entity as PaymentOrders},
        seats::{Column as SeatCol, Entity as Seats},
        session_items::{self, Column as ItemCol, Entity as SessionItems},
        showtimes::Entity as Showtimes,
        vouchers::{Column as VoucherCol, Entity as Vouchers},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{self, OrderStatus, PricingSnapshot, SessionState},
    pricing::{PricedConcession, PricingEngine, PricingInput, SeatPrice},
    response::ApiResponse,
    services::{payment_service, seat_lock_service, voucher_service},
    state::AppState,
};

/// A session owned by a signed-in user is only visible to that user.
/// Anonymous sessions are addressed by knowledge of the session id alone.
fn ensure_access(session: &booking_sessions::Model, user: Option<&AuthUser>) -> AppResult<()> {
    match session.user_id {
        Some(owner) => match user {
            Some(caller) if caller.user_id == owner => Ok(()),
            _ => Err(AppError::Forbidden),
        },
        None => Ok(()),
    }
}

fn ensure_not_expired(session: &booking_sessions::Model, now: DateTime<Utc>) -> AppResult<()> {
    if session.expires_at.with_timezone(&Utc) <= now {
        return Err(AppError::SessionExpired(session.id));
    }
    Ok(())
}

pub async fn create_session(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateSessionRequest,
) -> AppResult<ApiResponse<SessionDetail>> {
    let now = state.now();

    let showtime = Showtimes::find_by_id(payload.showtime_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("unknown showtime".into()))?;
    if showtime.sale_closes_at.with_timezone(&Utc) <= now {
        return Err(AppError::BadRequest(
            "ticket sales are closed for this showtime".into(),
        ));
    }

    let empty_snapshot = serde_json::to_value(PricingSnapshot::default())
        .map_err(|err| AppError::Internal(err.into()))?;
    let session = booking_sessions::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.map(|u| u.user_id)),
        showtime_id: Set(showtime.id),
        voucher_id: Set(None),
        voucher_reservation_id: Set(None),
        state: Set(SessionState::Active),
        pricing_snapshot: Set(empty_snapshot),
        expires_at: Set((now + state.config.session_ttl()).into()),
        version: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    let detail = SessionDetail {
        session: session_from_entity(session)?,
        items: vec![],
        order: None,
    };
    Ok(ApiResponse::success("Session created", detail, None))
}

/// Replace the session's selection. Seat locks follow the new seat set:
/// removed seats are released, added seats acquired, kept seats refreshed.
/// The submitted version is the optimistic guard; a stale caller is
/// rejected and must retry with the latest state.
pub async fn set_items(
    state: &AppState,
    user: Option<&AuthUser>,
    session_id: Uuid,
    payload: SetItemsRequest,
) -> AppResult<ApiResponse<SessionDetail>> {
    let now = state.now();

    let mut requested_seats: Vec<Uuid> = Vec::new();
    let mut seen = HashSet::new();
    for seat_id in &payload.seat_ids {
        if seen.insert(*seat_id) {
            requested_seats.push(*seat_id);
        }
    }
    for concession in &payload.concessions {
        if concession.quantity <= 0 {
            return Err(AppError::BadRequest(
                "concession quantity must be greater than 0".into(),
            ));
        }
    }

    let txn = state.orm.begin().await?;

    let session = BookingSessions::find_by_id(session_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_access(&session, user)?;

    match session.state {
        SessionState::Active => {}
        SessionState::Expired => return Err(AppError::SessionExpired(session.id)),
        other => {
            return Err(AppError::BadRequest(format!(
                "items can only be changed while the session is ACTIVE (state {})",
                other.as_str()
            )));
        }
    }
    ensure_not_expired(&session, now)?;

    if payload.version != session.version {
        return Err(AppError::ConcurrencyConflict {
            submitted: payload.version,
            current: session.version,
        });
    }

    let seats = Seats::find()
        .filter(SeatCol::ShowtimeId.eq(session.showtime_id))
        .filter(SeatCol::Id.is_in(requested_seats.clone()))
        .all(&txn)
        .await?;
    if seats.len() != requested_seats.len() {
        return Err(AppError::BadRequest(
            "unknown seat for this showtime".into(),
        ));
    }

    let previous_seats: Vec<Uuid> = SessionItems::find()
        .filter(ItemCol::SessionId.eq(session.id))
        .all(&txn)
        .await?
        .into_iter()
        .filter_map(|item| item.seat_id)
        .collect();
    let removed: Vec<Uuid> = previous_seats
        .iter()
        .filter(|seat_id| !seen.contains(*seat_id))
        .copied()
        .collect();

    seat_lock_service::release_locks(&txn, session.id, session.showtime_id, &removed).await?;
    seat_lock_service::acquire_locks(
        &txn,
        now,
        session.id,
        session.showtime_id,
        &requested_seats,
        state.config.hold_ttl(),
    )
    .await?;

    SessionItems::delete_many()
        .filter(ItemCol::SessionId.eq(session.id))
        .exec(&txn)
        .await?;

    let mut position = 0;
    for seat_id in &requested_seats {
        session_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session.id),
            seat_id: Set(Some(*seat_id)),
            concession_code: Set(None),
            quantity: Set(1),
            position: Set(position),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        position += 1;
    }

    let mut concessions = Vec::new();
    for selection in &payload.concessions {
        let unit_price = state
            .pricing
            .concession_price(&selection.code)
            .ok_or_else(|| {
                AppError::BadRequest(format!("unknown concession code {}", selection.code))
            })?;
        session_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session.id),
            seat_id: Set(None),
            concession_code: Set(Some(selection.code.clone())),
            quantity: Set(selection.quantity),
            position: Set(position),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        position += 1;

        concessions.push(PricedConcession {
            code: selection.code.clone(),
            unit_price,
            quantity: selection.quantity,
        });
    }

    let percent_off = active_discount(&txn, now, &session).await?;
    let snapshot = state.pricing.compute(&PricingInput {
        seats: seats
            .iter()
            .map(|seat| SeatPrice {
                seat_id: seat.id,
                price: seat.price,
            })
            .collect(),
        concessions,
        percent_off,
    });

    let version = session.version;
    let mut active: booking_sessions::ActiveModel = session.into();
    active.pricing_snapshot =
        Set(serde_json::to_value(snapshot).map_err(|err| AppError::Internal(err.into()))?);
    active.version = Set(version + 1);
    active.updated_at = Set(now.into());
    let session = active.update(&txn).await?;

    let items = load_items(&txn, session.id).await?;
    txn.commit().await?;

    let detail = SessionDetail {
        session: session_from_entity(session)?,
        items,
        order: None,
    };
    Ok(ApiResponse::ok(detail))
}

/// Swap the session's voucher: release any previous reservation, reserve
/// against the new voucher, reprice.
pub async fn apply_voucher(
    state: &AppState,
    user: Option<&AuthUser>,
    session_id: Uuid,
    payload: ApplyVoucherRequest,
) -> AppResult<ApiResponse<SessionDetail>> {
    let now = state.now();
    let txn = state.orm.begin().await?;

    let session = BookingSessions::find_by_id(session_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_access(&session, user)?;

    match session.state {
        SessionState::Active => {}
        SessionState::Expired => return Err(AppError::SessionExpired(session.id)),
        other => {
            return Err(AppError::BadRequest(format!(
                "vouchers can only be applied while the session is ACTIVE (state {})",
                other.as_str()
            )));
        }
    }
    ensure_not_expired(&session, now)?;

    let voucher = Vouchers::find()
        .filter(VoucherCol::Code.eq(payload.code.trim()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("unknown voucher code".into()))?;

    if let Some(previous) = session.voucher_reservation_id {
        voucher_service::release(&txn, now, previous).await?;
    }

    // The reservation lives exactly as long as the session does.
    let remaining = session.expires_at.with_timezone(&Utc) - now;
    let reservation = voucher_service::reserve(
        &txn,
        now,
        voucher.id,
        session.id,
        session.user_id,
        remaining,
    )
    .await?;

    let (seat_prices, concessions) = priced_items(state, &txn, session.id).await?;
    let snapshot = state.pricing.compute(&PricingInput {
        seats: seat_prices,
        concessions,
        percent_off: voucher.percent_off,
    });

    let version = session.version;
    let mut active: booking_sessions::ActiveModel = session.into();
    active.voucher_id = Set(Some(voucher.id));
    active.voucher_reservation_id = Set(Some(reservation.id));
    active.pricing_snapshot =
        Set(serde_json::to_value(snapshot).map_err(|err| AppError::Internal(err.into()))?);
    active.version = Set(version + 1);
    active.updated_at = Set(now.into());
    let session = active.update(&txn).await?;

    let items = load_items(&txn, session.id).await?;
    txn.commit().await?;

    let detail = SessionDetail {
        session: session_from_entity(session)?,
        items,
        order: None,
    };
    Ok(ApiResponse::ok(detail))
}

/// Freeze the snapshot, renew the seat holds across the payment window and
/// create the payment order. Re-entering checkout is permitted only when
/// the previous order failed; a live PENDING order is simply returned.
pub async fn begin_checkout(
    state: &AppState,
    user: Option<&AuthUser>,
    session_id: Uuid,
) -> AppResult<ApiResponse<SessionDetail>> {
    let now = state.now();
    let txn = state.orm.begin().await?;

    let session = BookingSessions::find_by_id(session_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_access(&session, user)?;

    match session.state {
        SessionState::Active | SessionState::Checkout => {}
        SessionState::Expired => return Err(AppError::SessionExpired(session.id)),
        other => {
            return Err(AppError::InvalidStateTransition {
                from: other.as_str().to_string(),
                to: SessionState::Checkout.as_str().to_string(),
            });
        }
    }
    ensure_not_expired(&session, now)?;

    if session.state == SessionState::Checkout {
        let existing = PaymentOrders::find()
            .filter(OrderCol::SessionId.eq(session.id))
            .order_by_desc(OrderCol::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(existing) = existing {
            match existing.status {
                OrderStatus::Paid => {
                    return Err(AppError::InvalidOrderState(
                        OrderStatus::Paid.as_str().to_string(),
                    ));
                }
                OrderStatus::Pending => {
                    // Idempotent: hand the live payment artifacts back.
                    let items = load_items(&txn, session.id).await?;
                    let detail = SessionDetail {
                        session: session_from_entity(session)?,
                        items,
                        order: Some(payment_service::order_from_entity(existing)),
                    };
                    txn.commit().await?;
                    return Ok(ApiResponse::ok(detail));
                }
                OrderStatus::Failed | OrderStatus::Expired | OrderStatus::Cancelled => {}
            }
        }
    }

    let seat_ids: Vec<Uuid> = SessionItems::find()
        .filter(ItemCol::SessionId.eq(session.id))
        .all(&txn)
        .await?
        .into_iter()
        .filter_map(|item| item.seat_id)
        .collect();
    if seat_ids.is_empty() {
        return Err(AppError::BadRequest(
            "cannot check out a session without seats".into(),
        ));
    }

    // Holds must survive until the session itself dies.
    let payment_window = session.expires_at.with_timezone(&Utc) - now;
    seat_lock_service::renew_locks(
        &txn,
        now,
        session.id,
        session.showtime_id,
        &seat_ids,
        payment_window,
    )
    .await?;

    let snapshot: PricingSnapshot = serde_json::from_value(session.pricing_snapshot.clone())
        .map_err(|err| AppError::Internal(err.into()))?;

    let order = payment_service::create_order(&txn, state, now, &session, snapshot.total).await?;
    if order.amount != snapshot.total {
        return Err(AppError::PricingMismatch {
            quoted: order.amount,
            snapshot: snapshot.total,
        });
    }

    let version = session.version;
    let was_active = session.state == SessionState::Active;
    let session_user = session.user_id;
    let mut active: booking_sessions::ActiveModel = session.into();
    if was_active {
        active.state = Set(SessionState::Checkout);
    }
    active.version = Set(version + 1);
    active.updated_at = Set(now.into());
    let session = active.update(&txn).await?;

    let items = load_items(&txn, session.id).await?;
    let session_id = session.id;
    let order_code = order.order_code.clone();
    let detail = SessionDetail {
        session: session_from_entity(session)?,
        items,
        order: Some(payment_service::order_from_entity(order)),
    };
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.orm,
        now,
        session_user,
        "session_checkout",
        Some("booking_sessions"),
        Some(serde_json::json!({ "session_id": session_id, "order_code": order_code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Checkout started", detail, None))
}

/// Give everything back: seat locks, voucher reservation, pending orders.
/// Allowed while no payment has been confirmed.
pub async fn cancel(
    state: &AppState,
    user: Option<&AuthUser>,
    session_id: Uuid,
) -> AppResult<ApiResponse<SessionDetail>> {
    let now = state.now();
    let txn = state.orm.begin().await?;

    let session = BookingSessions::find_by_id(session_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_access(&session, user)?;

    match session.state {
        SessionState::Active | SessionState::Checkout => {}
        SessionState::Cancelled => {
            let items = load_items(&txn, session.id).await?;
            let detail = SessionDetail {
                session: session_from_entity(session)?,
                items,
                order: None,
            };
            txn.commit().await?;
            return Ok(ApiResponse::ok(detail));
        }
        other => {
            return Err(AppError::InvalidStateTransition {
                from: other.as_str().to_string(),
                to: SessionState::Cancelled.as_str().to_string(),
            });
        }
    }

    let paid = PaymentOrders::find()
        .filter(OrderCol::SessionId.eq(session.id))
        .filter(OrderCol::Status.eq(OrderStatus::Paid))
        .one(&txn)
        .await?;
    if paid.is_some() {
        return Err(AppError::InvalidOrderState(
            OrderStatus::Paid.as_str().to_string(),
        ));
    }

    PaymentOrders::update_many()
        .col_expr(
            OrderCol::Status,
            sea_orm::sea_query::Expr::value(OrderStatus::Cancelled),
        )
        .col_expr(
            OrderCol::UpdatedAt,
            sea_orm::sea_query::Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
        )
        .filter(OrderCol::SessionId.eq(session.id))
        .filter(OrderCol::Status.eq(OrderStatus::Pending))
        .exec(&txn)
        .await?;

    seat_lock_service::release_all_for_session(&txn, session.id).await?;
    if let Some(reservation_id) = session.voucher_reservation_id {
        voucher_service::release(&txn, now, reservation_id).await?;
    }

    let version = session.version;
    let session_user = session.user_id;
    let mut active: booking_sessions::ActiveModel = session.into();
    active.state = Set(SessionState::Cancelled);
    active.version = Set(version + 1);
    active.updated_at = Set(now.into());
    let session = active.update(&txn).await?;

    let items = load_items(&txn, session.id).await?;
    let detail = SessionDetail {
        session: session_from_entity(session)?,
        items,
        order: None,
    };
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.orm,
        now,
        session_user,
        "session_cancelled",
        Some("booking_sessions"),
        Some(serde_json::json!({ "session_id": session_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Session cancelled", detail, None))
}

pub async fn get_session(
    state: &AppState,
    user: Option<&AuthUser>,
    session_id: Uuid,
) -> AppResult<ApiResponse<SessionDetail>> {
    let session = BookingSessions::find_by_id(session_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_access(&session, user)?;

    let items = load_items(&state.orm, session.id).await?;
    let order = PaymentOrders::find()
        .filter(OrderCol::SessionId.eq(session.id))
        .order_by_desc(OrderCol::CreatedAt)
        .one(&state.orm)
        .await?;

    let detail = SessionDetail {
        session: session_from_entity(session)?,
        items,
        order: order.map(payment_service::order_from_entity),
    };
    Ok(ApiResponse::ok(detail))
}

/// Discount currently in force: the session's voucher, provided its
/// reservation is still active.
async fn active_discount<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    session: &booking_sessions::Model,
) -> AppResult<i32> {
    let (Some(voucher_id), Some(reservation_id)) =
        (session.voucher_id, session.voucher_reservation_id)
    else {
        return Ok(0);
    };

    if voucher_service::find_active(conn, now, reservation_id)
        .await?
        .is_none()
    {
        return Ok(0);
    }

    let voucher = Vouchers::find_by_id(voucher_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(voucher.percent_off)
}

/// Current items of a session, priced for the pricing engine.
async fn priced_items<C: ConnectionTrait>(
    state: &AppState,
    conn: &C,
    session_id: Uuid,
) -> AppResult<(Vec<SeatPrice>, Vec<PricedConcession>)> {
    let items = SessionItems::find()
        .filter(ItemCol::SessionId.eq(session_id))
        .all(conn)
        .await?;

    let seat_ids: Vec<Uuid> = items.iter().filter_map(|item| item.seat_id).collect();
    let seats = Seats::find()
        .filter(SeatCol::Id.is_in(seat_ids))
        .all(conn)
        .await?;
    let seat_prices = seats
        .iter()
        .map(|seat| SeatPrice {
            seat_id: seat.id,
            price: seat.price,
        })
        .collect();

    let mut concessions = Vec::new();
    for item in &items {
        if let Some(code) = &item.concession_code {
            let unit_price = state
                .pricing
                .concession_price(code)
                .ok_or_else(|| AppError::BadRequest(format!("unknown concession code {code}")))?;
            concessions.push(PricedConcession {
                code: code.clone(),
                unit_price,
                quantity: item.quantity,
            });
        }
    }

    Ok((seat_prices, concessions))
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
) -> AppResult<Vec<models::SessionItem>> {
    let items = SessionItems::find()
        .filter(ItemCol::SessionId.eq(session_id))
        .order_by_asc(ItemCol::Position)
        .all(conn)
        .await?
        .into_iter()
        .map(item_from_entity)
        .collect();
    Ok(items)
}

fn session_from_entity(model: booking_sessions::Model) -> AppResult<models::BookingSession> {
    let pricing = serde_json::from_value(model.pricing_snapshot)
        .map_err(|err| AppError::Internal(err.into()))?;
    Ok(models::BookingSession {
        id: model.id,
        user_id: model.user_id,
        showtime_id: model.showtime_id,
        voucher_id: model.voucher_id,
        state: model.state,
        pricing,
        expires_at: model.expires_at.with_timezone(&Utc),
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn item_from_entity(model: session_items::Model) -> models::SessionItem {
    models::SessionItem {
        id: model.id,
        session_id: model.session_id,
        seat_id: model.seat_id,
        concession_code: model.concession_code,
        quantity: model.quantity,
        position: model.position,
    }
}
