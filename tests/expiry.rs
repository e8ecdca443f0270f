use chrono::Duration;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use axum_cinema_booking::{
    dto::sessions::{ApplyVoucherRequest, CreateSessionRequest, SetItemsRequest},
    entity::{BookingSessions, Bookings, PaymentOrders, Tickets, payment_orders},
    error::AppError,
    models::{OrderStatus, SessionState},
    services::{finalizer_service, payment_service, reaper, session_service},
};

mod common;

// A session abandoned past its TTL is reclaimed by the sweep: session
// EXPIRED, locks gone, reservation released.
#[tokio::test]
async fn sweep_reclaims_abandoned_sessions() -> anyhow::Result<()> {
    let (state, clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 3).await?;
    common::seed_voucher(&state, "SUMMER10", 10, 10).await?;

    let session = session_service::create_session(&state, None, CreateSessionRequest { showtime_id })
        .await?
        .data
        .unwrap()
        .session;
    session_service::set_items(
        &state,
        None,
        session.id,
        SetItemsRequest {
            version: 0,
            seat_ids: vec![seat_ids[0], seat_ids[1]],
            concessions: vec![],
        },
    )
    .await?;
    session_service::apply_voucher(
        &state,
        None,
        session.id,
        ApplyVoucherRequest {
            code: "SUMMER10".into(),
        },
    )
    .await?;
    assert_eq!(common::lock_count(&state, showtime_id).await?, 2);

    // One second short of the deadline nothing happens.
    clock.advance(Duration::seconds(599));
    let outcome = reaper::sweep_expired(&state).await?;
    assert_eq!(outcome.sessions_expired, 0);

    clock.advance(Duration::seconds(2));
    let outcome = reaper::sweep_expired(&state).await?;
    assert_eq!(outcome.sessions_expired, 1);
    assert_eq!(outcome.locks_released, 2);
    assert_eq!(outcome.reservations_released, 1);

    let row = BookingSessions::find_by_id(session.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(row.state, SessionState::Expired);
    assert_eq!(common::lock_count(&state, showtime_id).await?, 0);

    // Sweeping again finds nothing left to do.
    let outcome = reaper::sweep_expired(&state).await?;
    assert_eq!(outcome.sessions_expired, 0);

    Ok(())
}

// Payment confirmation arriving after the session's time box elapsed (but
// before any sweep) must fail and leave no booking or ticket behind.
#[tokio::test]
async fn late_confirmation_fails_with_session_expired() -> anyhow::Result<()> {
    let (state, clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 2).await?;

    let session = session_service::create_session(&state, None, CreateSessionRequest { showtime_id })
        .await?
        .data
        .unwrap()
        .session;
    session_service::set_items(
        &state,
        None,
        session.id,
        SetItemsRequest {
            version: 0,
            seat_ids: vec![seat_ids[0], seat_ids[1]],
            concessions: vec![],
        },
    )
    .await?;
    let order = session_service::begin_checkout(&state, None, session.id)
        .await?
        .data
        .unwrap()
        .order
        .unwrap();

    clock.advance(Duration::seconds(601));

    let err = finalizer_service::confirm_payment(&state, &order.order_code, Some("tx-late"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionExpired(id) if id == session.id));

    assert_eq!(Bookings::find().count(&state.orm).await?, 0);
    assert_eq!(Tickets::find().count(&state.orm).await?, 0);

    // The order is left PENDING for the reconciliation process.
    let row = PaymentOrders::find()
        .filter(payment_orders::Column::OrderCode.eq(order.order_code.clone()))
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(row.status, OrderStatus::Pending);

    Ok(())
}

// Same race, but the reaper wins first and expires the order as well; the
// late callback then hits a terminal order and still creates nothing.
#[tokio::test]
async fn sweep_beats_late_confirmation() -> anyhow::Result<()> {
    let (state, clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 1).await?;

    let session = session_service::create_session(&state, None, CreateSessionRequest { showtime_id })
        .await?
        .data
        .unwrap()
        .session;
    session_service::set_items(
        &state,
        None,
        session.id,
        SetItemsRequest {
            version: 0,
            seat_ids: vec![seat_ids[0]],
            concessions: vec![],
        },
    )
    .await?;
    let order = session_service::begin_checkout(&state, None, session.id)
        .await?
        .data
        .unwrap()
        .order
        .unwrap();

    clock.advance(Duration::seconds(601));
    let outcome = reaper::sweep_expired(&state).await?;
    assert_eq!(outcome.sessions_expired, 1);
    assert_eq!(outcome.orders_expired, 1);

    let err = payment_service::handle_provider_callback(
        &state,
        common::success_callback(&state, &order),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidOrderState(ref s) if s == "EXPIRED"));

    assert_eq!(Bookings::find().count(&state.orm).await?, 0);
    assert_eq!(Tickets::find().count(&state.orm).await?, 0);

    Ok(())
}

// Converted sessions are of no interest to the reaper even once their
// original expiry time lies in the past.
#[tokio::test]
async fn sweep_ignores_converted_sessions() -> anyhow::Result<()> {
    let (state, clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 1).await?;

    let session = session_service::create_session(&state, None, CreateSessionRequest { showtime_id })
        .await?
        .data
        .unwrap()
        .session;
    session_service::set_items(
        &state,
        None,
        session.id,
        SetItemsRequest {
            version: 0,
            seat_ids: vec![seat_ids[0]],
            concessions: vec![],
        },
    )
    .await?;
    let order = session_service::begin_checkout(&state, None, session.id)
        .await?
        .data
        .unwrap()
        .order
        .unwrap();
    payment_service::handle_provider_callback(&state, common::success_callback(&state, &order))
        .await?;

    clock.advance(Duration::seconds(601));
    let outcome = reaper::sweep_expired(&state).await?;
    assert_eq!(outcome.sessions_expired, 0);

    let row = BookingSessions::find_by_id(session.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(row.state, SessionState::Converted);

    Ok(())
}
