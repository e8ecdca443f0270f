use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use axum_cinema_booking::{
    dto::sessions::{CreateSessionRequest, SetItemsRequest},
    entity::{BookingSessions, Bookings, PaymentOrders, Tickets, payment_orders, tickets},
    error::AppError,
    models::{OrderStatus, SessionState},
    provider::ProviderCallback,
    services::{payment_service, session_service},
};

mod common;

async fn checked_out_session(
    state: &axum_cinema_booking::state::AppState,
    showtime_id: uuid::Uuid,
    seat_ids: &[uuid::Uuid],
) -> anyhow::Result<(uuid::Uuid, axum_cinema_booking::models::PaymentOrder)> {
    let session = session_service::create_session(state, None, CreateSessionRequest { showtime_id })
        .await?
        .data
        .unwrap()
        .session;
    session_service::set_items(
        state,
        None,
        session.id,
        SetItemsRequest {
            version: 0,
            seat_ids: seat_ids.to_vec(),
            concessions: vec![],
        },
    )
    .await?;
    let order = session_service::begin_checkout(state, None, session.id)
        .await?
        .data
        .unwrap()
        .order
        .unwrap();
    Ok((session.id, order))
}

// The provider may deliver the same confirmation more than once. The
// second delivery must answer with the same booking id and change nothing.
#[tokio::test]
async fn duplicate_success_callback_is_a_no_op() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 2).await?;
    let (_, order) = checked_out_session(&state, showtime_id, &seat_ids).await?;

    let callback = common::success_callback(&state, &order);

    let first = payment_service::handle_provider_callback(&state, callback.clone())
        .await?
        .data
        .unwrap();
    let second = payment_service::handle_provider_callback(&state, callback)
        .await?
        .data
        .unwrap();

    assert_eq!(first.booking_id, second.booking_id);
    assert_eq!(Bookings::find().count(&state.orm).await?, 1);
    assert_eq!(
        Tickets::find()
            .filter(tickets::Column::BookingId.eq(first.booking_id.unwrap()))
            .count(&state.orm)
            .await?,
        2
    );

    Ok(())
}

#[tokio::test]
async fn forged_signature_is_rejected_before_any_effect() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 1).await?;
    let (_, order) = checked_out_session(&state, showtime_id, &seat_ids).await?;

    let mut callback = common::success_callback(&state, &order);
    callback.signature = "forged".into();

    let err = payment_service::handle_provider_callback(&state, callback)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    assert_eq!(Bookings::find().count(&state.orm).await?, 0);
    let row = PaymentOrders::find()
        .filter(payment_orders::Column::OrderCode.eq(order.order_code.clone()))
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(row.status, OrderStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn unknown_order_code_is_not_found() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;

    let callback = ProviderCallback {
        order_code: "PAY-20260807-ffffffff".into(),
        status: axum_cinema_booking::provider::CallbackStatus::Success,
        transaction_id: "tx-unknown".into(),
        signature: axum_cinema_booking::provider::SandboxProvider::signature_for(
            &state.config.webhook_secret,
            "PAY-20260807-ffffffff",
            axum_cinema_booking::provider::CallbackStatus::Success,
        ),
    };

    let err = payment_service::handle_provider_callback(&state, callback)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

// A failed payment keeps the session alive: the order flips to FAILED,
// checkout can be retried and the retry can still convert.
#[tokio::test]
async fn failed_payment_allows_retrying_checkout() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 1).await?;
    let (session_id, order) = checked_out_session(&state, showtime_id, &seat_ids).await?;

    payment_service::handle_provider_callback(&state, common::failure_callback(&state, &order))
        .await?;

    let failed = PaymentOrders::find()
        .filter(payment_orders::Column::OrderCode.eq(order.order_code.clone()))
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(failed.status, OrderStatus::Failed);

    let session = BookingSessions::find_by_id(session_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(session.state, SessionState::Checkout);

    // Checkout again: a fresh order replaces the failed one.
    let retry = session_service::begin_checkout(&state, None, session_id)
        .await?
        .data
        .unwrap()
        .order
        .unwrap();
    assert_ne!(retry.order_code, order.order_code);

    let ack = payment_service::handle_provider_callback(
        &state,
        common::success_callback(&state, &retry),
    )
    .await?
    .data
    .unwrap();
    assert!(ack.booking_id.is_some());
    assert_eq!(Bookings::find().count(&state.orm).await?, 1);

    // A late duplicate of the original failure callback stays harmless.
    payment_service::handle_provider_callback(&state, common::failure_callback(&state, &order))
        .await?;
    assert_eq!(Bookings::find().count(&state.orm).await?, 1);

    Ok(())
}

// Confirming a payment against an order that already failed must not
// convert anything; the provider's books and ours disagree, so the order
// state wins and the caller gets a conflict.
#[tokio::test]
async fn success_after_failure_hits_invalid_order_state() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 1).await?;
    let (_, order) = checked_out_session(&state, showtime_id, &seat_ids).await?;

    payment_service::handle_provider_callback(&state, common::failure_callback(&state, &order))
        .await?;

    let err = payment_service::handle_provider_callback(
        &state,
        common::success_callback(&state, &order),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidOrderState(ref s) if s == "FAILED"));
    assert_eq!(Bookings::find().count(&state.orm).await?, 0);

    Ok(())
}
