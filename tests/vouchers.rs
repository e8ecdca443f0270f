use chrono::Duration;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use axum_cinema_booking::{
    dto::sessions::{ApplyVoucherRequest, CreateSessionRequest, SetItemsRequest},
    entity::{Vouchers, vouchers},
    error::AppError,
    services::{payment_service, session_service, voucher_service},
};

mod common;

async fn session_with_seat(
    state: &axum_cinema_booking::state::AppState,
    showtime_id: uuid::Uuid,
    seat_id: uuid::Uuid,
) -> anyhow::Result<uuid::Uuid> {
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
            seat_ids: vec![seat_id],
            concessions: vec![],
        },
    )
    .await?;
    Ok(session.id)
}

// usage_limit = 2: two reservations succeed, the third is refused no
// matter how the calls interleave with each other.
#[tokio::test]
async fn quota_admits_exactly_usage_limit_reservations() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 4).await?;
    common::seed_voucher(&state, "DUO", 20, 2).await?;

    let s1 = session_with_seat(&state, showtime_id, seat_ids[0]).await?;
    let s2 = session_with_seat(&state, showtime_id, seat_ids[1]).await?;
    let s3 = session_with_seat(&state, showtime_id, seat_ids[2]).await?;

    let code = ApplyVoucherRequest { code: "DUO".into() };
    session_service::apply_voucher(&state, None, s1, ApplyVoucherRequest { code: "DUO".into() })
        .await?;
    session_service::apply_voucher(&state, None, s2, ApplyVoucherRequest { code: "DUO".into() })
        .await?;

    let err = session_service::apply_voucher(&state, None, s3, code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::VoucherExhausted));

    Ok(())
}

// After one reservation is committed (paid through) and another released
// (cancelled), the voucher admits exactly one more reservation.
#[tokio::test]
async fn commit_and_release_free_quota_differently() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 5).await?;
    common::seed_voucher(&state, "DUO", 20, 2).await?;

    let s1 = session_with_seat(&state, showtime_id, seat_ids[0]).await?;
    let s2 = session_with_seat(&state, showtime_id, seat_ids[1]).await?;
    session_service::apply_voucher(&state, None, s1, ApplyVoucherRequest { code: "DUO".into() })
        .await?;
    session_service::apply_voucher(&state, None, s2, ApplyVoucherRequest { code: "DUO".into() })
        .await?;

    // s1 pays: its reservation is consumed for good.
    let order = session_service::begin_checkout(&state, None, s1)
        .await?
        .data
        .unwrap()
        .order
        .unwrap();
    payment_service::handle_provider_callback(&state, common::success_callback(&state, &order))
        .await?;

    // s2 walks away: its reservation returns to the pool.
    session_service::cancel(&state, None, s2).await?;

    let voucher = Vouchers::find()
        .filter(vouchers::Column::Code.eq("DUO"))
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(voucher.committed_uses, 1);

    // One slot left (limit 2, one committed): first taker wins, next fails.
    let s3 = session_with_seat(&state, showtime_id, seat_ids[2]).await?;
    session_service::apply_voucher(&state, None, s3, ApplyVoucherRequest { code: "DUO".into() })
        .await?;

    let s4 = session_with_seat(&state, showtime_id, seat_ids[3]).await?;
    let err =
        session_service::apply_voucher(&state, None, s4, ApplyVoucherRequest { code: "DUO".into() })
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::VoucherExhausted));

    Ok(())
}

#[tokio::test]
async fn voucher_outside_validity_window_is_refused() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 1).await?;
    let now = state.now();
    common::seed_voucher_window(
        &state,
        "NEXTWEEK",
        10,
        10,
        false,
        now + Duration::days(7),
        now + Duration::days(14),
    )
    .await?;

    let session = session_with_seat(&state, showtime_id, seat_ids[0]).await?;
    let err = session_service::apply_voucher(
        &state,
        None,
        session,
        ApplyVoucherRequest {
            code: "NEXTWEEK".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::VoucherNotInValidityWindow));

    Ok(())
}

#[tokio::test]
async fn restricted_voucher_refuses_anonymous_sessions() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 1).await?;
    let now = state.now();
    common::seed_voucher_window(
        &state,
        "WELCOME15",
        15,
        100,
        true,
        now - Duration::days(1),
        now + Duration::days(30),
    )
    .await?;

    let session = session_with_seat(&state, showtime_id, seat_ids[0]).await?;
    let err = session_service::apply_voucher(
        &state,
        None,
        session,
        ApplyVoucherRequest {
            code: "WELCOME15".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::VoucherRestricted));

    Ok(())
}

#[tokio::test]
async fn release_is_idempotent() -> anyhow::Result<()> {
    let (state, _clock) = common::setup_state().await?;
    let (showtime_id, seat_ids) = common::seed_showtime(&state, 2).await?;
    let voucher_id = common::seed_voucher(&state, "SOLO", 10, 1).await?;
    let now = state.now();

    let session = session_with_seat(&state, showtime_id, seat_ids[0]).await?;
    let reservation = voucher_service::reserve(
        &state.orm,
        now,
        voucher_id,
        session,
        None,
        Duration::seconds(600),
    )
    .await?;

    voucher_service::release(&state.orm, now, reservation.id).await?;
    voucher_service::release(&state.orm, now, reservation.id).await?;

    // Quota is back: a new reservation fits.
    let other = session_with_seat(&state, showtime_id, seat_ids[1]).await?;
    voucher_service::reserve(
        &state.orm,
        now,
        voucher_id,
        other,
        None,
        Duration::seconds(600),
    )
    .await?;

    Ok(())
}
