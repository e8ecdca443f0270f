#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    Set, Statement,
};
use uuid::Uuid;

use axum_cinema_booking::{
    clock::ManualClock,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{seat_locks, seats, showtimes, vouchers},
    models::PaymentOrder,
    pricing::StandardPricing,
    provider::{CallbackStatus, ProviderCallback, SandboxProvider},
    state::AppState,
};

pub const SEAT_PRICE: i64 = 80_000;

pub fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-08-07T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Real state against `TEST_DATABASE_URL` when set, in-memory SQLite
/// otherwise. Time is driven by the returned manual clock.
pub async fn setup_state() -> anyhow::Result<(AppState, Arc<ManualClock>)> {
    setup_state_with_provider(SandboxProvider::new()).await
}

pub async fn setup_state_with_provider(
    provider: SandboxProvider,
) -> anyhow::Result<(AppState, Arc<ManualClock>)> {
    let database_url =
        std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs against a persistent database.
    if database_url.starts_with("postgres") {
        let backend = orm.get_database_backend();
        orm.execute(Statement::from_string(
            backend,
            "TRUNCATE TABLE audit_logs, payment_orders, tickets, bookings, voucher_reservations, \
             seat_locks, session_items, booking_sessions, vouchers, seats, showtimes CASCADE",
        ))
        .await?;
    }

    let clock = Arc::new(ManualClock::new(start_time()));
    let state = AppState {
        orm,
        clock: clock.clone(),
        pricing: Arc::new(StandardPricing::default()),
        provider: Arc::new(provider),
        config: AppConfig::with_database_url(database_url),
    };
    Ok((state, clock))
}

/// One showtime with `seat_count` seats in row A, all at [`SEAT_PRICE`].
/// Returns the showtime id and the seat ids in seat-number order.
pub async fn seed_showtime(
    state: &AppState,
    seat_count: i32,
) -> anyhow::Result<(Uuid, Vec<Uuid>)> {
    let now = state.now();

    let showtime = showtimes::ActiveModel {
        id: Set(Uuid::new_v4()),
        movie_title: Set("Interstellar (Re-release)".into()),
        auditorium: Set("IMAX-1".into()),
        starts_at: Set((now + Duration::hours(3)).into()),
        sale_closes_at: Set((now + Duration::hours(2)).into()),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    let mut seat_ids = Vec::new();
    for number in 1..=seat_count {
        let seat = seats::ActiveModel {
            id: Set(Uuid::new_v4()),
            showtime_id: Set(showtime.id),
            row: Set("A".into()),
            number: Set(number),
            price: Set(SEAT_PRICE),
            created_at: Set(now.into()),
        }
        .insert(&state.orm)
        .await?;
        seat_ids.push(seat.id);
    }

    Ok((showtime.id, seat_ids))
}

pub async fn seed_voucher(
    state: &AppState,
    code: &str,
    percent_off: i32,
    usage_limit: i32,
) -> anyhow::Result<Uuid> {
    let now = state.now();
    seed_voucher_window(
        state,
        code,
        percent_off,
        usage_limit,
        false,
        now - Duration::days(1),
        now + Duration::days(30),
    )
    .await
}

pub async fn seed_voucher_window(
    state: &AppState,
    code: &str,
    percent_off: i32,
    usage_limit: i32,
    first_purchase_only: bool,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
) -> anyhow::Result<Uuid> {
    let voucher = vouchers::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.into()),
        percent_off: Set(percent_off),
        usage_limit: Set(usage_limit),
        committed_uses: Set(0),
        first_purchase_only: Set(first_purchase_only),
        valid_from: Set(valid_from.into()),
        valid_until: Set(valid_until.into()),
        created_at: Set(state.now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(voucher.id)
}

/// Locks whose lease has not lapsed yet, for one showtime.
pub async fn live_lock_count(state: &AppState, showtime_id: Uuid) -> anyhow::Result<u64> {
    let count = seat_locks::Entity::find()
        .filter(seat_locks::Column::ShowtimeId.eq(showtime_id))
        .filter(seat_locks::Column::LockedUntil.gt(DateTimeWithTimeZone::from(state.now())))
        .count(&state.orm)
        .await?;
    Ok(count)
}

pub async fn lock_count(state: &AppState, showtime_id: Uuid) -> anyhow::Result<u64> {
    let count = seat_locks::Entity::find()
        .filter(seat_locks::Column::ShowtimeId.eq(showtime_id))
        .count(&state.orm)
        .await?;
    Ok(count)
}

/// A correctly signed success callback for the given order.
pub fn success_callback(state: &AppState, order: &PaymentOrder) -> ProviderCallback {
    ProviderCallback {
        order_code: order.order_code.clone(),
        status: CallbackStatus::Success,
        transaction_id: format!("tx-{}", order.order_code),
        signature: SandboxProvider::signature_for(
            &state.config.webhook_secret,
            &order.order_code,
            CallbackStatus::Success,
        ),
    }
}

pub fn failure_callback(state: &AppState, order: &PaymentOrder) -> ProviderCallback {
    ProviderCallback {
        order_code: order.order_code.clone(),
        status: CallbackStatus::Failed,
        transaction_id: format!("tx-{}", order.order_code),
        signature: SandboxProvider::signature_for(
            &state.config.webhook_secret,
            &order.order_code,
            CallbackStatus::Failed,
        ),
    }
}
