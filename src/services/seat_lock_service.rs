use chrono::{DateTime, Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    SqlErr,
};
use uuid::Uuid;

use crate::{
    entity::{
        seat_locks::{self, Column as LockCol, Entity as SeatLocks},
        tickets::{Column as TicketCol, Entity as Tickets},
    },
    error::{AppError, AppResult},
};

/// Sorted, de-duplicated seat ids. Every multi-seat operation walks seats in
/// this order so overlapping acquisitions cannot deadlock each other.
fn normalized(seat_ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = seat_ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
}

/// All-or-nothing acquisition of one lock per requested seat, owned by
/// `session_id`. Must run inside the caller's transaction; on error the
/// caller rolls back and no partial set of locks survives.
pub async fn acquire_locks<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    session_id: Uuid,
    showtime_id: Uuid,
    seat_ids: &[Uuid],
    ttl: Duration,
) -> AppResult<()> {
    let seat_ids = normalized(seat_ids);
    let now_tz = DateTimeWithTimeZone::from(now);
    let locked_until = DateTimeWithTimeZone::from(now + ttl);

    // Stale leases do not count as contention.
    SeatLocks::delete_many()
        .filter(LockCol::ShowtimeId.eq(showtime_id))
        .filter(LockCol::SeatId.is_in(seat_ids.clone()))
        .filter(LockCol::LockedUntil.lte(now_tz))
        .exec(conn)
        .await?;

    for seat_id in seat_ids {
        let ticketed = Tickets::find()
            .filter(TicketCol::ShowtimeId.eq(showtime_id))
            .filter(TicketCol::SeatId.eq(seat_id))
            .one(conn)
            .await?;
        if ticketed.is_some() {
            return Err(AppError::SeatUnavailable {
                showtime_id,
                seat_id,
            });
        }

        let existing = SeatLocks::find()
            .filter(LockCol::ShowtimeId.eq(showtime_id))
            .filter(LockCol::SeatId.eq(seat_id))
            .lock(LockType::Update)
            .one(conn)
            .await?;

        match existing {
            Some(lock) if lock.session_id != session_id => {
                return Err(AppError::SeatUnavailable {
                    showtime_id,
                    seat_id,
                });
            }
            Some(lock) => {
                let mut active: seat_locks::ActiveModel = lock.into();
                active.locked_until = Set(locked_until);
                active.update(conn).await?;
            }
            None => {
                let insert = seat_locks::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    showtime_id: Set(showtime_id),
                    seat_id: Set(seat_id),
                    session_id: Set(session_id),
                    locked_until: Set(locked_until),
                    created_at: Set(now_tz),
                }
                .insert(conn)
                .await;

                // A racing transaction that committed first shows up as a
                // unique-index violation on (showtime_id, seat_id).
                if let Err(err) = insert {
                    return Err(match err.sql_err() {
                        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::SeatUnavailable {
                            showtime_id,
                            seat_id,
                        },
                        _ => AppError::DbError(err),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Extend the lease on locks already owned by `session_id`.
pub async fn renew_locks<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    session_id: Uuid,
    showtime_id: Uuid,
    seat_ids: &[Uuid],
    ttl: Duration,
) -> AppResult<()> {
    let seat_ids = normalized(seat_ids);
    let expected = seat_ids.len() as u64;
    let until = DateTimeWithTimeZone::from(now + ttl);

    let result = SeatLocks::update_many()
        .col_expr(LockCol::LockedUntil, Expr::value(until))
        .filter(LockCol::ShowtimeId.eq(showtime_id))
        .filter(LockCol::SeatId.is_in(seat_ids))
        .filter(LockCol::SessionId.eq(session_id))
        .filter(LockCol::LockedUntil.gt(DateTimeWithTimeZone::from(now)))
        .exec(conn)
        .await?;

    if result.rows_affected != expected {
        return Err(AppError::LockNotOwned { session_id });
    }

    Ok(())
}

/// Idempotent: deleting a lock that is already gone is a no-op.
pub async fn release_locks<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
    showtime_id: Uuid,
    seat_ids: &[Uuid],
) -> AppResult<u64> {
    let result = SeatLocks::delete_many()
        .filter(LockCol::ShowtimeId.eq(showtime_id))
        .filter(LockCol::SeatId.is_in(normalized(seat_ids)))
        .filter(LockCol::SessionId.eq(session_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Drop every lock a session holds, regardless of showtime. Used by cancel
/// and the reaper.
pub async fn release_all_for_session<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
) -> AppResult<u64> {
    let result = SeatLocks::delete_many()
        .filter(LockCol::SessionId.eq(session_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Finalizer-only: verify each lock is still live and owned by the
/// converting session, then remove it. Runs inside the conversion
/// transaction that creates the tickets; never call it anywhere else.
pub async fn convert_locks<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    session_id: Uuid,
    showtime_id: Uuid,
    seat_ids: &[Uuid],
) -> AppResult<()> {
    let seat_ids = normalized(seat_ids);

    for seat_id in &seat_ids {
        let lock = SeatLocks::find()
            .filter(LockCol::ShowtimeId.eq(showtime_id))
            .filter(LockCol::SeatId.eq(*seat_id))
            .lock(LockType::Update)
            .one(conn)
            .await?;

        match lock {
            Some(lock)
                if lock.session_id == session_id
                    && lock.locked_until.with_timezone(&Utc) > now => {}
            _ => {
                return Err(AppError::SeatUnavailable {
                    showtime_id,
                    seat_id: *seat_id,
                });
            }
        }
    }

    SeatLocks::delete_many()
        .filter(LockCol::ShowtimeId.eq(showtime_id))
        .filter(LockCol::SeatId.is_in(seat_ids))
        .filter(LockCol::SessionId.eq(session_id))
        .exec(conn)
        .await?;

    Ok(())
}
