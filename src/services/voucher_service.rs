use chrono::{DateTime, Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        voucher_reservations::{self, Column as ReservationCol, Entity as VoucherReservations},
        vouchers::{self, Column as VoucherCol, Entity as Vouchers},
    },
    error::{AppError, AppResult},
};

pub fn within_validity(voucher: &vouchers::Model, now: DateTime<Utc>) -> bool {
    let from = voucher.valid_from.with_timezone(&Utc);
    let until = voucher.valid_until.with_timezone(&Utc);
    from <= now && now < until
}

/// Pure eligibility predicate. The caller assembles the context (who is
/// asking, how many bookings they already have) inside the reservation
/// transaction.
pub fn voucher_eligible(
    voucher: &vouchers::Model,
    user_id: Option<Uuid>,
    prior_bookings: u64,
) -> bool {
    if voucher.first_purchase_only {
        return user_id.is_some() && prior_bookings == 0;
    }
    true
}

/// Take a time-boxed hold against the voucher's remaining quota.
///
/// The voucher row is read `FOR UPDATE`, so the quota recomputation and the
/// reservation insert are atomic with respect to concurrent reserves.
pub async fn reserve<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    voucher_id: Uuid,
    session_id: Uuid,
    user_id: Option<Uuid>,
    ttl: Duration,
) -> AppResult<voucher_reservations::Model> {
    let voucher = Vouchers::find_by_id(voucher_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !within_validity(&voucher, now) {
        return Err(AppError::VoucherNotInValidityWindow);
    }

    let prior_bookings = match user_id {
        Some(user_id) => {
            Bookings::find()
                .filter(BookingCol::CustomerId.eq(user_id))
                .count(conn)
                .await?
        }
        None => 0,
    };
    if !voucher_eligible(&voucher, user_id, prior_bookings) {
        return Err(AppError::VoucherRestricted);
    }

    let active = VoucherReservations::find()
        .filter(ReservationCol::VoucherId.eq(voucher_id))
        .filter(ReservationCol::ReleasedAt.is_null())
        .filter(ReservationCol::CommittedAt.is_null())
        .filter(ReservationCol::ExpiresAt.gt(DateTimeWithTimeZone::from(now)))
        .count(conn)
        .await?;

    let remaining = i64::from(voucher.usage_limit) - i64::from(voucher.committed_uses) - active as i64;
    if remaining <= 0 {
        return Err(AppError::VoucherExhausted);
    }

    let reservation = voucher_reservations::ActiveModel {
        id: Set(Uuid::new_v4()),
        voucher_id: Set(voucher_id),
        session_id: Set(session_id),
        user_id: Set(user_id),
        reserved_at: Set(now.into()),
        expires_at: Set((now + ttl).into()),
        released_at: Set(None),
        committed_at: Set(None),
    }
    .insert(conn)
    .await?;

    Ok(reservation)
}

/// Idempotent release. A committed reservation is left untouched.
pub async fn release<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    reservation_id: Uuid,
) -> AppResult<()> {
    let Some(reservation) = VoucherReservations::find_by_id(reservation_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
    else {
        return Ok(());
    };

    if reservation.released_at.is_some() || reservation.committed_at.is_some() {
        return Ok(());
    }

    let mut active: voucher_reservations::ActiveModel = reservation.into();
    active.released_at = Set(Some(now.into()));
    active.update(conn).await?;

    Ok(())
}

/// Finalizer-only: consume the reservation and count the use against the
/// voucher, inside the conversion transaction.
pub async fn commit<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    reservation_id: Uuid,
) -> AppResult<()> {
    let reservation = VoucherReservations::find_by_id(reservation_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    if reservation.committed_at.is_some() {
        return Ok(());
    }
    if reservation.released_at.is_some() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "cannot commit a released voucher reservation {reservation_id}"
        )));
    }

    let voucher_id = reservation.voucher_id;
    let mut active: voucher_reservations::ActiveModel = reservation.into();
    active.committed_at = Set(Some(now.into()));
    active.update(conn).await?;

    Vouchers::update_many()
        .col_expr(
            VoucherCol::CommittedUses,
            Expr::col(VoucherCol::CommittedUses).add(1),
        )
        .filter(VoucherCol::Id.eq(voucher_id))
        .exec(conn)
        .await?;

    Ok(())
}

/// A reservation that still counts against the quota: not released, not
/// committed, lease not lapsed.
pub async fn find_active<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
    reservation_id: Uuid,
) -> AppResult<Option<voucher_reservations::Model>> {
    let reservation = VoucherReservations::find_by_id(reservation_id)
        .filter(ReservationCol::ReleasedAt.is_null())
        .filter(ReservationCol::CommittedAt.is_null())
        .filter(ReservationCol::ExpiresAt.gt(DateTimeWithTimeZone::from(now)))
        .one(conn)
        .await?;

    Ok(reservation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voucher(first_purchase_only: bool) -> vouchers::Model {
        let now = Utc::now();
        vouchers::Model {
            id: Uuid::new_v4(),
            code: "SUMMER10".into(),
            percent_off: 10,
            usage_limit: 2,
            committed_uses: 0,
            first_purchase_only,
            valid_from: (now - Duration::days(1)).into(),
            valid_until: (now + Duration::days(1)).into(),
            created_at: now.into(),
        }
    }

    #[test]
    fn validity_window_is_half_open() {
        let v = voucher(false);
        assert!(within_validity(&v, Utc::now()));
        assert!(!within_validity(&v, Utc::now() - Duration::days(2)));
        assert!(!within_validity(&v, v.valid_until.with_timezone(&Utc)));
    }

    #[test]
    fn unrestricted_voucher_accepts_anonymous_callers() {
        let v = voucher(false);
        assert!(voucher_eligible(&v, None, 0));
        assert!(voucher_eligible(&v, Some(Uuid::new_v4()), 42));
    }

    #[test]
    fn first_purchase_voucher_needs_a_fresh_account() {
        let v = voucher(true);
        assert!(!voucher_eligible(&v, None, 0));
        assert!(voucher_eligible(&v, Some(Uuid::new_v4()), 0));
        assert!(!voucher_eligible(&v, Some(Uuid::new_v4()), 1));
    }
}
