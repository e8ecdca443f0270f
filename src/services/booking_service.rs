use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    dto::bookings::{BookingDetail, BookingList},
    entity::{
        bookings::{self, Column as BookingCol, Entity as Bookings},
        tickets::{self, Column as TicketCol, Entity as Tickets},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Read view for fulfillment, notifications and the booking confirmation
/// screen. A booking is only ever observed together with its full ticket
/// set; both are written in the same finalizer transaction.
pub async fn get_booking(
    state: &AppState,
    user: Option<&AuthUser>,
    booking_id: Uuid,
) -> AppResult<ApiResponse<BookingDetail>> {
    let booking = Bookings::find_by_id(booking_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let (Some(owner), Some(caller)) = (booking.customer_id, user) {
        if owner != caller.user_id {
            return Err(AppError::Forbidden);
        }
    }

    let tickets = Tickets::find()
        .filter(TicketCol::BookingId.eq(booking.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ticket_from_entity)
        .collect();

    let detail = BookingDetail {
        booking: booking_from_entity(booking)?,
        tickets,
    };
    Ok(ApiResponse::ok(detail))
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<BookingList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Bookings::find()
        .filter(BookingCol::CustomerId.eq(user.user_id))
        .order_by_desc(BookingCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", BookingList { items }, Some(meta)))
}

pub(crate) fn booking_from_entity(model: bookings::Model) -> AppResult<models::Booking> {
    let pricing = serde_json::from_value(model.pricing_snapshot)
        .map_err(|err| AppError::Internal(err.into()))?;
    Ok(models::Booking {
        id: model.id,
        code: model.code,
        showtime_id: model.showtime_id,
        customer_id: model.customer_id,
        voucher_id: model.voucher_id,
        total_amount: model.total_amount,
        status: model.status,
        payment_provider: model.payment_provider,
        payment_transaction_id: model.payment_transaction_id,
        payment_status: model.payment_status,
        session_id: model.session_id,
        pricing,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn ticket_from_entity(model: tickets::Model) -> models::Ticket {
    models::Ticket {
        id: model.id,
        showtime_id: model.showtime_id,
        seat_id: model.seat_id,
        booking_id: model.booking_id,
        price: model.price,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
