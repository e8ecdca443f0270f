use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::bookings::{BookingDetail, BookingList},
    error::AppResult,
    middleware::auth::{AuthUser, MaybeUser},
    response::ApiResponse,
    routes::params::Pagination,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings))
        .route("/{id}", get(get_booking))
}

#[utoipa::path(get, path = "/bookings", tag = "Bookings")]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let response = booking_service::list_bookings(&state, &user, pagination).await?;
    Ok(Json(response))
}

#[utoipa::path(get, path = "/bookings/{id}", tag = "Bookings")]
pub async fn get_booking(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingDetail>>> {
    let response = booking_service::get_booking(&state, user.as_ref(), id).await?;
    Ok(Json(response))
}
