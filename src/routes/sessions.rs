use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::sessions::{ApplyVoucherRequest, CreateSessionRequest, SessionDetail, SetItemsRequest},
    error::AppResult,
    middleware::auth::MaybeUser,
    response::ApiResponse,
    services::session_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session))
        .route("/{id}/items", put(set_items))
        .route("/{id}/voucher", post(apply_voucher))
        .route("/{id}/checkout", post(begin_checkout))
        .route("/{id}/cancel", post(cancel_session))
}

#[utoipa::path(post, path = "/sessions", tag = "Sessions")]
pub async fn create_session(
    State(state): State<AppState>,
    user: MaybeUser,
    Json(payload): Json<CreateSessionRequest>,
) -> AppResult<Json<ApiResponse<SessionDetail>>> {
    let response = session_service::create_session(&state, user.as_ref(), payload).await?;
    Ok(Json(response))
}

#[utoipa::path(get, path = "/sessions/{id}", tag = "Sessions")]
pub async fn get_session(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SessionDetail>>> {
    let response = session_service::get_session(&state, user.as_ref(), id).await?;
    Ok(Json(response))
}

#[utoipa::path(put, path = "/sessions/{id}/items", tag = "Sessions")]
pub async fn set_items(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetItemsRequest>,
) -> AppResult<Json<ApiResponse<SessionDetail>>> {
    let response = session_service::set_items(&state, user.as_ref(), id, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(post, path = "/sessions/{id}/voucher", tag = "Sessions")]
pub async fn apply_voucher(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplyVoucherRequest>,
) -> AppResult<Json<ApiResponse<SessionDetail>>> {
    let response = session_service::apply_voucher(&state, user.as_ref(), id, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(post, path = "/sessions/{id}/checkout", tag = "Sessions")]
pub async fn begin_checkout(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SessionDetail>>> {
    let response = session_service::begin_checkout(&state, user.as_ref(), id).await?;
    Ok(Json(response))
}

#[utoipa::path(post, path = "/sessions/{id}/cancel", tag = "Sessions")]
pub async fn cancel_session(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SessionDetail>>> {
    let response = session_service::cancel(&state, user.as_ref(), id).await?;
    Ok(Json(response))
}
