use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("seat {seat_id} is unavailable for showtime {showtime_id}")]
    SeatUnavailable { showtime_id: Uuid, seat_id: Uuid },

    #[error("seat lock not owned by session {session_id}")]
    LockNotOwned { session_id: Uuid },

    #[error("session {0} has expired")]
    SessionExpired(Uuid),

    #[error("voucher has no remaining uses")]
    VoucherExhausted,

    #[error("voucher is outside its validity window")]
    VoucherNotInValidityWindow,

    #[error("voucher restrictions are not met by this caller")]
    VoucherRestricted,

    #[error("pricing mismatch: order amount {quoted} differs from snapshot total {snapshot}")]
    PricingMismatch { quoted: i64, snapshot: i64 },

    #[error("stale session version: submitted {submitted}, current {current}")]
    ConcurrencyConflict { submitted: i32, current: i32 },

    #[error("payment provider error: {0}")]
    PaymentProvider(String),

    #[error("payment order is in state {0}, expected PENDING")]
    InvalidOrderState(String),

    #[error("illegal session transition {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Database error")]
    DbError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::SeatUnavailable { .. } => StatusCode::CONFLICT,
            AppError::LockNotOwned { .. } => StatusCode::CONFLICT,
            AppError::SessionExpired(_) => StatusCode::GONE,
            AppError::VoucherExhausted
            | AppError::VoucherNotInValidityWindow
            | AppError::VoucherRestricted => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PricingMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
            AppError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidOrderState(_) => StatusCode::CONFLICT,
            AppError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            AppError::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
