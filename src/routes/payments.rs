use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payments::CallbackAck, error::AppResult, provider::ProviderCallback,
    response::ApiResponse, services::payment_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(provider_webhook))
}

/// Provider payment callback. Delivery is at-least-once; duplicates are
/// acknowledged with the original outcome.
#[utoipa::path(post, path = "/payments/webhook", tag = "Payments")]
pub async fn provider_webhook(
    State(state): State<AppState>,
    Json(payload): Json<ProviderCallback>,
) -> AppResult<Json<ApiResponse<CallbackAck>>> {
    let response = payment_service::handle_provider_callback(&state, payload).await?;
    Ok(Json(response))
}
