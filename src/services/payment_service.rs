use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use uuid::Uuid;

use crate::{
    dto::payments::CallbackAck,
    entity::{booking_sessions, payment_orders},
    error::{AppError, AppResult},
    models::{self, OrderStatus},
    provider::{
        CallbackStatus, PaymentProvider, ProviderCallback, ProviderError, ProviderOrderRequest,
    },
    response::ApiResponse,
    services::finalizer_service,
    state::AppState,
};

/// Backoff schedule for transient provider failures.
#[derive(Debug, Clone)]
struct RetryPolicy {
    max_retries: u32,
    initial_delay: StdDuration,
    multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: StdDuration::from_millis(100),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> StdDuration {
        self.initial_delay * self.multiplier.saturating_pow(attempt)
    }
}

pub fn build_order_code(now: DateTime<Utc>, order_id: Uuid) -> String {
    let date = now.format("%Y%m%d");
    let suffix = order_id.to_string();
    format!("PAY-{}-{}", date, &suffix[..8])
}

/// Create a provider order for the frozen checkout amount and persist the
/// PENDING PaymentOrder. The payment link never outlives the session.
pub async fn create_order<C: ConnectionTrait>(
    conn: &C,
    state: &AppState,
    now: DateTime<Utc>,
    session: &booking_sessions::Model,
    amount: i64,
) -> AppResult<payment_orders::Model> {
    let order_id = Uuid::new_v4();
    let order_code = build_order_code(now, order_id);

    let session_deadline = session.expires_at.with_timezone(&Utc);
    let link_expires_at = (now + state.config.payment_link_ttl()).min(session_deadline);

    let request = ProviderOrderRequest {
        order_code: order_code.clone(),
        amount,
        currency: state.config.currency.clone(),
        description: format!("cinema booking session {}", session.id),
        expires_at: link_expires_at,
    };
    let artifacts = create_with_retry(state.provider.as_ref(), &request).await?;

    let order = payment_orders::ActiveModel {
        id: Set(order_id),
        session_id: Set(session.id),
        user_id: Set(session.user_id),
        showtime_id: Set(session.showtime_id),
        amount: Set(amount),
        currency: Set(state.config.currency.clone()),
        provider: Set(state.provider.name().to_string()),
        status: Set(OrderStatus::Pending),
        order_code: Set(order_code),
        payment_link: Set(artifacts.payment_link),
        qr_payload: Set(artifacts.qr_payload),
        link_expires_at: Set(link_expires_at.into()),
        booking_id: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    Ok(order)
}

async fn create_with_retry(
    provider: &dyn PaymentProvider,
    request: &ProviderOrderRequest,
) -> AppResult<crate::provider::ProviderOrder> {
    let policy = RetryPolicy::default();
    let mut attempt = 0;

    loop {
        match provider.create_order(request).await {
            Ok(order) => return Ok(order),
            Err(ProviderError::Rejected(reason)) => {
                return Err(AppError::PaymentProvider(reason));
            }
            Err(ProviderError::Transient(reason)) => {
                if attempt >= policy.max_retries {
                    return Err(AppError::PaymentProvider(reason));
                }
                tracing::warn!(
                    attempt,
                    order_code = %request.order_code,
                    error = %reason,
                    "payment provider call failed, retrying"
                );
                tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
                attempt += 1;
            }
        }
    }
}

/// Entry point for the provider's asynchronous callback. Verifies the
/// payload, then hands the normalized outcome to the finalizer. Duplicate
/// success deliveries resolve to the already-created booking.
pub async fn handle_provider_callback(
    state: &AppState,
    payload: ProviderCallback,
) -> AppResult<ApiResponse<CallbackAck>> {
    if !state
        .provider
        .verify_callback(&state.config.webhook_secret, &payload)
    {
        tracing::warn!(order_code = %payload.order_code, "rejected callback with bad signature");
        return Err(AppError::Forbidden);
    }

    match payload.status {
        CallbackStatus::Success => {
            let booking_id = finalizer_service::confirm_payment(
                state,
                &payload.order_code,
                Some(&payload.transaction_id),
            )
            .await?;
            Ok(ApiResponse::ok(CallbackAck {
                received: true,
                booking_id: Some(booking_id),
            }))
        }
        CallbackStatus::Failed => {
            finalizer_service::confirm_payment_failed(state, &payload.order_code).await?;
            Ok(ApiResponse::ok(CallbackAck {
                received: true,
                booking_id: None,
            }))
        }
    }
}

pub(crate) fn order_from_entity(model: payment_orders::Model) -> models::PaymentOrder {
    models::PaymentOrder {
        id: model.id,
        session_id: model.session_id,
        showtime_id: model.showtime_id,
        amount: model.amount,
        currency: model.currency,
        provider: model.provider,
        status: model.status,
        order_code: model.order_code,
        payment_link: model.payment_link,
        qr_payload: model.qr_payload,
        link_expires_at: model.link_expires_at.with_timezone(&Utc),
        booking_id: model.booking_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_code_carries_date_and_id_prefix() {
        let now = DateTime::parse_from_rfc3339("2026-08-07T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = Uuid::parse_str("a1b2c3d4-0000-0000-0000-000000000000").unwrap();

        assert_eq!(build_order_code(now, id), "PAY-20260807-a1b2c3d4");
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), StdDuration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), StdDuration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), StdDuration::from_millis(400));
    }
}
