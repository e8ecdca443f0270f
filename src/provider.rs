use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Worth retrying with backoff.
    #[error("transient provider failure: {0}")]
    Transient(String),

    #[error("provider rejected the order: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct ProviderOrderRequest {
    pub order_code: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub expires_at: DateTime<Utc>,
}

/// Artifacts handed back by the provider for a created order.
#[derive(Debug, Clone)]
pub struct ProviderOrder {
    pub payment_link: String,
    pub qr_payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Success,
    Failed,
}

impl CallbackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Wire payload of the provider's asynchronous payment callback.
/// Delivery is at-least-once; consumers must de-duplicate by `order_code`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderCallback {
    pub order_code: String,
    pub status: CallbackStatus,
    pub transaction_id: String,
    pub signature: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn create_order(&self, req: &ProviderOrderRequest)
    -> Result<ProviderOrder, ProviderError>;

    /// Authenticate a callback before anything else looks at it.
    fn verify_callback(&self, secret: &str, callback: &ProviderCallback) -> bool;
}

/// Stand-in provider: fabricates deterministic payment artifacts and
/// authenticates callbacks with a shared secret. Can be told to fail its
/// first N `create_order` calls to exercise the adapter's retry path.
#[derive(Debug, Default)]
pub struct SandboxProvider {
    fail_first: AtomicU32,
}

impl SandboxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(attempts: u32) -> Self {
        Self {
            fail_first: AtomicU32::new(attempts),
        }
    }

    pub fn signature_for(secret: &str, order_code: &str, status: CallbackStatus) -> String {
        format!("sbx1:{}:{}:{}", order_code, status.as_str(), secret)
    }
}

#[async_trait]
impl PaymentProvider for SandboxProvider {
    fn name(&self) -> &str {
        "sandbox"
    }

    async fn create_order(
        &self,
        req: &ProviderOrderRequest,
    ) -> Result<ProviderOrder, ProviderError> {
        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::Transient("simulated outage".into()));
        }

        if req.amount <= 0 {
            return Err(ProviderError::Rejected("non-positive amount".into()));
        }

        Ok(ProviderOrder {
            payment_link: format!("https://pay.sandbox.example/checkout/{}", req.order_code),
            qr_payload: format!(
                "SANDBOX|{}|{}|{}",
                req.order_code, req.amount, req.currency
            ),
        })
    }

    fn verify_callback(&self, secret: &str, callback: &ProviderCallback) -> bool {
        callback.signature == Self::signature_for(secret, &callback.order_code, callback.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderOrderRequest {
        ProviderOrderRequest {
            order_code: "PAY-20260807-abcd1234".into(),
            amount: 144_000,
            currency: "VND".into(),
            description: "2 seats".into(),
            expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sandbox_creates_deterministic_artifacts() {
        let provider = SandboxProvider::new();
        let order = provider.create_order(&request()).await.unwrap();
        assert_eq!(
            order.payment_link,
            "https://pay.sandbox.example/checkout/PAY-20260807-abcd1234"
        );
        assert!(order.qr_payload.contains("144000"));
    }

    #[tokio::test]
    async fn sandbox_fails_first_n_attempts() {
        let provider = SandboxProvider::failing_first(2);
        assert!(matches!(
            provider.create_order(&request()).await,
            Err(ProviderError::Transient(_))
        ));
        assert!(matches!(
            provider.create_order(&request()).await,
            Err(ProviderError::Transient(_))
        ));
        assert!(provider.create_order(&request()).await.is_ok());
    }

    #[test]
    fn callback_verification_rejects_bad_signature() {
        let provider = SandboxProvider::new();
        let mut callback = ProviderCallback {
            order_code: "PAY-1".into(),
            status: CallbackStatus::Success,
            transaction_id: "tx-1".into(),
            signature: SandboxProvider::signature_for("s3cret", "PAY-1", CallbackStatus::Success),
        };
        assert!(provider.verify_callback("s3cret", &callback));

        callback.signature = "forged".into();
        assert!(!provider.verify_callback("s3cret", &callback));

        // A failure callback signed as a success must not verify either.
        let relabeled = ProviderCallback {
            order_code: "PAY-1".into(),
            status: CallbackStatus::Failed,
            transaction_id: "tx-1".into(),
            signature: SandboxProvider::signature_for("s3cret", "PAY-1", CallbackStatus::Success),
        };
        assert!(!provider.verify_callback("s3cret", &relabeled));
    }
}
