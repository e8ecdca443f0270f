use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Acknowledgement returned to the provider. Redeliveries get the same
/// answer as the original delivery.
#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackAck {
    pub received: bool,
    pub booking_id: Option<Uuid>,
}
