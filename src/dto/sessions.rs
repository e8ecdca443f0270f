use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{BookingSession, ConcessionSelection, PaymentOrder, SessionItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub showtime_id: Uuid,
}

/// Full replacement of the session's selection. `version` must match the
/// session's current version; stale submissions are rejected.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetItemsRequest {
    pub version: i32,
    pub seat_ids: Vec<Uuid>,
    #[serde(default)]
    pub concessions: Vec<ConcessionSelection>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyVoucherRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDetail {
    pub session: BookingSession,
    pub items: Vec<SessionItem>,
    pub order: Option<PaymentOrder>,
}
