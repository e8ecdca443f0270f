use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a booking session.
///
/// `Active → Checkout → {Converted | Expired | Cancelled}`. `Converted` is
/// reachable only through the finalizer, `Expired` only through the reaper.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "CHECKOUT")]
    Checkout,
    #[sea_orm(string_value = "CONVERTED")]
    Converted,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converted | Self::Expired | Self::Cancelled)
    }

    /// Legal transitions of the session state machine.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Checkout)
                | (Self::Active, Self::Expired)
                | (Self::Active, Self::Cancelled)
                | (Self::Checkout, Self::Converted)
                | (Self::Checkout, Self::Expired)
                | (Self::Checkout, Self::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Checkout => "CHECKOUT",
            Self::Converted => "CONVERTED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        }
    }
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "CHECKED_IN")]
    CheckedIn,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "CHECKED_IN")]
    CheckedIn,
    #[sea_orm(string_value = "VOID")]
    Void,
}

/// Frozen price breakdown for a session. Amounts are minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct PricingSnapshot {
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub commission: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConcessionSelection {
    pub code: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Showtime {
    pub id: Uuid,
    pub movie_title: String,
    pub auditorium: String,
    pub starts_at: DateTime<Utc>,
    pub sale_closes_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Seat {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub row: String,
    pub number: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingSession {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub showtime_id: Uuid,
    pub voucher_id: Option<Uuid>,
    pub state: SessionState,
    pub pricing: PricingSnapshot,
    pub expires_at: DateTime<Utc>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionItem {
    pub id: Uuid,
    pub session_id: Uuid,
    pub seat_id: Option<Uuid>,
    pub concession_code: Option<String>,
    pub quantity: i32,
    pub position: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentOrder {
    pub id: Uuid,
    pub session_id: Uuid,
    pub showtime_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub provider: String,
    pub status: OrderStatus,
    pub order_code: String,
    pub payment_link: String,
    pub qr_payload: String,
    pub link_expires_at: DateTime<Utc>,
    pub booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub code: String,
    pub showtime_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub voucher_id: Option<Uuid>,
    pub total_amount: i64,
    pub status: BookingStatus,
    pub payment_provider: String,
    pub payment_transaction_id: Option<String>,
    pub payment_status: String,
    pub session_id: Uuid,
    pub pricing: PricingSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub booking_id: Uuid,
    pub price: i64,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_session_can_start_checkout_or_die() {
        assert!(SessionState::Active.can_transition_to(SessionState::Checkout));
        assert!(SessionState::Active.can_transition_to(SessionState::Expired));
        assert!(SessionState::Active.can_transition_to(SessionState::Cancelled));
        assert!(!SessionState::Active.can_transition_to(SessionState::Converted));
    }

    #[test]
    fn checkout_session_can_convert() {
        assert!(SessionState::Checkout.can_transition_to(SessionState::Converted));
        assert!(SessionState::Checkout.can_transition_to(SessionState::Expired));
        assert!(SessionState::Checkout.can_transition_to(SessionState::Cancelled));
        assert!(!SessionState::Checkout.can_transition_to(SessionState::Active));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [
            SessionState::Converted,
            SessionState::Expired,
            SessionState::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                SessionState::Active,
                SessionState::Checkout,
                SessionState::Converted,
                SessionState::Expired,
                SessionState::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn pending_is_the_only_open_order_status() {
        assert!(!OrderStatus::Pending.is_terminal());
        for status in [
            OrderStatus::Paid,
            OrderStatus::Expired,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
        ] {
            assert!(status.is_terminal());
        }
    }
}
