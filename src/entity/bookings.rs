use sea_orm::entity::prelude::*;

use crate::models::BookingStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
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
    pub pricing_snapshot: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::showtimes::Entity",
        from = "Column::ShowtimeId",
        to = "super::showtimes::Column::Id"
    )]
    Showtimes,
    #[sea_orm(has_many = "super::tickets::Entity")]
    Tickets,
}

impl Related<super::showtimes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Showtimes.def()
    }
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
