use sea_orm::entity::prelude::*;

use crate::models::OrderStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Option<Uuid>,
    pub showtime_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub provider: String,
    pub status: OrderStatus,
    #[sea_orm(unique)]
    pub order_code: String,
    pub payment_link: String,
    pub qr_payload: String,
    pub link_expires_at: DateTimeWithTimeZone,
    pub booking_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking_sessions::Entity",
        from = "Column::SessionId",
        to = "super::booking_sessions::Column::Id"
    )]
    BookingSessions,
}

impl Related<super::booking_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookingSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
