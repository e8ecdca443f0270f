use sea_orm::entity::prelude::*;

use crate::models::SessionState;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "booking_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub showtime_id: Uuid,
    pub voucher_id: Option<Uuid>,
    pub voucher_reservation_id: Option<Uuid>,
    pub state: SessionState,
    pub pricing_snapshot: Json,
    pub expires_at: DateTimeWithTimeZone,
    pub version: i32,
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
    #[sea_orm(has_many = "super::session_items::Entity")]
    SessionItems,
    #[sea_orm(has_many = "super::seat_locks::Entity")]
    SeatLocks,
}

impl Related<super::showtimes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Showtimes.def()
    }
}

impl Related<super::session_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionItems.def()
    }
}

impl Related<super::seat_locks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeatLocks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
