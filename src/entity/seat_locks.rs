use sea_orm::entity::prelude::*;

// One live row per (showtime_id, seat_id); enforced by a unique index.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "seat_locks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub session_id: Uuid,
    pub locked_until: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
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
