use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "session_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub seat_id: Option<Uuid>,
    pub concession_code: Option<String>,
    pub quantity: i32,
    pub position: i32,
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
