use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "seats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub row: String,
    pub number: i32,
    pub price: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::showtimes::Entity",
        from = "Column::ShowtimeId",
        to = "super::showtimes::Column::Id"
    )]
    Showtimes,
}

impl Related<super::showtimes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Showtimes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
