use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub percent_off: i32,
    pub usage_limit: i32,
    pub committed_uses: i32,
    pub first_purchase_only: bool,
    pub valid_from: DateTimeWithTimeZone,
    pub valid_until: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::voucher_reservations::Entity")]
    VoucherReservations,
}

impl Related<super::voucher_reservations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VoucherReservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
