use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Coupon, NewCoupon};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub discount: i32,
    pub valid: DateTimeWithTimeZone,
    pub event_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Coupon {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            discount: model.discount,
            valid: model.valid.into(),
            event_id: model.event_id,
        }
    }
}

impl ActiveModel {
    pub fn for_event(event_id: Uuid, input: NewCoupon) -> Self {
        ActiveModel {
            id: Set(Uuid::now_v7()),
            code: Set(input.code),
            discount: Set(input.discount),
            valid: Set(input.valid.into()),
            event_id: Set(event_id),
        }
    }
}
