use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Address, NewAddress};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub city: String,
    pub uf: String,
    #[sea_orm(unique)]
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

impl From<Model> for Address {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            city: model.city,
            uf: model.uf,
            event_id: model.event_id,
        }
    }
}

impl ActiveModel {
    pub fn for_event(event_id: Uuid, input: NewAddress) -> Self {
        ActiveModel {
            id: Set(Uuid::now_v7()),
            city: Set(input.city),
            uf: Set(input.uf),
            event_id: Set(event_id),
        }
    }
}
