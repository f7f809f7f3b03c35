use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Event, NewEvent};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub img_url: Option<String>,
    pub event_url: String,
    pub remote: bool,
    pub date: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::address::Entity")]
    Address,
    #[sea_orm(has_many = "super::coupon::Entity")]
    Coupons,
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl Related<super::coupon::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coupons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Joins the row with its LEFT JOINed address
    pub fn into_event(self, address: Option<super::address::Model>) -> Event {
        Event {
            id: self.id,
            title: self.title,
            description: self.description,
            img_url: self.img_url,
            event_url: self.event_url,
            remote: self.remote,
            date: self.date.into(),
            address: address.map(Into::into),
        }
    }
}

impl From<NewEvent> for ActiveModel {
    fn from(input: NewEvent) -> Self {
        ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(input.title),
            description: Set(input.description),
            img_url: Set(input.img_url),
            event_url: Set(input.event_url),
            remote: Set(input.remote),
            date: Set(input.date.into()),
            created_at: Set(chrono::Utc::now().into()),
        }
    }
}
