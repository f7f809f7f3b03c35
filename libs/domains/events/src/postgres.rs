use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::BaseRepository;
use sea_orm::sea_query::{Expr, ExprTrait, Func, IntoColumnRef, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Select, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{address, coupon, event},
    error::EventResult,
    models::{
        Address, Coupon, Event, EventFilter, NewAddress, NewCoupon, NewEvent, Page, PageRequest,
    },
    repository::{AddressRepository, CouponRepository, EventRepository},
};

pub struct PgEventRepository {
    base: BaseRepository<event::Entity>,
}

impl PgEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn fetch_page(
        &self,
        query: Select<event::Entity>,
        request: PageRequest,
    ) -> EventResult<Page<Event>> {
        let db = self.base.db();
        let total = query.clone().count(db).await?;

        let rows = query
            .select_also(address::Entity)
            .order_by_asc(event::Column::Id)
            .limit(request.size)
            .offset(request.offset())
            .all(db)
            .await?;

        let content = rows
            .into_iter()
            .map(|(event, address)| event.into_event(address))
            .collect();

        Ok(Page::new(content, request, total))
    }
}

/// Events dated at or after `reference_time`, LEFT JOINed with their address
fn upcoming_query(reference_time: DateTime<Utc>) -> Select<event::Entity> {
    event::Entity::find()
        .join(JoinType::LeftJoin, event::Relation::Address.def())
        .filter(event::Column::Date.gte(reference_time))
}

fn filtered_query(reference_time: DateTime<Utc>, filter: &EventFilter) -> Select<event::Entity> {
    let mut condition = Condition::all()
        .add(event::Column::Date.gte(filter.start_date))
        .add(event::Column::Date.lte(filter.end_date));

    if let Some(title) = filter.title.as_deref() {
        condition = condition.add(lower_like((event::Entity, event::Column::Title), title));
    }
    if let Some(city) = filter.city.as_deref() {
        condition = condition.add(
            Condition::any()
                .add(address::Column::City.is_null())
                .add(lower_like((address::Entity, address::Column::City), city)),
        );
    }
    if let Some(uf) = filter.uf.as_deref() {
        condition = condition.add(
            Condition::any()
                .add(address::Column::Uf.is_null())
                .add(lower_like((address::Entity, address::Column::Uf), uf)),
        );
    }

    upcoming_query(reference_time).filter(condition)
}

/// `LOWER(col) LIKE '%term%'` with the term matched literally
fn lower_like(column: impl IntoColumnRef, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(contains_pattern(term)).escape('\\'))
}

fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

async fn insert_address<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
    input: NewAddress,
) -> Result<address::Model, DbErr> {
    address::ActiveModel::for_event(event_id, input)
        .insert(db)
        .await
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn create(&self, input: NewEvent, address: Option<NewAddress>) -> EventResult<Event> {
        let txn = self.base.db().begin().await?;

        let active_model: event::ActiveModel = input.into();
        let model = active_model.insert(&txn).await?;

        let address = match address {
            Some(address) => Some(insert_address(&txn, model.id, address).await?),
            None => None,
        };

        txn.commit().await?;

        tracing::info!(event_id = %model.id, remote = model.remote, "Created event");
        Ok(model.into_event(address))
    }

    async fn find_by_id(&self, id: Uuid) -> EventResult<Option<Event>> {
        let row = event::Entity::find_by_id(id)
            .find_also_related(address::Entity)
            .one(self.base.db())
            .await?;

        Ok(row.map(|(event, address)| event.into_event(address)))
    }

    async fn exists(&self, id: Uuid) -> EventResult<bool> {
        Ok(self.base.exists(id).await?)
    }

    async fn find_upcoming(
        &self,
        reference_time: DateTime<Utc>,
        page: PageRequest,
    ) -> EventResult<Page<Event>> {
        self.fetch_page(upcoming_query(reference_time), page).await
    }

    async fn find_filtered(
        &self,
        reference_time: DateTime<Utc>,
        filter: EventFilter,
        page: PageRequest,
    ) -> EventResult<Page<Event>> {
        self.fetch_page(filtered_query(reference_time, &filter), page)
            .await
    }
}

pub struct PgAddressRepository {
    base: BaseRepository<address::Entity>,
}

impl PgAddressRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn create(&self, event_id: Uuid, input: NewAddress) -> EventResult<Address> {
        let model = insert_address(self.base.db(), event_id, input).await?;

        tracing::info!(address_id = %model.id, event_id = %event_id, "Created address");
        Ok(model.into())
    }

    async fn find_by_event_id(&self, event_id: Uuid) -> EventResult<Option<Address>> {
        let model = address::Entity::find()
            .filter(address::Column::EventId.eq(event_id))
            .one(self.base.db())
            .await?;

        Ok(model.map(Into::into))
    }
}

pub struct PgCouponRepository {
    base: BaseRepository<coupon::Entity>,
}

impl PgCouponRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn create(&self, event_id: Uuid, input: NewCoupon) -> EventResult<Coupon> {
        let model = coupon::ActiveModel::for_event(event_id, input)
            .insert(self.base.db())
            .await?;

        tracing::info!(coupon_id = %model.id, event_id = %event_id, "Created coupon");
        Ok(model.into())
    }

    async fn find_valid(&self, event_id: Uuid, as_of: DateTime<Utc>) -> EventResult<Vec<Coupon>> {
        let models = coupon::Entity::find()
            .filter(coupon::Column::EventId.eq(event_id))
            .filter(coupon::Column::Valid.gt(as_of))
            .order_by_asc(coupon::Column::Valid)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
