use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::EventResult;
use crate::models::{
    Address, Coupon, Event, EventFilter, NewAddress, NewCoupon, NewEvent, Page, PageRequest,
};

/// Event query layer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert an event and, for in-person events, its address as one unit
    async fn create(&self, event: NewEvent, address: Option<NewAddress>) -> EventResult<Event>;

    async fn find_by_id(&self, id: Uuid) -> EventResult<Option<Event>>;

    async fn exists(&self, id: Uuid) -> EventResult<bool>;

    /// Events dated at or after `reference_time`, in insertion order
    async fn find_upcoming(
        &self,
        reference_time: DateTime<Utc>,
        page: PageRequest,
    ) -> EventResult<Page<Event>>;

    /// Upcoming events that also satisfy `filter`
    async fn find_filtered(
        &self,
        reference_time: DateTime<Utc>,
        filter: EventFilter,
        page: PageRequest,
    ) -> EventResult<Page<Event>>;
}

/// Address lookup by owning event
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn create(&self, event_id: Uuid, input: NewAddress) -> EventResult<Address>;

    async fn find_by_event_id(&self, event_id: Uuid) -> EventResult<Option<Address>>;
}

/// Coupon lookup by owning event
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn create(&self, event_id: Uuid, input: NewCoupon) -> EventResult<Coupon>;

    /// Coupons with `valid > as_of`, earliest expiry first
    async fn find_valid(&self, event_id: Uuid, as_of: DateTime<Utc>) -> EventResult<Vec<Coupon>>;
}

/// In-memory implementation of AddressRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryAddressRepository {
    addresses: Arc<RwLock<HashMap<Uuid, Address>>>,
}

impl InMemoryAddressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.addresses.read().await.len()
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn create(&self, event_id: Uuid, input: NewAddress) -> EventResult<Address> {
        let address = Address {
            id: Uuid::now_v7(),
            city: input.city,
            uf: input.uf,
            event_id,
        };
        self.addresses
            .write()
            .await
            .insert(event_id, address.clone());

        tracing::info!(address_id = %address.id, event_id = %event_id, "Created address");
        Ok(address)
    }

    async fn find_by_event_id(&self, event_id: Uuid) -> EventResult<Option<Address>> {
        Ok(self.addresses.read().await.get(&event_id).cloned())
    }
}

/// In-memory implementation of EventRepository (for development/testing)
///
/// Keyed by UUIDv7 in a `BTreeMap`, so iteration order is insertion order.
/// Addresses live in the shared [`InMemoryAddressRepository`] returned by
/// [`InMemoryEventRepository::addresses`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<BTreeMap<Uuid, Event>>>,
    addresses: InMemoryAddressRepository,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addresses(addresses: InMemoryAddressRepository) -> Self {
        Self {
            events: Arc::default(),
            addresses,
        }
    }

    /// Handle to the address store backing this repository
    pub fn addresses(&self) -> InMemoryAddressRepository {
        self.addresses.clone()
    }

    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    async fn joined(&self, reference_time: DateTime<Utc>) -> EventResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut result = Vec::new();
        for event in events.values().filter(|e| e.date >= reference_time) {
            let mut event = event.clone();
            event.address = self.addresses.find_by_event_id(event.id).await?;
            result.push(event);
        }
        Ok(result)
    }
}

fn paginate(events: Vec<Event>, request: PageRequest) -> Page<Event> {
    let total = events.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let size = usize::try_from(request.size).unwrap_or(usize::MAX);
    let content = events.into_iter().skip(offset).take(size).collect();
    Page::new(content, request, total)
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(&self, input: NewEvent, address: Option<NewAddress>) -> EventResult<Event> {
        let mut event = Event {
            id: Uuid::now_v7(),
            title: input.title,
            description: input.description,
            img_url: input.img_url,
            event_url: input.event_url,
            remote: input.remote,
            date: input.date,
            address: None,
        };

        let mut events = self.events.write().await;
        events.insert(event.id, event.clone());
        drop(events);

        if let Some(address) = address {
            event.address = Some(self.addresses.create(event.id, address).await?);
        }

        tracing::info!(event_id = %event.id, remote = event.remote, "Created event");
        Ok(event)
    }

    async fn find_by_id(&self, id: Uuid) -> EventResult<Option<Event>> {
        let event = self.events.read().await.get(&id).cloned();
        match event {
            Some(mut event) => {
                event.address = self.addresses.find_by_event_id(id).await?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, id: Uuid) -> EventResult<bool> {
        Ok(self.events.read().await.contains_key(&id))
    }

    async fn find_upcoming(
        &self,
        reference_time: DateTime<Utc>,
        page: PageRequest,
    ) -> EventResult<Page<Event>> {
        let events = self.joined(reference_time).await?;
        Ok(paginate(events, page))
    }

    async fn find_filtered(
        &self,
        reference_time: DateTime<Utc>,
        filter: EventFilter,
        page: PageRequest,
    ) -> EventResult<Page<Event>> {
        let events = self
            .joined(reference_time)
            .await?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        Ok(paginate(events, page))
    }
}

/// In-memory implementation of CouponRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCouponRepository {
    coupons: Arc<RwLock<HashMap<Uuid, Vec<Coupon>>>>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn create(&self, event_id: Uuid, input: NewCoupon) -> EventResult<Coupon> {
        let coupon = Coupon {
            id: Uuid::now_v7(),
            code: input.code,
            discount: input.discount,
            valid: input.valid,
            event_id,
        };
        self.coupons
            .write()
            .await
            .entry(event_id)
            .or_default()
            .push(coupon.clone());

        tracing::info!(coupon_id = %coupon.id, event_id = %event_id, "Created coupon");
        Ok(coupon)
    }

    async fn find_valid(&self, event_id: Uuid, as_of: DateTime<Utc>) -> EventResult<Vec<Coupon>> {
        let coupons = self.coupons.read().await;
        let mut valid: Vec<Coupon> = coupons
            .get(&event_id)
            .map(|list| list.iter().filter(|c| c.valid > as_of).cloned().collect())
            .unwrap_or_default();
        valid.sort_by_key(|c| c.valid);
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
    }

    fn new_event(title: &str, days: i64, remote: bool) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: format!("{} description", title),
            img_url: None,
            event_url: "https://events.example.com".to_string(),
            remote,
            date: now() + Duration::days(days),
        }
    }

    fn recife() -> Option<NewAddress> {
        Some(NewAddress {
            city: "Recife".to_string(),
            uf: "PE".to_string(),
        })
    }

    fn page(size: u64) -> PageRequest {
        PageRequest::new(0, size, 100).unwrap()
    }

    #[tokio::test]
    async fn test_create_with_address_is_visible_through_shared_store() {
        let repo = InMemoryEventRepository::new();
        let addresses = repo.addresses();

        let event = repo
            .create(new_event("Rust Meetup", 3, false), recife())
            .await
            .unwrap();

        assert_eq!(event.city(), "Recife");
        let stored = addresses.find_by_event_id(event.id).await.unwrap().unwrap();
        assert_eq!(stored.uf, "PE");

        let found = repo.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(found, event);
        assert!(repo.exists(event.id).await.unwrap());
        assert!(!repo.exists(Uuid::now_v7()).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_upcoming_excludes_past_and_keeps_insertion_order() {
        let repo = InMemoryEventRepository::new();
        repo.create(new_event("Past", -1, true), None).await.unwrap();
        let later = repo.create(new_event("Later", 30, true), None).await.unwrap();
        let sooner = repo.create(new_event("Sooner", 2, true), None).await.unwrap();

        let result = repo.find_upcoming(now(), page(10)).await.unwrap();
        assert_eq!(result.total_elements, 2);
        let ids: Vec<Uuid> = result.content.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![later.id, sooner.id]);
    }

    #[tokio::test]
    async fn test_find_upcoming_paginates() {
        let repo = InMemoryEventRepository::new();
        for i in 0..5 {
            repo.create(new_event(&format!("Event {}", i), i + 1, true), None)
                .await
                .unwrap();
        }

        let second = repo
            .find_upcoming(now(), PageRequest::new(1, 2, 100).unwrap())
            .await
            .unwrap();
        assert_eq!(second.content.len(), 2);
        assert_eq!(second.content[0].title, "Event 2");
        assert_eq!(second.total_pages, 3);

        let beyond = repo
            .find_upcoming(now(), PageRequest::new(9, 2, 100).unwrap())
            .await
            .unwrap();
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_elements, 5);
    }

    #[tokio::test]
    async fn test_find_filtered_with_defaults_equals_upcoming() {
        let repo = InMemoryEventRepository::new();
        repo.create(new_event("Tech Conference 2024", 5, false), recife())
            .await
            .unwrap();
        repo.create(new_event("Online Summit", 6, true), None)
            .await
            .unwrap();

        let upcoming = repo.find_upcoming(now(), page(10)).await.unwrap();
        let filtered = repo
            .find_filtered(now(), EventFilter::default(), page(10))
            .await
            .unwrap();
        assert_eq!(upcoming, filtered);
    }

    #[tokio::test]
    async fn test_find_filtered_by_city_keeps_remote_events() {
        let repo = InMemoryEventRepository::new();
        repo.create(new_event("Recife Rust", 5, false), recife())
            .await
            .unwrap();
        repo.create(
            new_event("SP Rust", 5, false),
            Some(NewAddress {
                city: "São Paulo".to_string(),
                uf: "SP".to_string(),
            }),
        )
        .await
        .unwrap();
        repo.create(new_event("Remote Rust", 5, true), None)
            .await
            .unwrap();

        let filter = EventFilter {
            city: Some("rec".to_string()),
            ..Default::default()
        };
        let result = repo.find_filtered(now(), filter, page(10)).await.unwrap();
        let titles: Vec<&str> = result.content.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Recife Rust", "Remote Rust"]);
    }

    #[tokio::test]
    async fn test_coupons_only_valid_after_reference_sorted() {
        let repo = InMemoryCouponRepository::new();
        let event_id = Uuid::now_v7();
        for (code, days) in [("LATE", 20), ("EXPIRED", -1), ("SOON", 2)] {
            repo.create(
                event_id,
                NewCoupon {
                    code: code.to_string(),
                    discount: 10,
                    valid: now() + Duration::days(days),
                },
            )
            .await
            .unwrap();
        }

        let valid = repo.find_valid(event_id, now()).await.unwrap();
        let codes: Vec<&str> = valid.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["SOON", "LATE"]);

        assert!(repo.find_valid(Uuid::now_v7(), now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_coupon_expiring_exactly_now_is_not_valid() {
        let repo = InMemoryCouponRepository::new();
        let event_id = Uuid::now_v7();
        repo.create(
            event_id,
            NewCoupon {
                code: "EDGE".to_string(),
                discount: 5,
                valid: now(),
            },
        )
        .await
        .unwrap();

        assert!(repo.find_valid(event_id, now()).await.unwrap().is_empty());
    }
}
