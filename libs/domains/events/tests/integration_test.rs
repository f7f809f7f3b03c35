//! Integration tests for the events domain
//!
//! Run against real PostgreSQL via testcontainers to check:
//! - the LEFT JOIN and filter predicate as executed by Postgres
//! - event + address creation is atomic
//! - coupon validity is evaluated in SQL

use chrono::Duration;
use domain_events::*;
use sea_orm::{EntityTrait, PaginatorTrait};
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

fn page(size: u64) -> PageRequest {
    PageRequest::new(0, size, 100).unwrap()
}

fn new_event(builder: &TestDataBuilder, suffix: &str, days: i64, remote: bool) -> NewEvent {
    NewEvent {
        title: builder.title(suffix),
        description: format!("{} description", suffix),
        img_url: None,
        event_url: builder.event_url(suffix),
        remote,
        date: builder.days_from_now(days),
    }
}

fn address(city: &str, uf: &str) -> Option<NewAddress> {
    Some(NewAddress {
        city: city.to_string(),
        uf: uf.to_string(),
    })
}

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_find_event_with_address() {
    let db = TestDatabase::new().await;
    let events = PgEventRepository::new(db.connection());
    let addresses = PgAddressRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("create_and_find");

    let created = events
        .create(new_event(&builder, "main", 10, false), address("Recife", "PE"))
        .await
        .unwrap();

    let found = assert_some(
        events.find_by_id(created.id).await.unwrap(),
        "created event",
    );
    assert_uuid_eq(found.id, created.id, "event id");
    assert_eq!(found.date, created.date);
    assert_eq!(found.city(), "Recife");

    let stored = assert_some(
        addresses.find_by_event_id(created.id).await.unwrap(),
        "address of created event",
    );
    assert_eq!(stored.uf, "PE");
}

#[tokio::test]
async fn test_find_by_id_unknown_returns_none() {
    let db = TestDatabase::new().await;
    let events = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("unknown_event");

    assert!(events.find_by_id(builder.unknown_id()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_address_failure_rolls_back_event() {
    let db = TestDatabase::new().await;
    let events = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("atomic_create");

    // Postgres rejects NUL bytes in text columns
    let result = events
        .create(
            new_event(&builder, "atomic", 5, false),
            address("Reci\0fe", "PE"),
        )
        .await;

    assert!(matches!(result, Err(EventError::Database(_))));
    let remaining = entity::event::Entity::find()
        .count(&db.connection())
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_find_upcoming_skips_past_events_in_insertion_order() {
    let db = TestDatabase::new().await;
    let events = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("upcoming_order");

    events
        .create(new_event(&builder, "past", -3, true), None)
        .await
        .unwrap();
    let far = events
        .create(new_event(&builder, "far", 60, true), None)
        .await
        .unwrap();
    let near = events
        .create(new_event(&builder, "near", 1, false), address("Natal", "RN"))
        .await
        .unwrap();

    let result = events
        .find_upcoming(chrono::Utc::now(), page(10))
        .await
        .unwrap();

    assert_eq!(result.total_elements, 2);
    let ids: Vec<_> = result.content.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![far.id, near.id]);
    assert_eq!(result.content[0].address, None);
    assert_eq!(result.content[1].city(), "Natal");
}

#[tokio::test]
async fn test_find_upcoming_paginates() {
    let db = TestDatabase::new().await;
    let events = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("upcoming_pages");

    for i in 0..5 {
        events
            .create(new_event(&builder, &format!("e{}", i), i + 1, true), None)
            .await
            .unwrap();
    }

    let second = events
        .find_upcoming(chrono::Utc::now(), PageRequest::new(1, 2, 100).unwrap())
        .await
        .unwrap();

    assert_eq!(second.total_elements, 5);
    assert_eq!(second.total_pages, 3);
    assert_eq!(second.content.len(), 2);
    assert_eq!(second.content[0].title, builder.title("e2"));
}

#[tokio::test]
async fn test_find_filtered_predicate() {
    let db = TestDatabase::new().await;
    let events = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("filtered_predicate");
    let now = chrono::Utc::now();

    let mut conference = new_event(&builder, "conf", 10, false);
    conference.title = "Tech Conference 2024".to_string();
    events
        .create(conference, address("Recife", "PE"))
        .await
        .unwrap();

    let mut sale = new_event(&builder, "sale", 20, false);
    sale.title = "Black Friday 50% off".to_string();
    events
        .create(sale, address("São Paulo", "SP"))
        .await
        .unwrap();

    let mut webinar = new_event(&builder, "webinar", 30, true);
    webinar.title = "Rust Webinar".to_string();
    events.create(webinar, None).await.unwrap();

    let titles = |page: Page<Event>| -> Vec<String> {
        page.content.into_iter().map(|e| e.title).collect()
    };

    let by_title = EventFilter {
        title: Some("conf".to_string()),
        ..Default::default()
    };
    assert_eq!(
        titles(events.find_filtered(now, by_title, page(10)).await.unwrap()),
        vec!["Tech Conference 2024"]
    );

    let literal_percent = EventFilter {
        title: Some("%".to_string()),
        ..Default::default()
    };
    assert_eq!(
        titles(
            events
                .find_filtered(now, literal_percent, page(10))
                .await
                .unwrap()
        ),
        vec!["Black Friday 50% off"]
    );

    let by_uf = EventFilter {
        uf: Some("sp".to_string()),
        ..Default::default()
    };
    assert_eq!(
        titles(events.find_filtered(now, by_uf, page(10)).await.unwrap()),
        vec!["Black Friday 50% off", "Rust Webinar"]
    );

    let window = EventFilter {
        start_date: now + Duration::days(15),
        end_date: now + Duration::days(25),
        ..Default::default()
    };
    assert_eq!(
        titles(events.find_filtered(now, window, page(10)).await.unwrap()),
        vec!["Black Friday 50% off"]
    );

    let inverted = EventFilter {
        start_date: now + Duration::days(25),
        end_date: now + Duration::days(15),
        ..Default::default()
    };
    let empty = events.find_filtered(now, inverted, page(10)).await.unwrap();
    assert!(empty.content.is_empty());
    assert_eq!(empty.total_elements, 0);
}

#[tokio::test]
async fn test_find_filtered_defaults_equal_upcoming() {
    let db = TestDatabase::new().await;
    let events = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("filtered_defaults");
    let now = chrono::Utc::now();

    events
        .create(new_event(&builder, "a", 3, false), address("Recife", "PE"))
        .await
        .unwrap();
    events
        .create(new_event(&builder, "b", 4, true), None)
        .await
        .unwrap();
    events
        .create(new_event(&builder, "old", -4, true), None)
        .await
        .unwrap();

    let upcoming = events.find_upcoming(now, page(10)).await.unwrap();
    let filtered = events
        .find_filtered(now, EventFilter::default(), page(10))
        .await
        .unwrap();
    assert_eq!(upcoming, filtered);
}

#[tokio::test]
async fn test_coupons_valid_after_reference_time() {
    let db = TestDatabase::new().await;
    let events = PgEventRepository::new(db.connection());
    let coupons = PgCouponRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("coupon_validity");

    let event = events
        .create(new_event(&builder, "coupons", 10, true), None)
        .await
        .unwrap();
    for (code, days) in [("LATE", 9), ("EXPIRED", -1), ("SOON", 2)] {
        coupons
            .create(
                event.id,
                NewCoupon {
                    code: code.to_string(),
                    discount: 10,
                    valid: builder.days_from_now(days),
                },
            )
            .await
            .unwrap();
    }

    let valid = coupons
        .find_valid(event.id, chrono::Utc::now())
        .await
        .unwrap();
    let codes: Vec<_> = valid.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["SOON", "LATE"]);
}

// ============================================================================
// Service Tests
// ============================================================================

#[tokio::test]
async fn test_service_demo_day_end_to_end() {
    let db = TestDatabase::new().await;
    let storage = InMemoryObjectStorage::new();
    let service = EventService::new(
        Arc::new(PgEventRepository::new(db.connection())),
        Arc::new(PgAddressRepository::new(db.connection())),
        Arc::new(PgCouponRepository::new(db.connection())),
        Arc::new(storage.clone()),
        EventServiceConfig::new("eventostec-images"),
    )
    .with_clock(|| {
        chrono::DateTime::from_timestamp_millis(1_749_000_000_000).unwrap_or_default()
    });

    let created = service
        .create_event(EventCreateRequest {
            title: "Demo Day".to_string(),
            description: "Cohort pitches".to_string(),
            event_url: "https://demo.day".to_string(),
            date: 1_750_000_000_000,
            remote: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.img_url, None);
    assert!(storage.is_empty().await);

    let upcoming = service.get_upcoming_events(0, 10).await.unwrap();
    assert_eq!(upcoming.total_elements, 1);
    assert_eq!(upcoming.content[0].id, created.id);
    assert_eq!(upcoming.content[0].city, "");
    assert_eq!(upcoming.content[0].uf, "");

    let details = service.get_event_details(created.id).await.unwrap();
    assert_eq!(details.date.timestamp_millis(), 1_750_000_000_000);
    assert!(details.coupons.is_empty());
}

#[tokio::test]
async fn test_service_upload_failure_persists_nothing() {
    let db = TestDatabase::new().await;
    let storage = InMemoryObjectStorage::new();
    storage.set_failing(true);
    let service = EventService::new(
        Arc::new(PgEventRepository::new(db.connection())),
        Arc::new(PgAddressRepository::new(db.connection())),
        Arc::new(PgCouponRepository::new(db.connection())),
        Arc::new(storage),
        EventServiceConfig::new("eventostec-images"),
    );

    let result = service
        .create_event(EventCreateRequest {
            title: "Doomed".to_string(),
            event_url: "https://doomed.dev".to_string(),
            date: 1_900_000_000_000,
            city: Some("Recife".to_string()),
            uf: Some("PE".to_string()),
            image: Some(ImageUpload {
                filename: "cover.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: b"png".to_vec(),
            }),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(EventError::Upload(_))));
    let conn = db.connection();
    assert_eq!(entity::event::Entity::find().count(&conn).await.unwrap(), 0);
    assert_eq!(entity::address::Entity::find().count(&conn).await.unwrap(), 0);
}
