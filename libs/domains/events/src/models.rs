use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{EventError, EventResult};

/// Postal address of an in-person event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub city: String,
    /// Two-letter state code
    pub uf: String,
    pub event_id: Uuid,
}

/// A listed event, carrying its address when it is not remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub img_url: Option<String>,
    pub event_url: String,
    pub remote: bool,
    /// Epoch milliseconds on the wire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub date: DateTime<Utc>,
    pub address: Option<Address>,
}

impl Event {
    pub fn city(&self) -> &str {
        self.address.as_ref().map(|a| a.city.as_str()).unwrap_or("")
    }

    pub fn uf(&self) -> &str {
        self.address.as_ref().map(|a| a.uf.as_str()).unwrap_or("")
    }
}

/// Discount code attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub valid: DateTime<Utc>,
    pub event_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub img_url: Option<String>,
    pub event_url: String,
    pub remote: bool,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub city: String,
    pub uf: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub code: String,
    pub discount: i32,
    pub valid: DateTime<Utc>,
}

/// File received with an event creation request
#[derive(Clone, Default)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Input for event creation, assembled from the multipart form
#[derive(Debug, Clone, Default)]
pub struct EventCreateRequest {
    pub title: String,
    pub description: String,
    pub event_url: String,
    /// Epoch milliseconds
    pub date: i64,
    pub remote: bool,
    pub city: Option<String>,
    pub uf: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Coupon entry inside [`EventDetails`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub code: String,
    pub discount: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub valid: DateTime<Utc>,
}

impl From<Coupon> for CouponSummary {
    fn from(coupon: Coupon) -> Self {
        Self {
            code: coupon.code,
            discount: coupon.discount,
            valid: coupon.valid,
        }
    }
}

/// Single event view with its currently valid coupons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub date: DateTime<Utc>,
    pub city: String,
    pub uf: String,
    pub img_url: Option<String>,
    pub event_url: String,
    pub coupons: Vec<CouponSummary>,
}

/// Row of the upcoming and filtered listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub date: DateTime<Utc>,
    pub city: String,
    pub uf: String,
    pub remote: bool,
    pub event_url: String,
    pub img_url: Option<String>,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        let city = event.city().to_string();
        let uf = event.uf().to_string();
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            city,
            uf,
            remote: event.remote,
            event_url: event.event_url,
            img_url: event.img_url,
        }
    }
}

/// Zero-based page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    /// Rejects `size == 0` and caps `size` at `max_size`.
    ///
    /// The row offset must fit a Postgres `BIGINT`, so pages past that are rejected too.
    pub fn new(page: u64, size: u64, max_size: u64) -> EventResult<Self> {
        if size == 0 {
            return Err(EventError::Validation(
                "page size must be at least 1".to_string(),
            ));
        }
        let size = size.min(max_size.max(1));
        match page.checked_mul(size) {
            Some(offset) if i64::try_from(offset).is_ok() => Ok(Self { page, size }),
            _ => Err(EventError::Validation(format!(
                "page {} is out of range",
                page
            ))),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(request.size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Normalized listing filter; absent text filters match everything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub title: Option<String>,
    pub city: Option<String>,
    pub uf: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl EventFilter {
    pub fn min_date() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    /// 9999-12-31T23:59:59Z
    pub fn max_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Same predicate the SQL query applies, minus the reference-time bound.
    pub fn matches(&self, event: &Event) -> bool {
        if event.date < self.start_date || event.date > self.end_date {
            return false;
        }
        if !contains_ignore_case(&event.title, self.title.as_deref()) {
            return false;
        }
        match &event.address {
            None => true,
            Some(address) => {
                contains_ignore_case(&address.city, self.city.as_deref())
                    && contains_ignore_case(&address.uf, self.uf.as_deref())
            }
        }
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            title: None,
            city: None,
            uf: None,
            start_date: Self::min_date(),
            end_date: Self::max_date(),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// Converts epoch milliseconds; only years 1 through 9999 are accepted.
pub fn timestamp_from_millis(field: &str, millis: i64) -> EventResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .filter(|ts| (1..=9999).contains(&ts.year()))
        .ok_or_else(|| EventError::Validation(format!("{} is out of range: {}", field, millis)))
}

/// Body of `POST /coupon/event/{eventId}`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponCreateRequest {
    #[validate(length(min = 1, max = 100))]
    pub code: String,
    #[validate(range(min = 0, max = 100))]
    pub discount: i32,
    /// Expiry, epoch milliseconds
    pub valid: i64,
}

fn default_page_size() -> u64 {
    10
}

/// Query string of `GET /event`
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Zero-based page index
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
}

/// Query string of `GET /event/filter`
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FilterQuery {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
    pub title: Option<String>,
    pub city: Option<String>,
    pub uf: Option<String>,
    /// Epoch milliseconds, defaults to the Unix epoch
    pub start_date: Option<i64>,
    /// Epoch milliseconds, defaults to 9999-12-31T23:59:59Z
    pub end_date: Option<i64>,
}
