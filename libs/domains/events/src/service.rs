use chrono::{DateTime, Utc};
use observability::{EventMetrics, QueryKind, UploadTimer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{EventError, EventResult};
use crate::models::{
    Coupon, CouponCreateRequest, CouponSummary, Event, EventCreateRequest, EventDetails,
    EventFilter, EventSummary, ImageUpload, NewAddress, NewCoupon, NewEvent, Page, PageRequest,
    timestamp_from_millis,
};
use crate::repository::{AddressRepository, CouponRepository, EventRepository};
use crate::storage::{ObjectStorage, StorageConfig, StorageError};

/// Source of "now" for upcoming-event and coupon validity checks
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone, Debug)]
pub struct EventServiceConfig {
    /// Bucket receiving event images
    pub bucket: String,
    /// Where uploads are staged before being sent to storage
    pub upload_dir: PathBuf,
    pub max_page_size: u64,
}

impl EventServiceConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            upload_dir: std::env::temp_dir(),
            max_page_size: 100,
        }
    }

    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn with_max_page_size(mut self, max: u64) -> Self {
        self.max_page_size = max;
        self
    }
}

impl From<&StorageConfig> for EventServiceConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            upload_dir: config.upload_dir.clone(),
            max_page_size: config.max_page_size,
        }
    }
}

/// Event use cases: create, details, upcoming and filtered listings, coupons
#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventRepository>,
    addresses: Arc<dyn AddressRepository>,
    coupons: Arc<dyn CouponRepository>,
    storage: Arc<dyn ObjectStorage>,
    config: EventServiceConfig,
    clock: Clock,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        addresses: Arc<dyn AddressRepository>,
        coupons: Arc<dyn CouponRepository>,
        storage: Arc<dyn ObjectStorage>,
        config: EventServiceConfig,
    ) -> Self {
        Self {
            events,
            addresses,
            coupons,
            storage,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Validate, upload the image if any, then persist event and address together.
    ///
    /// An upload failure aborts creation before anything is written.
    #[instrument(skip(self, request), fields(title = %request.title, remote = request.remote))]
    pub async fn create_event(&self, request: EventCreateRequest) -> EventResult<Event> {
        let date = validate_create(&request)?;
        let address = if request.remote {
            None
        } else {
            Some(NewAddress {
                city: non_blank(request.city, "city")?,
                uf: non_blank(request.uf, "uf")?,
            })
        };

        let img_url = match request.image {
            Some(image) => Some(self.upload_image(image).await?),
            None => None,
        };

        let new_event = NewEvent {
            title: request.title,
            description: request.description,
            img_url,
            event_url: request.event_url,
            remote: request.remote,
            date,
        };

        let event = self.events.create(new_event, address).await?;
        EventMetrics::record_event_created(event.remote);
        Ok(event)
    }

    #[instrument(skip(self))]
    pub async fn get_event_details(&self, event_id: Uuid) -> EventResult<EventDetails> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;

        let coupons = self.coupons.find_valid(event_id, self.now()).await?;
        let address = self.addresses.find_by_event_id(event_id).await?;
        EventMetrics::record_query(QueryKind::Details, 1);

        let (city, uf) = address.map(|a| (a.city, a.uf)).unwrap_or_default();
        Ok(EventDetails {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            city,
            uf,
            img_url: event.img_url,
            event_url: event.event_url,
            coupons: coupons.into_iter().map(CouponSummary::from).collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_upcoming_events(
        &self,
        page: u64,
        size: u64,
    ) -> EventResult<Page<EventSummary>> {
        let request = PageRequest::new(page, size, self.config.max_page_size)?;
        let events = self.events.find_upcoming(self.now(), request).await?;

        EventMetrics::record_query(QueryKind::Upcoming, events.content.len());
        Ok(events.map(EventSummary::from))
    }

    /// Dates are epoch milliseconds; absent bounds span the whole calendar.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self))]
    pub async fn get_filtered_events(
        &self,
        page: u64,
        size: u64,
        title: Option<String>,
        city: Option<String>,
        uf: Option<String>,
        start_date: Option<i64>,
        end_date: Option<i64>,
    ) -> EventResult<Page<EventSummary>> {
        let request = PageRequest::new(page, size, self.config.max_page_size)?;
        let filter = EventFilter {
            title,
            city,
            uf,
            start_date: match start_date {
                Some(ms) => timestamp_from_millis("startDate", ms)?,
                None => EventFilter::min_date(),
            },
            end_date: match end_date {
                Some(ms) => timestamp_from_millis("endDate", ms)?,
                None => EventFilter::max_date(),
            },
        };

        let events = self
            .events
            .find_filtered(self.now(), filter, request)
            .await?;

        EventMetrics::record_query(QueryKind::Filtered, events.content.len());
        Ok(events.map(EventSummary::from))
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn add_coupon(
        &self,
        event_id: Uuid,
        request: CouponCreateRequest,
    ) -> EventResult<Coupon> {
        if !self.events.exists(event_id).await? {
            return Err(EventError::NotFound(event_id));
        }

        let coupon = NewCoupon {
            code: request.code,
            discount: request.discount,
            valid: timestamp_from_millis("valid", request.valid)?,
        };
        self.coupons.create(event_id, coupon).await
    }

    async fn upload_image(&self, image: ImageUpload) -> EventResult<String> {
        let timer = UploadTimer::start();
        let result = self.store_image(image).await;
        timer.finish(result.is_ok());
        result
    }

    /// Stage the bytes in `upload_dir`, push them to the bucket, return the public URL.
    async fn store_image(&self, image: ImageUpload) -> EventResult<String> {
        let object_name = format!("{}-{}", Uuid::new_v4(), base_name(&image.filename));
        let staged_path = self
            .config
            .upload_dir
            .join(format!("{}.upload", Uuid::new_v4()));
        let staged = StagedFile::new(staged_path);

        tokio::fs::write(&staged.path, &image.bytes)
            .await
            .map_err(StorageError::from)?;

        let content_type = if image.content_type.trim().is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            image.content_type.as_str()
        };

        self.storage
            .put_object(&self.config.bucket, &object_name, &staged.path, content_type)
            .await?;

        tracing::info!(
            bucket = %self.config.bucket,
            object_name = %object_name,
            "Uploaded event image"
        );
        Ok(self.storage.public_url(&self.config.bucket, &object_name))
    }
}

/// Staged upload, removed when dropped
struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged upload");
            }
        }
    }
}

/// Final path component of a client-supplied filename
fn base_name(filename: &str) -> &str {
    match filename.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name,
        _ => "image",
    }
}

fn validate_create(request: &EventCreateRequest) -> EventResult<DateTime<Utc>> {
    if request.title.trim().is_empty() {
        return Err(EventError::Validation("title is required".to_string()));
    }
    if request.event_url.trim().is_empty() {
        return Err(EventError::Validation("eventUrl is required".to_string()));
    }
    timestamp_from_millis("date", request.date)
}

fn non_blank(value: Option<String>, field: &str) -> EventResult<String> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        EventError::Validation(format!("{} is required for in-person events", field))
    })
}
