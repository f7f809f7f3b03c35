//! Events Domain
//!
//! Event creation with optional image upload, upcoming and filtered listings,
//! and event details enriched with the coupons that are still valid.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← multipart/JSON endpoints under /event and /coupon
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← validation, image upload, projections
//! └──┬───────┬──┘
//!    │       │
//! ┌──▼────┐ ┌▼──────────────┐
//! │ Repos │ │ ObjectStorage │  ← events/addresses/coupons, image bucket
//! └──┬────┘ └───────────────┘
//!    │
//! ┌──▼──────────┐
//! │   Models    │  ← Event, Address, Coupon, Page, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_events::{
//!     handlers, EventService, EventServiceConfig, InMemoryCouponRepository,
//!     InMemoryEventRepository, InMemoryObjectStorage,
//! };
//!
//! let events = InMemoryEventRepository::new();
//! let addresses = events.addresses();
//! let service = EventService::new(
//!     Arc::new(events),
//!     Arc::new(addresses),
//!     Arc::new(InMemoryCouponRepository::new()),
//!     Arc::new(InMemoryObjectStorage::new()),
//!     EventServiceConfig::new("eventostec-images"),
//! );
//!
//! let router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod storage;

pub use error::{EventError, EventResult};
pub use models::{
    Address, Coupon, CouponCreateRequest, CouponSummary, Event, EventCreateRequest, EventDetails,
    EventFilter, EventSummary, ImageUpload, NewAddress, NewCoupon, NewEvent, Page, PageRequest,
};
pub use postgres::{PgAddressRepository, PgCouponRepository, PgEventRepository};
pub use repository::{
    AddressRepository, CouponRepository, EventRepository, InMemoryAddressRepository,
    InMemoryCouponRepository, InMemoryEventRepository,
};
pub use service::{Clock, EventService, EventServiceConfig};
pub use storage::{
    Credentials, HttpObjectStorage, InMemoryObjectStorage, ObjectStorage, StorageConfig,
    StorageError,
};
