//! Application state management.
//!
//! Shared by the route builders at startup:
//! - Configuration
//! - PostgreSQL connection pool
//! - Object storage client for event images

use domain_events::ObjectStorage;
use std::sync::Arc;

/// Shared application state.
///
/// Cloning is cheap: the connection pool and storage client are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: database::postgres::DatabaseConnection,
    /// Image storage used when creating events
    pub storage: Arc<dyn ObjectStorage>,
}
