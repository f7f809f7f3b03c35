use axum::Router;
use domain_events::{
    EventService, EventServiceConfig, PgAddressRepository, PgCouponRepository, PgEventRepository,
    handlers,
};
use std::sync::Arc;

use crate::state::AppState;

/// Wire the Postgres repositories and image storage into the events router
pub fn router(state: &AppState) -> Router {
    let service = EventService::new(
        Arc::new(PgEventRepository::new(state.db.clone())),
        Arc::new(PgAddressRepository::new(state.db.clone())),
        Arc::new(PgCouponRepository::new(state.db.clone())),
        state.storage.clone(),
        EventServiceConfig::from(&state.config.storage),
    );

    handlers::router(service)
}
