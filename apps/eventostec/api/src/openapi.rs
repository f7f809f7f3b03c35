use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Eventostec API",
        version = "0.1.0",
        description = "Event listing with filters, event details with valid coupons, and event creation with image upload"
    ),
    nest(
        (path = "/api", api = domain_events::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_paths_are_under_api_prefix() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/event"));
        assert!(doc.paths.paths.contains_key("/api/event/{eventId}"));
        assert!(doc.paths.paths.contains_key("/api/coupon/event/{eventId}"));
    }
}
