use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, UuidPath, ValidatedJson,
    errors::responses::{
        BadGatewayResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::error::EventResult;
use crate::models::{
    Address, Coupon, CouponCreateRequest, CouponSummary, Event, EventCreateRequest, EventDetails,
    EventSummary, FilterQuery, ImageUpload, Page, PageQuery,
};
use crate::service::EventService;

pub const TAG: &str = "events";

/// Upper bound for the multipart body of `POST /event`
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// OpenAPI documentation for the events API
#[derive(OpenApi)]
#[openapi(
    paths(create_event, list_upcoming, list_filtered, get_event, add_coupon),
    components(
        schemas(
            Event,
            Address,
            Coupon,
            CouponSummary,
            EventDetails,
            EventSummary,
            CouponCreateRequest,
            EventCreateForm
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            BadGatewayResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Event listing, details and coupons")
    )
)]
pub struct ApiDoc;

/// Multipart form accepted by `POST /event`
#[derive(Debug, Default, ToSchema)]
#[schema(rename_all = "camelCase")]
struct EventCreateForm {
    title: String,
    description: Option<String>,
    /// Epoch milliseconds
    date: i64,
    /// Required unless `remote`
    city: Option<String>,
    /// State code, also accepted as `state`
    uf: Option<String>,
    remote: Option<bool>,
    event_url: String,
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<ImageUpload>,
}

impl From<EventCreateForm> for EventCreateRequest {
    fn from(form: EventCreateForm) -> Self {
        Self {
            title: form.title,
            description: form.description.unwrap_or_default(),
            event_url: form.event_url,
            date: form.date,
            remote: form.remote.unwrap_or(false),
            city: form.city,
            uf: form.uf,
            image: form.image,
        }
    }
}

/// Create the events router
pub fn router(service: EventService) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route(
            "/event",
            get(list_upcoming)
                .post(create_event)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/event/filter", get(list_filtered))
        .route("/event/{eventId}", get(get_event))
        .route("/coupon/event/{eventId}", post(add_coupon))
        .with_state(shared_service)
}

/// Create an event, uploading its image first when one is attached
#[utoipa::path(
    post,
    path = "/event",
    tag = TAG,
    request_body(content = EventCreateForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, response = BadRequestValidationResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_event(
    State(service): State<Arc<EventService>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_event_form(multipart).await?;
    let event = service.create_event(form.into()).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Upcoming events in insertion order
#[utoipa::path(
    get,
    path = "/event",
    tag = TAG,
    params(PageQuery),
    responses(
        (status = 200, description = "Page of upcoming events", body = Page<EventSummary>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_upcoming(
    State(service): State<Arc<EventService>>,
    Query(query): Query<PageQuery>,
) -> EventResult<Json<Page<EventSummary>>> {
    let page = service.get_upcoming_events(query.page, query.size).await?;
    Ok(Json(page))
}

/// Upcoming events matching title, city, state and date window
#[utoipa::path(
    get,
    path = "/event/filter",
    tag = TAG,
    params(FilterQuery),
    responses(
        (status = 200, description = "Page of matching events", body = Page<EventSummary>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_filtered(
    State(service): State<Arc<EventService>>,
    Query(query): Query<FilterQuery>,
) -> EventResult<Json<Page<EventSummary>>> {
    let page = service
        .get_filtered_events(
            query.page,
            query.size,
            query.title,
            query.city,
            query.uf,
            query.start_date,
            query.end_date,
        )
        .await?;
    Ok(Json(page))
}

/// Event details with coupons that are still valid
#[utoipa::path(
    get,
    path = "/event/{eventId}",
    tag = TAG,
    params(("eventId" = uuid::Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventDetails),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_event(
    State(service): State<Arc<EventService>>,
    UuidPath(event_id): UuidPath,
) -> EventResult<Json<EventDetails>> {
    let details = service.get_event_details(event_id).await?;
    Ok(Json(details))
}

/// Attach a coupon to an event
#[utoipa::path(
    post,
    path = "/coupon/event/{eventId}",
    tag = TAG,
    params(("eventId" = uuid::Uuid, Path, description = "Event ID")),
    request_body = CouponCreateRequest,
    responses(
        (status = 201, description = "Coupon created", body = Coupon),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_coupon(
    State(service): State<Arc<EventService>>,
    UuidPath(event_id): UuidPath,
    ValidatedJson(request): ValidatedJson<CouponCreateRequest>,
) -> EventResult<impl IntoResponse> {
    let coupon = service.add_coupon(event_id, request).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Collect the multipart fields of `POST /event`; unknown fields are ignored.
async fn read_event_form(mut multipart: Multipart) -> Result<EventCreateForm, AppError> {
    let mut form = EventCreateForm::default();
    let mut date = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "title" => form.title = field.text().await?,
            "description" => form.description = Some(field.text().await?),
            "eventUrl" => form.event_url = field.text().await?,
            "date" => date = Some(field.text().await?),
            "remote" => form.remote = Some(parse_flag(&field.text().await?)?),
            "city" => form.city = Some(field.text().await?),
            "state" | "uf" => form.uf = Some(field.text().await?),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let date = date.ok_or_else(|| AppError::BadRequest("date is required".to_string()))?;
    form.date = date.trim().parse().map_err(|_| {
        AppError::BadRequest(format!("date must be epoch milliseconds, got '{}'", date))
    })?;

    Ok(form)
}

fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" => Ok(false),
        "true" => Ok(true),
        other => Err(AppError::BadRequest(format!(
            "remote must be true or false, got '{}'",
            other
        ))),
    }
}
