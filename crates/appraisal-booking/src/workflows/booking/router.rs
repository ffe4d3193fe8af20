use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::collaborators::PaymentCallback;
use super::domain::{Attribution, BookingId, InspectionScope, LivingUnits};
use super::quote::{price_breakdown, PriceComponent, Quote, QuoteInput};
use super::repository::{RepositoryError, SessionRepository};
use super::service::{BookingService, BookingServiceError, Submission};
use super::validation::{ContactForm, PropertyDetailsForm, ScheduleForm};
use super::wizard::WizardError;

#[derive(Debug, Default, Deserialize)]
pub struct StartBookingRequest {
    #[serde(default)]
    pub attribution: Attribution,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub scope_of_inspection: Option<String>,
    pub size_of_home: u32,
    pub number_of_living_units: String,
    #[serde(default)]
    pub is_lot_over_one_acre: bool,
    #[serde(default)]
    pub has_site_influence: bool,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: Quote,
    pub display: String,
    pub components: Vec<PriceComponent>,
}

/// Router builder exposing the booking wizard and the stateless quote endpoint.
pub fn booking_router<R>(service: Arc<BookingService<R>>) -> Router
where
    R: SessionRepository + 'static,
{
    Router::new()
        .route("/api/v1/quotes", post(quote_handler))
        .route("/api/v1/bookings", post(start_handler::<R>))
        .route("/api/v1/bookings/:booking_id", get(view_handler::<R>))
        .route(
            "/api/v1/bookings/:booking_id/contact",
            post(contact_handler::<R>),
        )
        .route(
            "/api/v1/bookings/:booking_id/property",
            post(property_handler::<R>),
        )
        .route(
            "/api/v1/bookings/:booking_id/schedule",
            post(schedule_handler::<R>),
        )
        .route(
            "/api/v1/bookings/:booking_id/payment",
            post(payment_handler::<R>),
        )
        .route("/api/v1/bookings/:booking_id/back", post(back_handler::<R>))
        .route(
            "/api/v1/bookings/:booking_id/advance",
            post(advance_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn quote_handler(axum::Json(request): axum::Json<QuoteRequest>) -> Response {
    let scope = match request.scope_of_inspection.as_deref() {
        None | Some("") => None,
        Some(raw) => match InspectionScope::parse(raw) {
            Some(scope) => Some(scope),
            None => return invalid_field("scopeOfInspection"),
        },
    };
    let Some(living_units) = LivingUnits::parse(&request.number_of_living_units) else {
        return invalid_field("numberOfLivingUnits");
    };

    let breakdown = price_breakdown(&QuoteInput {
        scope,
        size_of_home: request.size_of_home,
        living_units,
        is_lot_over_one_acre: request.is_lot_over_one_acre,
        has_site_influence: request.has_site_influence,
    });

    let response = QuoteResponse {
        display: breakdown.quote.display(),
        quote: breakdown.quote,
        components: breakdown.components,
    };
    (StatusCode::OK, axum::Json(response)).into_response()
}

fn invalid_field(field: &str) -> Response {
    let payload = json!({
        "error": format!("{field} is not one of the listed options"),
        "field": field,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

pub(crate) async fn start_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    request: Option<axum::Json<StartBookingRequest>>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let attribution = request
        .map(|axum::Json(body)| body.attribution)
        .unwrap_or_default();
    match service.start(attribution) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn view_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.get(&BookingId(booking_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn contact_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(booking_id): Path<String>,
    axum::Json(form): axum::Json<ContactForm>,
) -> Response
where
    R: SessionRepository + 'static,
{
    submission_response(service.submit_contact(&BookingId(booking_id), form))
}

pub(crate) async fn property_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(booking_id): Path<String>,
    axum::Json(form): axum::Json<PropertyDetailsForm>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let today = Local::now().date_naive();
    submission_response(service.submit_property(&BookingId(booking_id), form, today))
}

pub(crate) async fn schedule_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(booking_id): Path<String>,
    axum::Json(form): axum::Json<ScheduleForm>,
) -> Response
where
    R: SessionRepository + 'static,
{
    submission_response(service.submit_schedule(&BookingId(booking_id), form))
}

pub(crate) async fn payment_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(booking_id): Path<String>,
    axum::Json(callback): axum::Json<PaymentCallback>,
) -> Response
where
    R: SessionRepository + 'static,
{
    submission_response(
        service
            .complete_payment(&BookingId(booking_id), callback)
            .await,
    )
}

pub(crate) async fn back_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.back(&BookingId(booking_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.advance(&BookingId(booking_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

fn submission_response(result: Result<Submission, BookingServiceError>) -> Response {
    match result {
        // Detached tasks keep running after their handles are dropped here.
        Ok(submission) => (StatusCode::OK, axum::Json(submission.view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: BookingServiceError) -> Response {
    let message = err.to_string();
    let (status, payload) = match err {
        BookingServiceError::Wizard(WizardError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": message, "fields": errors.fields }),
        ),
        BookingServiceError::Wizard(WizardError::QuoteAdvisory { message: advisory }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": advisory, "advisory": advisory }),
        ),
        BookingServiceError::Wizard(WizardError::PaymentFailed { .. }) => {
            (StatusCode::PAYMENT_REQUIRED, json!({ "error": message }))
        }
        BookingServiceError::Wizard(_) => (StatusCode::CONFLICT, json!({ "error": message })),
        BookingServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, json!({ "error": message }))
        }
        BookingServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, json!({ "error": message }))
        }
        BookingServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": message }),
        ),
    };
    (status, axum::Json(payload)).into_response()
}
