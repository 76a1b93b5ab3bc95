use axum::extract::rejection::JsonRejection;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::{
    AppState,
    db,
    error::ApiError,
    models::{CreateBookingRequest, CreateClassRequest, MessageResponse},
    validation::{validate_booking, validate_class},
};

#[utoipa::path(get, path = "/", tag = "booking")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Class Booking API",
        "endpoints": {
            "/classes": "Create a class (POST)",
            "/bookings": "Book a member into a class (POST)"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "booking")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    get,
    path = "/healthz/ready",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 500, description = "Database unavailable")
    ),
    tag = "booking"
)]
pub async fn healthz_ready(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    db::ping(state.ledger.pool()).await?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}

#[utoipa::path(
    post,
    path = "/classes",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = MessageResponse),
        (status = 422, description = "Invalid class details", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    ),
    tag = "classes"
)]
pub async fn create_class(
    State(state): State<AppState>,
    payload: Result<Json<CreateClassRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let class = validate_class(&req, Utc::now())?;

    let id = state
        .ledger
        .create_class(&class.name, class.start_date, class.end_date, class.capacity)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created("Class created successfully", id)),
    ))
}

#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = MessageResponse),
        (status = 404, description = "Class not found", body = MessageResponse),
        (status = 409, description = "Class is full on that date", body = MessageResponse),
        (status = 422, description = "Invalid booking details or date outside the class", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    ),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let booking = validate_booking(&req, Utc::now())?;

    let id = state
        .ledger
        .create_booking(booking.class_id, &booking.member_name, booking.date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::created("Booking created successfully", id)),
    ))
}
