use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    Json,
};
use serde::Deserialize;
use staybook_marketplace::{CreateBooking, RescheduleBooking};
use utoipa::ToSchema;

use crate::{
    pagination::{PageQuery, Paginated},
    routes::models::{BookingResponse, DateRangeRequest},
    ApiError, ApiJson, ApiQuery, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Public id of the listing to reserve.
    pub listing_id: String,
    /// First night, `YYYY-MM-DD`.
    pub start_date: String,
    /// Checkout day, `YYYY-MM-DD`, exclusive.
    pub end_date: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearerAuth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Bookings visible to the requester", body = crate::pagination::BookingPage),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Paginated<BookingResponse>>, ApiError> {
    let user = state.require_user(&headers).await?;
    let params = paging.resolve(state.pagination())?;
    let page = state
        .marketplace()
        .bookings
        .list(user.id, params.request())
        .await?;
    Ok(Json(Paginated::new(page, params, &uri)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearerAuth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created as pending", body = BookingResponse),
        (status = 400, description = "Invalid dates or listing not open", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Dates already booked", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let user = state.require_user(&headers).await?;
    let booking = state
        .marketplace()
        .bookings
        .create(
            user.id,
            CreateBooking {
                listing_id: payload.listing_id,
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{booking_id}",
    tag = "Bookings",
    security(("bearerAuth" = [])),
    params(("booking_id" = String, Path, description = "Booking public identifier")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Booking not found or not visible", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let booking = state
        .marketplace()
        .bookings
        .get(user.id, &booking_id)
        .await?;
    Ok(Json(booking.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{booking_id}",
    tag = "Bookings",
    security(("bearerAuth" = [])),
    params(("booking_id" = String, Path, description = "Booking public identifier")),
    request_body = DateRangeRequest,
    responses(
        (status = 200, description = "Booking moved to the new dates", body = BookingResponse),
        (status = 400, description = "Invalid dates or booking not pending", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the guest or an administrator", body = crate::error::ErrorResponse),
        (status = 409, description = "New dates already booked", body = crate::error::ErrorResponse)
    )
)]
pub async fn reschedule_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<DateRangeRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let booking = state
        .marketplace()
        .bookings
        .reschedule(
            user.id,
            &booking_id,
            RescheduleBooking {
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
        )
        .await?;
    Ok(Json(booking.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{booking_id}",
    tag = "Bookings",
    security(("bearerAuth" = [])),
    params(("booking_id" = String, Path, description = "Booking public identifier")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Administrators only", body = crate::error::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = state.require_user(&headers).await?;
    state
        .marketplace()
        .bookings
        .delete(user.id, &booking_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/confirm",
    tag = "Bookings",
    security(("bearerAuth" = [])),
    params(("booking_id" = String, Path, description = "Booking public identifier")),
    responses(
        (status = 200, description = "Booking confirmed", body = BookingResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the host, or booking not pending", body = crate::error::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Booking changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let booking = state
        .marketplace()
        .bookings
        .confirm(user.id, &booking_id)
        .await?;
    Ok(Json(booking.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/cancel",
    tag = "Bookings",
    security(("bearerAuth" = [])),
    params(("booking_id" = String, Path, description = "Booking public identifier")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the guest or host, or already cancelled", body = crate::error::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Booking changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BookingResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let booking = state
        .marketplace()
        .bookings
        .cancel(user.id, &booking_id)
        .await?;
    Ok(Json(booking.into()))
}
