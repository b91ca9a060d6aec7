use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    Json,
};
use serde::Deserialize;
use staybook_marketplace::{CreateReview, UpdateReview};
use utoipa::ToSchema;

use crate::{
    pagination::{PageQuery, Paginated},
    routes::models::ReviewResponse,
    ApiError, ApiJson, ApiQuery, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    /// Public id of the confirmed booking being reviewed.
    pub booking_id: String,
    /// 1 to 5.
    pub rating: i64,
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i64>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondRequest {
    pub host_response: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    tag = "Reviews",
    security(("bearerAuth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Reviews visible to the requester", body = crate::pagination::ReviewPage),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Paginated<ReviewResponse>>, ApiError> {
    let user = state.require_user(&headers).await?;
    let params = paging.resolve(state.pagination())?;
    let page = state
        .marketplace()
        .reviews
        .list(user.id, params.request())
        .await?;
    Ok(Json(Paginated::new(page, params, &uri)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    tag = "Reviews",
    security(("bearerAuth" = [])),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Invalid review or booking not confirmed", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the booking's guest", body = crate::error::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Booking already reviewed", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let user = state.require_user(&headers).await?;
    let review = state
        .marketplace()
        .reviews
        .create(
            user.id,
            CreateReview {
                booking_id: payload.booking_id,
                rating: payload.rating,
                body: payload.body,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/reviews/{review_id}",
    tag = "Reviews",
    security(("bearerAuth" = [])),
    params(("review_id" = String, Path, description = "Review public identifier")),
    responses(
        (status = 200, description = "Review", body = ReviewResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Review not found or not visible", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ReviewResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let review = state.marketplace().reviews.get(user.id, &review_id).await?;
    Ok(Json(review.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/reviews/{review_id}",
    tag = "Reviews",
    security(("bearerAuth" = [])),
    params(("review_id" = String, Path, description = "Review public identifier")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Updated review", body = ReviewResponse),
        (status = 400, description = "Invalid review payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Review not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let review = state
        .marketplace()
        .reviews
        .update(
            user.id,
            &review_id,
            UpdateReview {
                rating: payload.rating,
                body: payload.body,
            },
        )
        .await?;
    Ok(Json(review.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{review_id}",
    tag = "Reviews",
    security(("bearerAuth" = [])),
    params(("review_id" = String, Path, description = "Review public identifier")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the author or an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Review not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = state.require_user(&headers).await?;
    state
        .marketplace()
        .reviews
        .delete(user.id, &review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/reviews/{review_id}/respond",
    tag = "Reviews",
    security(("bearerAuth" = [])),
    params(("review_id" = String, Path, description = "Review public identifier")),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Host response recorded", body = ReviewResponse),
        (status = 400, description = "Empty response", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the listing's host", body = crate::error::ErrorResponse),
        (status = 404, description = "Review not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Review already has a response", body = crate::error::ErrorResponse)
    )
)]
pub async fn respond_to_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<RespondRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let review = state
        .marketplace()
        .reviews
        .respond(user.id, &review_id, &payload.host_response)
        .await?;
    Ok(Json(review.into()))
}
