use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    Json,
};
use serde::Deserialize;
use staybook_database::{ListingFilter, ListingOrdering, ListingStatus};
use staybook_marketplace::{CreateListing, UpdateListing};
use utoipa::{IntoParams, ToSchema};

use crate::{
    pagination::{PageQuery, Paginated},
    routes::models::{AvailabilityResponse, ListingResponse, ReviewResponse},
    util::parse_optional,
    ApiError, ApiJson, ApiQuery, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub city: String,
    #[serde(default)]
    pub county: String,
    /// Nightly rate in minor currency units.
    pub price_per_night: i64,
    pub bedrooms: i64,
    pub max_guests: i64,
}

impl From<CreateListingRequest> for CreateListing {
    fn from(request: CreateListingRequest) -> Self {
        CreateListing {
            name: request.name,
            description: request.description,
            city: request.city,
            county: request.county,
            price_per_night: request.price_per_night,
            bedrooms: request.bedrooms,
            max_guests: request.max_guests,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateListingRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub price_per_night: Option<i64>,
    pub bedrooms: Option<i64>,
    pub max_guests: Option<i64>,
    /// Moderation status; administrators only.
    pub status: Option<String>,
}

impl UpdateListingRequest {
    fn into_update(self) -> Result<UpdateListing, ApiError> {
        Ok(UpdateListing {
            status: parse_optional::<ListingStatus>("status", self.status.as_deref())?,
            name: self.name,
            description: self.description,
            city: self.city,
            county: self.county,
            price_per_night: self.price_per_night,
            bedrooms: self.bedrooms,
            max_guests: self.max_guests,
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Case-insensitive substring of the city.
    pub city: Option<String>,
    /// Case-insensitive substring of the county.
    pub county: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Minimum number of bedrooms.
    pub bedrooms: Option<i64>,
    /// Minimum guest capacity.
    pub guests: Option<i64>,
    /// Matches name, description, city or county.
    pub search: Option<String>,
    /// `price_per_night`, `created_at` or `name`, prefixed with `-` for descending order.
    pub ordering: Option<String>,
}

impl ListingQuery {
    fn into_filter(self) -> Result<ListingFilter, ApiError> {
        Ok(ListingFilter {
            ordering: parse_optional::<ListingOrdering>("ordering", self.ordering.as_deref())?
                .unwrap_or_default(),
            city: non_blank(self.city),
            county: non_blank(self.county),
            min_price: self.min_price,
            max_price: self.max_price,
            min_bedrooms: self.bedrooms,
            min_guests: self.guests,
            search: non_blank(self.search),
            ..Default::default()
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<i64>,
    pub guests: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, exclusive
    pub end_date: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[utoipa::path(
    get,
    path = "/api/v1/listings",
    tag = "Listings",
    params(ListingQuery, PageQuery),
    responses(
        (status = 200, description = "Approved listings", body = crate::pagination::ListingPage),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_listings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListingQuery>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    uri: Uri,
) -> Result<Json<Paginated<ListingResponse>>, ApiError> {
    let params = paging.resolve(state.pagination())?;
    let page = state
        .marketplace()
        .listings
        .list_approved(query.into_filter()?, params.request())
        .await?;
    Ok(Json(Paginated::new(page, params, &uri)))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/search",
    tag = "Listings",
    params(SearchQuery, PageQuery),
    responses(
        (status = 200, description = "Approved listings matching the search", body = crate::pagination::ListingPage),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_listings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    uri: Uri,
) -> Result<Json<Paginated<ListingResponse>>, ApiError> {
    let params = paging.resolve(state.pagination())?;
    let filter = ListingFilter {
        city: non_blank(query.city),
        min_price: query.min_price,
        max_price: query.max_price,
        min_bedrooms: query.bedrooms,
        min_guests: query.guests,
        ..Default::default()
    };
    let page = state
        .marketplace()
        .listings
        .list_approved(filter, params.request())
        .await?;
    Ok(Json(Paginated::new(page, params, &uri)))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings",
    tag = "Listings",
    security(("bearerAuth" = [])),
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created and awaiting moderation", body = ListingResponse),
        (status = 400, description = "Invalid listing payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateListingRequest>,
) -> Result<(StatusCode, Json<ListingResponse>), ApiError> {
    let user = state.require_user(&headers).await?;
    let listing = state
        .marketplace()
        .listings
        .create(user.id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(listing.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{listing_id}",
    tag = "Listings",
    params(("listing_id" = String, Path, description = "Listing public identifier")),
    responses(
        (status = 200, description = "Listing", body = ListingResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
) -> Result<Json<ListingResponse>, ApiError> {
    let listing = state.marketplace().listings.get(&listing_id).await?;
    Ok(Json(listing.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/listings/{listing_id}",
    tag = "Listings",
    security(("bearerAuth" = [])),
    params(("listing_id" = String, Path, description = "Listing public identifier")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Updated listing", body = ListingResponse),
        (status = 400, description = "Invalid listing payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the host or an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<UpdateListingRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let listing = state
        .marketplace()
        .listings
        .update(user.id, &listing_id, payload.into_update()?)
        .await?;
    Ok(Json(listing.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/listings/{listing_id}",
    tag = "Listings",
    security(("bearerAuth" = [])),
    params(("listing_id" = String, Path, description = "Listing public identifier")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the host or an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = state.require_user(&headers).await?;
    state
        .marketplace()
        .listings
        .delete(user.id, &listing_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{listing_id}/availability",
    tag = "Listings",
    params(("listing_id" = String, Path, description = "Listing public identifier"), AvailabilityQuery),
    responses(
        (status = 200, description = "Availability for the requested nights", body = AvailabilityResponse),
        (status = 400, description = "Missing or invalid dates", body = crate::error::ErrorResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn listing_availability(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let availability = state
        .marketplace()
        .listings
        .availability(
            &listing_id,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .await?;
    Ok(Json(availability.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{listing_id}/reviews",
    tag = "Listings",
    params(("listing_id" = String, Path, description = "Listing public identifier"), PageQuery),
    responses(
        (status = 200, description = "Reviews of the listing", body = crate::pagination::ReviewPage),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn listing_reviews(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    uri: Uri,
) -> Result<Json<Paginated<ReviewResponse>>, ApiError> {
    let params = paging.resolve(state.pagination())?;
    let page = state
        .marketplace()
        .reviews
        .list_for_listing(&listing_id, params.request())
        .await?;
    Ok(Json(Paginated::new(page, params, &uri)))
}
