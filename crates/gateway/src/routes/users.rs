use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    Json,
};
use serde::Deserialize;
use staybook_auth::NewAccount;
use staybook_database::{ProfileFilter, Role};
use staybook_marketplace::{policy, UpdateProfile};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::{
    pagination::{PageQuery, Paginated},
    routes::models::{BookingResponse, ListingResponse, ProfileResponse},
    util::parse_optional,
    ApiError, ApiJson, ApiQuery, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `guest` (default) or `host`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Administrators only.
    pub role: Option<String>,
    /// Administrators only.
    pub email_verified: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub role: Option<String>,
    pub email_verified: Option<bool>,
    /// Matches username, email, first or last name.
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(UserQuery, PageQuery),
    responses(
        (status = 200, description = "Profiles", body = crate::pagination::ProfilePage),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(filters): ApiQuery<UserQuery>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    uri: Uri,
) -> Result<Json<Paginated<ProfileResponse>>, ApiError> {
    let params = paging.resolve(state.pagination())?;
    let filter = ProfileFilter {
        role: parse_optional::<Role>("role", filters.role.as_deref())?,
        email_verified: filters.email_verified,
        search: filters.search.filter(|term| !term.trim().is_empty()),
    };

    let page = state
        .marketplace()
        .profiles
        .list(&filter, params.request())
        .await?;
    Ok(Json(Paginated::new(page, params, &uri)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account and profile created", body = ProfileResponse),
        (status = 400, description = "Invalid account details", body = crate::error::ErrorResponse),
        (status = 403, description = "Role cannot be self-assigned", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email already taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let role = parse_optional::<Role>("role", payload.role.as_deref())?.unwrap_or(Role::Guest);
    if !policy::is_self_assignable(role) {
        warn!(username = %payload.username, %role, "rejected self-assigned role");
        return Err(ApiError::forbidden(format!(
            "the {role} role cannot be chosen at registration"
        )));
    }

    let account = NewAccount {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        first_name: payload.first_name,
        last_name: payload.last_name,
    };

    let mut tx = state.db_pool().begin().await?;
    let user = state.authenticator().register_in(&mut tx, &account).await?;
    let profile = state
        .marketplace()
        .profiles
        .provision_in(&mut tx, user.id, role)
        .await?;
    tx.commit().await?;

    info!(user = %user.public_id, %role, "account registered");
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Profile not provisioned yet", body = crate::error::ErrorResponse)
    )
)]
pub async fn current_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let profile = state.marketplace().profiles.me(user.id).await?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Profile public identifier")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    state.require_user(&headers).await?;
    let profile = state.marketplace().profiles.get(&user_id).await?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Profile public identifier")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid profile payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not permitted", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.require_user(&headers).await?;
    let update = UpdateProfile {
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        role: parse_optional::<Role>("role", payload.role.as_deref())?,
        email_verified: payload.email_verified,
    };

    let profile = state
        .marketplace()
        .profiles
        .update(user.id, &user_id, update)
        .await?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/listings",
    tag = "Users",
    params(("user_id" = String, Path, description = "Host profile public identifier"), PageQuery),
    responses(
        (status = 200, description = "Listings owned by the host", body = crate::pagination::ListingPage),
        (status = 404, description = "Profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn user_listings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    uri: Uri,
) -> Result<Json<Paginated<ListingResponse>>, ApiError> {
    let params = paging.resolve(state.pagination())?;
    let page = state
        .marketplace()
        .listings
        .list_for_host(&user_id, params.request())
        .await?;
    Ok(Json(Paginated::new(page, params, &uri)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/bookings",
    tag = "Users",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Guest profile public identifier"), PageQuery),
    responses(
        (status = 200, description = "Bookings made by the guest", body = crate::pagination::BookingPage),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the guest or an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "Profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Paginated<BookingResponse>>, ApiError> {
    let user = state.require_user(&headers).await?;
    let params = paging.resolve(state.pagination())?;
    let page = state
        .marketplace()
        .bookings
        .list_for_guest(user.id, &user_id, params.request())
        .await?;
    Ok(Json(Paginated::new(page, params, &uri)))
}
