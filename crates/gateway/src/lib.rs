//! # Staybook Gateway Crate
//!
//! HTTP surface of the marketplace: JSON routes under `/api/v1`, the health
//! probe and the generated OpenAPI document.
//!
//! ## Architecture
//!
//! - **Routes**: one module per resource, each handler resolving the bearer
//!   token and delegating to the marketplace services
//! - **State**: authenticator, marketplace services and paging limits
//! - **Errors**: [`ApiError`] renders every failure as `{"error", "message"}`
//! - **Middleware**: request logging

mod docs;
mod error;
mod extract;
mod middleware;
mod pagination;
mod state;
mod util;

pub mod routes;

pub use docs::ApiDoc;
pub use error::{ApiError, ErrorResponse};
pub use extract::{ApiJson, ApiQuery};
pub use pagination::{PageQuery, Paginated};
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use staybook_config::HttpConfig;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;

pub fn build_router(state: AppState, http: &HttpConfig) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        // Auth
        .route("/api/v1/auth/login", post(routes::auth::login))
        .route("/api/v1/auth/logout", post(routes::auth::logout))
        // Users
        .route(
            "/api/v1/users",
            get(routes::users::list_users).post(routes::users::register_user),
        )
        .route("/api/v1/users/me", get(routes::users::current_profile))
        .route(
            "/api/v1/users/:user_id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .patch(routes::users::update_user),
        )
        .route(
            "/api/v1/users/:user_id/listings",
            get(routes::users::user_listings),
        )
        .route(
            "/api/v1/users/:user_id/bookings",
            get(routes::users::user_bookings),
        )
        // Listings
        .route(
            "/api/v1/listings",
            get(routes::listings::list_listings).post(routes::listings::create_listing),
        )
        .route(
            "/api/v1/listings/search",
            get(routes::listings::search_listings),
        )
        .route(
            "/api/v1/listings/:listing_id",
            get(routes::listings::get_listing)
                .put(routes::listings::update_listing)
                .patch(routes::listings::update_listing)
                .delete(routes::listings::delete_listing),
        )
        .route(
            "/api/v1/listings/:listing_id/availability",
            get(routes::listings::listing_availability),
        )
        .route(
            "/api/v1/listings/:listing_id/reviews",
            get(routes::listings::listing_reviews),
        )
        // Bookings
        .route(
            "/api/v1/bookings",
            get(routes::bookings::list_bookings).post(routes::bookings::create_booking),
        )
        .route(
            "/api/v1/bookings/:booking_id",
            get(routes::bookings::get_booking)
                .put(routes::bookings::reschedule_booking)
                .patch(routes::bookings::reschedule_booking)
                .delete(routes::bookings::delete_booking),
        )
        .route(
            "/api/v1/bookings/:booking_id/confirm",
            post(routes::bookings::confirm_booking),
        )
        .route(
            "/api/v1/bookings/:booking_id/cancel",
            post(routes::bookings::cancel_booking),
        )
        // Reviews
        .route(
            "/api/v1/reviews",
            get(routes::reviews::list_reviews).post(routes::reviews::create_review),
        )
        .route(
            "/api/v1/reviews/:review_id",
            get(routes::reviews::get_review)
                .put(routes::reviews::update_review)
                .patch(routes::reviews::update_review)
                .delete(routes::reviews::delete_review),
        )
        .route(
            "/api/v1/reviews/:review_id/respond",
            post(routes::reviews::respond_to_review),
        )
        .with_state(state)
        .layer(cors_layer(&http.cors_allowed_origins))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(allowed).allow_credentials(true)
}
