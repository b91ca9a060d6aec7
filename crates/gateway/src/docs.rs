use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::users::list_users,
        crate::routes::users::register_user,
        crate::routes::users::current_profile,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::user_listings,
        crate::routes::users::user_bookings,
        crate::routes::listings::list_listings,
        crate::routes::listings::search_listings,
        crate::routes::listings::create_listing,
        crate::routes::listings::get_listing,
        crate::routes::listings::update_listing,
        crate::routes::listings::delete_listing,
        crate::routes::listings::listing_availability,
        crate::routes::listings::listing_reviews,
        crate::routes::bookings::list_bookings,
        crate::routes::bookings::create_booking,
        crate::routes::bookings::get_booking,
        crate::routes::bookings::reschedule_booking,
        crate::routes::bookings::delete_booking,
        crate::routes::bookings::confirm_booking,
        crate::routes::bookings::cancel_booking,
        crate::routes::reviews::list_reviews,
        crate::routes::reviews::create_review,
        crate::routes::reviews::get_review,
        crate::routes::reviews::update_review,
        crate::routes::reviews::delete_review,
        crate::routes::reviews::respond_to_review
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::SessionResponse,
            crate::routes::models::UserResponse,
            crate::routes::models::ProfileResponse,
            crate::routes::models::ListingResponse,
            crate::routes::models::BookingResponse,
            crate::routes::models::ReviewResponse,
            crate::routes::models::AvailabilityResponse,
            crate::routes::models::DateRangeRequest,
            crate::routes::users::RegisterRequest,
            crate::routes::users::UpdateProfileRequest,
            crate::routes::listings::CreateListingRequest,
            crate::routes::listings::UpdateListingRequest,
            crate::routes::bookings::CreateBookingRequest,
            crate::routes::reviews::CreateReviewRequest,
            crate::routes::reviews::UpdateReviewRequest,
            crate::routes::reviews::RespondRequest,
            crate::pagination::ProfilePage,
            crate::pagination::ListingPage,
            crate::pagination::BookingPage,
            crate::pagination::ReviewPage
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Login and session management"),
        (name = "Users", description = "Accounts and marketplace profiles"),
        (name = "Listings", description = "Property catalogue, availability and listing reviews"),
        (name = "Bookings", description = "Reservations and their lifecycle"),
        (name = "Reviews", description = "Guest reviews and host responses")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("Opaque".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}
