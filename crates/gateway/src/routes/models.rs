//! JSON bodies exchanged with API clients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use staybook_auth::User;
use staybook_database::{Booking, Listing, Review, UserProfile};
use staybook_marketplace::Availability;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.public_id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// One of `guest`, `host` or `admin`.
    pub role: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.public_id,
            username: profile.username,
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            role: profile.role.to_string(),
            email_verified: profile.email_verified,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingResponse {
    pub id: String,
    /// Public id of the host profile.
    pub host: String,
    pub name: String,
    pub description: String,
    pub city: String,
    pub county: String,
    /// Nightly rate in minor currency units.
    pub price_per_night: i64,
    pub bedrooms: i64,
    pub max_guests: i64,
    /// One of `pending`, `approved` or `rejected`.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.public_id,
            host: listing.host_public_id,
            name: listing.name,
            description: listing.description,
            city: listing.city,
            county: listing.county,
            price_per_night: listing.price_per_night,
            bedrooms: listing.bedrooms,
            max_guests: listing.max_guests,
            status: listing.status.to_string(),
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub id: String,
    pub listing: String,
    pub guest: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// One of `pending`, `confirmed` or `cancelled`.
    pub status: String,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.public_id,
            listing: booking.listing_public_id,
            guest: booking.guest_public_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            status: booking.status.to_string(),
            total_price: booking.total_price,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub booking: String,
    pub listing: String,
    pub author: String,
    pub rating: i64,
    pub body: String,
    pub host_response: Option<String>,
    pub host_response_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.public_id,
            booking: review.booking_public_id,
            listing: review.listing_public_id,
            author: review.author_public_id,
            rating: review.rating,
            body: review.body,
            host_response: review.host_response,
            host_response_date: review.host_response_date,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub listing: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: bool,
    pub conflicting_bookings: i64,
}

impl From<Availability> for AvailabilityResponse {
    fn from(availability: Availability) -> Self {
        Self {
            listing: availability.listing_id,
            start_date: availability.start_date,
            end_date: availability.end_date,
            available: availability.available,
            conflicting_bookings: availability.conflicting_bookings,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DateRangeRequest {
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`, exclusive
    pub end_date: String,
}
