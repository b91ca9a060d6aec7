//! Inputs accepted by the marketplace services.
//!
//! Dates arrive as the raw `YYYY-MM-DD` strings supplied by the caller and are
//! parsed by the services so malformed values surface as validation errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use staybook_database::{ListingStatus, Role};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateListing {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub city: String,
    #[serde(default)]
    pub county: String,
    pub price_per_night: i64,
    pub bedrooms: i64,
    pub max_guests: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateListing {
    pub name: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub price_per_night: Option<i64>,
    pub bedrooms: Option<i64>,
    pub max_guests: Option<i64>,
    pub status: Option<ListingStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub listing_id: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleBooking {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub booking_id: String,
    pub rating: i64,
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReview {
    pub rating: Option<i64>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub email_verified: Option<bool>,
}

/// Result of an availability check for one listing and date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub listing_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: bool,
    pub conflicting_bookings: i64,
}
