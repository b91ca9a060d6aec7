//! # Staybook Marketplace Crate
//!
//! Business rules for the rental marketplace: profile provisioning, listings,
//! bookings and reviews.
//!
//! ## Architecture
//!
//! - **Services**: one per resource, each built from a shared SQLite pool
//! - **Policy**: the table mapping guarded actions to authorization rules
//! - **Scope**: which booking and review rows a requester may see
//! - **Types**: request inputs and [`MarketplaceError`]
//!
//! Services take the authenticated account id of the requester and resolve
//! its profile themselves.

use sqlx::SqlitePool;

pub mod policy;
pub mod scope;
pub mod services;
pub mod types;
pub mod utils;

pub use policy::{authorize, Action, Relationship, Rule};
pub use scope::record_scope;
pub use services::{BookingService, ListingService, ProfileService, ReviewService};
pub use types::{
    Availability, CreateBooking, CreateListing, CreateReview, MarketplaceError,
    MarketplaceResult, RescheduleBooking, UpdateListing, UpdateProfile, UpdateReview,
};

/// All marketplace services over one pool.
#[derive(Clone)]
pub struct Marketplace {
    pub profiles: ProfileService,
    pub listings: ListingService,
    pub bookings: BookingService,
    pub reviews: ReviewService,
}

impl Marketplace {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            profiles: ProfileService::new(pool.clone()),
            listings: ListingService::new(pool.clone()),
            bookings: BookingService::new(pool.clone()),
            reviews: ReviewService::new(pool),
        }
    }
}
