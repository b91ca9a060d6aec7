//! Request and result types for the marketplace services.

pub mod errors;
pub mod requests;

pub use errors::{MarketplaceError, MarketplaceResult};
pub use requests::{
    Availability, CreateBooking, CreateListing, CreateReview, RescheduleBooking, UpdateListing,
    UpdateProfile, UpdateReview,
};
