//! Business logic layer

pub mod booking_service;
pub mod listing_service;
pub mod profile_service;
pub mod review_service;

pub use booking_service::BookingService;
pub use listing_service::ListingService;
pub use profile_service::ProfileService;
pub use review_service::ReviewService;
