//! Row types for the marketplace tables.
//!
//! Each entity is read through a joined query so that it carries the public
//! identifiers of the records it references alongside the internal keys.

pub mod booking;
pub mod listing;
pub mod profile;
pub mod review;

pub use booking::{Booking, BookingFilter, BookingStatus, NewBooking};
pub use listing::{
    Listing, ListingChanges, ListingFilter, ListingOrdering, ListingSortField, ListingStatus,
    NewListing,
};
pub use profile::{ProfileChanges, ProfileFilter, Role, UserProfile};
pub use review::{NewReview, Review, ReviewChanges, ReviewFilter};
