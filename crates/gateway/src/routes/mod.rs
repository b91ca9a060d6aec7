pub mod auth;
pub mod bookings;
pub mod health;
pub mod listings;
pub mod models;
pub mod reviews;
pub mod users;
