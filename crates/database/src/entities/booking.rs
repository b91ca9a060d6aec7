//! Stays reserved by guests against a listing.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a booking in this status blocks its date range.
    pub fn holds_dates(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Allowed moves: pending to confirmed, and pending or confirmed to cancelled.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    pub public_id: String,
    pub listing_id: i64,
    pub listing_public_id: String,
    /// Profile id of the host owning the booked listing.
    pub host_id: i64,
    pub guest_id: i64,
    pub guest_public_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub listing_id: i64,
    pub guest_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: i64,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub guest_id: Option<i64>,
    pub listing_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_lifecycle() {
        use BookingStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn cancelled_bookings_release_dates() {
        assert!(BookingStatus::Pending.holds_dates());
        assert!(BookingStatus::Confirmed.holds_dates());
        assert!(!BookingStatus::Cancelled.holds_dates());
    }
}
