//! Property listings offered by hosts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ListingStatus::Pending),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            other => Err(format!("unknown listing status `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: i64,
    pub public_id: String,
    pub host_id: i64,
    pub host_public_id: String,
    pub name: String,
    pub description: String,
    pub city: String,
    pub county: String,
    /// Nightly rate in minor currency units.
    pub price_per_night: i64,
    pub bedrooms: i64,
    pub max_guests: i64,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub host_id: i64,
    pub name: String,
    pub description: String,
    pub city: String,
    pub county: String,
    pub price_per_night: i64,
    pub bedrooms: i64,
    pub max_guests: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ListingChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub price_per_night: Option<i64>,
    pub bedrooms: Option<i64>,
    pub max_guests: Option<i64>,
    pub status: Option<ListingStatus>,
}

impl ListingChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.city.is_none()
            && self.county.is_none()
            && self.price_per_night.is_none()
            && self.bedrooms.is_none()
            && self.max_guests.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSortField {
    PricePerNight,
    CreatedAt,
    Name,
}

impl ListingSortField {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            ListingSortField::PricePerNight => "l.price_per_night",
            ListingSortField::CreatedAt => "l.created_at",
            ListingSortField::Name => "l.name",
        }
    }
}

/// Sort key accepted by listing queries, written `field` or `-field`.
///
/// ```
/// use staybook_database::{ListingOrdering, ListingSortField};
///
/// let ordering: ListingOrdering = "-price_per_night".parse().unwrap();
/// assert_eq!(ordering.field, ListingSortField::PricePerNight);
/// assert!(ordering.descending);
/// assert_eq!(ListingOrdering::default().field, ListingSortField::CreatedAt);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOrdering {
    pub field: ListingSortField,
    pub descending: bool,
}

impl Default for ListingOrdering {
    fn default() -> Self {
        Self {
            field: ListingSortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for ListingOrdering {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let (descending, name) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let field = match name {
            "price_per_night" => ListingSortField::PricePerNight,
            "created_at" => ListingSortField::CreatedAt,
            "name" => ListingSortField::Name,
            other => return Err(format!("cannot order listings by `{other}`")),
        };
        Ok(Self { field, descending })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub host_id: Option<i64>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i64>,
    pub min_guests: Option<i64>,
    pub search: Option<String>,
    pub ordering: ListingOrdering,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_rejects_unknown_fields() {
        assert!("bedrooms".parse::<ListingOrdering>().is_err());
        assert!("-".parse::<ListingOrdering>().is_err());
    }

    #[test]
    fn ordering_defaults_to_ascending_without_prefix() {
        let ordering: ListingOrdering = "name".parse().unwrap();
        assert_eq!(ordering.field, ListingSortField::Name);
        assert!(!ordering.descending);
    }
}
