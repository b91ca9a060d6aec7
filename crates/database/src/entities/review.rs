//! Guest reviews and the host's single reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub public_id: String,
    pub booking_id: i64,
    pub booking_public_id: String,
    pub listing_id: i64,
    pub listing_public_id: String,
    pub host_id: i64,
    pub author_id: i64,
    pub author_public_id: String,
    pub rating: i64,
    pub body: String,
    pub host_response: Option<String>,
    pub host_response_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub booking_id: i64,
    pub listing_id: i64,
    pub author_id: i64,
    pub rating: i64,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub rating: Option<i64>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub listing_id: Option<i64>,
}
