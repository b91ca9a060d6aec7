//! Staybook Database Crate
//!
//! Connection management, migrations, marketplace entities and the
//! repositories that read and write them.

use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use staybook_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{BookingRepository, ListingRepository, ProfileRepository, ReviewRepository};

pub use entities::{
    Booking, BookingFilter, BookingStatus, Listing, ListingChanges, ListingFilter,
    ListingOrdering, ListingSortField, ListingStatus, NewBooking, NewListing, NewReview,
    ProfileChanges, ProfileFilter, Review, ReviewChanges, ReviewFilter, Role, UserProfile,
};

pub use types::{DatabaseError, DatabaseResult, Page, PageRequest, RecordScope};

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Generate the public identifier exposed for a new row.
pub fn new_public_id() -> String {
    CUID.create_id()
}

/// Open the pool and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(format!("{e:#}")))?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, Utc};
    use sqlx::SqlitePool;
    use staybook_config::DatabaseConfig;
    use tempfile::TempDir;

    use crate::entities::NewListing;

    pub async fn test_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("test.db").display()),
            max_connections: 4,
        };
        let pool = crate::initialize_database(&config).await.unwrap();
        (pool, temp_dir)
    }

    pub async fn insert_user(pool: &SqlitePool, username: &str) -> i64 {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (public_id, username, email, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(crate::new_public_id())
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    pub fn sample_listing(host_id: i64, city: &str, price_per_night: i64) -> NewListing {
        NewListing {
            host_id,
            name: format!("Cottage in {city}"),
            description: "Two rooms near the water".into(),
            city: city.into(),
            county: "Coast".into(),
            price_per_night,
            bedrooms: 2,
            max_guests: 4,
        }
    }

    pub fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_ids_are_unique() {
        let first = new_public_id();
        let second = new_public_id();
        assert_ne!(first, second);
        assert!(!first.is_empty());
    }
}
