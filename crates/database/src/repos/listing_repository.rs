//! Listing repository for database operations.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{Listing, ListingChanges, ListingFilter, NewListing};
use crate::new_public_id;
use crate::repos::{contains_pattern, push_like};
use crate::types::{DatabaseError, DatabaseResult, Page, PageRequest};

const LISTING_SELECT: &str = "SELECT l.id, l.public_id, l.host_id, hu.public_id AS host_public_id, \
     l.name, l.description, l.city, l.county, l.price_per_night, l.bedrooms, l.max_guests, \
     l.status, l.created_at, l.updated_at \
     FROM listings l \
     JOIN user_profiles hp ON hp.id = l.host_id \
     JOIN users hu ON hu.id = hp.user_id";

#[derive(Clone)]
pub struct ListingRepository {
    pool: SqlitePool,
}

impl ListingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new listing in the `pending` state.
    pub async fn create(&self, listing: &NewListing) -> DatabaseResult<Listing> {
        let now = Utc::now();
        let public_id = new_public_id();

        let result = sqlx::query(
            "INSERT INTO listings (public_id, host_id, name, description, city, county, \
             price_per_night, bedrooms, max_guests, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)",
        )
        .bind(&public_id)
        .bind(listing.host_id)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(&listing.city)
        .bind(&listing.county)
        .bind(listing.price_per_night)
        .bind(listing.bedrooms)
        .bind(listing.max_guests)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("listing {public_id}")))
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>(&format!("{LISTING_SELECT} WHERE l.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(listing)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Listing>> {
        let listing =
            sqlx::query_as::<_, Listing>(&format!("{LISTING_SELECT} WHERE l.public_id = ?"))
                .bind(public_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(listing)
    }

    pub async fn list(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> DatabaseResult<Page<Listing>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM listings l WHERE 1=1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(LISTING_SELECT);
        query.push(" WHERE 1=1");
        push_filters(&mut query, filter);

        let direction = if filter.ordering.descending { "DESC" } else { "ASC" };
        query.push(format!(
            " ORDER BY {} {direction}, l.id {direction} LIMIT ",
            filter.ordering.field.column()
        ));
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset);

        let items = query
            .build_query_as::<Listing>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, total })
    }

    pub async fn update(&self, id: i64, changes: &ListingChanges) -> DatabaseResult<Listing> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE listings SET updated_at = ");
        query.push_bind(Utc::now());
        if let Some(name) = &changes.name {
            query.push(", name = ").push_bind(name.clone());
        }
        if let Some(description) = &changes.description {
            query.push(", description = ").push_bind(description.clone());
        }
        if let Some(city) = &changes.city {
            query.push(", city = ").push_bind(city.clone());
        }
        if let Some(county) = &changes.county {
            query.push(", county = ").push_bind(county.clone());
        }
        if let Some(price) = changes.price_per_night {
            query.push(", price_per_night = ").push_bind(price);
        }
        if let Some(bedrooms) = changes.bedrooms {
            query.push(", bedrooms = ").push_bind(bedrooms);
        }
        if let Some(max_guests) = changes.max_guests {
            query.push(", max_guests = ").push_bind(max_guests);
        }
        if let Some(status) = changes.status {
            query.push(", status = ").push_bind(status);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("listing {id}")));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("listing {id}")))
    }

    /// Delete a listing together with its bookings and reviews.
    pub async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &ListingFilter) {
    if let Some(status) = filter.status {
        query.push(" AND l.status = ").push_bind(status);
    }
    if let Some(host_id) = filter.host_id {
        query.push(" AND l.host_id = ").push_bind(host_id);
    }
    if let Some(city) = contains_pattern(filter.city.as_deref()) {
        query.push(" AND ");
        push_like(query, "l.city", &city);
    }
    if let Some(county) = contains_pattern(filter.county.as_deref()) {
        query.push(" AND ");
        push_like(query, "l.county", &county);
    }
    if let Some(min_price) = filter.min_price {
        query.push(" AND l.price_per_night >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        query.push(" AND l.price_per_night <= ").push_bind(max_price);
    }
    if let Some(bedrooms) = filter.min_bedrooms {
        query.push(" AND l.bedrooms >= ").push_bind(bedrooms);
    }
    if let Some(guests) = filter.min_guests {
        query.push(" AND l.max_guests >= ").push_bind(guests);
    }
    if let Some(search) = contains_pattern(filter.search.as_deref()) {
        query.push(" AND (");
        push_like(query, "l.name", &search);
        query.push(" OR ");
        push_like(query, "l.description", &search);
        query.push(" OR ");
        push_like(query, "l.city", &search);
        query.push(" OR ");
        push_like(query, "l.county", &search);
        query.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ListingOrdering, ListingStatus, Role};
    use crate::repos::ProfileRepository;
    use crate::test_support::{insert_user, sample_listing, test_pool};

    #[tokio::test]
    async fn create_starts_pending_and_exposes_host() {
        let (pool, _dir) = test_pool().await;
        let host = ProfileRepository::new(pool.clone())
            .provision(insert_user(&pool, "host").await, Role::Host)
            .await
            .unwrap();
        let repo = ListingRepository::new(pool);

        let listing = repo.create(&sample_listing(host.id, "Nairobi", 5_000)).await.unwrap();

        assert_eq!(listing.status, ListingStatus::Pending);
        assert_eq!(listing.host_public_id, host.public_id);
        assert!(!listing.public_id.is_empty());
    }

    #[tokio::test]
    async fn list_applies_filters_and_ordering() {
        let (pool, _dir) = test_pool().await;
        let host = ProfileRepository::new(pool.clone())
            .provision(insert_user(&pool, "host").await, Role::Host)
            .await
            .unwrap();
        let repo = ListingRepository::new(pool);

        for (city, price) in [("Nairobi", 9_000), ("Mombasa", 4_000), ("Nairobi", 3_000)] {
            let listing = repo.create(&sample_listing(host.id, city, price)).await.unwrap();
            repo.update(
                listing.id,
                &ListingChanges {
                    status: Some(ListingStatus::Approved),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        repo.create(&sample_listing(host.id, "Nairobi", 1_000)).await.unwrap();

        let page = repo
            .list(
                &ListingFilter {
                    status: Some(ListingStatus::Approved),
                    city: Some("nairo".into()),
                    ordering: "price_per_night".parse::<ListingOrdering>().unwrap(),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        let prices: Vec<_> = page.items.iter().map(|l| l.price_per_night).collect();
        assert_eq!(prices, vec![3_000, 9_000]);

        let capped = repo
            .list(
                &ListingFilter {
                    status: Some(ListingStatus::Approved),
                    max_price: Some(5_000),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(capped.total, 2);
    }

    #[tokio::test]
    async fn text_filters_match_wildcards_literally() {
        let (pool, _dir) = test_pool().await;
        let host = ProfileRepository::new(pool.clone())
            .provision(insert_user(&pool, "host").await, Role::Host)
            .await
            .unwrap();
        let repo = ListingRepository::new(pool);
        for city in ["Nairobi", "Mombasa", "Watamu_North"] {
            repo.create(&sample_listing(host.id, city, 2_000)).await.unwrap();
        }

        let count = |filter: ListingFilter| {
            let repo = repo.clone();
            async move { repo.list(&filter, PageRequest::default()).await.unwrap().total }
        };

        let underscore = ListingFilter {
            city: Some("_".into()),
            ..Default::default()
        };
        assert_eq!(count(underscore).await, 1);

        let percent = ListingFilter {
            search: Some("%".into()),
            ..Default::default()
        };
        assert_eq!(count(percent).await, 0);

        let folded = ListingFilter {
            search: Some("WATAMU_n".into()),
            ..Default::default()
        };
        assert_eq!(count(folded).await, 1);
    }

    #[tokio::test]
    async fn paging_reports_total_across_pages() {
        let (pool, _dir) = test_pool().await;
        let host = ProfileRepository::new(pool.clone())
            .provision(insert_user(&pool, "host").await, Role::Host)
            .await
            .unwrap();
        let repo = ListingRepository::new(pool);
        for price in 1..=5 {
            repo.create(&sample_listing(host.id, "Kisumu", price)).await.unwrap();
        }

        let page = repo
            .list(&ListingFilter::default(), PageRequest::from_page(2, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn update_unknown_listing_is_not_found() {
        let (pool, _dir) = test_pool().await;
        let repo = ListingRepository::new(pool);
        let err = repo
            .update(
                42,
                &ListingChanges {
                    name: Some("x".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }
}
