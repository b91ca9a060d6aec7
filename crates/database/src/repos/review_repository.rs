//! Review repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{NewReview, Review, ReviewChanges, ReviewFilter};
use crate::new_public_id;
use crate::types::{DatabaseError, DatabaseResult, Page, PageRequest, RecordScope};

const REVIEW_SELECT: &str = "SELECT r.id, r.public_id, r.booking_id, b.public_id AS booking_public_id, \
     r.listing_id, l.public_id AS listing_public_id, l.host_id, r.author_id, \
     au.public_id AS author_public_id, r.rating, r.body, r.host_response, r.host_response_date, \
     r.created_at, r.updated_at \
     FROM reviews r \
     JOIN bookings b ON b.id = r.booking_id \
     JOIN listings l ON l.id = r.listing_id \
     JOIN user_profiles ap ON ap.id = r.author_id \
     JOIN users au ON au.id = ap.user_id";

const SCOPE_HOST_COLUMN: &str = "l.host_id";
const SCOPE_AUTHOR_COLUMN: &str = "r.author_id";

#[derive(Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a review. A second review for the same booking fails with
    /// [`DatabaseError::Duplicate`].
    pub async fn create(&self, review: &NewReview) -> DatabaseResult<Review> {
        let now = Utc::now();
        let public_id = new_public_id();

        let result = sqlx::query(
            "INSERT INTO reviews (public_id, booking_id, listing_id, author_id, rating, body, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(review.booking_id)
        .bind(review.listing_id)
        .bind(review.author_id)
        .bind(review.rating)
        .bind(&review.body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("review {public_id}")))
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    pub async fn find_by_public_id(
        &self,
        public_id: &str,
        scope: RecordScope,
    ) -> DatabaseResult<Option<Review>> {
        let mut query = QueryBuilder::<Sqlite>::new(REVIEW_SELECT);
        query.push(" WHERE r.public_id = ").push_bind(public_id.to_owned());
        scope.push_predicate(&mut query, SCOPE_HOST_COLUMN, SCOPE_AUTHOR_COLUMN);

        let review = query
            .build_query_as::<Review>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    pub async fn list(
        &self,
        scope: RecordScope,
        filter: &ReviewFilter,
        page: PageRequest,
    ) -> DatabaseResult<Page<Review>> {
        if scope.is_nothing() {
            return Ok(Page::empty());
        }

        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM reviews r JOIN listings l ON l.id = r.listing_id WHERE 1=1",
        );
        scope.push_predicate(&mut count, SCOPE_HOST_COLUMN, SCOPE_AUTHOR_COLUMN);
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(REVIEW_SELECT);
        query.push(" WHERE 1=1");
        scope.push_predicate(&mut query, SCOPE_HOST_COLUMN, SCOPE_AUTHOR_COLUMN);
        push_filters(&mut query, filter);
        query.push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset);

        let items = query
            .build_query_as::<Review>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, total })
    }

    pub async fn update(&self, id: i64, changes: &ReviewChanges) -> DatabaseResult<Review> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE reviews SET updated_at = ");
        query.push_bind(Utc::now());
        if let Some(rating) = changes.rating {
            query.push(", rating = ").push_bind(rating);
        }
        if let Some(body) = &changes.body {
            query.push(", body = ").push_bind(body.clone());
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("review {id}")));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("review {id}")))
    }

    pub async fn delete(&self, id: i64) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("review {id}")));
        }
        Ok(())
    }

    /// Store the host's reply if none has been stored yet.
    ///
    /// Returns `false` when a reply already exists; the stored text is left as is.
    pub async fn set_host_response(
        &self,
        id: i64,
        response: &str,
        responded_at: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE reviews SET host_response = ?, host_response_date = ?, updated_at = ? \
             WHERE id = ? AND host_response IS NULL",
        )
        .bind(response)
        .bind(responded_at)
        .bind(responded_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &ReviewFilter) {
    if let Some(listing_id) = filter.listing_id {
        query.push(" AND r.listing_id = ").push_bind(listing_id);
    }
}
