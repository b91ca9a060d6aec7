//! Booking repository for database operations.
//!
//! Overlap checks and the writes they guard are single statements. SQLite
//! takes the write lock before evaluating the `NOT EXISTS` sub-select, so two
//! racing inserts for the same dates cannot both succeed.

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{Booking, BookingFilter, BookingStatus, NewBooking};
use crate::new_public_id;
use crate::types::{DatabaseError, DatabaseResult, Page, PageRequest, RecordScope};

const BOOKING_SELECT: &str = "SELECT b.id, b.public_id, b.listing_id, l.public_id AS listing_public_id, \
     l.host_id, b.guest_id, gu.public_id AS guest_public_id, b.start_date, b.end_date, b.status, \
     b.total_price, b.created_at, b.updated_at \
     FROM bookings b \
     JOIN listings l ON l.id = b.listing_id \
     JOIN user_profiles gp ON gp.id = b.guest_id \
     JOIN users gu ON gu.id = gp.user_id";

const SCOPE_HOST_COLUMN: &str = "l.host_id";
const SCOPE_AUTHOR_COLUMN: &str = "b.guest_id";

#[derive(Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a pending booking unless it would overlap a pending or confirmed one.
    ///
    /// Returns `None` when the dates are taken.
    pub async fn create_if_available(&self, booking: &NewBooking) -> DatabaseResult<Option<Booking>> {
        let now = Utc::now();
        let public_id = new_public_id();

        let result = sqlx::query(
            "INSERT INTO bookings (public_id, listing_id, guest_id, start_date, end_date, status, \
             total_price, created_at, updated_at) \
             SELECT ?, ?, ?, ?, ?, 'pending', ?, ?, ? \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM bookings \
                 WHERE listing_id = ? AND status IN ('pending', 'confirmed') \
                   AND start_date < ? AND end_date > ?)",
        )
        .bind(&public_id)
        .bind(booking.listing_id)
        .bind(booking.guest_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.total_price)
        .bind(now)
        .bind(now)
        .bind(booking.listing_id)
        .bind(booking.end_date)
        .bind(booking.start_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(result.last_insert_rowid()).await
    }

    /// Number of pending or confirmed bookings on `listing_id` overlapping `[start, end)`.
    pub async fn count_overlapping(
        &self,
        listing_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings \
             WHERE listing_id = ? AND status IN ('pending', 'confirmed') \
               AND start_date < ? AND end_date > ?",
        )
        .bind(listing_id)
        .bind(end)
        .bind(start)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!("{BOOKING_SELECT} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    /// Look up a booking by public id, restricted to what `scope` can see.
    pub async fn find_by_public_id(
        &self,
        public_id: &str,
        scope: RecordScope,
    ) -> DatabaseResult<Option<Booking>> {
        let mut query = QueryBuilder::<Sqlite>::new(BOOKING_SELECT);
        query.push(" WHERE b.public_id = ").push_bind(public_id.to_owned());
        scope.push_predicate(&mut query, SCOPE_HOST_COLUMN, SCOPE_AUTHOR_COLUMN);

        let booking = query
            .build_query_as::<Booking>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    pub async fn list(
        &self,
        scope: RecordScope,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> DatabaseResult<Page<Booking>> {
        if scope.is_nothing() {
            return Ok(Page::empty());
        }

        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM bookings b JOIN listings l ON l.id = b.listing_id WHERE 1=1",
        );
        scope.push_predicate(&mut count, SCOPE_HOST_COLUMN, SCOPE_AUTHOR_COLUMN);
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(BOOKING_SELECT);
        query.push(" WHERE 1=1");
        scope.push_predicate(&mut query, SCOPE_HOST_COLUMN, SCOPE_AUTHOR_COLUMN);
        push_filters(&mut query, filter);
        query.push(" ORDER BY b.created_at DESC, b.id DESC LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset);

        let items = query
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, total })
    }

    /// Move a pending booking to new dates if they are free of other bookings.
    ///
    /// Returns `false` when the booking is no longer pending or the new range overlaps.
    pub async fn reschedule_if_available(
        &self,
        id: i64,
        start: NaiveDate,
        end: NaiveDate,
        total_price: i64,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET start_date = ?, end_date = ?, total_price = ?, updated_at = ? \
             WHERE id = ? AND status = 'pending' \
               AND NOT EXISTS ( \
                   SELECT 1 FROM bookings other \
                   WHERE other.listing_id = bookings.listing_id AND other.id != bookings.id \
                     AND other.status IN ('pending', 'confirmed') \
                     AND other.start_date < ? AND other.end_date > ?)",
        )
        .bind(start)
        .bind(end)
        .bind(total_price)
        .bind(Utc::now())
        .bind(id)
        .bind(end)
        .bind(start)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Compare-and-set the status. Returns `false` if the stored status was not `from`.
    pub async fn transition_status(
        &self,
        id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> DatabaseResult<bool> {
        let result =
            sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(to)
                .bind(Utc::now())
                .bind(id)
                .bind(from)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, id: i64) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("booking {id}")));
        }
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &BookingFilter) {
    if let Some(guest_id) = filter.guest_id {
        query.push(" AND b.guest_id = ").push_bind(guest_id);
    }
    if let Some(listing_id) = filter.listing_id {
        query.push(" AND b.listing_id = ").push_bind(listing_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Listing, Role, UserProfile};
    use crate::repos::{ListingRepository, ProfileRepository};
    use crate::test_support::{date, insert_user, sample_listing, test_pool};

    struct Fixture {
        bookings: BookingRepository,
        host: UserProfile,
        guest: UserProfile,
        listing: Listing,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let (pool, dir) = test_pool().await;
        let profiles = ProfileRepository::new(pool.clone());
        let host = profiles
            .provision(insert_user(&pool, "host").await, Role::Host)
            .await
            .unwrap();
        let guest = profiles
            .provision(insert_user(&pool, "guest").await, Role::Guest)
            .await
            .unwrap();
        let listing = ListingRepository::new(pool.clone())
            .create(&sample_listing(host.id, "Naivasha", 2_500))
            .await
            .unwrap();
        Fixture {
            bookings: BookingRepository::new(pool),
            host,
            guest,
            listing,
            _dir: dir,
        }
    }

    fn stay(fx: &Fixture, start: &str, end: &str) -> NewBooking {
        NewBooking {
            listing_id: fx.listing.id,
            guest_id: fx.guest.id,
            start_date: date(start),
            end_date: date(end),
            total_price: 1,
        }
    }

    #[tokio::test]
    async fn overlapping_insert_is_refused() {
        let fx = fixture().await;
        let first = fx
            .bookings
            .create_if_available(&stay(&fx, "2025-03-01", "2025-03-05"))
            .await
            .unwrap();
        assert!(first.is_some());

        let overlapping = fx
            .bookings
            .create_if_available(&stay(&fx, "2025-03-04", "2025-03-08"))
            .await
            .unwrap();
        assert!(overlapping.is_none());

        // Touching ranges do not overlap.
        let adjacent = fx
            .bookings
            .create_if_available(&stay(&fx, "2025-03-05", "2025-03-07"))
            .await
            .unwrap();
        assert!(adjacent.is_some());
    }

    #[tokio::test]
    async fn cancelled_bookings_free_their_dates() {
        let fx = fixture().await;
        let booking = fx
            .bookings
            .create_if_available(&stay(&fx, "2025-04-01", "2025-04-03"))
            .await
            .unwrap()
            .unwrap();
        assert!(fx
            .bookings
            .transition_status(booking.id, BookingStatus::Pending, BookingStatus::Cancelled)
            .await
            .unwrap());

        assert_eq!(
            fx.bookings
                .count_overlapping(fx.listing.id, date("2025-04-01"), date("2025-04-03"))
                .await
                .unwrap(),
            0
        );
        assert!(fx
            .bookings
            .create_if_available(&stay(&fx, "2025-04-02", "2025-04-04"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn transition_is_compare_and_set() {
        let fx = fixture().await;
        let booking = fx
            .bookings
            .create_if_available(&stay(&fx, "2025-05-01", "2025-05-02"))
            .await
            .unwrap()
            .unwrap();

        assert!(fx
            .bookings
            .transition_status(booking.id, BookingStatus::Pending, BookingStatus::Confirmed)
            .await
            .unwrap());
        assert!(!fx
            .bookings
            .transition_status(booking.id, BookingStatus::Pending, BookingStatus::Cancelled)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn reschedule_ignores_own_range_but_not_others() {
        let fx = fixture().await;
        let booking = fx
            .bookings
            .create_if_available(&stay(&fx, "2025-06-01", "2025-06-05"))
            .await
            .unwrap()
            .unwrap();
        fx.bookings
            .create_if_available(&stay(&fx, "2025-06-10", "2025-06-12"))
            .await
            .unwrap()
            .unwrap();

        assert!(fx
            .bookings
            .reschedule_if_available(booking.id, date("2025-06-02"), date("2025-06-06"), 10)
            .await
            .unwrap());
        assert!(!fx
            .bookings
            .reschedule_if_available(booking.id, date("2025-06-09"), date("2025-06-11"), 10)
            .await
            .unwrap());

        let stored = fx.bookings.find_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.start_date, date("2025-06-02"));
        assert_eq!(stored.total_price, 10);
    }

    #[tokio::test]
    async fn scope_limits_visibility() {
        let fx = fixture().await;
        let booking = fx
            .bookings
            .create_if_available(&stay(&fx, "2025-07-01", "2025-07-03"))
            .await
            .unwrap()
            .unwrap();

        let everything = fx
            .bookings
            .list(RecordScope::Everything, &BookingFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(everything.total, 1);

        let hosted = fx
            .bookings
            .list(RecordScope::HostedBy(fx.host.id), &BookingFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(hosted.items[0].public_id, booking.public_id);

        let other_host = fx
            .bookings
            .list(RecordScope::HostedBy(fx.guest.id), &BookingFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(other_host.total, 0);

        let nothing = fx
            .bookings
            .list(RecordScope::Nothing, &BookingFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert!(nothing.items.is_empty());

        assert!(fx
            .bookings
            .find_by_public_id(&booking.public_id, RecordScope::AuthoredBy(fx.host.id))
            .await
            .unwrap()
            .is_none());
        assert!(fx
            .bookings
            .find_by_public_id(&booking.public_id, RecordScope::AuthoredBy(fx.guest.id))
            .await
            .unwrap()
            .is_some());
    }
}
