//! Profile repository for database operations.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::entities::{ProfileChanges, ProfileFilter, Role, UserProfile};
use crate::repos::{contains_pattern, push_like};
use crate::types::{DatabaseError, DatabaseResult, Page, PageRequest};

const PROFILE_SELECT: &str = "SELECT p.id, p.user_id, u.public_id, u.username, u.email, \
     u.first_name, u.last_name, p.role, p.email_verified, p.created_at, p.updated_at \
     FROM user_profiles p JOIN users u ON u.id = p.user_id";

#[derive(Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get-or-create the profile of `user_id`.
    ///
    /// The insert is a no-op when a profile already exists, so concurrent
    /// callers converge on the same row and an existing role is never reset.
    pub async fn provision(&self, user_id: i64, default_role: Role) -> DatabaseResult<UserProfile> {
        let mut conn = self.pool.acquire().await?;
        Self::provision_in(&mut conn, user_id, default_role).await
    }

    /// [`provision`](Self::provision) on a caller-owned connection, usually an
    /// open transaction.
    pub async fn provision_in(
        conn: &mut SqliteConnection,
        user_id: i64,
        default_role: Role,
    ) -> DatabaseResult<UserProfile> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO user_profiles (user_id, role, email_verified, created_at, updated_at) \
             VALUES (?, ?, 0, ?, ?) ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(default_role)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let profile =
            sqlx::query_as::<_, UserProfile>(&format!("{PROFILE_SELECT} WHERE p.user_id = ?"))
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;
        profile.ok_or_else(|| DatabaseError::NotFound(format!("profile for user {user_id}")))
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!("{PROFILE_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn find_by_user_id(&self, user_id: i64) -> DatabaseResult<Option<UserProfile>> {
        let profile =
            sqlx::query_as::<_, UserProfile>(&format!("{PROFILE_SELECT} WHERE p.user_id = ?"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<UserProfile>> {
        let profile =
            sqlx::query_as::<_, UserProfile>(&format!("{PROFILE_SELECT} WHERE u.public_id = ?"))
                .bind(public_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    pub async fn list(
        &self,
        filter: &ProfileFilter,
        page: PageRequest,
    ) -> DatabaseResult<Page<UserProfile>> {
        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM user_profiles p JOIN users u ON u.id = p.user_id WHERE 1=1",
        );
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(PROFILE_SELECT);
        query.push(" WHERE 1=1");
        push_filters(&mut query, filter);
        query.push(" ORDER BY u.username ASC, p.id ASC LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset);

        let items = query
            .build_query_as::<UserProfile>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, total })
    }

    /// Apply account and profile changes in one transaction.
    pub async fn update(&self, id: i64, changes: &ProfileChanges) -> DatabaseResult<UserProfile> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("profile {id}")))?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if changes.touches_account() {
            let mut query = QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
            query.push_bind(now);
            if let Some(email) = &changes.email {
                query.push(", email = ").push_bind(email.clone());
            }
            if let Some(first_name) = &changes.first_name {
                query.push(", first_name = ").push_bind(first_name.clone());
            }
            if let Some(last_name) = &changes.last_name {
                query.push(", last_name = ").push_bind(last_name.clone());
            }
            query.push(" WHERE id = ").push_bind(current.user_id);
            query.build().execute(&mut *tx).await?;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE user_profiles SET updated_at = ");
        query.push_bind(now);
        if let Some(role) = changes.role {
            query.push(", role = ").push_bind(role);
        }
        if let Some(verified) = changes.email_verified {
            query.push(", email_verified = ").push_bind(verified);
        }
        query.push(" WHERE id = ").push_bind(id);
        query.build().execute(&mut *tx).await?;

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("profile {id}")))
    }

    /// Move a guest to the host role. Hosts and admins are left untouched.
    pub async fn promote_to_host(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE user_profiles SET role = 'host', updated_at = ? WHERE id = ? AND role = 'guest'",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &ProfileFilter) {
    if let Some(role) = filter.role {
        query.push(" AND p.role = ").push_bind(role);
    }
    if let Some(verified) = filter.email_verified {
        query.push(" AND p.email_verified = ").push_bind(verified);
    }
    if let Some(search) = contains_pattern(filter.search.as_deref()) {
        query.push(" AND (");
        push_like(query, "u.username", &search);
        query.push(" OR ");
        push_like(query, "u.email", &search);
        query.push(" OR ");
        push_like(query, "COALESCE(u.first_name, '')", &search);
        query.push(" OR ");
        push_like(query, "COALESCE(u.last_name, '')", &search);
        query.push(")");
    }
}
