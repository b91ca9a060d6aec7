use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use rand::RngCore;
use serde::Serialize;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use staybook_config::AuthConfig;
use thiserror::Error;
use tracing::{debug, info};

const PASSWORD_PROVIDER: &str = "password";
// Ten years.
const MAX_SESSION_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    session_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidAccount(String),
    #[error("user not found")]
    UserNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Fields accepted when opening a password account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let ttl_seconds = i64::try_from(config.session_ttl_seconds)
            .unwrap_or(MAX_SESSION_TTL_SECONDS)
            .min(MAX_SESSION_TTL_SECONDS);
        let session_ttl = Duration::seconds(ttl_seconds);

        Self { pool, session_ttl }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Create an account with a password identity keyed by username.
    pub async fn register(&self, account: &NewAccount) -> Result<User, AuthError> {
        let mut tx = self.pool.begin().await?;
        let user = self.register_in(&mut tx, account).await?;
        tx.commit().await?;

        info!(user = %user.public_id, username = %user.username, "registered account");
        Ok(user)
    }

    /// Create an account inside `tx` without committing it.
    ///
    /// Rows that must exist together with the account can be written to the
    /// same transaction before the caller commits.
    pub async fn register_in(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        account: &NewAccount,
    ) -> Result<User, AuthError> {
        let username = account.username.trim();
        let email = account.email.trim().to_lowercase();
        validate_account(username, &email, &account.password)?;

        let existing = sqlx::query("SELECT id FROM users WHERE username = ? OR email = ?")
            .bind(username)
            .bind(&email)
            .fetch_optional(&mut **tx)
            .await?;

        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        let now = Utc::now();
        let password_hash = self.hash_password(&account.password)?;

        let user = self
            .insert_user(
                tx,
                username,
                &email,
                account.first_name.as_deref(),
                account.last_name.as_deref(),
            )
            .await?;

        sqlx::query(
            "INSERT INTO user_identities (user_id, provider, provider_uid, secret, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(PASSWORD_PROVIDER)
        .bind(username)
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&mut **tx)
        .await
        .map_err(unique_to_exists)?;

        debug!(user = %user.public_id, "account staged");
        Ok(user)
    }

    /// Verify a password for a username or email and open a session.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession, AuthError> {
        let identifier = identifier.trim();
        let identity = sqlx::query(
            "SELECT i.user_id, i.secret FROM user_identities i \
             JOIN users u ON u.id = i.user_id \
             WHERE i.provider = ? AND (u.username = ? OR u.email = ?)",
        )
        .bind(PASSWORD_PROVIDER)
        .bind(identifier)
        .bind(identifier.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = identity else {
            return Err(AuthError::InvalidCredentials);
        };

        let secret: Option<String> = row.try_get("secret")?;
        let secret = secret.ok_or(AuthError::InvalidCredentials)?;
        let stored_hash = PasswordHash::new(&secret)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &stored_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let user_id: i64 = row.try_get("user_id")?;
        let session = self.issue_session(user_id).await?;
        debug!(user_id, "issued session");
        Ok(session)
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::SessionNotFound);
        };

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            return Err(AuthError::SessionExpired);
        }

        let user = self.user(user_id).await?;
        let session = AuthSession {
            token: token.to_owned(),
            user_id,
            expires_at,
        };

        Ok((user, session))
    }

    /// Delete the session behind `token`.
    pub async fn revoke_session(&self, token: &str) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::SessionNotFound);
        }
        Ok(())
    }

    pub async fn user(&self, id: i64) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(
            "SELECT id, public_id, username, email, first_name, last_name FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::UserNotFound)
    }

    async fn insert_user(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        username: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User, AuthError> {
        let now = Utc::now().to_rfc3339();
        let public_id = new_public_id();

        let result = sqlx::query(
            "INSERT INTO users (public_id, username, email, first_name, last_name, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(&now)
        .bind(&now)
        .execute(&mut **tx)
        .await
        .map_err(unique_to_exists)?;

        Ok(User {
            id: result.last_insert_rowid(),
            public_id,
            username: username.to_owned(),
            email: email.to_owned(),
            first_name: first_name.map(str::to_owned),
            last_name: last_name.map(str::to_owned),
        })
    }

    async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let token = self.generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        sqlx::query(
            "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&token)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            token,
            user_id,
            expires_at,
        })
    }

    fn hash_password(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn generate_session_token(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

fn new_public_id() -> String {
    CUID.create_id()
}

fn unique_to_exists(err: sqlx::Error) -> AuthError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AuthError::UserExists,
        _ => AuthError::Database(err),
    }
}

fn validate_account(username: &str, email: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() || username.len() > 150 {
        return Err(AuthError::InvalidAccount(
            "username must be between 1 and 150 characters".into(),
        ));
    }
    if username.contains(char::is_whitespace) || username.contains('@') {
        return Err(AuthError::InvalidAccount(
            "username may not contain whitespace or '@'".into(),
        ));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(AuthError::InvalidAccount("email address is invalid".into())),
    }
    if password.len() < 8 {
        return Err(AuthError::InvalidAccount(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_account_accepts_reasonable_input() {
        assert!(validate_account("amina", "amina@example.com", "correct-horse").is_ok());
    }

    #[test]
    fn validate_account_rejects_bad_fields() {
        assert!(validate_account("", "a@example.com", "long-enough").is_err());
        assert!(validate_account("with space", "a@example.com", "long-enough").is_err());
        assert!(validate_account("amina", "not-an-email", "long-enough").is_err());
        assert!(validate_account("amina", "a@example.com", "short").is_err());
    }
}
