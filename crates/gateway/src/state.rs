use axum::http::HeaderMap;
use sqlx::SqlitePool;
use staybook_auth::{AuthSession, Authenticator, User};
use staybook_config::PaginationConfig;
use staybook_marketplace::Marketplace;

use crate::{util::require_bearer, ApiError};

#[derive(Clone)]
pub struct AppState {
    db_pool: SqlitePool,
    authenticator: Authenticator,
    marketplace: Marketplace,
    pagination: PaginationConfig,
}

impl AppState {
    pub fn new(
        db_pool: SqlitePool,
        authenticator: Authenticator,
        pagination: PaginationConfig,
    ) -> Self {
        let marketplace = Marketplace::new(db_pool.clone());
        Self {
            db_pool,
            authenticator,
            marketplace,
            pagination,
        }
    }

    pub fn db_pool(&self) -> &SqlitePool {
        &self.db_pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn marketplace(&self) -> &Marketplace {
        &self.marketplace
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    pub async fn authenticate(&self, token: &str) -> Result<(User, AuthSession), ApiError> {
        self.authenticator
            .authenticate_token(token)
            .await
            .map_err(ApiError::from)
    }

    /// Resolve the bearer token in `headers` to its account.
    pub async fn require_user(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let token = require_bearer(headers)?;
        let (user, _) = self.authenticate(&token).await?;
        Ok(user)
    }
}
