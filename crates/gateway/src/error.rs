use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use staybook_auth::AuthError;
use staybook_marketplace::MarketplaceError;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine readable error kind, e.g. `not_found` or `conflict`.
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "permission_denied", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    /// Generic 500. The cause is logged by the caller, never returned.
    pub fn internal_server_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "an internal error occurred",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.kind.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<MarketplaceError> for ApiError {
    fn from(error: MarketplaceError) -> Self {
        match error {
            MarketplaceError::NotFound { .. } => Self::not_found(error.to_string()),
            MarketplaceError::Validation { message } => Self::bad_request(message),
            MarketplaceError::PermissionDenied { reason } => Self::forbidden(reason),
            MarketplaceError::Conflict { message } => Self::conflict(message),
            MarketplaceError::Database(source) => {
                error!(error = ?source, "marketplace database error");
                Self::internal_server_error()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::UserExists => Self::conflict(error.to_string()),
            AuthError::InvalidAccount(message) => Self::bad_request(message),
            AuthError::UserNotFound => Self::not_found(error.to_string()),
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession => Self::unauthorized(error.to_string()),
            AuthError::Database(_) | AuthError::PasswordHash(_) => {
                error!(error = ?error, "auth error");
                Self::internal_server_error()
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        error!(error = ?error, "database error");
        Self::internal_server_error()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marketplace_errors_map_to_statuses() {
        let cases = [
            (MarketplaceError::not_found("listing", "x"), StatusCode::NOT_FOUND),
            (MarketplaceError::validation("bad"), StatusCode::BAD_REQUEST),
            (MarketplaceError::permission_denied("no"), StatusCode::FORBIDDEN),
            (MarketplaceError::conflict("taken"), StatusCode::CONFLICT),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let error = ApiError::from(AuthError::Database(sqlx::Error::PoolClosed));
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.kind, "internal_error");
        assert!(!error.message.contains("pool"));
    }

    #[test]
    fn database_errors_are_internal() {
        let error = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, "an internal error occurred");
    }

    #[test]
    fn session_failures_are_unauthenticated() {
        for error in [AuthError::SessionExpired, AuthError::InvalidCredentials] {
            let mapped = ApiError::from(error);
            assert_eq!(mapped.status, StatusCode::UNAUTHORIZED);
            assert_eq!(mapped.kind, "unauthenticated");
        }
    }
}
