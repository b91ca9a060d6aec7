use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::ApiError;

pub fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("authentication credentials were not provided"))?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or("");
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(ApiError::unauthorized("invalid authorization scheme"));
    }

    let token = parts.next().unwrap_or("");
    if token.is_empty() {
        return Err(ApiError::unauthorized("missing bearer token"));
    }

    Ok(token.to_string())
}

/// Parse an optional query value with `FromStr`, reporting failures as 400s.
pub fn parse_optional<T>(field: &str, value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|reason| ApiError::bad_request(format!("{field}: {reason}")))
        })
        .transpose()
}
