//! Body and query extractors whose rejections render as [`ApiError`].

use axum::extract::{FromRequest, FromRequestParts};

use crate::ApiError;

/// JSON request body. Malformed or incomplete bodies answer 400 `validation_error`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string. Unparseable parameters answer 400 `validation_error`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
