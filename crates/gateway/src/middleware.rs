//! Request logging.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{info, warn};

/// Log method, uri, status and duration of every request.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = Instant::now();
    let response = next.run(request).await;
    let duration_ms = start.elapsed().as_millis();
    let status = response.status();

    if status.is_server_error() {
        warn!(%method, %uri, %status, duration_ms, "request failed");
    } else {
        info!(%method, %uri, %status, duration_ms, "request completed");
    }

    response
}
