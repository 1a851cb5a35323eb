//! Per-request access log for the device API.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

const USER_ROUTES: &str = "/api/users/";

/// Emits one `info!` line per request, tagged with the user it targets.
///
/// Requests outside `/api/users/{user_id}` log `user_id = "-"`.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let user_id = target_user(&path).unwrap_or("-").to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        user_id = %user_id,
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Device API request"
    );

    response
}

/// The `{user_id}` segment of a user-scoped route.
fn target_user(path: &str) -> Option<&str> {
    path.strip_prefix(USER_ROUTES)
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
}
