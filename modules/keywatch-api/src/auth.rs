use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use tracing::warn;

use crate::AppState;

/// Reject `/api/*` requests without valid HTTP Basic credentials.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if check_basic_auth(request.headers(), &state.admin_username, &state.admin_password) {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Rejected unauthenticated admin request");
    let mut response = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"keywatch\""),
    );
    response
}

pub fn check_basic_auth(headers: &HeaderMap, username: &str, password: &str) -> bool {
    let Some(auth) = headers.get(header::AUTHORIZATION) else { return false };
    let Ok(auth_str) = auth.to_str() else { return false };
    let Some(encoded) = auth_str.strip_prefix("Basic ") else { return false };

    let Ok(decoded_bytes) = base64::engine::general_purpose::STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded_bytes) else { return false };

    let expected = format!("{username}:{password}");
    constant_time_eq(decoded.as_bytes(), expected.as_bytes())
}

/// Length-leaking but content-constant comparison.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
