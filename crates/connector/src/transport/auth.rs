// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token guard for the local API.
//!
//! The router attaches [`require_token`] only to the routes that need it, so
//! the guard itself knows nothing about paths.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// Token carried by an `Authorization: Bearer` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

/// Check the request headers against the configured token. With no token
/// configured every request passes.
pub fn validate_bearer(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match bearer_token(headers) {
        Some(presented) if tokens_match(presented, expected) => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

/// Compares every byte regardless of where the first mismatch is.
fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented.bytes().zip(expected.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn require_token(State(s): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    match validate_bearer(req.headers(), s.config.auth_token.as_deref()) {
        Ok(()) => next.run(req).await,
        Err(code) => {
            tracing::debug!(path = req.uri().path(), "rejected request without valid token");
            code.to_http_response("missing or invalid bearer token").into_response()
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
