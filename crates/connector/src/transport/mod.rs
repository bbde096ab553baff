// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the integration form.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all connector routes.
///
/// Everything except health sits behind the bearer-token guard.
pub fn build_router(state: Arc<AppState>) -> Router {
    let guarded: Router<Arc<AppState>> = Router::new()
        .route("/api/v1/providers", get(http::providers))
        // Form fields
        .route("/api/v1/form", get(http::form))
        .route("/api/v1/form/user", put(http::set_user))
        .route("/api/v1/form/org", put(http::set_org))
        .route("/api/v1/form/provider", put(http::select_provider))
        // Handshake
        .route("/api/v1/connect", post(http::connect))
        .route("/api/v1/connect/error", delete(http::dismiss_connect_error))
        .route("/api/v1/selection", get(http::selection))
        // Data view
        .route("/api/v1/data/load", post(http::load_data))
        .route("/api/v1/data/clear", post(http::clear_data))
        .route("/api/v1/data/error", delete(http::dismiss_data_error))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_token));

    Router::new()
        .route("/api/v1/health", get(http::health))
        .merge(guarded)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
