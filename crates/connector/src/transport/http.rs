// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the integration form API.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::provider::{catalog, Provider};
use crate::selection::IntegrationSelection;
use crate::state::AppState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: Option<Provider>,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct OrgRequest {
    pub org: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderRequest {
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selection: Option<IntegrationSelection>,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let form = s.form.read().await;
    Json(HealthResponse { status: "running".to_owned(), provider: form.provider() })
}

/// `GET /api/v1/providers`
pub async fn providers() -> impl IntoResponse {
    Json(catalog())
}

/// `GET /api/v1/form`
pub async fn form(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.form.read().await.view())
}

/// `PUT /api/v1/form/user`
pub async fn set_user(
    State(s): State<Arc<AppState>>,
    Json(req): Json<UserRequest>,
) -> impl IntoResponse {
    let mut form = s.form.write().await;
    form.set_user(req.user);
    Json(form.view())
}

/// `PUT /api/v1/form/org`
pub async fn set_org(
    State(s): State<Arc<AppState>>,
    Json(req): Json<OrgRequest>,
) -> impl IntoResponse {
    let mut form = s.form.write().await;
    form.set_org(req.org);
    Json(form.view())
}

/// `PUT /api/v1/form/provider` — mount a provider control, or unmount with `null`.
pub async fn select_provider(
    State(s): State<Arc<AppState>>,
    Json(req): Json<ProviderRequest>,
) -> impl IntoResponse {
    let provider = match req.provider.as_deref() {
        None => None,
        Some(name) => match name.parse::<Provider>() {
            Ok(p) => Some(p),
            Err(e) => return ApiError::BadRequest.to_http_response(e.to_string()).into_response(),
        },
    };

    let mut form = s.form.write().await;
    if form.select_provider(provider) {
        tracing::info!(provider = ?provider, "provider selected");
    }
    Json(form.view()).into_response()
}

/// `POST /api/v1/connect` — start a handshake on the mounted control.
///
/// Responds once the popup is open or the attempt failed.
pub async fn connect(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let request = s.form.read().await.connect_request();
    match request {
        Some(request) => Json(request.run().await).into_response(),
        None => {
            ApiError::NoProvider.to_http_response("no provider selected").into_response()
        }
    }
}

/// `DELETE /api/v1/connect/error`
pub async fn dismiss_connect_error(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let form = s.form.read().await;
    match form.control() {
        Some(control) => {
            control.dismiss_error();
            Json(control.view()).into_response()
        }
        None => {
            ApiError::NoProvider.to_http_response("no provider selected").into_response()
        }
    }
}

/// `GET /api/v1/selection`
pub async fn selection(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SelectionResponse { selection: s.form.read().await.selection() })
}

/// `POST /api/v1/data/load`
pub async fn load_data(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let data = s.form.read().await.data().clone();
    Json(data.load().await)
}

/// `POST /api/v1/data/clear`
pub async fn clear_data(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.form.read().await.data().clear())
}

/// `DELETE /api/v1/data/error`
pub async fn dismiss_data_error(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.form.read().await.data().dismiss_error())
}
