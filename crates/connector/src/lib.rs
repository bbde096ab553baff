// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration connector: links third-party accounts through an OAuth popup
//! handshake and shares the resulting credentials with a data view.

pub mod config;
pub mod control;
pub mod data_view;
pub mod error;
pub mod exchange;
pub mod form;
pub mod popup;
pub mod provider;
pub mod selection;
pub mod state;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectorConfig;
use crate::state::AppState;
use crate::transport::build_router;

/// Run the connector server until ctrl-c.
pub async fn run(config: ConnectorConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let addr = config.addr();
    let state = Arc::new(AppState::from_config(config, shutdown.clone())?);

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
            }
            shutdown.cancel();
        }
    });

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        "connector listening on {addr} (backend {})",
        state.config.backend_url
    );
    serve(listener, state).await
}

/// Serve the API on `listener` until `state.shutdown` fires, then unmount
/// the active control so its popup is closed.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let router = build_router(Arc::clone(&state));
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;
    state.form.write().await.unmount();
    Ok(())
}
