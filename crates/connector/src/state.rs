// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectorConfig;
use crate::control::ControlContext;
use crate::exchange::client::BackendClient;
use crate::form::IntegrationForm;
use crate::popup::browser::BrowserLauncher;
use crate::popup::closure::ClosureDetector;
use crate::selection::SelectionCell;

/// Shared connector state.
pub struct AppState {
    pub config: ConnectorConfig,
    pub form: RwLock<IntegrationForm>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: ConnectorConfig, ctx: ControlContext, shutdown: CancellationToken) -> Self {
        let form = IntegrationForm::new(ctx, config.user.clone(), config.org.clone());
        Self { config, form: RwLock::new(form), shutdown }
    }

    /// Wire the production backend client and browser launcher.
    pub fn from_config(
        config: ConnectorConfig,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let backend = BackendClient::new(config.backend_url.clone(), config.request_timeout())?;
        let launcher = BrowserLauncher::new(
            config.popup_command.clone(),
            config.popup_width,
            config.popup_height,
        );
        let ctx = ControlContext {
            backend: Arc::new(backend),
            launcher: Arc::new(launcher),
            detector: ClosureDetector::new(config.poll_interval()),
            selection: SelectionCell::new(),
        };
        Ok(Self::new(config, ctx, shutdown))
    }
}
