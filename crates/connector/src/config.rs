// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

/// Opens the consent screen in a dedicated chromium app window. A fresh
/// profile directory keeps the process alive exactly as long as the window.
pub const DEFAULT_POPUP_COMMAND: &str = "chromium --app=\"$CONNECTOR_POPUP_URL\" \
    --window-size=\"$CONNECTOR_POPUP_WIDTH,$CONNECTOR_POPUP_HEIGHT\" \
    --user-data-dir=\"$(mktemp -d)\"";

/// Configuration for the integration connector.
#[derive(Debug, Clone, Parser)]
#[command(name = "connector", version, about = "Connect third-party accounts over OAuth.")]
pub struct ConnectorConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "CONNECTOR_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9810, env = "CONNECTOR_PORT")]
    pub port: u16,

    /// Bearer token for the local API. If unset, auth is disabled.
    #[arg(long, env = "CONNECTOR_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Base URL of the backend authorization service.
    #[arg(long, default_value = "http://localhost:8000", env = "CONNECTOR_BACKEND_URL")]
    pub backend_url: String,

    /// Initial user identifier.
    #[arg(long, default_value = "TestUser", env = "CONNECTOR_USER")]
    pub user: String,

    /// Initial organization identifier.
    #[arg(long, default_value = "TestOrg", env = "CONNECTOR_ORG")]
    pub org: String,

    /// Shell command that opens the popup (run via `sh -c`).
    #[arg(long, default_value = DEFAULT_POPUP_COMMAND, env = "CONNECTOR_POPUP_COMMAND")]
    pub popup_command: String,

    /// Popup width in pixels.
    #[arg(long, default_value_t = 600, env = "CONNECTOR_POPUP_WIDTH")]
    pub popup_width: u32,

    /// Popup height in pixels.
    #[arg(long, default_value_t = 600, env = "CONNECTOR_POPUP_HEIGHT")]
    pub popup_height: u32,

    /// Popup closure poll interval in milliseconds.
    #[arg(long, default_value_t = 200, env = "CONNECTOR_POLL_MS")]
    pub poll_ms: u64,

    /// Backend request timeout in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "CONNECTOR_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Log format (json or text).
    #[arg(long, default_value = "json", env = "CONNECTOR_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "CONNECTOR_LOG_LEVEL")]
    pub log_level: String,
}

impl ConnectorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_ms == 0 {
            anyhow::bail!("--poll-ms must be greater than zero");
        }
        if self.request_timeout_ms == 0 {
            anyhow::bail!("--request-timeout-ms must be greater than zero");
        }
        if self.popup_width == 0 || self.popup_height == 0 {
            anyhow::bail!("popup size must be non-zero");
        }
        if self.popup_command.trim().is_empty() {
            anyhow::bail!("--popup-command must not be empty");
        }
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("--backend-url must be an http(s) URL: {url}");
        }
        match self.log_format.as_str() {
            "json" | "text" => Ok(()),
            other => anyhow::bail!("invalid log format: {other}"),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Config for tests: no popup browser, fast polling.
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            auth_token: None,
            backend_url: "http://127.0.0.1:1".into(),
            user: "TestUser".into(),
            org: "TestOrg".into(),
            popup_command: "sleep 1".into(),
            popup_width: 600,
            popup_height: 600,
            poll_ms: 20,
            request_timeout_ms: 5_000,
            log_format: "text".into(),
            log_level: "debug".into(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
