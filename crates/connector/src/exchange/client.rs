// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the backend authorization service.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::{ErrorKind, FlowError};
use crate::exchange::{Backend, BoxFuture, Credentials, Finalize};
use crate::provider::Provider;

/// Form-encoded client for `{base_url}/integrations/{provider}/...`.
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, provider: Provider, action: &str) -> String {
        format!("{}/integrations/{}/{action}", self.base_url, provider.path_segment())
    }

    /// POST a form and decode the body, normalizing every failure into `kind`.
    ///
    /// Empty bodies decode to `null`; non-JSON bodies decode to a string.
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        kind: ErrorKind,
    ) -> Result<Value, FlowError> {
        let resp = self.client.post(url).form(form).send().await.map_err(|e| {
            tracing::warn!(url, err = %e, "backend request failed");
            kind.fallback()
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            tracing::warn!(url, err = %e, "failed to read backend response");
            kind.fallback()
        })?;

        if !status.is_success() {
            let message =
                detail_message(&bytes).unwrap_or_else(|| kind.fallback_message().to_owned());
            tracing::debug!(url, %status, detail = %message, "backend returned an error");
            return Err(kind.with_message(message));
        }

        Ok(decode_body(&bytes))
    }
}

impl Backend for BackendClient {
    fn begin_authorization<'a>(
        &'a self,
        provider: Provider,
        user: &'a str,
        org: &'a str,
    ) -> BoxFuture<'a, Result<String, FlowError>> {
        Box::pin(async move {
            let kind = ErrorKind::AuthorizationRequestFailed;
            let url = self.url(provider, "authorize");
            let body = self.post_form(&url, &[("user_id", user), ("org_id", org)], kind).await?;
            match body {
                Value::String(auth_url) if !auth_url.trim().is_empty() => {
                    Ok(auth_url.trim().to_owned())
                }
                other => {
                    tracing::warn!(%provider, body = %other, "authorize response is not a URL");
                    Err(kind.fallback())
                }
            }
        })
    }

    fn try_finalize<'a>(
        &'a self,
        provider: Provider,
        user: &'a str,
        org: &'a str,
    ) -> BoxFuture<'a, Result<Finalize, FlowError>> {
        Box::pin(async move {
            let url = self.url(provider, "credentials");
            let body = self
                .post_form(
                    &url,
                    &[("user_id", user), ("org_id", org)],
                    ErrorKind::FinalizeRequestFailed,
                )
                .await?;
            Ok(Finalize::from_body(body))
        })
    }

    fn load<'a>(
        &'a self,
        provider: Provider,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<Value, FlowError>> {
        Box::pin(async move {
            let url = self.url(provider, "load");
            let serialized = credentials.to_string();
            let form = [("credentials", serialized.as_str())];
            self.post_form(&url, &form, ErrorKind::LoadRequestFailed).await
        })
    }
}

/// Extract the `detail` field of an error body, if any.
pub fn detail_message(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    match value.get("detail")? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
