// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential exchange with the backend authorization service.
//!
//! Every call is a single request/response. Nothing here retries: a
//! finalize that finds no credentials yet is reported to the caller as
//! [`Finalize::NotYetAvailable`] and the caller decides what that means.

pub mod client;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::{ErrorKind, FlowError};
use crate::provider::Provider;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Provider-issued credential bundle. Opaque to the connector.
pub type Credentials = Value;

/// Outcome of one finalize attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Finalize {
    Ready(Credentials),
    NotYetAvailable,
}

impl Finalize {
    /// Classify a finalize response body.
    pub fn from_body(body: Value) -> Self {
        if credentials_present(&body) {
            Self::Ready(body)
        } else {
            Self::NotYetAvailable
        }
    }

    /// Credentials, or a [`ErrorKind::FinalizeNotYetAvailable`] failure.
    pub fn into_credentials(self) -> Result<Credentials, FlowError> {
        match self {
            Self::Ready(credentials) => Ok(credentials),
            Self::NotYetAvailable => Err(ErrorKind::FinalizeNotYetAvailable.fallback()),
        }
    }
}

/// Whether a value counts as issued credentials. `null`, `false`, `0`, blank
/// strings and empty objects do not.
///
/// Stricter than JSON truthiness on purpose: `{}` is truthy, but a backend
/// answering `{}` has issued nothing, so it reads as not yet available.
pub fn credentials_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(_) => true,
    }
}

/// The backend collaborator. Provider identity travels in the path, never
/// in the body.
pub trait Backend: Send + Sync {
    /// `POST /integrations/{provider}/authorize` → authorization URL.
    fn begin_authorization<'a>(
        &'a self,
        provider: Provider,
        user: &'a str,
        org: &'a str,
    ) -> BoxFuture<'a, Result<String, FlowError>>;

    /// `POST /integrations/{provider}/credentials` → credentials or nothing yet.
    fn try_finalize<'a>(
        &'a self,
        provider: Provider,
        user: &'a str,
        org: &'a str,
    ) -> BoxFuture<'a, Result<Finalize, FlowError>>;

    /// `POST /integrations/{provider}/load` → provider payload.
    fn load<'a>(
        &'a self,
        provider: Provider,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<Value, FlowError>>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
