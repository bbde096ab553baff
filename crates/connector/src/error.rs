// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure kinds raised by a connect handshake or a data load.
///
/// None of these are fatal: each is shown next to the control that raised
/// it and the user retries by invoking the action again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PopupBlocked,
    AuthorizationRequestFailed,
    FinalizeNotYetAvailable,
    FinalizeRequestFailed,
    LoadRequestFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PopupBlocked => "POPUP_BLOCKED",
            Self::AuthorizationRequestFailed => "AUTHORIZATION_REQUEST_FAILED",
            Self::FinalizeNotYetAvailable => "FINALIZE_NOT_YET_AVAILABLE",
            Self::FinalizeRequestFailed => "FINALIZE_REQUEST_FAILED",
            Self::LoadRequestFailed => "LOAD_REQUEST_FAILED",
        }
    }

    /// Message shown when the backend response carries no `detail`.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::PopupBlocked => "The authorization window was blocked",
            Self::AuthorizationRequestFailed => "Error starting authorization",
            Self::FinalizeNotYetAvailable => "Credentials are not available yet",
            Self::FinalizeRequestFailed => "Error fetching credentials",
            Self::LoadRequestFailed => "Error loading data",
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> FlowError {
        FlowError { kind: self, message: message.into() }
    }

    pub fn fallback(self) -> FlowError {
        self.with_message(self.fallback_message())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handshake or load failure normalized into one human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowError {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FlowError {}

/// Error codes for the local form API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    Unauthorized,
    BadRequest,
    NoProvider,
}

impl ApiError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::NoProvider => 409,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::NoProvider => "NO_PROVIDER",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
