// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state of one mounted provider control.

use std::fmt;

use serde::Serialize;

use crate::error::FlowError;
use crate::provider::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Connecting,
    Connected,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that drive the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    ConnectRequested,
    HandshakeFailed(FlowError),
    Finalized,
    /// The shared selection holds credentials for this control's provider.
    SelectionMatched,
    ErrorDismissed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub phase: Phase,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionState {
    pub fn new(provider: Provider) -> Self {
        Self { phase: Phase::Idle, provider, error: None }
    }

    /// Apply `event`. Returns whether anything changed.
    ///
    /// `Connected` is terminal; events that make no sense in the current
    /// phase are ignored.
    pub fn apply(&mut self, event: &ControlEvent) -> bool {
        match (self.phase, event) {
            (Phase::Idle | Phase::Failed, ControlEvent::ConnectRequested) => {
                self.phase = Phase::Connecting;
                self.error = None;
                true
            }
            (Phase::Connecting, ControlEvent::HandshakeFailed(err)) => {
                self.phase = Phase::Failed;
                self.error = Some(err.message.clone());
                true
            }
            (Phase::Connecting, ControlEvent::Finalized) => {
                self.phase = Phase::Connected;
                self.error = None;
                true
            }
            (Phase::Idle | Phase::Connecting | Phase::Failed, ControlEvent::SelectionMatched) => {
                self.phase = Phase::Connected;
                self.error = None;
                true
            }
            (Phase::Failed, ControlEvent::ErrorDismissed) => self.error.take().is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
