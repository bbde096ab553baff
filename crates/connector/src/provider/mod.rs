// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supported providers and the connect capability each one implements.
//!
//! Provider identity is routing information only: it selects the backend
//! path segment and the copy shown next to the connect button. The handshake
//! itself is provider-agnostic and never matches on a variant.

pub mod airtable;
pub mod hubspot;
pub mod notion;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::control::state::{ConnectionState, Phase};
use crate::error::FlowError;
use crate::exchange::{Backend, BoxFuture, Finalize};

/// Third-party services a user can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Notion,
    Airtable,
    HubSpot,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Self::Notion, Self::Airtable, Self::HubSpot];

    /// Backend path segment under `/integrations/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Notion => "notion",
            Self::Airtable => "airtable",
            Self::HubSpot => "hubspot",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Notion => "Notion",
            Self::Airtable => "Airtable",
            Self::HubSpot => "HubSpot",
        }
    }

    /// Resolve the connect capability for this provider.
    pub fn connector(&self) -> &'static dyn ConnectProvider {
        match self {
            Self::Notion => &notion::Notion,
            Self::Airtable => &airtable::Airtable,
            Self::HubSpot => &hubspot::HubSpot,
        }
    }

    /// Accepts either the display name or the path segment, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|p| {
            p.display_name().eq_ignore_ascii_case(value) || p.path_segment().eq_ignore_ascii_case(value)
        })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("unknown provider: {s}"))
    }
}

/// Rendered connect control for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub title: String,
    pub description: String,
    pub button_label: String,
    pub button_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Capability every provider implements to take part in a handshake.
///
/// The backend calls default to routing by [`ConnectProvider::provider`];
/// implementations normally only supply their copy.
pub trait ConnectProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Sentence shown above the connect button.
    fn description(&self) -> &'static str;

    /// What the provider calls a linked account ("workspace", "account").
    fn account_noun(&self) -> &'static str;

    fn popup_title(&self) -> String {
        format!("{} Authorization", self.provider().display_name())
    }

    fn begin_authorization<'a>(
        &self,
        backend: &'a dyn Backend,
        user: &'a str,
        org: &'a str,
    ) -> BoxFuture<'a, Result<String, FlowError>> {
        backend.begin_authorization(self.provider(), user, org)
    }

    fn try_finalize<'a>(
        &self,
        backend: &'a dyn Backend,
        user: &'a str,
        org: &'a str,
    ) -> BoxFuture<'a, Result<Finalize, FlowError>> {
        backend.try_finalize(self.provider(), user, org)
    }

    fn render_prompt(&self, state: &ConnectionState) -> Prompt {
        let name = self.provider().display_name();
        let (button_label, button_enabled) = match state.phase {
            Phase::Idle | Phase::Failed => (format!("Connect to {name}"), true),
            Phase::Connecting => ("Connecting...".to_owned(), false),
            Phase::Connected => (format!("✓ Connected to {name}"), false),
        };
        let note = (state.phase == Phase::Connected)
            .then(|| format!("Your {name} {} is successfully connected", self.account_noun()));
        Prompt {
            title: format!("Connect to {name}"),
            description: self.description().to_owned(),
            button_label,
            button_enabled,
            note,
            error: state.error.clone(),
        }
    }
}

/// Catalog entry returned by `GET /api/v1/providers`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub provider: Provider,
    pub path_segment: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
}

pub fn catalog() -> Vec<ProviderInfo> {
    Provider::ALL
        .into_iter()
        .map(|provider| ProviderInfo {
            provider,
            path_segment: provider.path_segment(),
            display_name: provider.display_name(),
            description: provider.connector().description(),
        })
        .collect()
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
