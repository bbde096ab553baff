// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The integration form: user and org fields, the provider selector, the
//! mounted provider control, and the data view.

use std::sync::Arc;

use serde::Serialize;

use crate::control::{ControlContext, ControlView, MountedControl, ProviderControl};
use crate::data_view::{DataView, DataViewState};
use crate::provider::{catalog, Provider, ProviderInfo};
use crate::selection::IntegrationSelection;

pub struct IntegrationForm {
    user: String,
    org: String,
    mounted: Option<MountedControl>,
    data: DataView,
    ctx: ControlContext,
}

impl IntegrationForm {
    pub fn new(ctx: ControlContext, user: impl Into<String>, org: impl Into<String>) -> Self {
        let data = DataView::new(Arc::clone(&ctx.backend), ctx.selection.reader());
        Self { user: user.into(), org: org.into(), mounted: None, data, ctx }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    pub fn set_org(&mut self, org: impl Into<String>) {
        self.org = org.into();
    }

    pub fn provider(&self) -> Option<Provider> {
        self.mounted.as_ref().map(MountedControl::provider)
    }

    /// Switch the mounted control. Re-selecting the current provider is a
    /// no-op; anything else unmounts the current control first. Returns
    /// whether the mounted control changed.
    pub fn select_provider(&mut self, provider: Option<Provider>) -> bool {
        if self.provider() == provider {
            return false;
        }
        if let Some(previous) = self.mounted.take() {
            tracing::debug!(provider = %previous.provider(), "unmounting provider control");
        }
        self.mounted = provider.map(|p| ProviderControl::mount(p, self.ctx.clone()));
        true
    }

    /// Unmount the current control, if any.
    pub fn unmount(&mut self) {
        self.select_provider(None);
    }

    pub fn control(&self) -> Option<&ProviderControl> {
        self.mounted.as_ref().map(MountedControl::control)
    }

    /// Capture what a connect needs so it can run without borrowing the form.
    pub fn connect_request(&self) -> Option<ConnectRequest> {
        self.control().map(|control| ConnectRequest {
            control: control.clone(),
            user: self.user.clone(),
            org: self.org.clone(),
        })
    }

    pub fn selection(&self) -> Option<IntegrationSelection> {
        self.ctx.selection.read()
    }

    pub fn data(&self) -> &DataView {
        &self.data
    }

    pub fn view(&self) -> FormView {
        let selection = self.selection();
        let data = selection.is_some().then(|| self.data.view());
        FormView {
            title: "Integration Connector",
            user: self.user.clone(),
            org: self.org.clone(),
            providers: catalog(),
            provider: self.provider(),
            control: self.control().map(ProviderControl::view),
            selection,
            data,
        }
    }
}

/// A connect call detached from the form.
pub struct ConnectRequest {
    control: ProviderControl,
    user: String,
    org: String,
}

impl ConnectRequest {
    pub fn control(&self) -> &ProviderControl {
        &self.control
    }

    pub async fn run(self) -> ControlView {
        let state = self.control.connect(&self.user, &self.org).await;
        self.control.render(state)
    }
}

/// Rendered form.
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub title: &'static str,
    pub user: String,
    pub org: String,
    pub providers: Vec<ProviderInfo>,
    pub provider: Option<Provider>,
    pub control: Option<ControlView>,
    pub selection: Option<IntegrationSelection>,
    pub data: Option<DataViewState>,
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
