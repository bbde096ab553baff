// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads provider data for the current integration selection.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::ErrorKind;
use crate::exchange::Backend;
use crate::provider::Provider;
use crate::selection::{IntegrationSelection, SelectionReader};

/// Rendered data view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataViewState {
    pub provider: Option<Provider>,
    pub title: Option<String>,
    /// Pretty-printed payload of the last successful load.
    pub payload: Option<String>,
    pub loading: bool,
    pub load_label: &'static str,
    pub can_clear: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Default)]
struct Slot {
    seen: Option<IntegrationSelection>,
    payload: Option<String>,
    loading: bool,
    error: Option<String>,
    /// Bumped on every reset; a load whose generation is stale is discarded.
    generation: u64,
}

impl Slot {
    /// Drop everything derived from a selection that is no longer current.
    fn sync(&mut self, current: Option<IntegrationSelection>) {
        if self.seen != current {
            if self.payload.is_some() || self.loading {
                tracing::debug!("selection changed, dropping loaded data");
            }
            self.seen = current;
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.payload = None;
        self.error = None;
        self.loading = false;
        self.generation += 1;
    }

    fn snapshot(&self) -> DataViewState {
        let provider = self.seen.as_ref().map(|s| s.provider);
        DataViewState {
            provider,
            title: provider.map(|p| format!("Data from {p}")),
            payload: self.payload.clone(),
            loading: self.loading,
            load_label: if self.loading { "Loading..." } else { "Load Data" },
            can_clear: !self.loading && self.payload.is_some(),
            error: self.error.clone(),
        }
    }
}

/// Data panel bound to one selection cell. Clones share state.
#[derive(Clone)]
pub struct DataView {
    inner: Arc<DataViewInner>,
}

struct DataViewInner {
    backend: Arc<dyn Backend>,
    selection: SelectionReader,
    slot: Mutex<Slot>,
}

impl DataView {
    pub fn new(backend: Arc<dyn Backend>, selection: SelectionReader) -> Self {
        let slot = Mutex::new(Slot::default());
        Self { inner: Arc::new(DataViewInner { backend, selection, slot }) }
    }

    pub fn view(&self) -> DataViewState {
        let mut slot = self.inner.slot.lock();
        slot.sync(self.inner.selection.read());
        slot.snapshot()
    }

    /// Load the payload for the current selection.
    ///
    /// Ignored while a load is in flight. A result that arrives after the
    /// selection changed or the view was cleared is discarded.
    pub async fn load(&self) -> DataViewState {
        let (selection, generation) = {
            let mut slot = self.inner.slot.lock();
            slot.sync(self.inner.selection.read());
            if slot.loading {
                tracing::debug!("load ignored, already loading");
                return slot.snapshot();
            }
            let Some(selection) = slot.seen.clone() else {
                slot.error = Some("No integration connected".to_owned());
                return slot.snapshot();
            };
            slot.loading = true;
            slot.error = None;
            (selection, slot.generation)
        };

        let provider = selection.provider;
        tracing::debug!(%provider, "loading integration data");
        let result = self.inner.backend.load(provider, &selection.credentials).await;

        let mut slot = self.inner.slot.lock();
        slot.sync(self.inner.selection.read());
        if slot.generation != generation {
            tracing::debug!(%provider, "stale load result discarded");
            return slot.snapshot();
        }
        slot.loading = false;
        match result.and_then(|value| {
            serde_json::to_string_pretty(&value)
                .map_err(|e| ErrorKind::LoadRequestFailed.with_message(e.to_string()))
        }) {
            Ok(text) => {
                tracing::info!(%provider, bytes = text.len(), "integration data loaded");
                slot.payload = Some(text);
            }
            Err(e) => {
                tracing::warn!(%provider, err = %e, "integration data load failed");
                slot.error = Some(e.message);
            }
        }
        slot.snapshot()
    }

    /// Empty the payload and error. Idempotent.
    pub fn clear(&self) -> DataViewState {
        let mut slot = self.inner.slot.lock();
        slot.sync(self.inner.selection.read());
        slot.reset();
        slot.snapshot()
    }

    pub fn dismiss_error(&self) -> DataViewState {
        let mut slot = self.inner.slot.lock();
        slot.sync(self.inner.selection.read());
        slot.error = None;
        slot.snapshot()
    }
}

#[cfg(test)]
#[path = "data_view_tests.rs"]
mod tests;
