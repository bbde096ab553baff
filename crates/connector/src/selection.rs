// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared integration selection.
//!
//! One cell per form. Every write replaces the whole value; nothing merges
//! and nothing but [`SelectionCell::set_selection`] mutates it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::exchange::Credentials;
use crate::provider::Provider;

/// Credentials tagged with the provider that issued them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationSelection {
    pub provider: Provider,
    pub credentials: Credentials,
}

/// Writable handle to the selection. Clones share the same cell.
#[derive(Clone)]
pub struct SelectionCell {
    tx: Arc<watch::Sender<Option<IntegrationSelection>>>,
    writes: Arc<AtomicU64>,
}

impl Default for SelectionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx), writes: Arc::new(AtomicU64::new(0)) }
    }

    /// Replace the selection. Last writer wins.
    pub fn set_selection(&self, provider: Provider, credentials: Credentials) {
        let previous = self.tx.send_replace(Some(IntegrationSelection { provider, credentials }));
        self.writes.fetch_add(1, Ordering::AcqRel);
        match previous {
            Some(prev) if prev.provider != provider => {
                tracing::info!(
                    %provider,
                    replaced = %prev.provider,
                    "integration selection replaced"
                );
            }
            _ => tracing::info!(%provider, "integration selection set"),
        }
    }

    pub fn read(&self) -> Option<IntegrationSelection> {
        self.tx.borrow().clone()
    }

    /// A read-only subscriber that sees the current value as unseen.
    pub fn reader(&self) -> SelectionReader {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        SelectionReader { rx }
    }

    /// Number of writes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }
}

/// Read-only view of a [`SelectionCell`] with change notification.
#[derive(Clone)]
pub struct SelectionReader {
    rx: watch::Receiver<Option<IntegrationSelection>>,
}

impl SelectionReader {
    pub fn read(&self) -> Option<IntegrationSelection> {
        self.rx.borrow().clone()
    }

    /// Whether a write happened since the last [`Self::read_and_mark`].
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Read the current value and mark it seen.
    pub fn read_and_mark(&mut self) -> Option<IntegrationSelection> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next write. Returns `false` once the cell is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
