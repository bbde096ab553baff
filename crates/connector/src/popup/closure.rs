// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling detector for popup closure.
//!
//! A popup gives no callback when the user finishes (or abandons) the
//! provider's consent screen, so each watch samples the handle on a fixed
//! interval and resolves once on the first sample that sees it closed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::popup::PopupHandle;

/// How a watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    Closed,
    /// The popup closed without ever opening.
    Blocked,
    Cancelled,
}

/// Spawns one sampling task per watched popup.
#[derive(Clone)]
pub struct ClosureDetector {
    interval: Duration,
    active: Arc<AtomicUsize>,
}

impl ClosureDetector {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of watches whose timer is still running.
    pub fn active_watches(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Start sampling `handle`. The watch stops when the popup closes, when
    /// `parent` is cancelled, or when the subscription is dropped. Cancelling
    /// asks the popup to close.
    pub fn watch(
        &self,
        mut handle: Box<dyn PopupHandle>,
        parent: &CancellationToken,
    ) -> ClosureSubscription {
        let cancel = parent.child_token();
        let (tx, rx) = oneshot::channel();
        let period = self.interval;
        let slot = ActiveSlot::acquire(&self.active);

        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            handle.close();
                            tracing::debug!("closure watch cancelled");
                            return;
                        }
                        _ = ticker.tick() => {}
                    }

                    if handle.is_closed() {
                        let outcome = match handle.failed_to_open() {
                            true => Closure::Blocked,
                            false => Closure::Closed,
                        };
                        tracing::debug!(?outcome, "popup closed");
                        drop(slot);
                        let _ = tx.send(outcome);
                        return;
                    }
                }
            }
        });

        ClosureSubscription { rx, cancel: cancel.clone(), _guard: cancel.drop_guard() }
    }
}

/// Resolves once with the outcome of one watch. Dropping it cancels the watch.
pub struct ClosureSubscription {
    rx: oneshot::Receiver<Closure>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl ClosureSubscription {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn closed(mut self) -> Closure {
        match (&mut self.rx).await {
            Ok(outcome) => outcome,
            Err(_) => Closure::Cancelled,
        }
    }
}

/// Holds one count in the detector's active-watch tally until dropped.
struct ActiveSlot(Arc<AtomicUsize>);

impl ActiveSlot {
    fn acquire(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
#[path = "closure_tests.rs"]
mod tests;
