// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One provider's connect control and the handshake it drives.
//!
//! A handshake runs strictly in order: authorization URL, popup, closure,
//! one finalize attempt, transition. Only the transition to `Connected`
//! touches the shared selection, and it writes the selection before the
//! phase flips.

pub mod state;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{ErrorKind, FlowError};
use crate::exchange::{credentials_present, Backend, Finalize};
use crate::popup::closure::{Closure, ClosureDetector, ClosureSubscription};
use crate::popup::PopupLauncher;
use crate::provider::{ConnectProvider, Prompt, Provider};
use crate::selection::{IntegrationSelection, SelectionCell};

use self::state::{ConnectionState, ControlEvent, Phase};

/// Collaborators shared by every control a form mounts.
#[derive(Clone)]
pub struct ControlContext {
    pub backend: Arc<dyn Backend>,
    pub launcher: Arc<dyn PopupLauncher>,
    pub detector: ClosureDetector,
    pub selection: SelectionCell,
}

/// Handle to a mounted control. Clones refer to the same instance.
#[derive(Clone)]
pub struct ProviderControl {
    inner: Arc<ControlInner>,
}

struct ControlInner {
    connector: &'static dyn ConnectProvider,
    ctx: ControlContext,
    state: watch::Sender<ConnectionState>,
    unmounted: CancellationToken,
}

/// Rendered control: state plus the prompt drawn from it.
#[derive(Debug, Clone, Serialize)]
pub struct ControlView {
    pub state: ConnectionState,
    pub prompt: Prompt,
}

/// Owns a control's lifetime. Dropping it unmounts the control: the closure
/// watch stops and any later handshake result is discarded.
pub struct MountedControl {
    control: ProviderControl,
    _unmount: DropGuard,
}

impl MountedControl {
    pub fn control(&self) -> &ProviderControl {
        &self.control
    }

    pub fn provider(&self) -> Provider {
        self.control.provider()
    }
}

impl ProviderControl {
    /// Mount a fresh control in `Idle`, already reflecting the selection.
    pub fn mount(provider: Provider, ctx: ControlContext) -> MountedControl {
        let unmounted = CancellationToken::new();
        let (state, _) = watch::channel(ConnectionState::new(provider));
        let mut reader = ctx.selection.reader();
        let control = Self {
            inner: Arc::new(ControlInner {
                connector: provider.connector(),
                ctx,
                state,
                unmounted: unmounted.clone(),
            }),
        };

        control.observe_selection(reader.read_and_mark().as_ref());
        tokio::spawn({
            let control = control.clone();
            let unmounted = unmounted.clone();
            async move {
                loop {
                    tokio::select! {
                        _ = unmounted.cancelled() => break,
                        alive = reader.changed() => {
                            if !alive {
                                break;
                            }
                        }
                    }
                    control.observe_selection(reader.read_and_mark().as_ref());
                }
            }
        });

        tracing::debug!(%provider, "provider control mounted");
        MountedControl { control, _unmount: unmounted.drop_guard() }
    }

    pub fn provider(&self) -> Provider {
        self.inner.connector.provider()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    pub fn prompt(&self) -> Prompt {
        self.inner.connector.render_prompt(&self.state())
    }

    pub fn view(&self) -> ControlView {
        self.render(self.state())
    }

    pub fn render(&self, state: ConnectionState) -> ControlView {
        ControlView { prompt: self.inner.connector.render_prompt(&state), state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.unmounted.is_cancelled()
    }

    /// Start a handshake. Ignored unless the phase is `Idle` or `Failed`.
    ///
    /// Returns once the popup is open (or the attempt failed); the rest of
    /// the handshake completes in the background.
    pub async fn connect(&self, user: &str, org: &str) -> ConnectionState {
        let provider = self.provider();
        if !self.apply(ControlEvent::ConnectRequested) {
            tracing::debug!(%provider, phase = %self.state().phase, "connect ignored");
            return self.state();
        }
        tracing::info!(%provider, user, org, "starting authorization");

        let backend = self.inner.ctx.backend.as_ref();
        let url = match self.inner.connector.begin_authorization(backend, user, org).await {
            Ok(url) => url,
            Err(e) => {
                self.fail(e);
                return self.state();
            }
        };
        if !self.is_mounted() {
            tracing::debug!(%provider, "unmounted before popup launch");
            return self.state();
        }

        let title = self.inner.connector.popup_title();
        let Some(handle) = self.inner.ctx.launcher.launch(&url, &title) else {
            self.fail(ErrorKind::PopupBlocked.fallback());
            return self.state();
        };

        let subscription = self.inner.ctx.detector.watch(handle, &self.inner.unmounted);
        tokio::spawn({
            let control = self.clone();
            let (user, org) = (user.to_owned(), org.to_owned());
            async move { control.complete_handshake(subscription, user, org).await }
        });
        self.state()
    }

    async fn complete_handshake(
        self,
        subscription: ClosureSubscription,
        user: String,
        org: String,
    ) {
        let provider = self.provider();
        match subscription.closed().await {
            Closure::Closed => {}
            Closure::Cancelled => {
                tracing::debug!(%provider, "handshake abandoned");
                return;
            }
            Closure::Blocked => {
                self.fail(ErrorKind::PopupBlocked.fallback());
                return;
            }
        }

        let backend = self.inner.ctx.backend.as_ref();
        let result = self
            .inner
            .connector
            .try_finalize(backend, &user, &org)
            .await
            .and_then(Finalize::into_credentials);

        if !self.is_mounted() {
            tracing::debug!(%provider, "finalize result discarded after unmount");
            return;
        }
        match result {
            Ok(credentials) => {
                self.inner.ctx.selection.set_selection(provider, credentials);
                self.apply(ControlEvent::Finalized);
                tracing::info!(%provider, "provider connected");
            }
            Err(e) => self.fail(e),
        }
    }

    /// Clear the displayed error. The phase stays `Failed`.
    pub fn dismiss_error(&self) -> bool {
        self.apply(ControlEvent::ErrorDismissed)
    }

    /// Wait until the state satisfies `pred`.
    pub async fn wait_for(&self, pred: impl FnMut(&ConnectionState) -> bool) -> ConnectionState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(pred).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Wait until the phase is `Connected` or `Failed`.
    pub async fn wait_settled(&self) -> ConnectionState {
        self.wait_for(|s| matches!(s.phase, Phase::Connected | Phase::Failed)).await
    }

    fn observe_selection(&self, selection: Option<&IntegrationSelection>) {
        let Some(selection) = selection else { return };
        if selection.provider == self.provider() && credentials_present(&selection.credentials) {
            self.apply(ControlEvent::SelectionMatched);
        }
    }

    fn fail(&self, err: FlowError) {
        let provider = self.provider();
        tracing::warn!(%provider, kind = %err.kind, err = %err, "handshake failed");
        self.apply(ControlEvent::HandshakeFailed(err));
    }

    fn apply(&self, event: ControlEvent) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let mut from = None;
        let changed = self.inner.state.send_if_modified(|state| {
            let phase = state.phase;
            let changed = state.apply(&event);
            if changed {
                from = Some(phase);
            }
            changed
        });
        if let Some(from) = from {
            let to = self.inner.state.borrow().phase;
            tracing::debug!(provider = %self.provider(), %from, %to, "connection state changed");
        }
        changed
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
