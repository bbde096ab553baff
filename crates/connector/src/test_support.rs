// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: fake popups, a scripted backend, and
//! assertion helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::control::ControlContext;
use crate::error::FlowError;
use crate::exchange::{Backend, BoxFuture, Credentials, Finalize};
use crate::popup::closure::ClosureDetector;
use crate::popup::{PopupHandle, PopupLauncher};
use crate::provider::Provider;
use crate::selection::SelectionCell;

/// Sampling interval used by [`ContextBuilder`] unless overridden.
pub const TEST_POLL: Duration = Duration::from_millis(200);

/// A popup the test closes by hand.
#[derive(Clone, Default)]
pub struct FakeWindow {
    inner: Arc<FakeWindowInner>,
}

#[derive(Default)]
struct FakeWindowInner {
    closed: AtomicBool,
    failed: AtomicBool,
    samples: AtomicUsize,
    close_requests: AtomicUsize,
}

impl FakeWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user finishing (or abandoning) the consent screen.
    pub fn close_by_user(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    /// Simulate a browser that exits before showing anything.
    pub fn fail_to_open(&self) {
        self.inner.failed.store(true, Ordering::Release);
        self.inner.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of times a detector sampled this window.
    pub fn samples(&self) -> usize {
        self.inner.samples.load(Ordering::Acquire)
    }

    /// Number of times something asked the window to close.
    pub fn close_requests(&self) -> usize {
        self.inner.close_requests.load(Ordering::Acquire)
    }

    pub fn handle(&self) -> Box<dyn PopupHandle> {
        Box::new(FakeHandle(self.clone()))
    }
}

struct FakeHandle(FakeWindow);

impl PopupHandle for FakeHandle {
    fn is_closed(&mut self) -> bool {
        self.0.inner.samples.fetch_add(1, Ordering::AcqRel);
        self.0.is_closed()
    }

    fn failed_to_open(&self) -> bool {
        self.0.inner.failed.load(Ordering::Acquire)
    }

    fn close(&mut self) {
        self.0.inner.close_requests.fetch_add(1, Ordering::AcqRel);
        self.0.inner.closed.store(true, Ordering::Release);
    }
}

/// One recorded popup launch.
#[derive(Clone)]
pub struct Launch {
    pub url: String,
    pub title: String,
    pub window: FakeWindow,
}

/// Launcher that hands out [`FakeWindow`]s, or nothing when blocked.
#[derive(Default)]
pub struct FakeLauncher {
    blocked: AtomicBool,
    launches: Mutex<Vec<Launch>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocked() -> Self {
        let launcher = Self::default();
        launcher.set_blocked(true);
        launcher
    }

    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::Release);
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().len()
    }

    pub fn last_launch(&self) -> Option<Launch> {
        self.launches.lock().last().cloned()
    }

    pub fn last_window(&self) -> Option<FakeWindow> {
        self.last_launch().map(|l| l.window)
    }
}

impl PopupLauncher for FakeLauncher {
    fn launch(&self, url: &str, title: &str) -> Option<Box<dyn PopupHandle>> {
        if self.blocked.load(Ordering::Acquire) {
            return None;
        }
        let window = FakeWindow::new();
        let handle = window.handle();
        self.launches.lock().push(Launch { url: url.to_owned(), title: title.to_owned(), window });
        Some(handle)
    }
}

/// A backend call as observed by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Authorize { provider: Provider, user: String, org: String },
    Finalize { provider: Provider, user: String, org: String },
    Load { provider: Provider, credentials: Credentials },
}

/// Backend with per-provider scripted responses.
///
/// Unscripted providers succeed: authorize returns
/// `https://auth.example/{segment}`, finalize returns
/// `{"access_token": "{segment}-token"}` and load echoes the provider.
#[derive(Default)]
pub struct FakeBackend {
    authorize: Mutex<HashMap<Provider, Result<String, FlowError>>>,
    finalize: Mutex<HashMap<Provider, Result<Finalize, FlowError>>>,
    load: Mutex<HashMap<Provider, Result<Value, FlowError>>>,
    calls: Mutex<Vec<BackendCall>>,
    finalize_gate: Mutex<Option<Arc<Notify>>>,
    load_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_credentials(provider: Provider) -> Credentials {
        json!({ "access_token": format!("{}-token", provider.path_segment()) })
    }

    pub fn script_authorize(&self, provider: Provider, result: Result<String, FlowError>) {
        self.authorize.lock().insert(provider, result);
    }

    pub fn script_finalize(&self, provider: Provider, result: Result<Finalize, FlowError>) {
        self.finalize.lock().insert(provider, result);
    }

    pub fn script_load(&self, provider: Provider, result: Result<Value, FlowError>) {
        self.load.lock().insert(provider, result);
    }

    /// Make every following finalize wait until the returned gate is notified.
    pub fn hold_finalize(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.finalize_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Make every following load wait until the returned gate is notified.
    pub fn hold_load(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.load_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    pub fn finalize_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| matches!(c, BackendCall::Finalize { .. })).count()
    }

    pub fn load_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| matches!(c, BackendCall::Load { .. })).count()
    }
}

impl Backend for FakeBackend {
    fn begin_authorization<'a>(
        &'a self,
        provider: Provider,
        user: &'a str,
        org: &'a str,
    ) -> BoxFuture<'a, Result<String, FlowError>> {
        Box::pin(async move {
            self.calls.lock().push(BackendCall::Authorize {
                provider,
                user: user.to_owned(),
                org: org.to_owned(),
            });
            let scripted = self.authorize.lock().get(&provider).cloned();
            scripted.unwrap_or_else(|| Ok(format!("https://auth.example/{}", provider.path_segment())))
        })
    }

    fn try_finalize<'a>(
        &'a self,
        provider: Provider,
        user: &'a str,
        org: &'a str,
    ) -> BoxFuture<'a, Result<Finalize, FlowError>> {
        Box::pin(async move {
            self.calls.lock().push(BackendCall::Finalize {
                provider,
                user: user.to_owned(),
                org: org.to_owned(),
            });
            let gate = self.finalize_gate.lock().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let scripted = self.finalize.lock().get(&provider).cloned();
            scripted.unwrap_or_else(|| Ok(Finalize::Ready(Self::default_credentials(provider))))
        })
    }

    fn load<'a>(
        &'a self,
        provider: Provider,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<Value, FlowError>> {
        Box::pin(async move {
            self.calls.lock().push(BackendCall::Load { provider, credentials: credentials.clone() });
            let gate = self.load_gate.lock().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let scripted = self.load.lock().get(&provider).cloned();
            scripted.unwrap_or_else(|| {
                Ok(json!({ "provider": provider.path_segment(), "items": [] }))
            })
        })
    }
}

/// Fakes wired into a [`ControlContext`], with handles kept for assertions.
pub struct TestContext {
    pub ctx: ControlContext,
    pub backend: Arc<FakeBackend>,
    pub launcher: Arc<FakeLauncher>,
}

/// Builder for a [`TestContext`] with sensible defaults.
pub struct ContextBuilder {
    backend: Arc<FakeBackend>,
    launcher: Arc<FakeLauncher>,
    poll: Duration,
    selection: Option<SelectionCell>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            backend: Arc::new(FakeBackend::new()),
            launcher: Arc::new(FakeLauncher::new()),
            poll: TEST_POLL,
            selection: None,
        }
    }

    pub fn backend(mut self, backend: FakeBackend) -> Self {
        self.backend = Arc::new(backend);
        self
    }

    pub fn launcher(mut self, launcher: FakeLauncher) -> Self {
        self.launcher = Arc::new(launcher);
        self
    }

    pub fn poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub fn selection(mut self, selection: SelectionCell) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn build(self) -> TestContext {
        let ctx = ControlContext {
            backend: Arc::clone(&self.backend) as Arc<dyn Backend>,
            launcher: Arc::clone(&self.launcher) as Arc<dyn PopupLauncher>,
            detector: ClosureDetector::new(self.poll),
            selection: self.selection.unwrap_or_default(),
        };
        TestContext { ctx, backend: self.backend, launcher: self.launcher }
    }
}

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider reqwest needs. Only the first call has
/// effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve_router(router: axum::Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

/// Let spawned tasks run until they block, without advancing a paused clock
/// past any pending timer.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
