// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `connector` binary against an in-process stub of the
//! backend authorization service and drives it over HTTP. Popups are plain
//! shell commands, so "the user closes the popup" is the command exiting.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Once};
use std::time::Duration;

use axum::extract::{Form, Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times — only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Resolve the path to the compiled `connector` binary.
pub fn connector_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("connector")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

// -- Stub backend -------------------------------------------------------------

/// Scripted behavior for one provider path segment.
#[derive(Clone)]
pub struct StubProvider {
    /// `Ok(url)` or `Err((status, detail))`.
    pub authorize: Result<String, (u16, Option<String>)>,
    /// Finalize body; `Value::Null` means "not yet available".
    pub credentials: Value,
    pub payload: Value,
}

impl StubProvider {
    pub fn connected(segment: &str, credentials: Value) -> Self {
        Self {
            authorize: Ok(format!("https://{segment}.example/oauth?client_id=stub")),
            credentials,
            payload: json!({ "provider": segment, "items": [{ "id": 1, "name": "Item" }] }),
        }
    }
}

/// A recorded backend request.
#[derive(Debug, Clone, PartialEq)]
pub struct StubCall {
    pub segment: String,
    pub action: String,
    pub form: HashMap<String, String>,
}

#[derive(Default)]
struct StubState {
    providers: HashMap<String, StubProvider>,
    calls: Vec<StubCall>,
}

/// In-process stand-in for the backend authorization service.
#[derive(Clone, Default)]
pub struct StubBackend {
    state: Arc<Mutex<StubState>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, segment: &str, provider: StubProvider) {
        self.state.lock().providers.insert(segment.to_owned(), provider);
    }

    pub fn calls(&self) -> Vec<StubCall> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, segment: &str, action: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| c.segment == segment && c.action == action).count()
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn serve(&self) -> anyhow::Result<String> {
        let router = Router::new()
            .route("/integrations/{segment}/{action}", post(stub_handler))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(format!("http://{addr}"))
    }
}

async fn stub_handler(
    State(stub): State<StubBackend>,
    UrlPath((segment, action)): UrlPath<(String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let scripted = {
        let mut state = stub.state.lock();
        state.calls.push(StubCall { segment: segment.clone(), action: action.clone(), form });
        state.providers.get(&segment).cloned()
    };
    let Some(provider) = scripted else {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "unknown integration" })))
            .into_response();
    };

    match action.as_str() {
        "authorize" => match provider.authorize {
            Ok(url) => Json(url).into_response(),
            Err((status, detail)) => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
                match detail {
                    Some(detail) => (status, Json(json!({ "detail": detail }))).into_response(),
                    None => status.into_response(),
                }
            }
        },
        "credentials" => Json(provider.credentials).into_response(),
        "load" => Json(provider.payload).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

// -- Connector process --------------------------------------------------------

/// A running `connector` process that is killed on drop.
pub struct ConnectorProcess {
    child: Child,
    port: u16,
    auth_token: Option<String>,
}

/// Builder for the connector command line.
pub struct ConnectorBuilder {
    backend_url: String,
    popup_command: String,
    auth_token: Option<String>,
}

impl ConnectorBuilder {
    /// Popup command run for each handshake (default: stays open 300ms).
    pub fn popup_command(mut self, cmd: &str) -> Self {
        self.popup_command = cmd.to_owned();
        self
    }

    pub fn auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_owned());
        self
    }

    pub fn spawn(self) -> anyhow::Result<ConnectorProcess> {
        ensure_crypto();
        let binary = connector_binary();
        anyhow::ensure!(binary.exists(), "connector binary not found at {}", binary.display());

        let port = free_port()?;
        let mut args: Vec<String> = vec![
            "--host".into(),
            "127.0.0.1".into(),
            "--port".into(),
            port.to_string(),
            "--backend-url".into(),
            self.backend_url,
            "--popup-command".into(),
            self.popup_command,
            "--poll-ms".into(),
            "50".into(),
            "--log-format".into(),
            "text".into(),
            "--log-level".into(),
            "warn".into(),
        ];
        if let Some(ref token) = self.auth_token {
            args.extend(["--auth-token".into(), token.clone()]);
        }

        let child = Command::new(&binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(ConnectorProcess { child, port, auth_token: self.auth_token })
    }
}

impl ConnectorProcess {
    pub fn build(backend_url: &str) -> ConnectorBuilder {
        ConnectorBuilder {
            backend_url: backend_url.to_owned(),
            popup_command: "sleep 0.3".to_owned(),
            auth_token: None,
        }
    }

    /// Spawn with defaults against `backend_url`.
    pub fn start(backend_url: &str) -> anyhow::Result<Self> {
        Self::build(backend_url).spawn()
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = reqwest::Client::new().request(method, format!("{}{path}", self.base_url()));
        match self.auth_token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        Ok(self.request(reqwest::Method::GET, path).send().await?.json().await?)
    }

    pub async fn post(&self, path: &str) -> anyhow::Result<Value> {
        Ok(self.request(reqwest::Method::POST, path).send().await?.json().await?)
    }

    pub async fn put(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        Ok(self.request(reqwest::Method::PUT, path).json(&body).send().await?.json().await?)
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        Ok(self.request(reqwest::Method::DELETE, path).send().await?.json().await?)
    }

    pub async fn select(&self, provider: Value) -> anyhow::Result<Value> {
        self.put("/api/v1/form/provider", json!({ "provider": provider })).await
    }

    /// Poll the form until the mounted control reaches `phase`.
    pub async fn wait_phase(&self, phase: &str, timeout: Duration) -> anyhow::Result<Value> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let form = self.get("/api/v1/form").await?;
            if form["control"]["state"]["phase"] == phase {
                return Ok(form);
            }
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("control never reached {phase}: {form}");
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Poll health until responsive.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/api/v1/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("connector did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for ConnectorProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
