// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `connector` binary and run
//! complete handshakes against a stub backend.

use std::time::Duration;

use serde_json::{json, Value};

use connector_specs::{ConnectorProcess, StubBackend, StubProvider};

const TIMEOUT: Duration = Duration::from_secs(10);

async fn start(stub: &StubBackend) -> anyhow::Result<ConnectorProcess> {
    let backend_url = stub.serve().await?;
    let connector = ConnectorProcess::start(&backend_url)?;
    connector.wait_healthy(TIMEOUT).await?;
    Ok(connector)
}

#[tokio::test]
async fn health_and_catalog() -> anyhow::Result<()> {
    let stub = StubBackend::new();
    let connector = start(&stub).await?;

    let health = connector.get("/api/v1/health").await?;
    assert_eq!(health["status"], "running");
    assert_eq!(health["provider"], Value::Null);

    let providers = connector.get("/api/v1/providers").await?;
    let segments: Vec<&str> = providers
        .as_array()
        .map(|a| a.iter().filter_map(|p| p["path_segment"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(segments, ["notion", "airtable", "hubspot"]);
    Ok(())
}

#[tokio::test]
async fn full_handshake_then_load() -> anyhow::Result<()> {
    let stub = StubBackend::new();
    stub.script("notion", StubProvider::connected("notion", json!({ "token": "abc" })));
    let connector = start(&stub).await?;

    connector.put("/api/v1/form/user", json!({ "user": "u" })).await?;
    connector.put("/api/v1/form/org", json!({ "org": "o" })).await?;
    connector.select(json!("Notion")).await?;

    let started = connector.post("/api/v1/connect").await?;
    assert_eq!(started["state"]["phase"], "connecting");
    assert_eq!(started["prompt"]["button_label"], "Connecting...");

    let form = connector.wait_phase("connected", TIMEOUT).await?;
    assert_eq!(form["selection"], json!({ "provider": "Notion", "credentials": { "token": "abc" } }));
    assert_eq!(form["control"]["prompt"]["button_label"], "✓ Connected to Notion");
    assert_eq!(stub.count("notion", "credentials"), 1);

    let authorize = stub
        .calls()
        .into_iter()
        .find(|c| c.action == "authorize")
        .ok_or_else(|| anyhow::anyhow!("authorize never called"))?;
    assert_eq!(authorize.form.get("user_id").map(String::as_str), Some("u"));
    assert_eq!(authorize.form.get("org_id").map(String::as_str), Some("o"));

    let data = connector.post("/api/v1/data/load").await?;
    assert_eq!(data["title"], "Data from Notion");
    let payload: Value = serde_json::from_str(data["payload"].as_str().unwrap_or_default())?;
    assert_eq!(payload["provider"], "notion");

    let load = stub
        .calls()
        .into_iter()
        .find(|c| c.action == "load")
        .ok_or_else(|| anyhow::anyhow!("load never called"))?;
    let sent: Value = serde_json::from_str(load.form.get("credentials").map_or("", String::as_str))?;
    assert_eq!(sent, json!({ "token": "abc" }));

    for _ in 0..2 {
        let cleared = connector.post("/api/v1/data/clear").await?;
        assert_eq!(cleared["payload"], Value::Null);
        assert!(cleared.get("error").is_none());
    }
    Ok(())
}

#[tokio::test]
async fn authorize_detail_is_shown() -> anyhow::Result<()> {
    let stub = StubBackend::new();
    stub.script(
        "airtable",
        StubProvider {
            authorize: Err((400, Some("org not found".to_owned()))),
            ..StubProvider::connected("airtable", json!({ "token": "t" }))
        },
    );
    let connector = start(&stub).await?;
    connector.select(json!("airtable")).await?;

    let failed = connector.post("/api/v1/connect").await?;
    assert_eq!(failed["state"]["phase"], "failed");
    assert_eq!(failed["state"]["error"], "org not found");
    assert_eq!(failed["prompt"]["button_enabled"], true);

    let dismissed = connector.delete("/api/v1/connect/error").await?;
    assert_eq!(dismissed["state"]["phase"], "failed");
    assert!(dismissed["state"].get("error").is_none());
    Ok(())
}

#[tokio::test]
async fn empty_credentials_fail_without_retry() -> anyhow::Result<()> {
    let stub = StubBackend::new();
    stub.script("hubspot", StubProvider::connected("hubspot", Value::Null));
    let connector = start(&stub).await?;
    connector.select(json!("HubSpot")).await?;

    connector.post("/api/v1/connect").await?;
    let form = connector.wait_phase("failed", TIMEOUT).await?;
    assert_eq!(form["control"]["state"]["error"], "Credentials are not available yet");
    assert_eq!(form["selection"], Value::Null);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(stub.count("hubspot", "credentials"), 1);
    Ok(())
}

#[tokio::test]
async fn switching_provider_keeps_selection() -> anyhow::Result<()> {
    let stub = StubBackend::new();
    stub.script("notion", StubProvider::connected("notion", json!({ "token": "a" })));
    stub.script("hubspot", StubProvider::connected("hubspot", json!({ "token": "c" })));
    let connector = start(&stub).await?;

    connector.select(json!("Notion")).await?;
    connector.post("/api/v1/connect").await?;
    connector.wait_phase("connected", TIMEOUT).await?;

    let switched = connector.select(json!("HubSpot")).await?;
    assert_eq!(switched["control"]["state"]["phase"], "idle");
    assert_eq!(switched["selection"]["provider"], "Notion");
    assert_eq!(switched["selection"]["credentials"], json!({ "token": "a" }));

    connector.post("/api/v1/connect").await?;
    let form = connector.wait_phase("connected", TIMEOUT).await?;
    assert_eq!(form["selection"], json!({ "provider": "HubSpot", "credentials": { "token": "c" } }));
    Ok(())
}

#[tokio::test]
async fn auth_token_guards_api() -> anyhow::Result<()> {
    let stub = StubBackend::new();
    let backend_url = stub.serve().await?;
    let connector = ConnectorProcess::build(&backend_url).auth_token("s3cret").spawn()?;
    connector.wait_healthy(TIMEOUT).await?;

    let unauthenticated = reqwest::get(format!("{}/api/v1/form", connector.base_url())).await?;
    assert_eq!(unauthenticated.status().as_u16(), 401);
    let body: Value = unauthenticated.json().await?;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let form = connector.get("/api/v1/form").await?;
    assert_eq!(form["user"], "TestUser");
    Ok(())
}

#[tokio::test]
async fn missing_browser_is_a_blocked_popup() -> anyhow::Result<()> {
    let stub = StubBackend::new();
    stub.script("notion", StubProvider::connected("notion", json!({ "token": "abc" })));
    let backend_url = stub.serve().await?;
    let connector =
        ConnectorProcess::build(&backend_url).popup_command("no-such-browser-xyz").spawn()?;
    connector.wait_healthy(TIMEOUT).await?;
    connector.select(json!("Notion")).await?;

    connector.post("/api/v1/connect").await?;
    let form = connector.wait_phase("failed", TIMEOUT).await?;
    assert_eq!(form["control"]["state"]["error"], "The authorization window was blocked");
    assert_eq!(stub.count("notion", "credentials"), 0);
    assert_eq!(form["selection"], Value::Null);
    Ok(())
}
