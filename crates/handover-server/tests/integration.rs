use axum::http::StatusCode;
use http_body_util::BodyExt;
use mockito::Matcher;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

use handover_core::config::Config;
use handover_core::TargetBot;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write a config pointing at `orchestrator_url` and build the router.
fn app(dir: &TempDir, orchestrator_url: &str) -> axum::Router {
    let mut config = Config::new("primary");
    config.orchestration.start_intents = vec!["insurance".into()];
    config.orchestration.stop_intents = vec!["stop".into()];
    config.orchestration.no_orchestration_intents = vec!["greetings".into()];
    config.orchestration.eligible_bots.insert(
        "web".into(),
        vec![TargetBot::new("insurance", "Insurance assistant")],
    );
    config.orchestrator.base_url = orchestrator_url.to_string();
    config.orchestrator.timeout_ms = 2000;
    config.save(dir.path()).unwrap();

    let state = handover_server::AppState::new(dir.path().to_path_buf()).unwrap();
    handover_server::build_router(state)
}

fn turn(intent: Option<&str>, text: &str) -> serde_json::Value {
    json!({
        "participant": "user-1",
        "connector": "web",
        "intent": intent,
        "action": { "type": "sentence", "text": text },
        "application_id": "app",
        "recipient_id": "primary",
    })
}

fn sentence(text: &str) -> serde_json::Value {
    json!({
        "payload": { "type": "sentence", "text": text },
        "metadata": { "orchestration_lock": false, "sent_at": "2026-01-01T00:00:00Z" },
    })
}

fn bot() -> serde_json::Value {
    json!({ "bot_id": "insurance", "label": "Insurance assistant" })
}

fn target_metadata() -> serde_json::Value {
    json!({
        "participant": "user-1",
        "connector": "web",
        "application_id": "app",
        "recipient_id": "primary",
    })
}

fn eligible() -> String {
    json!({
        "type": "eligible",
        "target_bot": bot(),
        "score": 0.9,
        "metadata": target_metadata(),
    })
    .to_string()
}

fn available(texts: &[&str]) -> String {
    let actions: Vec<_> = texts.iter().map(|t| sentence(t)).collect();
    json!({
        "type": "available",
        "target_bot": bot(),
        "actions": actions,
        "metadata": target_metadata(),
    })
    .to_string()
}

/// Mock a `proceed` answer for the user sentence `said`.
async fn mock_proceed(server: &mut mockito::ServerGuard, said: &str, body: String) -> mockito::Mock {
    server
        .mock("POST", "/orchestration/proceed")
        .match_body(Matcher::PartialJson(
            json!({ "action": { "payload": { "text": said } } }),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn mock_eligible(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/orchestration/eligibility")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(eligible())
        .create_async()
        .await
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn put_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, Some(body)).await
}

fn relayed_texts(result: &serde_json::Value) -> Vec<String> {
    result["messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["type"] == "relay")
        .map(|m| m["action"]["payload"]["text"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_turn_orchestration_then_stop() {
    let mut server = mockito::Server::new_async().await;
    let eligibility = mock_eligible(&mut server).await;
    mock_proceed(&mut server, "A1", available(&["R1"])).await;
    mock_proceed(&mut server, "A2", available(&["R2", "R3"])).await;

    let dir = TempDir::new().unwrap();
    let app = app(&dir, &server.url());

    let (status, first) = post_json(app.clone(), "/api/turns", turn(Some("insurance"), "A1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["flow"], "handled");
    assert_eq!(first["ended"], true);
    assert_eq!(first["messages"][0]["type"], "text");
    assert_eq!(relayed_texts(&first), vec!["R1"]);
    eligibility.assert_async().await;

    let (_, second) = post_json(app.clone(), "/api/turns", turn(Some("quote"), "A2")).await;
    assert_eq!(second["flow"], "handled");
    assert_eq!(relayed_texts(&second), vec!["R2", "R3"]);

    let (status, record) = get(app.clone(), "/api/orchestrations/user-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "active");
    let history: Vec<_> = record["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["payload"]["text"].as_str().unwrap())
        .collect();
    assert_eq!(history, vec!["R1", "R2", "R3"]);

    let (_, stop) = post_json(app.clone(), "/api/turns", turn(Some("stop"), "stop")).await;
    assert_eq!(stop["flow"], "handled");
    assert_eq!(stop["switched_story"], "comeback");

    let (status, _) = get(app.clone(), "/api/orchestrations/user-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = get(app, "/api/orchestrations/user-1/history").await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["status"], "closed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_turns_on_worker_runtime() {
    let mut server = mockito::Server::new_async().await;
    mock_eligible(&mut server).await;
    mock_proceed(&mut server, "A1", available(&["R1"])).await;

    let dir = TempDir::new().unwrap();
    let app = app(&dir, &server.url());

    let mut other = turn(Some("insurance"), "A1");
    other["participant"] = json!("user-2");
    let (a, b) = tokio::join!(
        post_json(app.clone(), "/api/turns", turn(Some("insurance"), "A1")),
        post_json(app.clone(), "/api/turns", other),
    );
    assert_eq!(a.1["flow"], "handled");
    assert_eq!(b.1["flow"], "handled");

    let (status, _) = get(app.clone(), "/api/orchestrations/user-1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(app, "/api/orchestrations/user-2").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn no_eligible_bot_lets_primary_story_run() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/orchestration/eligibility")
        .with_status(204)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let app = app(&dir, &server.url());

    let (status, result) = post_json(app.clone(), "/api/turns", turn(Some("insurance"), "A1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["flow"], "continue");
    assert!(result["messages"].as_array().unwrap().is_empty());

    let (status, _) = get(app, "/api/orchestrations/user-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unreachable_orchestrator_degrades_to_continue() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, "http://127.0.0.1:9");

    let (status, result) = post_json(app, "/api/turns", turn(Some("insurance"), "A1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["flow"], "continue");
}

#[tokio::test]
async fn resume_failure_apologizes_and_switches_to_comeback() {
    let mut server = mockito::Server::new_async().await;
    mock_eligible(&mut server).await;
    mock_proceed(&mut server, "A1", available(&["R1"])).await;
    server
        .mock("POST", "/orchestration/proceed")
        .match_body(Matcher::PartialJson(
            json!({ "action": { "payload": { "text": "A2" } } }),
        ))
        .with_status(503)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let app = app(&dir, &server.url());
    post_json(app.clone(), "/api/turns", turn(Some("insurance"), "A1")).await;

    let (_, result) = post_json(app.clone(), "/api/turns", turn(None, "A2")).await;
    assert_eq!(result["flow"], "handled");
    assert_eq!(result["switched_story"], "comeback");
    assert_eq!(
        result["messages"][0]["text"],
        "The conversation with Insurance assistant was interrupted."
    );

    let (status, _) = get(app, "/api/orchestrations/user-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_turn_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, "http://127.0.0.1:9");
    let (status, _) = post_json(app, "/api/turns", json!({ "participant": "user-1" })).await;
    assert!(status.is_client_error());
}

// ---------------------------------------------------------------------------
// Operator endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn end_closes_active_orchestration() {
    let mut server = mockito::Server::new_async().await;
    mock_eligible(&mut server).await;
    mock_proceed(&mut server, "A1", available(&["R1"])).await;

    let dir = TempDir::new().unwrap();
    let app = app(&dir, &server.url());
    post_json(app.clone(), "/api/turns", turn(Some("insurance"), "A1")).await;

    let (status, json) = post_json(app.clone(), "/api/orchestrations/user-1/end", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["closed"], 1);

    let (_, again) = post_json(app, "/api/orchestrations/user-1/end", json!({})).await;
    assert_eq!(again["closed"], 0);
}

#[tokio::test]
async fn handover_block_flag_skips_orchestration() {
    let mut server = mockito::Server::new_async().await;
    let eligibility = server
        .mock("POST", "/orchestration/eligibility")
        .expect(0)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let app = app(&dir, &server.url());

    let (status, json) = put_json(
        app.clone(),
        "/api/flags/user-1/block_handover_to_secondary_bot",
        json!({ "value": true, "ttl_minutes": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ttl_minutes"], 5);

    let (_, flag) = get(app.clone(), "/api/flags/user-1/block_handover_to_secondary_bot").await;
    assert_eq!(flag["value"], true);

    let (_, result) = post_json(app, "/api/turns", turn(Some("insurance"), "A1")).await;
    assert_eq!(result["flow"], "continue");
    eligibility.assert_async().await;
}

#[tokio::test]
async fn unknown_flag_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, "http://127.0.0.1:9");
    let (status, json) = get(app, "/api/flags/user-1/not_a_flag").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("not_a_flag"));
}

#[tokio::test]
async fn cleared_flag_reads_null() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, "http://127.0.0.1:9");
    let uri = "/api/flags/user-1/block_take_over_from_primary_bot";
    put_json(app.clone(), uri, json!({ "value": true })).await;

    let (status, _) = send(app.clone(), "DELETE", uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, flag) = get(app, uri).await;
    assert!(flag["value"].is_null());
}

#[tokio::test]
async fn stamp_reflects_held_floor() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, "http://127.0.0.1:9");
    let body = json!({ "actions": [sentence("fill the form"), sentence("step 2")] });

    let (_, unstamped) = post_json(app.clone(), "/api/secondary/user-1/stamp", body.clone()).await;
    assert_eq!(unstamped["actions"][0]["metadata"]["orchestration_lock"], false);

    let (status, _) = put_json(app.clone(), "/api/secondary/user-1/floor", json!({ "hold": true })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, stamped) = post_json(app, "/api/secondary/user-1/stamp", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stamped["actions"][0]["metadata"]["orchestration_lock"], true);
    assert_eq!(stamped["actions"][1]["metadata"]["orchestration_lock"], true);
}

#[tokio::test]
async fn get_config_returns_loaded_config() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir, "http://127.0.0.1:9");
    let (status, json) = get(app, "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config"]["bot"]["name"], "primary");
    assert_eq!(json["config"]["orchestration"]["start_intents"][0], "insurance");
}
