use super::*;
use handover_core::{SecondaryBotAction, SessionData, TargetBot, TargetMetadata};
use mockito::Matcher;

fn bot() -> TargetBot {
    TargetBot::new("insurance", "Insurance assistant")
}

fn metadata() -> TargetMetadata {
    TargetMetadata {
        participant: "user-1".into(),
        connector: "web".into(),
        application_id: "app".into(),
        recipient_id: "primary".into(),
    }
}

fn eligibility_request() -> EligibilityRequest {
    EligibilityRequest {
        eligible_bots: vec![bot()],
        session: SessionData {
            participant: "user-1".into(),
            connector: "web".into(),
            intent: Some("insurance".into()),
        },
        action: SecondaryBotAction::sentence("quote please"),
        metadata: metadata(),
    }
}

fn resume_request() -> ResumeRequest {
    ResumeRequest {
        target_bot: bot(),
        action: SecondaryBotAction::sentence("my car"),
        metadata: metadata(),
    }
}

fn client(url: &str) -> HttpOrchestratorClient {
    HttpOrchestratorClient::new(url, Duration::from_secs(2), Some("secret")).unwrap()
}

#[tokio::test]
async fn eligibility_posts_json_with_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::to_string(&OrchestrationResponse::Eligible {
        target_bot: bot(),
        score: 0.8,
        metadata: metadata(),
    })
    .unwrap();
    let mock = server
        .mock("POST", "/orchestration/eligibility")
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "session": { "participant": "user-1", "intent": "insurance" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let response = client(&server.url())
        .ask_orchestration(eligibility_request())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(matches!(
        response,
        OrchestrationResponse::Eligible { ref target_bot, .. } if target_bot.bot_id == "insurance"
    ));
}

#[tokio::test]
async fn no_content_means_no_eligible_bot() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/orchestration/eligibility")
        .with_status(204)
        .create_async()
        .await;

    let response = client(&server.url())
        .ask_orchestration(eligibility_request())
        .await
        .unwrap();
    assert_eq!(response, OrchestrationResponse::NoEligibleBot);
}

#[tokio::test]
async fn proceed_returns_secondary_actions() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::to_string(&OrchestrationResponse::Available {
        target_bot: bot(),
        actions: vec![
            SecondaryBotAction::sentence("R2"),
            SecondaryBotAction::sentence("R3"),
        ],
        metadata: metadata(),
    })
    .unwrap();
    server
        .mock("POST", "/orchestration/proceed")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let response = client(&server.url())
        .resume_orchestration(resume_request())
        .await
        .unwrap();
    match response {
        OrchestrationResponse::Available { actions, .. } => {
            let texts: Vec<_> = actions.iter().filter_map(|a| a.text()).collect();
            assert_eq!(texts, vec!["R2", "R3"]);
        }
        other => panic!("expected available, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_proceed_is_unavailable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/orchestration/proceed")
        .with_status(204)
        .create_async()
        .await;

    let response = client(&server.url())
        .resume_orchestration(resume_request())
        .await
        .unwrap();
    assert_eq!(response.kind(), "unavailable");
}

#[tokio::test]
async fn error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/orchestration/proceed")
        .with_status(503)
        .with_body("bot down")
        .create_async()
        .await;

    let err = client(&server.url())
        .resume_orchestration(resume_request())
        .await
        .unwrap_err();
    match err {
        OrchestratorError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "bot down");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/orchestration/eligibility")
        .with_status(200)
        .with_body("{\"type\":\"something_else\"}")
        .create_async()
        .await;

    let err = client(&server.url())
        .ask_orchestration(eligibility_request())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Decode(_)));
}

#[tokio::test]
async fn unreachable_orchestrator_is_a_transport_error() {
    // Nothing listens on port 9 locally.
    let err = client("http://127.0.0.1:9")
        .ask_orchestration(eligibility_request())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Transport(_) | OrchestratorError::Timeout(_)
    ));
}

#[test]
fn rejects_base_url_without_scheme() {
    let err = HttpOrchestratorClient::new("localhost:8089", Duration::from_secs(1), None)
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidUrl(_)));
}

#[test]
fn from_config_trims_trailing_slash() {
    let config = OrchestratorConfig {
        base_url: "http://orchestrator.local/".to_string(),
        timeout_ms: 1500,
        api_token: None,
    };
    let client = HttpOrchestratorClient::from_config(&config).unwrap();
    assert_eq!(client.base_url(), "http://orchestrator.local");
}
