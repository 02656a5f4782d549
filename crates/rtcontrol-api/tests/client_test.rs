// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP client tests for rtcontrol-api against a mock Control API.

use std::time::Duration;

use rtcontrol_api::{
    ApiConfig, ApiError, ControlApi, HttpControlApi, IftttTarget, QueuePayload, RequestMode,
    RulePayload, RuleStatus, RuleTarget, TransportKind,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpControlApi {
    let config = ApiConfig::new("test-token")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_request_timeout(Duration::from_secs(5));
    HttpControlApi::new(config).unwrap()
}

#[tokio::test]
async fn test_me_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"account": {"id": "acc1", "name": "Acme"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let me = client_for(&server).me().await.unwrap();
    assert_eq!(me.account.id, "acc1");
}

#[tokio::test]
async fn test_get_rule_decodes_target() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/app1/rules/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "r1",
            "appId": "app1",
            "status": "enabled",
            "requestMode": "single",
            "source": {"channelFilter": "", "type": "channel.message"},
            "ruleType": "http/ifttt",
            "target": {"webhookKey": "wk", "eventName": "ev"}
        })))
        .mount(&server)
        .await;

    let rule = client_for(&server).get_rule("app1", "r1").await.unwrap();
    assert_eq!(rule.id, "r1");
    assert!(matches!(rule.typed_target().unwrap(), RuleTarget::Ifttt(_)));
}

#[tokio::test]
async fn test_not_found_maps_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/app1/rules/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Rule not found",
            "code": 40400,
            "statusCode": 404,
            "href": "https://help.example.com/error/40400"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_rule("app1", "missing")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        ApiError::Status {
            status,
            code,
            message,
            href,
        } => {
            assert_eq!(status, 404);
            assert_eq!(code, Some(40400));
            assert_eq!(message, "Rule not found");
            assert!(href.is_some());
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_with_plain_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/app1/queues"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_queues("app1").await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("upstream unavailable"));
}

#[tokio::test]
async fn test_create_rule_sends_typed_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/apps/app1/rules"))
        .and(body_partial_json(json!({
            "ruleType": "http/ifttt",
            "requestMode": "single",
            "target": {"webhookKey": "wk", "eventName": "ev"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "r9",
            "appId": "app1",
            "status": "enabled",
            "requestMode": "single",
            "ruleType": "http/ifttt",
            "target": {"webhookKey": "wk", "eventName": "ev"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let target = RuleTarget::Ifttt(IftttTarget {
        webhook_key: "wk".to_string(),
        event_name: "ev".to_string(),
    });
    let payload =
        RulePayload::new(RuleStatus::Enabled, RequestMode::Single, None, &target).unwrap();

    let rule = client_for(&server)
        .create_rule("app1", &payload)
        .await
        .unwrap();
    assert_eq!(rule.id, "r9");
}

#[tokio::test]
async fn test_create_queue_posts_to_app() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/apps/app1/queues"))
        .and(body_partial_json(json!({"name": "jobs", "maxLength": 100})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "app1:eu:jobs",
            "appId": "app1",
            "name": "jobs",
            "region": "eu",
            "ttl": 60,
            "maxLength": 100
        })))
        .mount(&server)
        .await;

    let payload = QueuePayload {
        name: "jobs".to_string(),
        ttl: 60,
        max_length: 100,
        region: "eu".to_string(),
    };
    let queue = client_for(&server)
        .create_queue("app1", &payload)
        .await
        .unwrap();
    assert_eq!(queue.id, "app1:eu:jobs");
}

#[tokio::test]
async fn test_revoke_key_posts_to_revoke_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/apps/app1/keys/k1/revoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).revoke_key("app1", "k1").await.unwrap();
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/apps/app1/namespaces/chat"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_namespace("app1", "chat")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_success_body_is_unexpected_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apps/app1/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_keys("app1").await.unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedResponse(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ApiConfig::new("tok")
        .with_base_url(format!("http://{}/v1", addr))
        .with_connect_timeout(Duration::from_secs(2));
    let api = HttpControlApi::new(config).unwrap();

    let err = api.list_apps("acc1").await.unwrap_err();
    assert_eq!(err.status(), Some(0));
    assert!(matches!(
        err,
        ApiError::Transport {
            kind: TransportKind::Connect,
            ..
        }
    ));
}
