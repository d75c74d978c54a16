use std::time::Duration;

use serde_json::{Value, json};
use wallarm_api::{
    ActionRead, ApiError, Credentials, HintCreate, HintRead, RetryPolicy, RulesApi, WallarmClient,
    read_all_rules,
};
use wallarm_core::{ConditionSpec, MatchType, RuleSpec, RuleType};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        min_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

fn client(server: &MockServer, credentials: Credentials) -> WallarmClient {
    WallarmClient::builder()
        .base_url(server.uri())
        .credentials(credentials)
        .retry(fast_retry(3))
        .build()
        .unwrap()
}

fn token_client(server: &MockServer) -> WallarmClient {
    client(server, Credentials::Token("test-token".into()))
}

fn rule(id: i64) -> Value {
    json!({
        "id": id,
        "actionid": 10,
        "clientid": 42,
        "type": "wallarm_mode",
        "mode": "block",
        "action": []
    })
}

#[tokio::test]
async fn sends_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/user"))
        .and(header("X-WallarmAPI-Token", "test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": 200, "body": { "id": 1, "clientid": 42 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let user = token_client(&server).user_details().await.unwrap();
    assert_eq!(user.clientid, 42);
}

#[tokio::test]
async fn sends_uuid_and_secret_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/hint"))
        .and(header("X-WallarmAPI-UUID", "u-1"))
        .and(header("X-WallarmAPI-Secret", "s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "body": null })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(
        &server,
        Credentials::UuidSecret {
            uuid: "u-1".into(),
            secret: "s-1".into(),
        },
    );
    let rules = client.read_rules(&HintRead::for_client(42)).await.unwrap();
    assert!(rules.is_empty());
}

#[test]
fn build_without_credentials_fails() {
    let err = WallarmClient::builder().build().err().unwrap();
    assert!(matches!(err, ApiError::InvalidCredentials));
}

#[test]
fn build_rejects_non_http_host() {
    let err = WallarmClient::builder()
        .base_url("ftp://api.wallarm.com")
        .credentials(Credentials::Token("t".into()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::InvalidHost { .. }));
}

#[tokio::test]
async fn reads_every_page() {
    let server = MockServer::start().await;
    let first: Vec<Value> = (0..1000).map(rule).collect();
    let second: Vec<Value> = (1000..1500).map(rule).collect();

    Mock::given(method("POST"))
        .and(path("/v1/objects/hint"))
        .and(body_partial_json(json!({ "offset": 0, "limit": 1000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "body": first })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/hint"))
        .and(body_partial_json(json!({ "offset": 1000, "limit": 1000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "body": second })))
        .expect(1)
        .mount(&server)
        .await;

    let rules = read_all_rules(&token_client(&server), &HintRead::for_client(42))
        .await
        .unwrap();
    assert_eq!(rules.len(), 1500);
    assert_eq!(rules.last().unwrap().id, 1499);
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/action"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/action"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "body": [{ "id": 5, "clientid": 42, "conditions": [], "hints": 1, "grouped_hints_count": 1 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let actions = token_client(&server)
        .read_actions(&ActionRead::for_client(42))
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].holds_single_rule());
}

#[tokio::test]
async fn stops_after_configured_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/hint"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let client = WallarmClient::builder()
        .base_url(server.uri())
        .credentials(Credentials::Token("t".into()))
        .retry(fast_retry(2))
        .build()
        .unwrap();
    let err = client.read_rules(&HintRead::for_client(1)).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/action/77"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let err = token_client(&server).delete_action(77).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn create_maps_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/hint/create"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "status": 400, "body": "Already exists" })),
        )
        .mount(&server)
        .await;

    let mut spec = RuleSpec::new(RuleType::WallarmMode);
    spec.mode = Some("block".into());
    let body = HintCreate::for_spec(&spec, 42).unwrap().remove(0);
    let err = token_client(&server).create_rule(&body).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn create_sends_normalized_conditions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/hint/create"))
        .and(body_partial_json(json!({
            "type": "wallarm_mode",
            "clientid": 42,
            "action": [{ "type": "iequal", "point": ["header", "HOST"], "value": "example.com" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "body": {
                "id": 900, "actionid": 90, "clientid": 42, "type": "wallarm_mode", "mode": "block",
                "action": [{ "type": "iequal", "point": ["header", "HOST"], "value": "example.com" }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut spec = RuleSpec::new(RuleType::WallarmMode);
    spec.mode = Some("block".into());
    spec.action =
        vec![ConditionSpec::new(MatchType::Iequal, "header", "host").with_value("Example.COM")];
    let body = HintCreate::for_spec(&spec, 42).unwrap().remove(0);
    let created = token_client(&server).create_rule(&body).await.unwrap();
    assert_eq!(created.id, 900);
    assert_eq!(created.action_id, 90);
}

#[tokio::test]
async fn delete_rule_posts_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/objects/hint/delete"))
        .and(body_partial_json(json!({ "filter": { "clientid": [42], "id": 900 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 200, "body": [] })))
        .expect(1)
        .mount(&server)
        .await;

    token_client(&server).delete_rule(42, 900).await.unwrap();
}
