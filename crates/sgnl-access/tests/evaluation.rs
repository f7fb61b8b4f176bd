// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use serde_json::json;
use sgnl_access::{AccessClient, ResultKind, RetryConfig, StaticDeviceIdentity, Verdict};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";
const DEVICE: &str = "dev-test";

fn client(server: &MockServer) -> AccessClient {
	AccessClient::builder()
		.api_url(server.uri())
		.api_token(TOKEN)
		.device_identity(StaticDeviceIdentity::new(DEVICE))
		.build()
		.unwrap()
}

fn decisions(verdicts: &[&str]) -> serde_json::Value {
	json!({
		"decisions": verdicts
			.iter()
			.map(|v| json!({"decision": v}))
			.collect::<Vec<_>>()
	})
}

#[tokio::test]
async fn single_query_sends_expected_request() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/access/v2/evaluations"))
		.and(header("Authorization", "Bearer test-token"))
		.and(header("Accept", "application/json"))
		.and(header("Content-Type", "application/json"))
		.and(header_exists("X-Request-Id"))
		.and(body_json(json!({
			"principal": {"id": "alice", "deviceId": DEVICE},
			"queries": [{"assetId": "sshd", "action": "execute"}]
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"decisions": [{"decision": "Allow", "reason": "on-call", "assetId": "sshd"}]
		})))
		.expect(1)
		.mount(&server)
		.await;

	let client = client(&server);
	let result = client.evaluate_one("alice", Some("sshd"), None).await;

	assert_eq!(result.outcome, ResultKind::Allowed);
	assert_eq!(result.decision, Some(Verdict::Allow));
	assert_eq!(result.reason.as_deref(), Some("on-call"));
	assert_eq!(result.principal_id, "alice");
	assert_eq!(result.asset_id.as_deref(), Some("sshd"));
	assert_eq!(result.action, "execute");
	assert_eq!(client.last_request_id(), Some(result.request_id.clone()));
	assert!(client.last_error().is_none());
}

#[tokio::test]
async fn request_id_header_matches_result() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(decisions(&["Deny"])))
		.mount(&server)
		.await;

	let result = client(&server)
		.evaluate_one("alice", Some("sshd"), Some("login"))
		.await;
	assert_eq!(result.outcome, ResultKind::Denied);
	assert_eq!(result.action, "login");

	let requests = server.received_requests().await.unwrap();
	assert_eq!(requests.len(), 1);
	let sent = requests[0].headers.get("X-Request-Id").unwrap();
	assert_eq!(sent.to_str().unwrap(), result.request_id);
	assert!(result.request_id.starts_with("sgnl-"));
}

#[tokio::test]
async fn decision_other_than_exact_allow_denies() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(decisions(&["allow"])))
		.mount(&server)
		.await;

	let result = client(&server).evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::Denied);
	assert_eq!(result.decision, Some(Verdict::Deny));
}

#[tokio::test]
async fn empty_decisions_deny_single_query() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"decisions": []})))
		.mount(&server)
		.await;

	let result = client(&server).evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::Denied);
	assert_eq!(result.decision, Some(Verdict::Deny));
}

#[tokio::test]
async fn malformed_json_is_an_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
		.mount(&server)
		.await;

	let client = client(&server);
	let result = client.evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::Error);
	assert!(result.decision.is_none());
	assert!(result.error_message.is_some());
	assert_eq!(client.last_error(), result.error_message);
}

#[tokio::test]
async fn missing_decisions_is_an_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
		.mount(&server)
		.await;

	let result = client(&server).evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::Error);
}

#[tokio::test]
async fn service_error_object_is_an_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"error": {"message": "tenant suspended"},
			"decisions": [{"decision": "Allow"}]
		})))
		.mount(&server)
		.await;

	let result = client(&server).evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::Error);
	assert_eq!(result.error_message.as_deref(), Some("tenant suspended"));
}

#[tokio::test]
async fn http_status_classification() {
	let cases = [
		(401, ResultKind::AuthError),
		(403, ResultKind::AuthError),
		(500, ResultKind::NetworkError),
		(503, ResultKind::NetworkError),
		(404, ResultKind::Error),
		(400, ResultKind::Error),
	];

	for (status, expected) in cases {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(status))
			.expect(1)
			.mount(&server)
			.await;

		let result = client(&server).evaluate_one("alice", Some("sshd"), None).await;
		assert_eq!(result.outcome, expected, "status {status}");
		assert_eq!(result.error_code, Some(status));
		assert!(result.decision.is_none());
	}
}

#[tokio::test]
async fn not_found_message_uses_reason_phrase() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;

	let result = client(&server).evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.error_message.as_deref(), Some("HTTP 404: Not Found"));
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
	let client = AccessClient::builder()
		.api_url("http://127.0.0.1:1")
		.api_token(TOKEN)
		.device_identity(StaticDeviceIdentity::new(DEVICE))
		.build()
		.unwrap();

	let result = client.evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::NetworkError);
	assert!(result.error_code.is_none());
	assert!(client.evaluate_batch("alice", &["a", "b"], None).await.is_none());
}

#[tokio::test]
async fn slow_service_is_a_timeout() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(decisions(&["Allow"]))
				.set_delay(Duration::from_secs(2)),
		)
		.mount(&server)
		.await;

	let client = AccessClient::builder()
		.api_url(server.uri())
		.api_token(TOKEN)
		.timeout(Duration::from_millis(200))
		.device_identity(StaticDeviceIdentity::new(DEVICE))
		.build()
		.unwrap();

	let result = client.evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::TimeoutError);
}

#[tokio::test]
async fn batch_correlates_by_position_and_backfills_deny() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/access/v2/evaluations"))
		.and(body_json(json!({
			"principal": {"id": "alice", "deviceId": DEVICE},
			"queries": [
				{"assetId": "A", "action": "execute"},
				{"assetId": "B", "action": "execute"},
				{"assetId": "C", "action": "execute"}
			]
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"decisions": [
				{"decision": "Allow", "assetId": "C"},
				{"decision": "Deny", "reason": "no grant"}
			]
		})))
		.expect(1)
		.mount(&server)
		.await;

	let results = client(&server)
		.evaluate_batch("alice", &["A", "B", "C"], None)
		.await
		.unwrap();

	let outcomes: Vec<_> = results.iter().map(|r| r.outcome).collect();
	assert_eq!(
		outcomes,
		vec![ResultKind::Allowed, ResultKind::Denied, ResultKind::Denied]
	);
	assert_eq!(results[0].asset_id.as_deref(), Some("A"));
	assert_eq!(results[1].reason.as_deref(), Some("no grant"));
	assert_eq!(results[2].decision, Some(Verdict::Deny));
	assert!(results[2].reason.is_none());
	assert!(results.iter().all(|r| r.request_id == results[0].request_id));
}

#[tokio::test]
async fn batch_uses_given_actions() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(body_json(json!({
			"principal": {"id": "bob", "deviceId": DEVICE},
			"queries": [
				{"assetId": "cat", "action": "sudo"},
				{"assetId": "/etc/passwd", "action": "cat"}
			]
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(decisions(&["Allow", "Allow"])))
		.expect(1)
		.mount(&server)
		.await;

	let results = client(&server)
		.evaluate_batch("bob", &["cat", "/etc/passwd"], Some(&["sudo", "cat"][..]))
		.await
		.unwrap();
	assert!(results.iter().all(|r| r.outcome == ResultKind::Allowed));
	assert_eq!(results[1].action, "cat");
}

#[tokio::test]
async fn long_asset_ids_are_evaluated_on_both_paths() {
	let long_asset = format!("/opt/{}", "x".repeat(300));
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(decisions(&["Allow", "Allow"])))
		.expect(2)
		.mount(&server)
		.await;

	let client = client(&server);
	let single = client
		.evaluate_one("alice", Some(long_asset.as_str()), None)
		.await;
	assert_eq!(single.outcome, ResultKind::Allowed);
	assert_eq!(single.asset_id.as_deref(), Some(long_asset.as_str()));

	let batch = client
		.evaluate_batch("alice", &[long_asset.as_str()], None)
		.await
		.unwrap();
	assert_eq!(batch[0].outcome, single.outcome);
}

#[tokio::test]
async fn batch_returns_none_when_service_cannot_answer() {
	let bodies = [
		ResponseTemplate::new(200).set_body_string("garbage"),
		ResponseTemplate::new(200).set_body_json(json!({"decisions": "Allow"})),
		ResponseTemplate::new(500),
		ResponseTemplate::new(401),
	];

	for template in bodies {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(template)
			.mount(&server)
			.await;

		let client = client(&server);
		assert!(client.evaluate_batch("alice", &["a", "b"], None).await.is_none());
		assert!(client.last_error().is_some());
	}
}

#[tokio::test]
async fn server_errors_are_retried() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(503))
		.expect(3)
		.mount(&server)
		.await;

	let client = AccessClient::builder()
		.api_url(server.uri())
		.api_token(TOKEN)
		.retry(RetryConfig {
			max_retries: 2,
			base_delay: Duration::from_millis(1),
			jitter: false,
			..RetryConfig::default()
		})
		.device_identity(StaticDeviceIdentity::new(DEVICE))
		.build()
		.unwrap();

	let result = client.evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::NetworkError);

	let requests = server.received_requests().await.unwrap();
	let ids: Vec<_> = requests
		.iter()
		.map(|r| r.headers.get("X-Request-Id").unwrap().to_str().unwrap().to_string())
		.collect();
	assert!(ids.iter().all(|id| *id == result.request_id));
}

#[tokio::test]
async fn auth_failures_are_not_retried() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(401))
		.expect(1)
		.mount(&server)
		.await;

	let client = AccessClient::builder()
		.api_url(server.uri())
		.api_token(TOKEN)
		.retry(RetryConfig {
			max_retries: 3,
			base_delay: Duration::from_millis(1),
			..RetryConfig::default()
		})
		.device_identity(StaticDeviceIdentity::new(DEVICE))
		.build()
		.unwrap();

	let result = client.evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::AuthError);
}

#[tokio::test]
async fn denials_are_not_retried() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(decisions(&["Deny"])))
		.expect(1)
		.mount(&server)
		.await;

	let client = AccessClient::builder()
		.api_url(server.uri())
		.api_token(TOKEN)
		.retry(RetryConfig::new(3, Duration::from_millis(1)))
		.device_identity(StaticDeviceIdentity::new(DEVICE))
		.build()
		.unwrap();

	let result = client.evaluate_one("alice", Some("sshd"), None).await;
	assert_eq!(result.outcome, ResultKind::Denied);
}

#[tokio::test]
async fn search_returns_allowed_assets() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/access/v2/search"))
		.and(body_json(json!({
			"principal": {"id": "alice", "deviceId": DEVICE},
			"queries": [{"action": "execute"}]
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"decisions": [
				{"decision": "Allow", "assetId": "/usr/bin/ls"},
				{"decision": "Deny", "assetId": "/usr/bin/rm"},
				{"decision": "Allow", "assetId": "/usr/bin/cat"}
			]
		})))
		.expect(1)
		.mount(&server)
		.await;

	let assets = client(&server)
		.search_assets("alice", Some("execute"))
		.await
		.unwrap();
	assert_eq!(assets, vec!["/usr/bin/ls", "/usr/bin/cat"]);
}

#[tokio::test]
async fn search_defaults_to_list_action() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/access/v2/search"))
		.and(body_json(json!({
			"principal": {"id": "alice", "deviceId": DEVICE},
			"queries": [{"action": "list"}]
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"decisions": []})))
		.expect(1)
		.mount(&server)
		.await;

	let assets = client(&server).search_assets("alice", None).await.unwrap();
	assert!(assets.is_empty());
}

#[tokio::test]
async fn search_failure_returns_none() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(403))
		.mount(&server)
		.await;

	assert!(client(&server).search_assets("alice", None).await.is_none());
}
