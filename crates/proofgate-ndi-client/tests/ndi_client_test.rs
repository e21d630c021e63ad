//! Contract tests for NdiClient against a mock provider.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/oauth/token` | `access_token_*` |
//! | POST   | `/verifier/proof-request` | `dispatch_proof_*` |
//! | POST   | `/issuer/issue-credential` | `issue_credential_*` |
//! | POST   | `/webhook/subscribe` | `subscribe_*` |
//! | POST   | `/webhook/register` | `register_webhook_*` |

use proofgate_core::{ProofKind, ProviderRef};
use proofgate_ndi_client::{IssueCredentialRequest, NdiApiError, NdiClient, NdiConfig};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> NdiClient {
    NdiClient::new(NdiConfig::local_mock(&mock_server.uri()).unwrap()).unwrap()
}

async fn mount_token(mock_server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok-123",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(mock_server)
        .await;
}

// ── POST /oauth/token ────────────────────────────────────────────────

#[tokio::test]
async fn access_token_is_cached_between_calls() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    let client = test_client(&mock_server);
    let first = client.access_token().await.unwrap();
    let second = client.access_token().await.unwrap();
    assert_eq!(first.as_str(), "tok-123");
    assert_eq!(second.as_str(), "tok-123");
}

#[tokio::test]
async fn access_token_refetched_after_invalidate() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 2).await;

    let client = test_client(&mock_server);
    client.access_token().await.unwrap();
    client.invalidate_token().await;
    client.access_token().await.unwrap();
}

#[tokio::test]
async fn access_token_near_expiry_is_not_reused() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "short-lived",
            "expires_in": 30
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client.access_token().await.unwrap();
    client.access_token().await.unwrap();
}

#[tokio::test]
async fn access_token_rejected_credentials_is_api_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.access_token().await.unwrap_err();
    match err {
        NdiApiError::ApiError { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid_client");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

// ── POST /verifier/proof-request ─────────────────────────────────────

#[tokio::test]
async fn dispatch_proof_sends_template_and_returns_thread() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/verifier/proof-request"))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_partial_json(serde_json::json!({
            "proofName": "Verify Foundational ID"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "statusCode": 201,
            "data": {
                "proofRequestThreadId": "ndi-999",
                "proofRequestURL": "https://ndi.example/qr/ndi-999"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let dispatched = client.dispatch_proof_request(ProofKind::Normal).await.unwrap();
    assert_eq!(dispatched.provider_ref.as_str(), "ndi-999");
    assert_eq!(dispatched.url, "https://ndi.example/qr/ndi-999");
}

#[tokio::test]
async fn dispatch_proof_agent_uses_agent_template() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/verifier/proof-request"))
        .and(body_partial_json(serde_json::json!({ "proofName": "CFA Credential" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "proofRequestThreadId": "ndi-agent-1", "proofRequestURL": "u" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let dispatched = client.dispatch_proof_request(ProofKind::Agent).await.unwrap();
    assert_eq!(dispatched.provider_ref.as_str(), "ndi-agent-1");
}

#[tokio::test]
async fn dispatch_proof_provider_error_is_api_error() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/verifier/proof-request"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.dispatch_proof_request(ProofKind::Normal).await.unwrap_err();
    assert!(matches!(err, NdiApiError::ApiError { status: 503, .. }));
}

#[tokio::test]
async fn dispatch_proof_empty_thread_id_is_invalid_response() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/verifier/proof-request"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "proofRequestThreadId": "", "proofRequestURL": "u" }
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.dispatch_proof_request(ProofKind::Normal).await.unwrap_err();
    assert!(matches!(err, NdiApiError::InvalidResponse { .. }));
}

#[tokio::test]
async fn dispatch_proof_unexpected_body_is_deserialization_error() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/verifier/proof-request"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.dispatch_proof_request(ProofKind::Normal).await.unwrap_err();
    assert!(matches!(err, NdiApiError::Deserialization { .. }));
}

// ── POST /issuer/issue-credential ────────────────────────────────────

#[tokio::test]
async fn issue_credential_returns_thread_and_revocation_id() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/issuer/issue-credential"))
        .and(body_partial_json(serde_json::json!({
            "schemaId": "schema-x",
            "holderDID": "did:key:holder"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": {
                "threadId": "cred-thread-1",
                "credentialOfferURL": "https://ndi.example/offer/1",
                "revocationId": "rev-42"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let issued = client
        .issue_credential(&IssueCredentialRequest {
            credential_data: serde_json::json!({ "Full Name": "Jane Doe" }),
            schema_id: "schema-x".into(),
            holder_did: "did:key:holder".into(),
            for_relationship: "did:key:rel".into(),
        })
        .await
        .unwrap();
    assert_eq!(issued.provider_ref.as_str(), "cred-thread-1");
    assert_eq!(issued.url.as_deref(), Some("https://ndi.example/offer/1"));
    assert_eq!(issued.revocation_id.as_deref(), Some("rev-42"));
}

// ── POST /webhook/subscribe ──────────────────────────────────────────

#[tokio::test]
async fn subscribe_sends_webhook_and_thread_id() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/webhook/subscribe"))
        .and(body_partial_json(serde_json::json!({
            "webhookId": "proofgate-webhook",
            "threadId": "ndi-999"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client
        .subscribe(&ProviderRef::new("ndi-999").unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn subscribe_failure_is_reported() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/webhook/subscribe"))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown webhook"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .subscribe(&ProviderRef::new("ndi-999").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, NdiApiError::ApiError { status: 404, .. }));
}

// ── POST /webhook/register ───────────────────────────────────────────

#[tokio::test]
async fn register_webhook_posts_callback_url() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/webhook/register"))
        .and(body_partial_json(serde_json::json!({
            "webhookId": "proofgate-webhook",
            "webhookURL": "https://proofgate.example/webhook"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client
        .register_webhook(&"https://proofgate.example/webhook".parse().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn register_webhook_conflict_counts_as_registered() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, 1).await;

    Mock::given(method("POST"))
        .and(path("/webhook/register"))
        .respond_with(ResponseTemplate::new(409).set_body_string("already exists"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client
        .register_webhook(&"https://proofgate.example/webhook".parse().unwrap())
        .await
        .unwrap();
}
