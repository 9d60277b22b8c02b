mod common;

use common::*;
use licensy_storage::LICENSES_NAMESPACE;
use licensy_types::wire::ErrorBody;
use licensy_types::{License, LicenseStatus, UsageAction, UsageLogEntry};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn issue_with_explicit_key() {
    let server = spawn_test_server().await;

    let resp = server
        .admin_post("/api/v1/licenses")
        .json(&json!({"owner": "acct-42", "key": "CUSTOM-KEY"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let license: License = resp.json().await.unwrap();
    assert_eq!(license.key.as_str(), "CUSTOM-KEY");
    assert_eq!(license.owner.as_str(), "acct-42");
    assert_eq!(license.status, LicenseStatus::Active);
}

#[tokio::test]
async fn issue_generates_key() {
    let server = spawn_test_server().await;

    let license: License = server
        .admin_post("/api/v1/licenses")
        .json(&json!({"owner": "acct-42"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(license.key.as_str().len(), 23);
    assert_eq!(license.key.as_str().matches('-').count(), 3);
}

#[tokio::test]
async fn issue_duplicate_is_conflict() {
    let server = spawn_test_server().await;
    server.active("TAKEN");

    let resp = server
        .admin_post("/api/v1/licenses")
        .json(&json!({"owner": "acct-2", "key": "TAKEN"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: ErrorBody = resp.json().await.unwrap();
    assert!(body.error.contains("TAKEN"));
}

#[tokio::test]
async fn issue_rejects_bad_input() {
    let server = spawn_test_server().await;

    for body in [
        json!({"owner": "acct-1", "key": ""}),
        json!({"owner": "acct-1", "key": "k".repeat(101)}),
        json!({"owner": "  "}),
        json!({"key": "NO-OWNER"}),
    ] {
        let resp = server
            .admin_post("/api/v1/licenses")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body {body}");
    }
}

#[tokio::test]
async fn get_license_by_key() {
    let server = spawn_test_server().await;
    server.active("K-1");

    let resp = server.admin_get("/api/v1/licenses/K-1").send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let license: License = resp.json().await.unwrap();
    assert_eq!(license.key.as_str(), "K-1");

    let missing = server.admin_get("/api/v1/licenses/NOPE").send().await.unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn list_filters_by_owner() {
    let server = spawn_test_server().await;
    server.active("A-1");
    server
        .state
        .issuer
        .issue(&"acct-2".into(), Some("B-1"))
        .unwrap();

    let all: Vec<License> = server
        .admin_get("/api/v1/licenses")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let mine: Vec<License> = server
        .admin_get("/api/v1/licenses?owner=acct-2")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].key.as_str(), "B-1");
}

#[tokio::test]
async fn revoke_then_revoke_again() {
    let server = spawn_test_server().await;
    server.active("K");

    let first = server
        .admin_post("/api/v1/licenses/K/revoke")
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);
    let license: License = first.json().await.unwrap();
    assert_eq!(license.status, LicenseStatus::Revoked);

    let second = server
        .admin_post("/api/v1/licenses/K/revoke")
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);

    let missing = server
        .admin_post("/api/v1/licenses/NOPE/revoke")
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn revoked_key_verifies_invalid() {
    let server = spawn_test_server().await;
    server.active("K");
    server
        .admin_post("/api/v1/licenses/K/revoke")
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = server.verify(json!(["K"])).await.json().await.unwrap();
    assert_eq!(
        body,
        json!([{"key": "K", "status": "invalid", "reason": "revoked"}])
    );
}

#[tokio::test]
async fn usage_lists_checks_in_order() {
    let server = spawn_test_server().await;
    server.active("K");
    server.verify(json!(["K", "OTHER"])).await;
    server
        .admin_post("/api/v1/licenses/K/revoke")
        .send()
        .await
        .unwrap();
    server.verify(json!(["K"])).await;

    let entries: Vec<UsageLogEntry> = server
        .admin_get("/api/v1/licenses/K/usage")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let actions: Vec<UsageAction> = entries.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![UsageAction::CheckSuccess, UsageAction::CheckFailureRevoked]
    );
    assert!(entries[0].timestamp < entries[1].timestamp);
    assert!(entries.iter().all(|e| e.caller_identity.as_str() == CALLER_NAME));
}

#[tokio::test]
async fn usage_window_is_inclusive() {
    let server = spawn_test_server().await;
    server.verify(json!(["UNKNOWN"])).await;

    let entries: Vec<UsageLogEntry> = server
        .admin_get("/api/v1/licenses/UNKNOWN/usage")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    let ts = entries[0].timestamp;

    let exact: Vec<UsageLogEntry> = server
        .admin_get("/api/v1/licenses/UNKNOWN/usage")
        .query(&[("from", ts.to_rfc3339()), ("to", ts.to_rfc3339())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);

    let later: Vec<UsageLogEntry> = server
        .admin_get("/api/v1/licenses/UNKNOWN/usage")
        .query(&[("from", (ts + chrono::Duration::seconds(1)).to_rfc3339())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(later.is_empty());
}

#[tokio::test]
async fn usage_rejects_bad_window() {
    let server = spawn_test_server().await;

    let garbage = server
        .admin_get("/api/v1/licenses/K/usage?from=yesterday")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), 400);

    let inverted = server
        .admin_get("/api/v1/licenses/K/usage")
        .query(&[("from", "2026-02-01T00:00:00Z"), ("to", "2026-01-01T00:00:00Z")])
        .send()
        .await
        .unwrap();
    assert_eq!(inverted.status(), 400);
}

// ── Admin auth ──────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_require_admin_key() {
    let server = spawn_test_server().await;

    let none = server
        .http
        .get(server.url("/api/v1/licenses"))
        .send()
        .await
        .unwrap();
    assert_eq!(none.status(), 401);

    let caller = server
        .http
        .get(server.url("/api/v1/licenses"))
        .bearer_auth(CALLER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(caller.status(), 401);

    let issue = server
        .http
        .post(server.url("/api/v1/licenses"))
        .bearer_auth("wrong")
        .json(&json!({"owner": "acct-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(issue.status(), 401);
    assert_eq!(server.store.write_count(), 0);
}

#[tokio::test]
async fn admin_key_accepted_as_raw_header() {
    let server = spawn_test_server().await;

    let resp = server
        .http
        .get(server.url("/api/v1/licenses"))
        .header("Authorization", ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn admin_routes_disabled_without_admin_key() {
    let mut config = test_config();
    config.admin_key = None;
    let server = spawn_with_config(config).await;

    let resp = server.admin_get("/api/v1/licenses").send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn storage_failure_is_503() {
    let server = spawn_test_server().await;
    server.store.fail_writes(LICENSES_NAMESPACE);

    let resp = server
        .admin_post("/api/v1/licenses")
        .json(&json!({"owner": "acct-1", "key": "K"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.error, "storage unavailable");
}
