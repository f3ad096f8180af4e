//! Tests for the audit module

use super::*;
use crate::config::AuditConfig;
use crate::error::Error;
use crate::http::HttpClientConfig;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry(id: &str, action: &str, date_create: i64) -> Value {
    json!({
        "id": id,
        "date_create": date_create,
        "action": action,
        "actor": {
            "type": "user",
            "user": {"id": "W123AB456", "name": "Charlie Parker", "email": "bird@slack.com"}
        },
        "entity": {
            "type": "user",
            "user": {"id": "W123AB456", "name": "Charlie Parker", "email": "bird@slack.com"}
        },
        "context": {
            "location": {"type": "enterprise", "id": "E1701NCCA", "name": "Birdland", "domain": "birdland"},
            "ua": "Mozilla/5.0",
            "ip_address": "1.23.45.678"
        }
    })
}

fn logs_first_page() -> Value {
    json!({
        "entries": [
            entry("0123a45b-6c7d-8900-e12f-3456789gh0i1", "user_login", 1_559_626_515),
            entry("0123a45b-6c7d-8900-e12f-3456789gh0i2", "user_logout", 1_559_626_600),
        ],
        "response_metadata": {"next_cursor": "X"}
    })
}

fn logs_last_page() -> Value {
    json!({
        "entries": [entry("0123a45b-6c7d-8900-e12f-3456789gh0i3", "user_login", 1_559_627_000)],
        "response_metadata": {"next_cursor": ""}
    })
}

fn schemas_body() -> Value {
    json!({
        "schemas": [
            {"type": "workspace", "workspace": {"id": "string", "name": "string", "domain": "string"}},
            {"type": "enterprise", "enterprise": {"id": "string", "name": "string", "domain": "string"}},
            {"type": "user", "user": {"id": "string", "name": "string", "email": "string"}},
            {"type": "file", "file": {"id": "string", "name": "string", "filetype": "string", "title": "string"}},
            {"type": "channel", "channel": {
                "id": "string", "name": "string", "privacy": "string",
                "is_shared": "boolean", "is_org_shared": "boolean", "teams_shared_with": "array"
            }},
            {"type": "app", "app": {
                "id": "string", "name": "string", "is_distributed": "boolean",
                "is_directory_approved": "boolean", "is_workflow_app": "boolean", "scopes": "array"
            }},
            {"type": "workflow", "workflow": {"id": "string", "name": "string"}},
            {"type": "barrier", "barrier": {
                "id": "string", "primary_usergroup": "string",
                "barriered_from_usergroup": "string", "restricted_subjects": "array"
            }}
        ]
    })
}

fn client_for(server: &MockServer) -> AuditClient {
    let config = AuditConfig {
        base_url: server.uri(),
        token: Some("audit-token".to_string()),
    };
    AuditClient::new(&config, HttpClientConfig::builder()).unwrap()
}

// ============================================================================
// Query
// ============================================================================

#[test]
fn test_query_defaults() {
    let query = AuditLogQuery::new();
    assert_eq!(query.limit, MAX_AUDIT_LIMIT);
    assert!(query.latest.is_none());
    assert!(query.action.is_none());
}

#[test]
fn test_query_limit_is_clamped() {
    assert_eq!(AuditLogQuery::new().limit(20_000).limit, 9999);
    assert_eq!(AuditLogQuery::new().limit(0).limit, 1);
    assert_eq!(AuditLogQuery::new().limit(10).limit, 10);
}

#[test]
fn test_entry_created_at() {
    let entry: AuditEntry = serde_json::from_value(entry("a", "user_login", 1_559_626_515)).unwrap();
    assert_eq!(
        entry.created_at().unwrap().to_rfc3339(),
        "2019-06-04T05:35:15+00:00"
    );
    assert_eq!(entry.context.user_agent, "Mozilla/5.0");
    assert_eq!(entry.actor.kind, "user");
}

#[test]
fn test_new_requires_token() {
    let err = AuditClient::new(&AuditConfig::default(), HttpClientConfig::builder()).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));
}

// ============================================================================
// Logs
// ============================================================================

#[tokio::test]
async fn test_paginated_two_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param("cursor", "X"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logs_last_page()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param_is_missing("cursor"))
        .and(query_param("limit", "10"))
        .and(query_param("oldest", "1559626515"))
        .and(header("Authorization", "Bearer audit-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logs_first_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut cursor = client.audit_logs_paginated(AuditLogQuery::new().limit(10).oldest(1_559_626_515));

    assert_eq!(cursor.advance().await.unwrap(), crate::pagination::Step::Fetched(2));
    assert_eq!(cursor.items().len(), 2);
    assert_eq!(cursor.advance().await.unwrap(), crate::pagination::Step::Fetched(1));
    assert_eq!(cursor.items().len(), 1);
    assert!(cursor.is_terminal());
    assert_eq!(cursor.advance().await.unwrap(), crate::pagination::Step::Complete);
}

#[tokio::test]
async fn test_list_audit_logs_sends_filters_every_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param("cursor", "X"))
        .and(query_param("latest", "1559636515"))
        .and(query_param("action", "fake-action"))
        .and(query_param("actor", "fake-actor"))
        .and(query_param("entity", "fake-entity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logs_last_page()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param("latest", "1559636515"))
        .and(query_param("oldest", "1559626515"))
        .and(query_param("action", "fake-action"))
        .and(query_param("actor", "fake-actor"))
        .and(query_param("entity", "fake-entity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logs_first_page()))
        .expect(1)
        .mount(&server)
        .await;

    let query = AuditLogQuery::new()
        .limit(10)
        .latest(1_559_636_515)
        .oldest(1_559_626_515)
        .action("fake-action")
        .actor("fake-actor")
        .entity("fake-entity");
    let entries = client_for(&server)
        .list_audit_logs(query)
        .await
        .into_result()
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].id, "0123a45b-6c7d-8900-e12f-3456789gh0i3");
}

#[tokio::test]
async fn test_list_audit_logs_default_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param("limit", "9999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logs_last_page()))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client_for(&server).list_audit_logs(AuditLogQuery::new()).await;
    assert!(listing.is_complete());
    assert_eq!(listing.items.len(), 1);
}

#[tokio::test]
async fn test_list_audit_logs_null_cursor_ends_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [entry("e1", "user_login", 1_559_626_515)],
            "response_metadata": {"next_cursor": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client_for(&server).list_audit_logs(AuditLogQuery::new()).await;
    assert!(listing.is_complete());
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0].id, "e1");
}

#[test]
fn test_response_metadata_cursor_forms() {
    let missing: ResponseMetadata = serde_json::from_value(json!({})).unwrap();
    let null: ResponseMetadata = serde_json::from_value(json!({"next_cursor": null})).unwrap();
    let set: ResponseMetadata = serde_json::from_value(json!({"next_cursor": "X"})).unwrap();

    assert_eq!(missing.next_cursor, "");
    assert_eq!(null.next_cursor, "");
    assert_eq!(set.next_cursor, "X");
}

#[tokio::test]
async fn test_list_audit_logs_repeated_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logs_first_page()))
        .expect(2)
        .mount(&server)
        .await;

    let listing = client_for(&server).list_audit_logs(AuditLogQuery::new()).await;
    assert_eq!(listing.items.len(), 2);
    assert!(matches!(listing.error, Some(Error::Pagination { .. })));
}

#[tokio::test]
async fn test_list_audit_logs_rate_limited_mid_way() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param("cursor", "X"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logs_first_page()))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client_for(&server).list_audit_logs(AuditLogQuery::new()).await;
    assert_eq!(listing.items.len(), 2);
    assert_eq!(
        listing.error.and_then(|e| e.retry_after()),
        Some(std::time::Duration::from_secs(30))
    );
}

// ============================================================================
// Catalogues
// ============================================================================

#[tokio::test]
async fn test_actions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "actions": {
                "workspace_or_org": ["workspace_created", "organization_created"],
                "user": ["user_created", "user_login"],
                "file": ["file_downloaded"],
                "channel": ["user_channel_join"],
                "app": [
                    "app_installed", "app_uninstalled", "app_scopes_expanded",
                    "app_resources_added", "bot_token_upgraded"
                ],
                "other": ["pref.allow_calls"]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let actions = client_for(&server).actions().await.unwrap();
    assert_eq!(actions["app"].len(), 5);
    assert_eq!(actions.len(), 6);
}

#[tokio::test]
async fn test_schemas() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schemas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schemas_body()))
        .expect(1)
        .mount(&server)
        .await;

    let schemas = client_for(&server).schemas().await.unwrap();
    assert_eq!(schemas.schemas.len(), 8);
    assert_eq!(schemas.workspace().unwrap().id, "string");
    assert_eq!(schemas.app().unwrap().scopes, "array");
    assert_eq!(schemas.channel().unwrap().is_shared, "boolean");
    assert_eq!(schemas.barrier().unwrap().restricted_subjects, "array");
    assert_eq!(schemas.schemas[3].kind(), "file");
}

#[test]
fn test_unknown_schema_type_is_reported() {
    let body = serde_json::to_vec(&json!({
        "schemas": [
            {"type": "workspace", "workspace": {"id": "string"}},
            {"type": "huddle", "huddle": {"id": "string"}}
        ]
    }))
    .unwrap();

    match parse_schemas(&body).unwrap_err() {
        Error::UnknownSchemaType { kind } => assert_eq!(kind, "huddle"),
        other => panic!("expected unknown schema type, got {other:?}"),
    }
}

#[test]
fn test_schema_without_payload() {
    let body = br#"{"schemas": [{"type": "user"}]}"#;
    assert!(matches!(parse_schemas(body), Err(Error::Decode { .. })));
}

#[test]
fn test_schema_serializes_with_type_tag() {
    let schema = AuditSchema::Workflow(WorkflowSchema {
        id: "string".to_string(),
        name: "string".to_string(),
    });
    assert_eq!(
        serde_json::to_value(&schema).unwrap(),
        json!({"type": "workflow", "id": "string", "name": "string"})
    );
}
