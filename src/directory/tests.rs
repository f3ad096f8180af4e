//! Tests for the directory module

use super::*;
use crate::config::DirectoryConfig;
use crate::error::Error;
use crate::http::HttpClientConfig;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fake_user() -> Value {
    json!({
        "nickname": "yamada_taro",
        "groups": [],
        "dn": "uid=yamada_taro,ou=People,dc=asteraceae,dc=local",
        "organizationUnits": "uid=yamada_taro,ou=People,dc=asteraceae,dc=local",
        "updated_at": "2018-10-01T00:02:03.091Z",
        "name": "",
        "picture": "",
        "user_id": "ad|auth0-ldap01|yamada_taro",
        "identities": [{
            "user_id": "auth0-ldap01|yamada_taro",
            "provider": "ad",
            "connection": "auth0-ldap01",
            "isSocial": false
        }],
        "created_at": "2018-05-29T09:17:12.941Z",
        "user_metadata": {"surname": "yamada", "givenname": "taro"},
        "last_login": "2018-11-01T00:00:00.090Z",
        "last_ip": "000.000.00.0",
        "logins_count": 8,
        "app_metadata": {"lambda_authorizer": true, "apps": ["app1", "app2"]}
    })
}

fn users_json(first: usize, count: usize) -> Value {
    Value::Array(
        (first..first + count)
            .map(|n| json!({"user_id": format!("ad|ldap|user{n}"), "nickname": format!("user{n}")}))
            .collect(),
    )
}

async fn client_for(server: &MockServer) -> DirectoryClient {
    let config = DirectoryConfig {
        endpoint: Some(format!("{}/api/v2/", server.uri())),
        token: Some("dir-token".to_string()),
        ..DirectoryConfig::default()
    };
    DirectoryClient::new(&config, HttpClientConfig::builder()).unwrap()
}

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_parse_user_decodes_metadata() {
    let body = serde_json::to_vec(&fake_user()).unwrap();
    let user = parse_user(&body).unwrap();

    assert_eq!(user.nickname.as_deref(), Some("yamada_taro"));
    assert_eq!(user.logins_count, 8);
    assert_eq!(user.identities[0].connection, "auth0-ldap01");
    assert!(!user.identities[0].is_social);
    assert!(user.raw_app_metadata.is_some());

    assert_eq!(
        user.app_meta,
        Some(AppMetadata {
            lambda_authorizer: true,
            apps: vec!["app1".to_string(), "app2".to_string()],
        })
    );
    assert_eq!(
        user.user_meta.unwrap().givenname.as_deref(),
        Some("taro")
    );
}

#[test]
fn test_parse_user_without_metadata() {
    let user = parse_user(br#"{"user_id": "ad|ldap|x", "app_metadata": null}"#).unwrap();
    assert!(user.app_meta.is_none());
    assert!(user.user_meta.is_none());
    assert_eq!(user.logins_count, 0);
}

#[test]
fn test_parse_user_bad_metadata_fails() {
    let body = br#"{"user_id": "ad|ldap|x", "app_metadata": {"apps": "not-a-list"}}"#;
    match parse_user(body).unwrap_err() {
        Error::Decode { target, .. } => assert_eq!(target, "AppMetadata"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn test_parse_users_fails_on_any_bad_record() {
    let body = serde_json::to_vec(&json!([
        fake_user(),
        {"user_id": "ad|ldap|y", "user_metadata": {"surname": 42}}
    ]))
    .unwrap();
    assert!(matches!(parse_users(&body), Err(Error::Decode { .. })));
}

#[test]
fn test_parse_users_not_json() {
    assert!(matches!(
        parse_users(b"<html></html>"),
        Err(Error::Decode { .. })
    ));
}

// ============================================================================
// Client
// ============================================================================

#[test]
fn test_new_requires_endpoint_and_token() {
    let err = DirectoryClient::new(&DirectoryConfig::default(), HttpClientConfig::builder())
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));

    let config = DirectoryConfig {
        endpoint: Some("https://tenant.example.com/api/v2/".to_string()),
        ..DirectoryConfig::default()
    };
    let err = DirectoryClient::new(&config, HttpClientConfig::builder()).unwrap_err();
    assert_eq!(err.to_string(), "Missing required config field: directory.token");
}

#[tokio::test]
async fn test_user_id_uses_provider_and_connection() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;
    assert_eq!(client.user_id("yamada_taro"), "ad|ldap|yamada_taro");
}

#[tokio::test]
async fn test_get_user_by_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v2/users/ad(\||%7C)ldap(\||%7C)yamada_taro$"))
        .and(header("Authorization", "Bearer dir-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fake_user()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let user = client.get_user_by_name("yamada_taro").await.unwrap();

    assert_eq!(user.nickname.as_deref(), Some("yamada_taro"));
    assert!(user.app_meta.unwrap().lambda_authorizer);
}

#[tokio::test]
async fn test_get_user_empty_name() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;
    assert!(client.get_user_by_name("").await.is_err());
}

#[tokio::test]
async fn test_get_user_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get_user_by_name("nobody").await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_list_users_budget_in_one_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("page", "0"))
        .and(query_param("per_page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_json(0, 3)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let users = client.list_users(0, Some(3)).await.into_result().unwrap();
    assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn test_list_users_pages_until_budget() {
    let server = MockServer::start().await;

    for page in 0..3 {
        Mock::given(method("GET"))
            .and(path("/api/v2/users"))
            .and(query_param("page", page.to_string()))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(users_json(page * 100, 100)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server).await;
    let mut cursor = client.users_paginated(0, Some(250));
    let listing = crate::pagination::collect_all(&mut cursor).await;

    assert!(listing.is_complete());
    assert_eq!(listing.items.len(), 250);
    assert_eq!(listing.items[249].nickname.as_deref(), Some("user249"));
    assert_eq!(cursor.pages_fetched(), 3);
}

#[tokio::test]
async fn test_list_users_unbounded_stops_on_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_json(200, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let users = client.list_users(2, None).await.into_result().unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_list_users_keeps_pages_before_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_json(0, 100)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/users"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let listing = client.list_users(0, None).await;

    assert_eq!(listing.items.len(), 100);
    assert!(matches!(
        listing.error,
        Some(Error::HttpStatus { status: 500, .. })
    ));
}
