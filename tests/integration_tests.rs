//! Integration tests using mock HTTP servers and in-memory cloud fakes
//!
//! Exercises the public API end to end: config → client → paged requests → typed results

use async_trait::async_trait;
use calendula::audit::{AuditClient, AuditLogQuery};
use calendula::cloud::{ObjectListPage, ObjectStorage, ObjectStorageApi};
use calendula::config::{AuditConfig, Config, DirectoryConfig};
use calendula::directory::DirectoryClient;
use calendula::http::{HttpClient, HttpClientConfig};
use calendula::{crypto, Error, Result};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{header, method, path, path_regex, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Audit logs
// ============================================================================

fn audit_entry(id: &str, date_create: i64) -> serde_json::Value {
    json!({
        "id": id,
        "date_create": date_create,
        "action": "user_login",
        "actor": {"type": "user", "user": {"id": "W1", "name": "Charlie", "email": "c@example.com"}},
        "entity": {"type": "user", "user": {"id": "W1", "name": "Charlie", "email": "c@example.com"}},
        "context": {
            "location": {"type": "workspace", "id": "T1", "name": "Birdland", "domain": "birdland"},
            "ua": "curl/8.0",
            "ip_address": "10.0.0.1"
        }
    })
}

#[tokio::test]
async fn test_audit_logs_across_two_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param("cursor", "X"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [audit_entry("e3", 1_559_627_000)],
            "response_metadata": {"next_cursor": ""}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(query_param_is_missing("cursor"))
        .and(query_param("limit", "10"))
        .and(query_param("oldest", "1559626515"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [audit_entry("e1", 1_559_626_515), audit_entry("e2", 1_559_626_600)],
            "response_metadata": {"next_cursor": "X"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config::default()
        .with_env(|key| match key {
            "AUDIT_URL" => Some(server.uri()),
            "ACCESS_TOKEN" => Some("xoxp-test".to_string()),
            _ => None,
        })
        .unwrap();
    let client = AuditClient::new(&config.audit, HttpClientConfig::from_settings(&config.http, false))
        .unwrap();

    let listing = client
        .list_audit_logs(AuditLogQuery::new().limit(10).oldest(1_559_626_515))
        .await;

    assert!(listing.is_complete());
    let ids: Vec<&str> = listing.items.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["e1", "e2", "e3"]);
}

#[tokio::test]
async fn test_audit_unknown_schema_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schemas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schemas": [{"type": "canvas", "canvas": {"id": "string"}}]
        })))
        .mount(&server)
        .await;

    let config = AuditConfig {
        base_url: server.uri(),
        token: Some("xoxp-test".to_string()),
    };
    let client = AuditClient::new(&config, HttpClientConfig::builder()).unwrap();

    assert!(matches!(
        client.schemas().await,
        Err(Error::UnknownSchemaType { kind }) if kind == "canvas"
    ));
}

// ============================================================================
// Directory
// ============================================================================

#[tokio::test]
async fn test_directory_user_with_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v2/users/ad(\||%7C)ldap(\||%7C)yamada_taro$"))
        .and(header("Authorization", "Bearer dir-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "ad|ldap|yamada_taro",
            "nickname": "yamada_taro",
            "name": "Taro Yamada",
            "logins_count": 42,
            "app_metadata": {"lambda_authorizer": true, "apps": ["wiki"]},
            "user_metadata": {"surname": "Yamada", "givenname": "Taro"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = DirectoryConfig {
        endpoint: Some(format!("{}/api/v2/", server.uri())),
        token: Some("dir-token".to_string()),
        ..DirectoryConfig::default()
    };
    let client = DirectoryClient::new(&config, HttpClientConfig::builder()).unwrap();
    let user = client.get_user_by_name("yamada_taro").await.unwrap();

    assert_eq!(user.name.as_deref(), Some("Taro Yamada"));
    assert_eq!(user.logins_count, 42);
    assert_eq!(user.app_meta.unwrap().apps, vec!["wiki"]);
    assert_eq!(user.user_meta.unwrap().givenname.as_deref(), Some("Taro"));
}

// ============================================================================
// HTTP
// ============================================================================

#[tokio::test]
async fn test_rate_limit_is_reported_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get_json::<serde_json::Value>(&format!("{}/busy", server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
}

// ============================================================================
// Object storage
// ============================================================================

struct PagedBucket {
    pages: Mutex<VecDeque<ObjectListPage>>,
}

#[async_trait]
impl ObjectStorageApi for PagedBucket {
    async fn list_keys(
        &self,
        _bucket: &str,
        _prefix: &str,
        _max_keys: i32,
        _token: Option<&str>,
    ) -> Result<ObjectListPage> {
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn read_object(&self, _bucket: &str, key: &str) -> Result<Vec<u8>> {
        Err(Error::cloud("S3", format!("NoSuchKey: {key}")))
    }

    async fn write_object(&self, _bucket: &str, _key: &str, _body: Vec<u8>) -> Result<()> {
        Ok(())
    }

    async fn remove_object(&self, _bucket: &str, _key: &str) -> Result<()> {
        Ok(())
    }
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|k| format!("example-prefix/{k}")).collect()
}

#[tokio::test]
async fn test_storage_listing_across_truncated_pages() {
    let bucket = PagedBucket {
        pages: Mutex::new(VecDeque::from(vec![
            ObjectListPage {
                keys: keys(&["a", "b"]),
                next_token: Some("t1".to_string()),
                is_truncated: true,
            },
            ObjectListPage {
                keys: keys(&["c", "d", "e"]),
                next_token: Some("t2".to_string()),
                is_truncated: true,
            },
            ObjectListPage::default(),
        ])),
    };

    let listing = ObjectStorage::new(bucket)
        .list_objects("example-bucket", "example-prefix")
        .await;

    assert!(listing.is_complete());
    assert_eq!(listing.items, keys(&["a", "b", "c", "d", "e"]));
}

// ============================================================================
// Crypto
// ============================================================================

#[test]
fn test_encoded_aes_round_trip() {
    let key = crypto::generate_key(24).unwrap();
    let sealed = crypto::encrypt_aes_encoded(&key, "パスワード".as_bytes()).unwrap();
    let opened = crypto::decrypt_aes_encoded(&key, &sealed).unwrap();
    assert_eq!(String::from_utf8(opened).unwrap(), "パスワード");
}
