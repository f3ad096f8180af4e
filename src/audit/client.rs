//! Audit API client

use super::schema::{parse_actions, parse_schemas, AuditActions, AuditSchemas};
use super::types::{AuditEntry, AuditLogQuery, AuditLogResponse};
use crate::config::AuditConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfigBuilder, RequestConfig};
use crate::pagination::{collect_all, token_next, Cursor, Listing, Page, PageSource};
use crate::types::Method;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Client for the audit logs API
#[derive(Debug, Clone)]
pub struct AuditClient {
    http: Arc<HttpClient>,
}

impl AuditClient {
    /// Create a client; the token must be configured
    pub fn new(config: &AuditConfig, http: HttpClientConfigBuilder) -> Result<Self> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| Error::missing_field("audit.token"))?;

        let http = HttpClient::with_config(
            http.base_url(config.base_url.as_str())
                .bearer_token(token)
                .build(),
        )?;

        Ok(Self {
            http: Arc::new(http),
        })
    }

    /// Cursor over the audit logs matching `query`
    pub fn audit_logs_paginated(&self, query: AuditLogQuery) -> Cursor<AuditLogPages> {
        let page_size = query.limit;
        let source = AuditLogPages {
            http: Arc::clone(&self.http),
            query,
        };
        Cursor::new(source, String::new(), page_size, None)
    }

    /// List every audit log entry matching `query`
    pub async fn list_audit_logs(&self, query: AuditLogQuery) -> Listing<AuditEntry> {
        let mut cursor = self.audit_logs_paginated(query);
        collect_all(&mut cursor).await
    }

    /// Action names by category
    pub async fn actions(&self) -> Result<AuditActions> {
        let url = self.http.endpoint(&["actions"])?;
        self.http
            .request_decoded(Method::GET, &url, RequestConfig::new(), parse_actions)
            .await
    }

    /// Field type descriptions of every audited object type
    pub async fn schemas(&self) -> Result<AuditSchemas> {
        let url = self.http.endpoint(&["schemas"])?;
        self.http
            .request_decoded(Method::GET, &url, RequestConfig::new(), parse_schemas)
            .await
    }
}

/// Page source for `GET /logs`
#[derive(Debug)]
pub struct AuditLogPages {
    http: Arc<HttpClient>,
    query: AuditLogQuery,
}

impl AuditLogPages {
    /// Filters sent with every page
    pub fn query(&self) -> &AuditLogQuery {
        &self.query
    }

    fn request_config(&self, cursor: &str, page_size: usize) -> RequestConfig {
        let mut config = RequestConfig::new().query("limit", page_size);
        if !cursor.is_empty() {
            config = config.query("cursor", cursor);
        }
        config
            .query_opt("latest", self.query.latest)
            .query_opt("oldest", self.query.oldest)
            .query_opt("action", self.query.action.as_deref())
            .query_opt("actor", self.query.actor.as_deref())
            .query_opt("entity", self.query.entity.as_deref())
    }
}

#[async_trait]
impl PageSource for AuditLogPages {
    type Item = AuditEntry;
    type Position = String;

    async fn fetch_page(&self, cursor: &String, page_size: usize) -> Result<Page<AuditEntry, String>> {
        let url = self.http.endpoint(&["logs"])?;
        let response: AuditLogResponse = self
            .http
            .get_json_with_config(&url, self.request_config(cursor, page_size))
            .await?;

        debug!(
            "GetAuditLogs: got {} entries; next cursor {:?}",
            response.entries.len(),
            response.response_metadata.next_cursor
        );

        Ok(Page {
            next: token_next(&response.response_metadata.next_cursor),
            items: response.entries,
        })
    }
}
