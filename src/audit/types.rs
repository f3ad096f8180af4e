//! Audit log records and query filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Largest `limit` the logs endpoint accepts, also the default
pub const MAX_AUDIT_LIMIT: usize = 9999;

// ============================================================================
// Entries
// ============================================================================

/// One audit event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(default)]
    pub id: String,
    /// Unix timestamp in seconds
    #[serde(default)]
    pub date_create: i64,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub actor: AuditActor,
    #[serde(default)]
    pub entity: AuditEntity,
    #[serde(default)]
    pub context: AuditContext,
}

impl AuditEntry {
    /// Creation time, if the timestamp is representable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date_create, 0)
    }
}

/// Who performed the action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user: AuditUser,
}

/// What the action was performed on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntity {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user: AuditUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Where the action came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    #[serde(default, rename = "ua")]
    pub user_agent: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub location: AuditLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLocation {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
}

/// Body of `GET /logs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogResponse {
    #[serde(default)]
    pub entries: Vec<AuditEntry>,
    #[serde(default)]
    pub response_metadata: ResponseMetadata,
}

/// Pagination metadata of a list response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    /// Empty on the last page; `null` decodes as empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub next_cursor: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Query
// ============================================================================

/// Filters for an audit log listing
///
/// Every filter is sent unchanged with each page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Entries requested per page, at most [`MAX_AUDIT_LIMIT`]
    pub limit: usize,
    /// Most recent event to include (inclusive, unix seconds)
    pub latest: Option<i64>,
    /// Least recent event to include (inclusive, unix seconds)
    pub oldest: Option<i64>,
    pub action: Option<String>,
    pub actor: Option<String>,
    pub entity: Option<String>,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            limit: MAX_AUDIT_LIMIT,
            latest: None,
            oldest: None,
            action: None,
            actor: None,
            entity: None,
        }
    }
}

impl AuditLogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries per page; clamped to `1..=9999`
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_AUDIT_LIMIT);
        self
    }

    #[must_use]
    pub fn latest(mut self, latest: i64) -> Self {
        self.latest = Some(latest);
        self
    }

    #[must_use]
    pub fn oldest(mut self, oldest: i64) -> Self {
        self.oldest = Some(oldest);
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    #[must_use]
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}
