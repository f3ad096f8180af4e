//! Audit action and schema catalogues
//!
//! `GET /schemas` returns a list of entries tagged by `type`, each carrying
//! its payload under a key of the same name:
//!
//! ```json
//! {"schemas": [{"type": "workspace", "workspace": {"id": "string", ...}}]}
//! ```
//!
//! Field values describe the JSON type of the corresponding audit field.

use crate::error::{Error, Result};
use crate::http::decode_json;
use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Actions
// ============================================================================

/// Action names grouped by category
pub type AuditActions = BTreeMap<String, Vec<String>>;

#[derive(Deserialize)]
struct ActionsResponse {
    #[serde(default)]
    actions: AuditActions,
}

/// Decode the body of `GET /actions`
pub fn parse_actions(body: &[u8]) -> Result<AuditActions> {
    let response: ActionsResponse = decode_json(body)?;
    Ok(response.actions)
}

// ============================================================================
// Schema Variants
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub filetype: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub privacy: String,
    #[serde(default)]
    pub is_shared: String,
    #[serde(default)]
    pub is_org_shared: String,
    #[serde(default)]
    pub teams_shared_with: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_distributed: String,
    #[serde(default)]
    pub is_directory_approved: String,
    #[serde(default)]
    pub is_workflow_app: String,
    #[serde(default)]
    pub scopes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierSchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub primary_usergroup: String,
    #[serde(default)]
    pub barriered_from_usergroup: String,
    #[serde(default)]
    pub restricted_subjects: String,
}

/// One schema entry, by type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuditSchema {
    Workspace(WorkspaceSchema),
    Enterprise(EnterpriseSchema),
    User(UserSchema),
    File(FileSchema),
    Channel(ChannelSchema),
    App(AppSchema),
    Workflow(WorkflowSchema),
    Barrier(BarrierSchema),
}

impl AuditSchema {
    /// Decode the payload of an entry tagged `kind`
    pub fn from_tagged(kind: &str, payload: &JsonValue) -> Result<Self> {
        Ok(match kind {
            "workspace" => Self::Workspace(decode_payload(payload)?),
            "enterprise" => Self::Enterprise(decode_payload(payload)?),
            "user" => Self::User(decode_payload(payload)?),
            "file" => Self::File(decode_payload(payload)?),
            "channel" => Self::Channel(decode_payload(payload)?),
            "app" => Self::App(decode_payload(payload)?),
            "workflow" => Self::Workflow(decode_payload(payload)?),
            "barrier" => Self::Barrier(decode_payload(payload)?),
            other => {
                return Err(Error::UnknownSchemaType {
                    kind: other.to_string(),
                })
            }
        })
    }

    /// The `type` tag of this entry
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workspace(_) => "workspace",
            Self::Enterprise(_) => "enterprise",
            Self::User(_) => "user",
            Self::File(_) => "file",
            Self::Channel(_) => "channel",
            Self::App(_) => "app",
            Self::Workflow(_) => "workflow",
            Self::Barrier(_) => "barrier",
        }
    }
}

fn decode_payload<T: DeserializeOwned>(payload: &JsonValue) -> Result<T> {
    T::deserialize(payload).map_err(Error::decode::<T>)
}

// ============================================================================
// Catalogue
// ============================================================================

/// Every schema returned by `GET /schemas`, in server order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSchemas {
    pub schemas: Vec<AuditSchema>,
}

#[derive(Deserialize)]
struct SchemasResponse {
    #[serde(default)]
    schemas: Vec<RawSchema>,
}

#[derive(Deserialize)]
struct RawSchema {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    payloads: BTreeMap<String, JsonValue>,
}

/// Decode the body of `GET /schemas`
///
/// An entry whose type is unknown or whose payload is missing fails the
/// whole catalogue.
pub fn parse_schemas(body: &[u8]) -> Result<AuditSchemas> {
    let response: SchemasResponse = decode_json(body)?;
    let schemas = response
        .schemas
        .iter()
        .map(|raw| {
            let payload = raw.payloads.get(&raw.kind).ok_or_else(|| {
                Error::decode::<AuditSchema>(format!("no '{}' payload", raw.kind))
            })?;
            AuditSchema::from_tagged(&raw.kind, payload)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(AuditSchemas { schemas })
}

impl AuditSchemas {
    pub fn workspace(&self) -> Option<&WorkspaceSchema> {
        self.schemas.iter().find_map(|s| match s {
            AuditSchema::Workspace(v) => Some(v),
            _ => None,
        })
    }

    pub fn enterprise(&self) -> Option<&EnterpriseSchema> {
        self.schemas.iter().find_map(|s| match s {
            AuditSchema::Enterprise(v) => Some(v),
            _ => None,
        })
    }

    pub fn user(&self) -> Option<&UserSchema> {
        self.schemas.iter().find_map(|s| match s {
            AuditSchema::User(v) => Some(v),
            _ => None,
        })
    }

    pub fn file(&self) -> Option<&FileSchema> {
        self.schemas.iter().find_map(|s| match s {
            AuditSchema::File(v) => Some(v),
            _ => None,
        })
    }

    pub fn channel(&self) -> Option<&ChannelSchema> {
        self.schemas.iter().find_map(|s| match s {
            AuditSchema::Channel(v) => Some(v),
            _ => None,
        })
    }

    pub fn app(&self) -> Option<&AppSchema> {
        self.schemas.iter().find_map(|s| match s {
            AuditSchema::App(v) => Some(v),
            _ => None,
        })
    }

    pub fn workflow(&self) -> Option<&WorkflowSchema> {
        self.schemas.iter().find_map(|s| match s {
            AuditSchema::Workflow(v) => Some(v),
            _ => None,
        })
    }

    pub fn barrier(&self) -> Option<&BarrierSchema> {
        self.schemas.iter().find_map(|s| match s {
            AuditSchema::Barrier(v) => Some(v),
            _ => None,
        })
    }
}
