//! Audit logs
//!
//! Lists audit events with server-side filters and reads the action and
//! schema catalogues of the audit API.

mod client;
mod schema;
mod types;

pub use client::{AuditClient, AuditLogPages};
pub use schema::{
    parse_actions, parse_schemas, AppSchema, AuditActions, AuditSchema, AuditSchemas,
    BarrierSchema, ChannelSchema, EnterpriseSchema, FileSchema, UserSchema, WorkflowSchema,
    WorkspaceSchema,
};
pub use types::{
    AuditActor, AuditContext, AuditEntity, AuditEntry, AuditLocation, AuditLogQuery,
    AuditLogResponse, AuditUser, ResponseMetadata, MAX_AUDIT_LIMIT,
};

#[cfg(test)]
mod tests;
