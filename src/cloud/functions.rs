//! Functions (Lambda)

use super::sdk_error;
use crate::crypto::short_id;
use crate::error::Result;
use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const SERVICE: &str = "Lambda";

/// Action granted when none is given
pub const ACTION_INVOKE: &str = "lambda:InvokeFunction";

/// Principal granted when none is given
pub const PRINCIPAL_EVENTS: &str = "events.amazonaws.com";

/// How a function is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationKind {
    /// Queue the event and return immediately
    Event,
    /// Wait for the function and return its payload
    #[default]
    RequestResponse,
}

impl InvocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::RequestResponse => "RequestResponse",
        }
    }
}

/// Outcome of an invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub status_code: i32,
    /// Set when the function itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_error: Option<String>,
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_version: Option<String>,
}

/// A resource-policy statement to add to a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub function: String,
    pub statement_id: String,
    pub action: String,
    pub principal: String,
    pub source_arn: Option<String>,
}

impl PermissionGrant {
    /// Grant EventBridge permission to invoke `function` under a random statement id
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            statement_id: short_id(),
            action: ACTION_INVOKE.to_string(),
            principal: PRINCIPAL_EVENTS.to_string(),
            source_arn: None,
        }
    }

    #[must_use]
    pub fn statement_id(mut self, statement_id: impl Into<String>) -> Self {
        self.statement_id = statement_id.into();
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    #[must_use]
    pub fn principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = principal.into();
        self
    }

    #[must_use]
    pub fn source_arn(mut self, source_arn: impl Into<String>) -> Self {
        self.source_arn = Some(source_arn.into());
        self
    }
}

/// Function operations used by the tools
#[async_trait]
pub trait FunctionApi: Send + Sync {
    async fn invoke_function(
        &self,
        function: &str,
        payload: &[u8],
        kind: InvocationKind,
    ) -> Result<Invocation>;

    /// Returns the statement the service recorded
    async fn grant_permission(&self, grant: &PermissionGrant) -> Result<Option<String>>;
}

#[async_trait]
impl FunctionApi for aws_sdk_lambda::Client {
    async fn invoke_function(
        &self,
        function: &str,
        payload: &[u8],
        kind: InvocationKind,
    ) -> Result<Invocation> {
        let output = self
            .invoke()
            .function_name(function)
            .invocation_type(InvocationType::from(kind.as_str()))
            .payload(Blob::new(payload.to_vec()))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(Invocation {
            status_code: output.status_code(),
            function_error: output.function_error().map(str::to_string),
            payload: output
                .payload()
                .map(|blob| String::from_utf8_lossy(blob.as_ref()).into_owned()),
            executed_version: output.executed_version().map(str::to_string),
        })
    }

    async fn grant_permission(&self, grant: &PermissionGrant) -> Result<Option<String>> {
        let output = self
            .add_permission()
            .function_name(&grant.function)
            .statement_id(&grant.statement_id)
            .action(&grant.action)
            .principal(&grant.principal)
            .set_source_arn(grant.source_arn.clone())
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(output.statement().map(str::to_string))
    }
}

/// Function service
#[derive(Debug)]
pub struct Functions<A> {
    pub(super) api: Arc<A>,
}

impl<A> Clone for Functions<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: FunctionApi> Functions<A> {
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }

    pub async fn invoke(
        &self,
        function: &str,
        payload: &[u8],
        kind: InvocationKind,
    ) -> Result<Invocation> {
        let invocation = self.api.invoke_function(function, payload, kind).await?;
        match &invocation.function_error {
            Some(error) => warn!("Invoked {function}: function error {error}"),
            None => info!(
                "Invoked {function} ({}): status {}",
                kind.as_str(),
                invocation.status_code
            ),
        }
        Ok(invocation)
    }

    pub async fn add_permission(&self, grant: &PermissionGrant) -> Result<Option<String>> {
        let statement = self.api.grant_permission(grant).await?;
        info!(
            "Granted {} to {} on {} as {}",
            grant.action, grant.principal, grant.function, grant.statement_id
        );
        Ok(statement)
    }
}
