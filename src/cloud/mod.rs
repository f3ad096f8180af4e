//! Cloud services
//!
//! Each AWS service the tools touch is reached through a small port trait
//! (`*Api`) implemented for the SDK client, and a service struct that owns
//! the behaviour: paging, batching, logging and error mapping. Tests swap
//! the SDK client for an in-memory fake.

mod events;
mod functions;
mod keys;
mod parameters;
mod storage;

pub use events::{
    EventRule, EventRules, EventRulesApi, FailedTarget, RuleNamePage, RuleNamePages, RuleSpec,
    TargetSpec, RULE_NAMES_PER_PAGE,
};
pub use functions::{
    FunctionApi, Functions, Invocation, InvocationKind, PermissionGrant, ACTION_INVOKE,
    PRINCIPAL_EVENTS,
};
pub use keys::{DataKey, Envelope, KeyManagementApi, KeyVault, DEFAULT_KEY_SPEC};
pub use parameters::{
    DeleteOutcome, ParameterKind, ParameterPage, ParameterPages, ParameterSpec, ParameterStore,
    ParameterStoreApi, MAX_DELETE_BATCH, MAX_PARAMETERS_PER_PAGE, RESOURCE_PARAMETER,
};
pub use storage::{ObjectListPage, ObjectPages, ObjectStorage, ObjectStorageApi, MAX_KEYS_PER_PAGE};

use crate::config::CloudConfig;
use crate::error::Error;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

/// Load SDK configuration from the environment, applying overrides
pub async fn load_sdk_config(config: &CloudConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    let sdk_config = loader.load().await;
    debug!("Cloud region: {:?}", sdk_config.region());
    sdk_config
}

/// Map an SDK error to [`Error::Cloud`], keeping its whole source chain
pub(crate) fn sdk_error<E>(service: &str, error: E) -> Error
where
    E: std::error::Error + 'static,
{
    Error::cloud(
        service,
        aws_sdk_s3::error::DisplayErrorContext(error).to_string(),
    )
}
