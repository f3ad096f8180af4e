//! Scheduled event rules (CloudWatch Events)

use super::sdk_error;
use crate::error::{Error, Result};
use crate::pagination::{collect_all, optional_token_next, Cursor, Listing, Page, PageSource};
use async_trait::async_trait;
use aws_sdk_cloudwatchevents::types::{RuleState, Target};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

const SERVICE: &str = "CloudWatchEvents";

/// Page size for rule name listings
pub const RULE_NAMES_PER_PAGE: usize = 100;

/// A rule as described by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventRule {
    pub arn: Option<String>,
    pub description: Option<String>,
    pub event_pattern: Option<String>,
    pub managed_by: Option<String>,
    pub name: Option<String>,
    pub role_arn: Option<String>,
    pub schedule_expression: Option<String>,
    pub state: Option<String>,
}

/// A rule to create or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub name: String,
    pub schedule_expression: Option<String>,
    pub event_pattern: Option<String>,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    pub enabled: bool,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schedule_expression: None,
            event_pattern: None,
            description: None,
            role_arn: None,
            enabled: true,
        }
    }

    #[must_use]
    pub fn schedule(mut self, expression: impl Into<String>) -> Self {
        self.schedule_expression = Some(expression.into());
        self
    }

    #[must_use]
    pub fn event_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.event_pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn state(&self) -> &'static str {
        if self.enabled {
            "ENABLED"
        } else {
            "DISABLED"
        }
    }
}

/// A target to attach to a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub id: String,
    pub arn: String,
    /// Constant JSON passed to the target instead of the event
    pub input: Option<String>,
}

/// A target the service refused
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailedTarget {
    pub target_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

/// One `ListRuleNamesByTarget` response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleNamePage {
    pub names: Vec<String>,
    pub next_token: Option<String>,
}

/// Event rule operations used by the tools
#[async_trait]
pub trait EventRulesApi: Send + Sync {
    async fn rule_names_page(
        &self,
        target_arn: &str,
        limit: i32,
        token: Option<&str>,
    ) -> Result<RuleNamePage>;

    async fn rule(&self, name: &str) -> Result<EventRule>;

    /// Returns the rule ARN
    async fn write_rule(&self, rule: &RuleSpec) -> Result<String>;

    /// Returns the entries the service refused
    async fn write_target(&self, rule: &str, target: &TargetSpec) -> Result<Vec<FailedTarget>>;
}

#[async_trait]
impl EventRulesApi for aws_sdk_cloudwatchevents::Client {
    async fn rule_names_page(
        &self,
        target_arn: &str,
        limit: i32,
        token: Option<&str>,
    ) -> Result<RuleNamePage> {
        let output = self
            .list_rule_names_by_target()
            .target_arn(target_arn)
            .limit(limit)
            .set_next_token(token.map(str::to_string))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(RuleNamePage {
            names: output.rule_names().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn rule(&self, name: &str) -> Result<EventRule> {
        let output = self
            .describe_rule()
            .name(name)
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(EventRule {
            arn: output.arn().map(str::to_string),
            description: output.description().map(str::to_string),
            event_pattern: output.event_pattern().map(str::to_string),
            managed_by: output.managed_by().map(str::to_string),
            name: output.name().map(str::to_string),
            role_arn: output.role_arn().map(str::to_string),
            schedule_expression: output.schedule_expression().map(str::to_string),
            state: output.state().map(|state| state.as_str().to_string()),
        })
    }

    async fn write_rule(&self, rule: &RuleSpec) -> Result<String> {
        let output = self
            .put_rule()
            .name(&rule.name)
            .set_schedule_expression(rule.schedule_expression.clone())
            .set_event_pattern(rule.event_pattern.clone())
            .set_description(rule.description.clone())
            .set_role_arn(rule.role_arn.clone())
            .state(RuleState::from(rule.state()))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        output
            .rule_arn()
            .map(str::to_string)
            .ok_or_else(|| Error::cloud(SERVICE, "response carried no rule ARN"))
    }

    async fn write_target(&self, rule: &str, target: &TargetSpec) -> Result<Vec<FailedTarget>> {
        let sdk_target = Target::builder()
            .id(&target.id)
            .arn(&target.arn)
            .set_input(target.input.clone())
            .build()
            .map_err(|e| Error::cloud(SERVICE, e.to_string()))?;

        let output = self
            .put_targets()
            .rule(rule)
            .targets(sdk_target)
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(output
            .failed_entries()
            .iter()
            .map(|entry| FailedTarget {
                target_id: entry.target_id().map(str::to_string),
                error_code: entry.error_code().map(str::to_string),
                error_message: entry.error_message().map(str::to_string),
            })
            .collect())
    }
}

/// Event rule service
#[derive(Debug)]
pub struct EventRules<A> {
    pub(super) api: Arc<A>,
}

impl<A> Clone for EventRules<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: EventRulesApi> EventRules<A> {
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }

    /// Cursor over the names of rules that target `target_arn`
    pub fn rule_names_paginated(&self, target_arn: &str) -> Cursor<RuleNamePages<A>> {
        let source = RuleNamePages {
            api: Arc::clone(&self.api),
            target_arn: target_arn.to_string(),
        };
        Cursor::new(source, None, RULE_NAMES_PER_PAGE, None)
    }

    pub async fn rule_names_by_target(&self, target_arn: &str) -> Listing<String> {
        let mut cursor = self.rule_names_paginated(target_arn);
        collect_all(&mut cursor).await
    }

    pub async fn describe_rule(&self, name: &str) -> Result<EventRule> {
        self.api.rule(name).await
    }

    pub async fn put_rule(&self, rule: &RuleSpec) -> Result<String> {
        let arn = self.api.write_rule(rule).await?;
        info!("Put rule {} ({}): {arn}", rule.name, rule.state());
        Ok(arn)
    }

    /// Attach `target` to `rule`; a refused entry is an error
    pub async fn put_target(&self, rule: &str, target: &TargetSpec) -> Result<()> {
        let failed = self.api.write_target(rule, target).await?;
        if let Some(entry) = failed.first() {
            return Err(Error::cloud(
                SERVICE,
                format!(
                    "target {} rejected: {} {}",
                    entry.target_id.as_deref().unwrap_or(&target.id),
                    entry.error_code.as_deref().unwrap_or_default(),
                    entry.error_message.as_deref().unwrap_or_default()
                )
                .trim_end()
                .to_string(),
            ));
        }
        info!("Put target {} on rule {rule}", target.id);
        Ok(())
    }
}

/// Page source for `ListRuleNamesByTarget`
#[derive(Debug)]
pub struct RuleNamePages<A> {
    api: Arc<A>,
    target_arn: String,
}

#[async_trait]
impl<A: EventRulesApi> PageSource for RuleNamePages<A> {
    type Item = String;
    type Position = Option<String>;

    async fn fetch_page(
        &self,
        token: &Option<String>,
        page_size: usize,
    ) -> Result<Page<String, Option<String>>> {
        let page = self
            .api
            .rule_names_page(&self.target_arn, page_size as i32, token.as_deref())
            .await?;
        debug!(
            "ListRuleNamesByTarget {}: {} rules",
            self.target_arn,
            page.names.len()
        );

        Ok(Page {
            next: optional_token_next(page.next_token.as_deref()),
            items: page.names,
        })
    }
}
