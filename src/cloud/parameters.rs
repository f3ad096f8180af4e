//! Parameter store (SSM)

use super::sdk_error;
use crate::error::{Error, Result};
use crate::pagination::{collect_all, optional_token_next, Cursor, Page, PageSource};
use crate::types::StringMap;
use async_trait::async_trait;
use aws_sdk_ssm::types::{ParameterType, ResourceTypeForTagging, Tag};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

const SERVICE: &str = "SSM";

/// Tagging resource type of a parameter
pub const RESOURCE_PARAMETER: &str = "Parameter";

/// Largest page `GetParametersByPath` returns
pub const MAX_PARAMETERS_PER_PAGE: usize = 10;

/// Most names one `DeleteParameters` call accepts
pub const MAX_DELETE_BATCH: usize = 10;

/// Stored type of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    StringList,
    SecureString,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::StringList => "StringList",
            Self::SecureString => "SecureString",
        }
    }
}

/// A parameter to write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub value: String,
    /// Encrypt with this key; makes the parameter a `SecureString`
    pub key_id: Option<String>,
    /// Store a comma-separated list
    pub is_array: bool,
    pub overwrite: bool,
    pub tags: StringMap,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    #[must_use]
    pub fn array(mut self, is_array: bool) -> Self {
        self.is_array = is_array;
        self
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: StringMap) -> Self {
        self.tags = tags;
        self
    }

    /// A key id wins over the list flag
    pub fn kind(&self) -> ParameterKind {
        if self.key_id.is_some() {
            ParameterKind::SecureString
        } else if self.is_array {
            ParameterKind::StringList
        } else {
            ParameterKind::String
        }
    }
}

/// One `GetParametersByPath` response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPage {
    /// `(name, value)` pairs
    pub parameters: Vec<(String, String)>,
    pub next_token: Option<String>,
}

/// Result of a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: Vec<String>,
    pub invalid: Vec<String>,
}

/// Parameter store operations used by the tools
#[async_trait]
pub trait ParameterStoreApi: Send + Sync {
    async fn write_parameter(&self, spec: &ParameterSpec) -> Result<()>;

    async fn tag_resource(
        &self,
        resource_type: &str,
        resource_id: &str,
        tags: &StringMap,
    ) -> Result<()>;

    async fn parameters_page(
        &self,
        path: &str,
        recursive: bool,
        max_results: i32,
        token: Option<&str>,
    ) -> Result<ParameterPage>;

    async fn resource_tags(&self, resource_type: &str, resource_id: &str) -> Result<StringMap>;

    /// Delete at most [`MAX_DELETE_BATCH`] parameters
    async fn remove_parameters(&self, names: &[String]) -> Result<DeleteOutcome>;
}

fn sdk_tags(tags: &StringMap) -> Result<Vec<Tag>> {
    tags.iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| Error::cloud(SERVICE, e.to_string()))
        })
        .collect()
}

#[async_trait]
impl ParameterStoreApi for aws_sdk_ssm::Client {
    async fn write_parameter(&self, spec: &ParameterSpec) -> Result<()> {
        let tags = if spec.tags.is_empty() {
            None
        } else {
            Some(sdk_tags(&spec.tags)?)
        };

        let output = self
            .put_parameter()
            .name(&spec.name)
            .value(&spec.value)
            .overwrite(spec.overwrite)
            .r#type(ParameterType::from(spec.kind().as_str()))
            .set_key_id(spec.key_id.clone())
            .set_tags(tags)
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        debug!("PutParameter {}: version {:?}", spec.name, output.version());
        Ok(())
    }

    async fn tag_resource(
        &self,
        resource_type: &str,
        resource_id: &str,
        tags: &StringMap,
    ) -> Result<()> {
        self.add_tags_to_resource()
            .resource_type(ResourceTypeForTagging::from(resource_type))
            .resource_id(resource_id)
            .set_tags(Some(sdk_tags(tags)?))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;
        Ok(())
    }

    async fn parameters_page(
        &self,
        path: &str,
        recursive: bool,
        max_results: i32,
        token: Option<&str>,
    ) -> Result<ParameterPage> {
        let output = self
            .get_parameters_by_path()
            .path(path)
            .recursive(recursive)
            .with_decryption(true)
            .max_results(max_results)
            .set_next_token(token.map(str::to_string))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(ParameterPage {
            parameters: output
                .parameters()
                .iter()
                .filter_map(|p| Some((p.name()?.to_string(), p.value()?.to_string())))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn resource_tags(&self, resource_type: &str, resource_id: &str) -> Result<StringMap> {
        let output = self
            .list_tags_for_resource()
            .resource_type(ResourceTypeForTagging::from(resource_type))
            .resource_id(resource_id)
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(output
            .tag_list()
            .iter()
            .map(|tag| (tag.key().to_string(), tag.value().to_string()))
            .collect())
    }

    async fn remove_parameters(&self, names: &[String]) -> Result<DeleteOutcome> {
        let output = self
            .delete_parameters()
            .set_names(Some(names.to_vec()))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(DeleteOutcome {
            deleted: output.deleted_parameters().to_vec(),
            invalid: output.invalid_parameters().to_vec(),
        })
    }
}

/// Parameter store service
#[derive(Debug)]
pub struct ParameterStore<A> {
    pub(super) api: Arc<A>,
}

impl<A> Clone for ParameterStore<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: ParameterStoreApi> ParameterStore<A> {
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }

    pub async fn put_parameter(&self, spec: &ParameterSpec) -> Result<()> {
        self.api.write_parameter(spec).await?;
        info!(
            "Put parameter {} ({}, overwrite={}, tags={:?})",
            spec.name,
            spec.kind().as_str(),
            spec.overwrite,
            spec.tags
        );
        Ok(())
    }

    pub async fn add_tags(&self, resource_type: &str, resource_id: &str, tags: &StringMap) -> Result<()> {
        self.api.tag_resource(resource_type, resource_id, tags).await?;
        info!("Added tags {tags:?} to {resource_id}");
        Ok(())
    }

    /// Cursor over the parameters under `path`
    pub fn parameters_paginated(
        &self,
        path: &str,
        recursive: bool,
        page_size: usize,
    ) -> Cursor<ParameterPages<A>> {
        let source = ParameterPages {
            api: Arc::clone(&self.api),
            path: path.to_string(),
            recursive,
        };
        Cursor::new(
            source,
            None,
            page_size.clamp(1, MAX_PARAMETERS_PER_PAGE),
            None,
        )
    }

    /// Every parameter under `path`, by name
    ///
    /// An empty first page means the path does not exist.
    pub async fn parameters_by_path(
        &self,
        path: &str,
        recursive: bool,
        page_size: usize,
    ) -> Result<StringMap> {
        let mut cursor = self.parameters_paginated(path, recursive, page_size);
        cursor.advance().await?;
        let first = cursor.take_items();
        if first.is_empty() {
            return Err(Error::cloud(SERVICE, format!("parameter {path} not found")));
        }

        let rest = collect_all(&mut cursor).await.into_result()?;
        Ok(first.into_iter().chain(rest).collect())
    }

    pub async fn list_tags(&self, resource_type: &str, resource_id: &str) -> Result<StringMap> {
        self.api.resource_tags(resource_type, resource_id).await
    }

    /// Delete parameters in batches of [`MAX_DELETE_BATCH`]
    pub async fn delete_parameters(&self, names: &[String]) -> Result<DeleteOutcome> {
        let mut outcome = DeleteOutcome::default();
        for batch in names.chunks(MAX_DELETE_BATCH) {
            let result = self.api.remove_parameters(batch).await?;
            outcome.deleted.extend(result.deleted);
            outcome.invalid.extend(result.invalid);
        }
        info!(
            "Deleted parameters {:?}; invalid {:?}",
            outcome.deleted, outcome.invalid
        );
        Ok(outcome)
    }
}

/// Page source for `GetParametersByPath`
#[derive(Debug)]
pub struct ParameterPages<A> {
    api: Arc<A>,
    path: String,
    recursive: bool,
}

#[async_trait]
impl<A: ParameterStoreApi> PageSource for ParameterPages<A> {
    type Item = (String, String);
    type Position = Option<String>;

    async fn fetch_page(
        &self,
        token: &Option<String>,
        page_size: usize,
    ) -> Result<Page<(String, String), Option<String>>> {
        let page = self
            .api
            .parameters_page(&self.path, self.recursive, page_size as i32, token.as_deref())
            .await?;
        debug!(
            "GetParametersByPath {}: {} parameters",
            self.path,
            page.parameters.len()
        );

        Ok(Page {
            next: optional_token_next(page.next_token.as_deref()),
            items: page.parameters,
        })
    }
}
