//! Object storage (S3)

use super::sdk_error;
use crate::error::{Error, Result};
use crate::pagination::{collect_all, truncation_next, Cursor, Listing, Page, PageSource};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use std::sync::Arc;
use tracing::{debug, info};

const SERVICE: &str = "S3";

/// Page size for bulk listings; also the service maximum
pub const MAX_KEYS_PER_PAGE: usize = 1000;

/// One `ListObjectsV2` response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListPage {
    pub keys: Vec<String>,
    pub next_token: Option<String>,
    pub is_truncated: bool,
}

/// Object storage operations used by the tools
#[async_trait]
pub trait ObjectStorageApi: Send + Sync {
    /// List up to `max_keys` keys under `prefix`, continuing from `token`
    async fn list_keys(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
        token: Option<&str>,
    ) -> Result<ObjectListPage>;

    /// Read a whole object
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Create or replace an object
    async fn write_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    /// Delete an object
    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()>;
}

#[async_trait]
impl ObjectStorageApi for aws_sdk_s3::Client {
    async fn list_keys(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
        token: Option<&str>,
    ) -> Result<ObjectListPage> {
        let output = self
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(max_keys)
            .set_continuation_token(token.map(str::to_string))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        Ok(ObjectListPage {
            keys: output
                .contents()
                .iter()
                .filter_map(|object| object.key().map(str::to_string))
                .collect(),
            next_token: output.next_continuation_token().map(str::to_string),
            is_truncated: output.is_truncated().unwrap_or_default(),
        })
    }

    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let output = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Error::cloud(SERVICE, e.to_string()))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn write_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(SERVICE, e))?;
        Ok(())
    }
}

/// Object storage service
#[derive(Debug)]
pub struct ObjectStorage<A> {
    pub(super) api: Arc<A>,
}

impl<A> Clone for ObjectStorage<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: ObjectStorageApi> ObjectStorage<A> {
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }

    /// Cursor over the keys under `prefix`
    pub fn objects_paginated(
        &self,
        bucket: &str,
        prefix: &str,
        page_size: usize,
    ) -> Cursor<ObjectPages<A>> {
        let source = ObjectPages {
            api: Arc::clone(&self.api),
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        };
        Cursor::new(source, None, page_size.min(MAX_KEYS_PER_PAGE), None)
    }

    /// Every key under `prefix`
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Listing<String> {
        let mut cursor = self.objects_paginated(bucket, prefix, MAX_KEYS_PER_PAGE);
        collect_all(&mut cursor).await
    }

    /// One page of keys starting after `marker`
    ///
    /// Returns the keys, the marker of the following page and whether the
    /// listing was truncated.
    pub async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        size: usize,
        marker: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>, bool)> {
        let page = self
            .api
            .list_keys(bucket, prefix, page_limit(size), marker)
            .await?;
        Ok((page.keys, page.next_token, page.is_truncated))
    }

    /// Read an object as UTF-8 text
    pub async fn get_object_text(&self, bucket: &str, key: &str) -> Result<String> {
        let body = self.api.read_object(bucket, key).await?;
        String::from_utf8(body).map_err(Error::decode::<String>)
    }

    pub async fn put_object_text(&self, bucket: &str, key: &str, body: &str) -> Result<()> {
        self.api
            .write_object(bucket, key, body.as_bytes().to_vec())
            .await?;
        info!("Uploaded s3://{bucket}/{key} ({} bytes)", body.len());
        Ok(())
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.api.remove_object(bucket, key).await?;
        info!("Deleted s3://{bucket}/{key}");
        Ok(())
    }
}

fn page_limit(size: usize) -> i32 {
    size.clamp(1, MAX_KEYS_PER_PAGE) as i32
}

/// Page source for `ListObjectsV2`
#[derive(Debug)]
pub struct ObjectPages<A> {
    api: Arc<A>,
    bucket: String,
    prefix: String,
}

#[async_trait]
impl<A: ObjectStorageApi> PageSource for ObjectPages<A> {
    type Item = String;
    type Position = Option<String>;

    async fn fetch_page(
        &self,
        token: &Option<String>,
        page_size: usize,
    ) -> Result<Page<String, Option<String>>> {
        let page = self
            .api
            .list_keys(&self.bucket, &self.prefix, page_limit(page_size), token.as_deref())
            .await?;
        debug!(
            "ListObjects: {} keys from s3://{}/{} (truncated: {})",
            page.keys.len(),
            self.bucket,
            self.prefix,
            page.is_truncated
        );

        Ok(Page {
            next: truncation_next(page.is_truncated, page.next_token.as_deref()),
            items: page.keys,
        })
    }
}
