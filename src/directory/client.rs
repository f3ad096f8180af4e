//! Directory API client

use super::types::{parse_user, parse_users, User};
use crate::config::DirectoryConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfigBuilder, RequestConfig};
use crate::pagination::{collect_all, page_number_next, Cursor, Listing, Page, PageSource};
use crate::types::Method;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Largest `per_page` the users endpoint accepts
pub const MAX_USERS_PER_PAGE: usize = 100;

/// Client for the user directory management API
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: Arc<HttpClient>,
    provider: String,
    connection: String,
}

impl DirectoryClient {
    /// Create a client; endpoint and token must be configured
    pub fn new(config: &DirectoryConfig, http: HttpClientConfigBuilder) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::missing_field("directory.endpoint"))?;
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| Error::missing_field("directory.token"))?;

        let http = HttpClient::with_config(http.base_url(endpoint).bearer_token(token).build())?;

        Ok(Self {
            http: Arc::new(http),
            provider: config.provider.clone(),
            connection: config.connection.clone(),
        })
    }

    /// Full user id for a directory user name
    pub fn user_id(&self, name: &str) -> String {
        format!("{}|{}|{}", self.provider, self.connection, name)
    }

    /// Look up one user by its directory name
    pub async fn get_user_by_name(&self, name: &str) -> Result<User> {
        if name.is_empty() {
            return Err(Error::Other("user name must not be empty".to_string()));
        }
        let user_id = self.user_id(name);
        let url = self.http.endpoint(&["users", user_id.as_str()])?;
        self.http
            .request_decoded(Method::GET, &url, RequestConfig::new(), parse_user)
            .await
    }

    /// Cursor over users starting at page `start`
    ///
    /// `limit` caps the total number of users; `None` lists everything.
    pub fn users_paginated(&self, start: u32, limit: Option<usize>) -> Cursor<UserPages> {
        let per_page = limit.map_or(MAX_USERS_PER_PAGE, |l| l.min(MAX_USERS_PER_PAGE));
        let source = UserPages {
            http: Arc::clone(&self.http),
            per_page: per_page.max(1),
        };
        Cursor::new(source, start, per_page, limit)
    }

    /// List users from page `start` until the directory or the budget runs out
    pub async fn list_users(&self, start: u32, limit: Option<usize>) -> Listing<User> {
        let mut cursor = self.users_paginated(start, limit);
        collect_all(&mut cursor).await
    }
}

/// Page source for `GET /users?page=N&per_page=M`
///
/// `per_page` stays fixed across requests so page indexes keep addressing
/// the same offsets; a smaller request from the cursor is served by
/// truncating the page locally.
#[derive(Debug)]
pub struct UserPages {
    http: Arc<HttpClient>,
    per_page: usize,
}

#[async_trait]
impl PageSource for UserPages {
    type Item = User;
    type Position = u32;

    async fn fetch_page(&self, page: &u32, page_size: usize) -> Result<Page<User, u32>> {
        let url = self.http.endpoint(&["users"])?;
        let config = RequestConfig::new()
            .query("page", page)
            .query("per_page", self.per_page);

        let mut users = self
            .http
            .request_decoded(Method::GET, &url, config, parse_users)
            .await?;
        debug!("ListUsers: {} users on page {page}", users.len());

        let next = page_number_next(*page, users.len(), self.per_page);
        users.truncate(page_size);
        Ok(Page { items: users, next })
    }
}
