//! Directory user records
//!
//! Users are decoded in two stages: the envelope first, keeping
//! `app_metadata` and `user_metadata` as raw JSON, then each metadata blob
//! into its typed form.

use crate::error::{Error, Result};
use crate::http::decode_json;
use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A directory user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dn: Option<String>,
    #[serde(default, rename = "organizationUnits")]
    pub organization_units: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub groups: Vec<JsonValue>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub last_ip: Option<String>,
    #[serde(default)]
    pub logins_count: u64,
    #[serde(default)]
    pub identities: Vec<Identity>,

    /// Undecoded `app_metadata`
    #[serde(default, rename = "app_metadata")]
    pub raw_app_metadata: Option<JsonValue>,
    /// Undecoded `user_metadata`
    #[serde(default, rename = "user_metadata")]
    pub raw_user_metadata: Option<JsonValue>,

    /// Typed `app_metadata`, filled by [`parse_user`]
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub app_meta: Option<AppMetadata>,
    /// Typed `user_metadata`, filled by [`parse_user`]
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub user_meta: Option<UserMetadata>,
}

/// One linked identity of a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, rename = "isSocial")]
    pub is_social: bool,
    #[serde(default)]
    pub connection: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub user_id: String,
}

/// Application authorization attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub lambda_authorizer: bool,
    #[serde(default)]
    pub apps: Vec<String>,
}

/// Personal name attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub givenname: Option<String>,
}

impl User {
    /// Decode the raw metadata blobs into their typed forms
    pub fn decode_metadata(&mut self) -> Result<()> {
        self.app_meta = decode_blob(self.raw_app_metadata.as_ref())?;
        self.user_meta = decode_blob(self.raw_user_metadata.as_ref())?;
        Ok(())
    }
}

fn decode_blob<T: DeserializeOwned>(raw: Option<&JsonValue>) -> Result<Option<T>> {
    match raw {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => T::deserialize(value).map(Some).map_err(Error::decode::<T>),
    }
}

/// Decode one user, including its metadata
pub fn parse_user(body: &[u8]) -> Result<User> {
    let mut user: User = decode_json(body)?;
    user.decode_metadata()?;
    Ok(user)
}

/// Decode a list of users; any bad record fails the whole list
pub fn parse_users(body: &[u8]) -> Result<Vec<User>> {
    let mut users: Vec<User> = decode_json(body)?;
    for user in &mut users {
        user.decode_metadata()?;
    }
    Ok(users)
}
