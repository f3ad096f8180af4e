//! User directory
//!
//! Looks up and lists users of an identity provider's management API.

mod client;
mod types;

pub use client::{DirectoryClient, UserPages, MAX_USERS_PER_PAGE};
pub use types::{parse_user, parse_users, AppMetadata, Identity, User, UserMetadata};

#[cfg(test)]
mod tests;
