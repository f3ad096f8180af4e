// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # calendula
//!
//! Administrative tooling for three external systems: an identity
//! provider's user directory, a workspace audit-log API, and a handful of
//! AWS services (S3, KMS, SSM, Lambda, CloudWatch Events).
//!
//! ## Features
//!
//! - **One pagination core**: page-number, opaque-cursor and
//!   continuation-token APIs all walk through the same [`pagination::Cursor`]
//! - **Typed payloads**: users with decoded metadata, audit entries, tagged
//!   audit schemas
//! - **Partial listings**: a failure mid-way keeps the pages already fetched
//! - **Cloud ports**: every SDK client sits behind a small trait, so the
//!   service logic runs against in-memory fakes in tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use calendula::audit::{AuditClient, AuditLogQuery};
//! use calendula::config::Config;
//! use calendula::http::HttpClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> calendula::Result<()> {
//!     let config = Config::load(None)?;
//!     let client = AuditClient::new(&config.audit, HttpClientConfig::builder())?;
//!
//!     let listing = client
//!         .list_audit_logs(AuditLogQuery::new().limit(100).action("user_login"))
//!         .await;
//!     for entry in &listing.items {
//!         println!("{} {}", entry.id, entry.action);
//!     }
//!     listing.into_result().map(|_| ())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┬──────────────┬─────────────────────────────────────┐
//! │  directory   │    audit     │               cloud                 │
//! │  users       │  logs        │  storage  keys  parameters          │
//! │  metadata    │  actions     │  functions  events                  │
//! │              │  schemas     │  (port trait + service per SDK)     │
//! ├──────────────┴──────────────┼─────────────────────────────────────┤
//! │            http             │             aws-config              │
//! ├─────────────────────────────┴─────────────────────────────────────┤
//! │       pagination: PageSource → Cursor → collect_all → Listing     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Runtime configuration
pub mod config;

/// HTTP client with rate limiting and response classification
pub mod http;

/// Generic pagination cursor and termination strategies
pub mod pagination;

/// User directory client
pub mod directory;

/// Audit-log client
pub mod audit;

/// AWS service ports and services
pub mod cloud;

/// AES-CTR, base64 and id helpers
pub mod crypto;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
