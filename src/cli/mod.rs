//! CLI module
//!
//! One binary with a subcommand group per tool.
//!
//! # Commands
//!
//! - `directory` - Look up and list directory users
//! - `audit` - List audit logs, actions and schemas
//! - `storage` - List, read, write and delete objects
//! - `keys` - Data keys and envelope encryption
//! - `params` - Parameter store values and tags
//! - `lambda` - Invoke functions and grant invoke permissions
//! - `rules` - Scheduled event rules and their targets
//! - `crypto` - Local AES helpers and id generation

mod commands;
mod runner;

pub use commands::{
    AuditCommand, Cli, Commands, CryptoCommand, DirectoryCommand, KeysCommand, LambdaCommand,
    OutputFormat, ParamsCommand, RulesCommand, StorageCommand,
};
pub use runner::Runner;
