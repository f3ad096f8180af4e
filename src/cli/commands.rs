//! CLI commands and argument parsing

use crate::audit::MAX_AUDIT_LIMIT;
use crate::cloud::{InvocationKind, DEFAULT_KEY_SPEC, MAX_KEYS_PER_PAGE, MAX_PARAMETERS_PER_PAGE};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Administrative tools for a user directory, an audit-log API and AWS services
#[derive(Parser, Debug)]
#[command(name = "calendula")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output, including request and response dumps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append log output to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// User directory
    Directory {
        #[command(subcommand)]
        command: DirectoryCommand,
    },

    /// Audit logs
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },

    /// Object storage (S3)
    Storage {
        #[command(subcommand)]
        command: StorageCommand,
    },

    /// Data keys and envelope encryption (KMS)
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },

    /// Parameter store (SSM)
    Params {
        #[command(subcommand)]
        command: ParamsCommand,
    },

    /// Functions (Lambda)
    Lambda {
        #[command(subcommand)]
        command: LambdaCommand,
    },

    /// Scheduled event rules (CloudWatch Events)
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Local AES helpers and id generation
    Crypto {
        #[command(subcommand)]
        command: CryptoCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum DirectoryCommand {
    /// Look up a user by directory name
    GetUser {
        #[arg(long)]
        name: String,
    },

    /// List users page by page
    ListUsers {
        /// First page index
        #[arg(long, default_value = "0")]
        start: u32,

        /// Maximum number of users (default: all)
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// List audit log entries
    ListLogs {
        /// Entries per request
        #[arg(long, default_value_t = MAX_AUDIT_LIMIT)]
        limit: usize,

        /// Latest timestamp (unix seconds)
        #[arg(long)]
        latest: Option<i64>,

        /// Oldest timestamp (unix seconds)
        #[arg(long)]
        oldest: Option<i64>,

        #[arg(long)]
        action: Option<String>,

        #[arg(long)]
        actor: Option<String>,

        #[arg(long)]
        entity: Option<String>,
    },

    /// List action names by category
    ListActions,

    /// List entity schemas
    ListSchemas,
}

#[derive(Subcommand, Debug)]
pub enum StorageCommand {
    /// List every key under a prefix
    List {
        #[arg(long)]
        bucket: String,

        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// List one page of keys
    ListPage {
        #[arg(long)]
        bucket: String,

        #[arg(long, default_value = "")]
        prefix: String,

        #[arg(long, default_value_t = MAX_KEYS_PER_PAGE)]
        size: usize,

        /// Continuation token from a previous page
        #[arg(long)]
        marker: Option<String>,
    },

    /// Print an object as text
    Get {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        key: String,
    },

    /// Upload text as an object
    Put {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        key: String,

        /// Object body
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        body: Option<String>,

        /// Read the body from this file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete an object
    Delete {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        key: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Generate a data key under a master key
    NewDataKey {
        #[arg(long)]
        key_id: String,

        #[arg(long, default_value = DEFAULT_KEY_SPEC)]
        key_spec: String,
    },

    /// Encrypt text under a new data key
    Seal {
        #[arg(long)]
        key_id: String,

        #[arg(long)]
        plaintext: String,
    },

    /// Decrypt an envelope produced by `seal`
    Open {
        /// Base64 data key ciphertext blob
        #[arg(long)]
        key: String,

        /// Base64 IV and ciphertext
        #[arg(long)]
        data: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ParamsCommand {
    /// Create or update a parameter
    Put {
        #[arg(long)]
        name: String,

        #[arg(long)]
        value: String,

        /// Encrypt with this key (stores a SecureString)
        #[arg(long)]
        key_id: Option<String>,

        /// Store a comma-separated list
        #[arg(long)]
        array: bool,

        #[arg(long)]
        overwrite: bool,

        /// Tag as key=value (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Print every parameter under a path
    GetByPath {
        #[arg(long)]
        path: String,

        #[arg(long)]
        recursive: bool,

        #[arg(long, default_value_t = MAX_PARAMETERS_PER_PAGE)]
        page_size: usize,
    },

    /// Print the tags of a parameter
    Tags {
        #[arg(long)]
        name: String,
    },

    /// Tag a parameter
    AddTags {
        #[arg(long)]
        name: String,

        /// Tag as key=value (repeatable)
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
    },

    /// Delete parameters
    Delete {
        /// Parameter name (repeatable)
        #[arg(long = "name", required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LambdaCommand {
    /// Invoke a function
    Invoke {
        #[arg(long)]
        function: String,

        /// JSON payload
        #[arg(long, default_value = "{}")]
        payload: String,

        /// Queue the invocation and return without waiting
        #[arg(long = "async")]
        is_async: bool,
    },

    /// Allow a principal to invoke a function
    AddPermission {
        #[arg(long)]
        function: String,

        /// Statement id (default: random)
        #[arg(long)]
        statement_id: Option<String>,

        #[arg(long)]
        action: Option<String>,

        #[arg(long)]
        principal: Option<String>,

        #[arg(long)]
        source_arn: Option<String>,
    },
}

impl LambdaCommand {
    pub(crate) fn invocation_kind(is_async: bool) -> InvocationKind {
        if is_async {
            InvocationKind::Event
        } else {
            InvocationKind::RequestResponse
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List the rules that target a resource
    ListByTarget {
        #[arg(long)]
        arn: String,
    },

    /// Describe a rule
    Describe {
        #[arg(long)]
        name: String,
    },

    /// Create or update a rule
    Put {
        #[arg(long)]
        name: String,

        /// e.g. `cron(0 3 * * ? *)` or `rate(1 hour)`
        #[arg(long)]
        schedule: Option<String>,

        #[arg(long)]
        event_pattern: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        role_arn: Option<String>,

        #[arg(long)]
        disabled: bool,
    },

    /// Attach a target to a rule
    PutTarget {
        #[arg(long)]
        rule: String,

        #[arg(long)]
        id: String,

        #[arg(long)]
        arn: String,

        /// Constant JSON input for the target
        #[arg(long)]
        input: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CryptoCommand {
    /// Encrypt text with a base64 AES key
    Encrypt {
        #[arg(long)]
        key: String,

        #[arg(long)]
        plaintext: String,
    },

    /// Decrypt base64 data with a base64 AES key
    Decrypt {
        #[arg(long)]
        key: String,

        #[arg(long)]
        data: String,
    },

    /// Generate a random AES key
    GenKey {
        /// Key size in bytes (16, 24 or 32)
        #[arg(long, default_value = "32")]
        size: usize,
    },

    /// Generate a random id
    Id {
        /// Short URL-safe id instead of a sortable one
        #[arg(long)]
        short: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON, one document per line
    Json,
    /// Indented JSON
    Pretty,
}
