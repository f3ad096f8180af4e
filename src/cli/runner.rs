//! CLI runner - executes commands

use crate::audit::{AuditClient, AuditLogQuery};
use crate::cli::commands::{
    AuditCommand, Cli, Commands, CryptoCommand, DirectoryCommand, KeysCommand, LambdaCommand,
    OutputFormat, ParamsCommand, RulesCommand, StorageCommand,
};
use crate::cloud::{
    load_sdk_config, EventRules, EventRulesApi, FunctionApi, Functions, KeyManagementApi,
    KeyVault, ObjectStorage, ObjectStorageApi, ParameterSpec, ParameterStore, ParameterStoreApi,
    PermissionGrant, RuleSpec, TargetSpec, RESOURCE_PARAMETER,
};
use crate::config::Config;
use crate::crypto;
use crate::directory::DirectoryClient;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, HttpClientConfigBuilder};
use crate::pagination::Listing;
use crate::types::parse_key_values;
use aws_config::SdkConfig;
use serde::Serialize;
use serde_json::json;

/// CLI runner
pub struct Runner {
    cli: Cli,
    config: Config,
}

impl Runner {
    /// Create a runner, loading configuration from `--config` and the environment
    pub fn new(cli: Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        Ok(Self::with_config(cli, config))
    }

    /// Create a runner with an explicit configuration
    pub fn with_config(cli: Cli, config: Config) -> Self {
        Self { cli, config }
    }

    /// Whether request/response dumps are enabled
    pub fn debug(&self) -> bool {
        self.config.debug || self.cli.verbose
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let Some(command) = &self.cli.command else {
            return Err(Error::config("no command given"));
        };

        match command {
            Commands::Directory { command } => self.directory(command).await,
            Commands::Audit { command } => self.audit(command).await,
            Commands::Storage { command } => {
                let sdk = self.sdk_config().await;
                let storage = ObjectStorage::new(aws_sdk_s3::Client::new(&sdk));
                self.storage(&storage, command).await
            }
            Commands::Keys { command } => {
                let sdk = self.sdk_config().await;
                let vault = KeyVault::new(aws_sdk_kms::Client::new(&sdk));
                self.keys(&vault, command).await
            }
            Commands::Params { command } => {
                let sdk = self.sdk_config().await;
                let store = ParameterStore::new(aws_sdk_ssm::Client::new(&sdk));
                self.params(&store, command).await
            }
            Commands::Lambda { command } => {
                let sdk = self.sdk_config().await;
                let functions = Functions::new(aws_sdk_lambda::Client::new(&sdk));
                self.lambda(&functions, command).await
            }
            Commands::Rules { command } => {
                let sdk = self.sdk_config().await;
                let rules = EventRules::new(aws_sdk_cloudwatchevents::Client::new(&sdk));
                self.rules(&rules, command).await
            }
            Commands::Crypto { command } => self.crypto(command),
        }
    }

    fn http_config(&self) -> HttpClientConfigBuilder {
        HttpClientConfig::from_settings(&self.config.http, self.debug())
    }

    async fn sdk_config(&self) -> SdkConfig {
        load_sdk_config(&self.config.cloud).await
    }

    // ========================================================================
    // Directory and audit
    // ========================================================================

    async fn directory(&self, command: &DirectoryCommand) -> Result<()> {
        let client = DirectoryClient::new(&self.config.directory, self.http_config())?;
        match command {
            DirectoryCommand::GetUser { name } => {
                let user = client.get_user_by_name(name).await?;
                self.output(&user)
            }
            DirectoryCommand::ListUsers { start, limit } => {
                let listing = client.list_users(*start, *limit).await;
                self.output_listing(listing)
            }
        }
    }

    async fn audit(&self, command: &AuditCommand) -> Result<()> {
        let client = AuditClient::new(&self.config.audit, self.http_config())?;
        match command {
            AuditCommand::ListLogs {
                limit,
                latest,
                oldest,
                action,
                actor,
                entity,
            } => {
                let query = AuditLogQuery {
                    latest: *latest,
                    oldest: *oldest,
                    action: action.clone(),
                    actor: actor.clone(),
                    entity: entity.clone(),
                    ..AuditLogQuery::new()
                }
                .limit(*limit);
                let listing = client.list_audit_logs(query).await;
                self.output_listing(listing)
            }
            AuditCommand::ListActions => self.output(&client.actions().await?),
            AuditCommand::ListSchemas => self.output(&client.schemas().await?),
        }
    }

    // ========================================================================
    // Cloud services
    // ========================================================================

    async fn storage<A: ObjectStorageApi>(
        &self,
        storage: &ObjectStorage<A>,
        command: &StorageCommand,
    ) -> Result<()> {
        match command {
            StorageCommand::List { bucket, prefix } => {
                let listing = storage.list_objects(bucket, prefix).await;
                self.output_listing(listing)
            }
            StorageCommand::ListPage {
                bucket,
                prefix,
                size,
                marker,
            } => {
                let (keys, next, truncated) = storage
                    .list_objects_page(bucket, prefix, *size, marker.as_deref())
                    .await?;
                self.output(&json!({
                    "keys": keys,
                    "next_marker": next,
                    "is_truncated": truncated,
                }))
            }
            StorageCommand::Get { bucket, key } => {
                let text = storage.get_object_text(bucket, key).await?;
                self.output(&text)
            }
            StorageCommand::Put {
                bucket,
                key,
                body,
                file,
            } => {
                let body = match (body, file) {
                    (Some(body), _) => body.clone(),
                    (None, Some(path)) => std::fs::read_to_string(path)?,
                    (None, None) => return Err(Error::config("--body or --file is required")),
                };
                storage.put_object_text(bucket, key, &body).await?;
                self.output(&json!({"bucket": bucket, "key": key, "size": body.len()}))
            }
            StorageCommand::Delete { bucket, key } => {
                storage.delete_object(bucket, key).await?;
                self.output(&json!({"bucket": bucket, "key": key, "deleted": true}))
            }
        }
    }

    async fn keys<A: KeyManagementApi>(
        &self,
        vault: &KeyVault<A>,
        command: &KeysCommand,
    ) -> Result<()> {
        match command {
            KeysCommand::NewDataKey { key_id, key_spec } => {
                let key = vault.new_data_key(key_id, key_spec).await?;
                self.output(&json!({
                    "plaintext": crypto::encode_base64(&key.plaintext),
                    "ciphertext": crypto::encode_base64(&key.ciphertext),
                }))
            }
            KeysCommand::Seal { key_id, plaintext } => {
                let envelope = vault.seal(key_id, plaintext.as_bytes()).await?;
                self.output(&envelope)
            }
            KeysCommand::Open { key, data } => {
                let envelope = crate::cloud::Envelope {
                    key: key.clone(),
                    data: data.clone(),
                };
                let plaintext = vault.open(&envelope).await?;
                self.output(&String::from_utf8_lossy(&plaintext))
            }
        }
    }

    async fn params<A: ParameterStoreApi>(
        &self,
        store: &ParameterStore<A>,
        command: &ParamsCommand,
    ) -> Result<()> {
        match command {
            ParamsCommand::Put {
                name,
                value,
                key_id,
                array,
                overwrite,
                tags,
            } => {
                let mut spec = ParameterSpec::new(name, value)
                    .array(*array)
                    .overwrite(*overwrite)
                    .tags(parse_key_values(tags)?);
                if let Some(key_id) = key_id {
                    spec = spec.key_id(key_id);
                }
                store.put_parameter(&spec).await?;
                self.output(&json!({"name": name, "type": spec.kind().as_str()}))
            }
            ParamsCommand::GetByPath {
                path,
                recursive,
                page_size,
            } => {
                let params = store.parameters_by_path(path, *recursive, *page_size).await?;
                self.output(&params)
            }
            ParamsCommand::Tags { name } => {
                let tags = store.list_tags(RESOURCE_PARAMETER, name).await?;
                self.output(&tags)
            }
            ParamsCommand::AddTags { name, tags } => {
                let tags = parse_key_values(tags)?;
                store.add_tags(RESOURCE_PARAMETER, name, &tags).await?;
                self.output(&tags)
            }
            ParamsCommand::Delete { names } => {
                let outcome = store.delete_parameters(names).await?;
                self.output(&outcome)
            }
        }
    }

    async fn lambda<A: FunctionApi>(
        &self,
        functions: &Functions<A>,
        command: &LambdaCommand,
    ) -> Result<()> {
        match command {
            LambdaCommand::Invoke {
                function,
                payload,
                is_async,
            } => {
                let kind = LambdaCommand::invocation_kind(*is_async);
                let invocation = functions.invoke(function, payload.as_bytes(), kind).await?;
                self.output(&invocation)?;
                match invocation.function_error {
                    Some(error) => Err(Error::cloud(
                        "Lambda",
                        format!("{function} failed: {error}"),
                    )),
                    None => Ok(()),
                }
            }
            LambdaCommand::AddPermission {
                function,
                statement_id,
                action,
                principal,
                source_arn,
            } => {
                let mut grant = PermissionGrant::new(function);
                if let Some(statement_id) = statement_id {
                    grant = grant.statement_id(statement_id);
                }
                if let Some(action) = action {
                    grant = grant.action(action);
                }
                if let Some(principal) = principal {
                    grant = grant.principal(principal);
                }
                if let Some(source_arn) = source_arn {
                    grant = grant.source_arn(source_arn);
                }
                let statement = functions.add_permission(&grant).await?;
                self.output(&json!({
                    "statement_id": grant.statement_id,
                    "statement": statement,
                }))
            }
        }
    }

    async fn rules<A: EventRulesApi>(
        &self,
        rules: &EventRules<A>,
        command: &RulesCommand,
    ) -> Result<()> {
        match command {
            RulesCommand::ListByTarget { arn } => {
                let listing = rules.rule_names_by_target(arn).await;
                self.output_listing(listing)
            }
            RulesCommand::Describe { name } => self.output(&rules.describe_rule(name).await?),
            RulesCommand::Put {
                name,
                schedule,
                event_pattern,
                description,
                role_arn,
                disabled,
            } => {
                let spec = RuleSpec {
                    schedule_expression: schedule.clone(),
                    event_pattern: event_pattern.clone(),
                    description: description.clone(),
                    role_arn: role_arn.clone(),
                    ..RuleSpec::new(name)
                }
                .enabled(!*disabled);
                let arn = rules.put_rule(&spec).await?;
                self.output(&json!({"rule_arn": arn}))
            }
            RulesCommand::PutTarget {
                rule,
                id,
                arn,
                input,
            } => {
                let target = TargetSpec {
                    id: id.clone(),
                    arn: arn.clone(),
                    input: input.clone(),
                };
                rules.put_target(rule, &target).await?;
                self.output(&json!({"rule": rule, "target_id": id}))
            }
        }
    }

    // ========================================================================
    // Local helpers
    // ========================================================================

    fn crypto(&self, command: &CryptoCommand) -> Result<()> {
        match command {
            CryptoCommand::Encrypt { key, plaintext } => {
                let data = crypto::encrypt_aes_encoded(key, plaintext.as_bytes())?;
                self.output(&json!({ "data": data }))
            }
            CryptoCommand::Decrypt { key, data } => {
                let plaintext = crypto::decrypt_aes_encoded(key, data)?;
                self.output(&String::from_utf8_lossy(&plaintext))
            }
            CryptoCommand::GenKey { size } => {
                self.output(&json!({ "key": crypto::generate_key(*size)? }))
            }
            CryptoCommand::Id { short } => {
                let id = if *short {
                    crypto::short_id()
                } else {
                    crypto::rand_id()
                };
                self.output(&json!({ "id": id }))
            }
        }
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Serialize a value in the selected format
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        })
    }

    fn output<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", self.render(value)?);
        Ok(())
    }

    /// Print whatever was collected, then surface the error that stopped the listing
    fn output_listing<T: Serialize>(&self, listing: Listing<T>) -> Result<()> {
        self.output(&listing.items)?;
        match listing.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::Value;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runner(args: &[&str], config: Config) -> Runner {
        let cli = Cli::try_parse_from(std::iter::once("calendula").chain(args.iter().copied()))
            .unwrap();
        Runner::with_config(cli, config)
    }

    #[test]
    fn test_render_formats() {
        let value = json!({"a": 1});
        let compact = runner(&["crypto", "id"], Config::default());
        assert_eq!(compact.render(&value).unwrap(), r#"{"a":1}"#);

        let pretty = runner(&["crypto", "id", "--format", "pretty"], Config::default());
        assert_eq!(pretty.render(&value).unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_debug_from_flag_or_config() {
        assert!(!runner(&["crypto", "id"], Config::default()).debug());
        assert!(runner(&["crypto", "id", "-v"], Config::default()).debug());

        let config = Config {
            debug: true,
            ..Config::default()
        };
        assert!(runner(&["crypto", "id"], config).debug());
    }

    #[tokio::test]
    async fn test_crypto_commands() {
        assert!(runner(&["crypto", "gen-key", "--size", "16"], Config::default())
            .run()
            .await
            .is_ok());
        assert!(matches!(
            runner(&["crypto", "gen-key", "--size", "12"], Config::default())
                .run()
                .await,
            Err(Error::Crypto { .. })
        ));
    }

    #[tokio::test]
    async fn test_directory_requires_token() {
        let result = runner(&["directory", "get-user", "--name", "x"], Config::default())
            .run()
            .await;
        assert!(matches!(result, Err(Error::MissingConfigField { .. })));
    }

    #[tokio::test]
    async fn test_directory_get_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user_id": "ad|ldap|hanako",
                "nickname": "hanako"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.directory.endpoint = Some(format!("{}/api/v2/", server.uri()));
        config.directory.token = Some("dir-token".to_string());

        runner(&["directory", "get-user", "--name", "hanako"], config)
            .run()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_partial_listing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logs"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.audit.base_url = server.uri();
        config.audit.token = Some("audit-token".to_string());

        let result = runner(&["audit", "list-logs"], config).run().await;
        match result {
            Err(error) => assert!(error.is_retryable()),
            Ok(()) => panic!("expected the listing to fail"),
        }
    }

    #[test]
    fn test_render_listing_items() {
        let listing: Listing<Value> = Listing {
            items: vec![json!("k1"), json!("k2")],
            error: None,
        };
        let r = runner(&["crypto", "id"], Config::default());
        assert_eq!(r.render(&listing.items).unwrap(), r#"["k1","k2"]"#);
    }
}
