// src/config.rs
use crate::constants::{AUTO_CONCURRENCY_CAP, CONFLUENCE_API_PAGE_SIZE, MAX_CONCURRENT_REQUESTS};
use crate::error::AppError;
use crate::logging::parse_level;
use crate::output::SinkKind;
use crate::types::{ApiToken, Credentials, PageId, SpaceKey, ValidatedUrl};
use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config.json";
const DEFAULT_OUTPUT_DIR: &str = "./output";
const DEFAULT_LOG_FILE_NAME: &str = "confluence_export.log";

const ENV_BASE_URL: &str = "CONFLUENCE_BASE_URL";
const ENV_USERNAME: &str = "CONFLUENCE_USERNAME";
const ENV_API_TOKEN: &str = "CONFLUENCE_API_TOKEN";

/// Parsed command-line input. Flags override the config file and environment.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Confluence site URL (e.g., "https://example.atlassian.net/wiki")
    #[arg(long)]
    pub base_url: Option<String>,

    /// Account used for Basic authentication
    #[arg(short, long)]
    pub username: Option<String>,

    /// Export a single space
    #[arg(short, long)]
    pub space_key: Option<String>,

    /// Export the tree rooted at this page (takes precedence over --space-key)
    #[arg(short, long)]
    pub page_id: Option<String>,

    /// Directory for exported files, the SQLite store or the search payload
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// One of: file, sqlite (alias duckdb), meilisearch
    #[arg(short = 't', long)]
    pub output_type: Option<String>,

    /// Include every descendant of --page-id, not just the page itself
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Download page attachments (file output only)
    #[arg(short, long, default_value_t = false)]
    pub attachments: bool,

    /// Number of pages prepared at once (0 = auto, max 32)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Records requested per listing call
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Prefix Markdown files with YAML front matter
    #[arg(long, default_value_t = false)]
    pub front_matter: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// On-disk configuration, keyed in camelCase.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigFile {
    pub confluence: ConfluenceSection,
    pub export: ExportSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfluenceSection {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSection {
    pub space_key: Option<String>,
    pub page_id: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub output_type: Option<String>,
    pub recursive: bool,
    pub include_attachments: bool,
    pub concurrent_requests: usize,
    pub page_size: Option<usize>,
    pub format: FormatSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatSection {
    pub include_front_matter: bool,
    pub preserve_links: bool,
}

impl Default for FormatSection {
    fn default() -> Self {
        Self {
            include_front_matter: false,
            preserve_links: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingSection {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl ConfigFile {
    /// Loads the file named on the command line.
    ///
    /// A missing file is only an error when it was asked for explicitly.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, AppError> {
        serde_json::from_str(text).map_err(|source| AppError::JsonParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Console level and log file location, before any other config is resolved.
    pub fn logging_settings(&self, verbose: bool) -> (LevelFilter, PathBuf) {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            self.logging
                .level
                .as_deref()
                .map(parse_level)
                .unwrap_or(LevelFilter::Info)
        };
        let file = self
            .logging
            .file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_FILE_NAME));
        (level, file)
    }
}

/// Resolved configuration, validated and ready to drive an export.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub base_url: ValidatedUrl,
    pub credentials: Credentials,
    pub space_key: Option<SpaceKey>,
    pub page_id: Option<PageId>,
    pub recursive: bool,
    pub output_dir: PathBuf,
    pub output_type: SinkKind,
    pub include_attachments: bool,
    pub concurrency: usize,
    pub page_size: usize,
    pub include_front_matter: bool,
    pub preserve_links: bool,
}

impl PipelineConfig {
    /// Resolves a complete configuration from CLI input, environment and file.
    pub fn resolve(cli: CommandLineInput, file: ConfigFile) -> Result<Self, AppError> {
        Self::resolve_with_env(cli, file, |name| std::env::var(name).ok())
    }

    /// Like [`PipelineConfig::resolve`] with an injectable environment lookup.
    pub fn resolve_with_env<F>(
        cli: CommandLineInput,
        file: ConfigFile,
        env: F,
    ) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ConfigFile {
            confluence, export, ..
        } = file;

        let base_url = pick(cli.base_url, env(ENV_BASE_URL), confluence.base_url).ok_or_else(
            || missing("base URL", "--base-url", ENV_BASE_URL, "confluence.baseUrl"),
        )?;
        let username = pick(cli.username, env(ENV_USERNAME), confluence.username).ok_or_else(
            || missing("username", "--username", ENV_USERNAME, "confluence.username"),
        )?;
        let api_token = pick(None, env(ENV_API_TOKEN), confluence.api_token).ok_or_else(|| {
            AppError::MissingConfiguration(format!(
                "API token: set {} or confluence.apiToken",
                ENV_API_TOKEN
            ))
        })?;

        let base_url = ValidatedUrl::parse(&base_url)?;
        let credentials = Credentials::new(username, ApiToken::new(api_token)?)?;

        let space_key = cli
            .space_key
            .or(export.space_key)
            .filter(|key| !key.trim().is_empty())
            .map(|key| SpaceKey::new(key))
            .transpose()?;
        let page_id = cli
            .page_id
            .or(export.page_id)
            .filter(|id| !id.trim().is_empty())
            .map(|id| PageId::parse(&id))
            .transpose()?;

        let output_type = match cli.output_type.or(export.output_type) {
            Some(name) => name.parse::<SinkKind>()?,
            None => SinkKind::Files,
        };

        let page_size = cli
            .page_size
            .or(export.page_size)
            .unwrap_or(CONFLUENCE_API_PAGE_SIZE);
        if page_size == 0 {
            return Err(AppError::InvalidConfiguration(
                "page size must be at least 1".to_string(),
            ));
        }

        let include_attachments = cli.attachments || export.include_attachments;
        if include_attachments && output_type != SinkKind::Files {
            log::warn!(
                "Attachments are only downloaded by the file output; ignored for {}",
                output_type
            );
        }

        Ok(PipelineConfig {
            base_url,
            credentials,
            space_key,
            page_id,
            recursive: cli.recursive || export.recursive,
            output_dir: cli
                .output_dir
                .or(export.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            output_type,
            include_attachments: include_attachments && output_type == SinkKind::Files,
            concurrency: effective_concurrency(
                cli.concurrency.unwrap_or(export.concurrent_requests),
            ),
            page_size,
            include_front_matter: cli.front_matter || export.format.include_front_matter,
            preserve_links: export.format.preserve_links,
        })
    }
}

/// First value present, in precedence order.
fn pick(cli: Option<String>, env: Option<String>, file: Option<String>) -> Option<String> {
    [cli, env, file]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

fn missing(what: &str, flag: &str, env: &str, key: &str) -> AppError {
    AppError::MissingConfiguration(format!("{}: pass {}, set {} or {}", what, flag, env, key))
}

/// 0 means auto: one per CPU, capped. Anything else is capped at the hard maximum.
pub fn effective_concurrency(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get().clamp(1, AUTO_CONCURRENCY_CAP)
    } else {
        requested.min(MAX_CONCURRENT_REQUESTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(json: &str) -> ConfigFile {
        ConfigFile::parse(json, Path::new("test.json")).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const MINIMAL: &str = r#"{
        "confluence": {
            "baseUrl": "https://wiki.example.com",
            "username": "ada@example.com",
            "apiToken": "token-1"
        }
    }"#;

    #[test]
    fn defaults_fill_unset_fields() {
        let config =
            PipelineConfig::resolve_with_env(CommandLineInput::default(), file(MINIMAL), no_env)
                .unwrap();
        assert_eq!(config.output_type, SinkKind::Files);
        assert_eq!(config.output_dir, PathBuf::from("./output"));
        assert_eq!(config.page_size, 25);
        assert!(config.preserve_links);
        assert!(!config.include_front_matter);
        assert!(config.space_key.is_none());
        assert!((1..=AUTO_CONCURRENCY_CAP).contains(&config.concurrency));
    }

    #[test]
    fn cli_overrides_env_which_overrides_file() {
        let cli = CommandLineInput {
            username: Some("cli-user".to_string()),
            space_key: Some("OPS".to_string()),
            output_type: Some("duckdb".to_string()),
            concurrency: Some(100),
            ..Default::default()
        };
        let env = |name: &str| match name {
            ENV_BASE_URL => Some("https://env.example.com".to_string()),
            ENV_USERNAME => Some("env-user".to_string()),
            _ => None,
        };
        let config = PipelineConfig::resolve_with_env(cli, file(MINIMAL), env).unwrap();

        assert_eq!(config.base_url.as_str(), "https://env.example.com/");
        assert_eq!(
            config.credentials,
            Credentials::new("cli-user", ApiToken::new("token-1").unwrap()).unwrap()
        );
        assert_eq!(config.space_key.unwrap().as_str(), "OPS");
        assert_eq!(config.output_type, SinkKind::Store);
        assert_eq!(config.concurrency, MAX_CONCURRENT_REQUESTS);
    }

    #[test]
    fn export_section_is_read_in_camel_case() {
        let json = r#"{
            "confluence": {"baseUrl": "https://wiki.example.com", "username": "u", "apiToken": "t"},
            "export": {
                "pageId": "12345",
                "outputType": "meilisearch",
                "recursive": true,
                "concurrentRequests": 3,
                "format": {"includeFrontMatter": true, "preserveLinks": false}
            },
            "logging": {"level": "warn", "file": "/tmp/export.log"}
        }"#;
        let parsed = file(json);
        assert_eq!(
            parsed.logging_settings(false),
            (LevelFilter::Warn, PathBuf::from("/tmp/export.log"))
        );
        assert_eq!(parsed.logging_settings(true).0, LevelFilter::Debug);

        let config =
            PipelineConfig::resolve_with_env(CommandLineInput::default(), parsed, no_env).unwrap();
        assert_eq!(config.page_id.unwrap().as_str(), "12345");
        assert_eq!(config.output_type, SinkKind::SearchIndex);
        assert!(config.recursive);
        assert_eq!(config.concurrency, 3);
        assert!(config.include_front_matter);
        assert!(!config.preserve_links);
    }

    #[test]
    fn missing_token_is_reported() {
        let json = r#"{"confluence": {"baseUrl": "https://wiki.example.com", "username": "u"}}"#;
        let err = PipelineConfig::resolve_with_env(CommandLineInput::default(), file(json), no_env)
            .unwrap_err();
        assert!(matches!(err, AppError::MissingConfiguration(_)));
    }

    #[test]
    fn bad_values_are_rejected() {
        let cli = CommandLineInput {
            output_type: Some("parquet".to_string()),
            ..Default::default()
        };
        assert!(PipelineConfig::resolve_with_env(cli, file(MINIMAL), no_env).is_err());

        let cli = CommandLineInput {
            base_url: Some("ftp://wiki.example.com".to_string()),
            ..Default::default()
        };
        assert!(PipelineConfig::resolve_with_env(cli, file(MINIMAL), no_env).is_err());

        let cli = CommandLineInput {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            PipelineConfig::resolve_with_env(cli, file(MINIMAL), no_env),
            Err(AppError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn attachments_only_apply_to_file_output() {
        let cli = CommandLineInput {
            attachments: true,
            output_type: Some("sqlite".to_string()),
            ..Default::default()
        };
        let config = PipelineConfig::resolve_with_env(cli, file(MINIMAL), no_env).unwrap();
        assert!(!config.include_attachments);
    }

    #[test]
    fn missing_default_config_file_is_tolerated() {
        let cwd_default = Path::new(DEFAULT_CONFIG_PATH);
        if !cwd_default.exists() {
            assert!(ConfigFile::load(cwd_default).is_ok());
        }
        assert!(matches!(
            ConfigFile::load(Path::new("/nonexistent/dir/custom.json")),
            Err(AppError::ConfigFile { .. })
        ));
    }
}
