//! Application configuration for DocDraft.
//!
//! User config lives at `~/.docdraft/docdraft.toml`.
//! CLI flags override config file values, which override defaults.
//! Credentials are never stored in the file — only the names of the
//! environment variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocDraftError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docdraft.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docdraft";

// ---------------------------------------------------------------------------
// Config structs (matching docdraft.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Git host settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Notification service settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Stage retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Branch pull requests target.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Prefix for generated documentation branches.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// Notification channel for completed runs.
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            base_branch: default_base_branch(),
            branch_prefix: default_branch_prefix(),
            channel: default_channel(),
        }
    }
}

fn default_base_branch() -> String {
    "main".into()
}
fn default_branch_prefix() -> String {
    "docs/update-".into()
}
fn default_channel() -> String {
    "#releases".into()
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API base URL (override for GitHub Enterprise or tests).
    #[serde(default = "default_github_api_base")]
    pub api_base: String,

    /// Name of the env var holding the API token (never store the token).
    #[serde(default = "default_github_token_env")]
    pub token_env: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            token_env: default_github_token_env(),
        }
    }
}

fn default_github_api_base() -> String {
    "https://api.github.com".into()
}
fn default_github_token_env() -> String {
    "GITHUB_TOKEN".into()
}

/// `[slack]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// API base URL (override for tests).
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,

    /// Name of the env var holding the bot token (never store the token).
    #[serde(default = "default_slack_token_env")]
    pub token_env: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base: default_slack_api_base(),
            token_env: default_slack_token_env(),
        }
    }
}

fn default_slack_api_base() -> String {
    "https://slack.com/api".into()
}
fn default_slack_token_env() -> String {
    "SLACK_BOT_TOKEN".into()
}

/// `[retry]` section.
///
/// One attempt means no retry — component errors propagate as-is. Raising
/// `max_attempts` retries transient upstream failures with exponential
/// backoff at the pipeline stage boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per pipeline stage (minimum 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in ms before the first retry; doubles per attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}
fn default_base_delay_ms() -> u64 {
    500
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docdraft/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocDraftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docdraft/docdraft.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocDraftError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocDraftError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocDraftError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocDraftError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocDraftError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Credential resolution
// ---------------------------------------------------------------------------

/// Resolve the Git host token from the configured environment variable.
pub fn github_token(config: &AppConfig) -> Result<String> {
    token_from_env(&config.github.token_env, "Git host")
}

/// Resolve the notification service token from the configured environment
/// variable.
pub fn slack_token(config: &AppConfig) -> Result<String> {
    token_from_env(&config.slack.token_env, "notification service")
}

fn token_from_env(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(DocDraftError::config(format!(
            "{what} token not found. Set the {var_name} environment variable."
        ))),
    }
}
