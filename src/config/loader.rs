//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::store::{DEFAULT_HISTORY_CAPACITY, DEFAULT_STICKER_CACHE_CAPACITY};
use crate::transport::DEFAULT_API_URL;

/// Environment variable holding the bot token.
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";

/// Environment variable controlling whether queued updates are dropped at startup.
pub const ENV_DROP_PENDING_UPDATES: &str = "DROP_PENDING_UPDATES";

/// Environment variable overriding the Bot API base URL.
pub const ENV_API_URL: &str = "TELEGRAM_API_URL";

/// Environment variable pointing at a config file.
pub const ENV_CONFIG_PATH: &str = "REPLYSTICKER_CONFIG";

/// Default long-poll timeout in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// No bot token survived the precedence chain.
    #[error("Missing bot token: set {ENV_BOT_TOKEN} or `token` in the config file")]
    MissingToken,
}

/// Bot API token. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct BotToken(String);

impl BotToken {
    /// `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// The raw token, for building request URLs.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(<redacted>)")
    }
}

/// TOML configuration file structure.
///
/// All fields are optional; anything missing falls back to the defaults of
/// [`ResolvedConfig`]. Lives at `~/.config/replysticker/config.toml` by
/// default.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Bot API token. Prefer the environment for secrets.
    #[serde(default)]
    pub token: Option<BotToken>,

    /// Bot API base URL, for self-hosted API servers.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Drop updates queued while the bot was offline.
    #[serde(default)]
    pub drop_pending_updates: Option<bool>,

    /// Long-poll timeout in seconds.
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,

    /// Messages remembered per conversation for reply-less commands.
    #[serde(default)]
    pub history_capacity: Option<usize>,

    /// Users whose last rendered sticker is kept for `/pack`.
    #[serde(default)]
    pub sticker_cache_capacity: Option<usize>,

    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Bot token; required before polling starts.
    pub token: Option<BotToken>,
    /// Bot API base URL.
    pub api_url: String,
    /// Skip updates queued while the bot was offline.
    pub drop_pending_updates: bool,
    /// Long-poll timeout for `getUpdates`.
    pub poll_timeout_secs: u64,
    /// Messages kept per conversation.
    pub history_capacity: usize,
    /// Users whose last sticker is remembered.
    pub sticker_cache_capacity: usize,
    /// `None` logs to stderr.
    pub log_file_path: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            drop_pending_updates: true,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sticker_cache_capacity: DEFAULT_STICKER_CACHE_CAPACITY,
            log_file_path: None,
        }
    }
}

impl ResolvedConfig {
    /// The token, or [`ConfigError::MissingToken`].
    pub fn require_token(&self) -> Result<&BotToken, ConfigError> {
        self.token.as_ref().ok_or(ConfigError::MissingToken)
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/replysticker/config.toml` on Linux, the platform
/// equivalent elsewhere, or `None` if no config directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("replysticker").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `REPLYSTICKER_CONFIG` environment variable
/// 3. Default path `~/.config/replysticker/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(config_path: Option<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        token: config.token.and_then(|token| BotToken::new(token.expose())),
        api_url: config.api_url.unwrap_or(defaults.api_url),
        drop_pending_updates: config
            .drop_pending_updates
            .unwrap_or(defaults.drop_pending_updates),
        poll_timeout_secs: config.poll_timeout_secs.unwrap_or(defaults.poll_timeout_secs),
        history_capacity: config.history_capacity.unwrap_or(defaults.history_capacity),
        sticker_cache_capacity: config
            .sticker_cache_capacity
            .unwrap_or(defaults.sticker_cache_capacity),
        log_file_path: config.log_file_path.or(defaults.log_file_path),
    }
}

/// `"true"` in any case means true; every other value means false.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Apply environment overrides read through `lookup`.
///
/// - `BOT_TOKEN`: token, trimmed; blank values are ignored
/// - `DROP_PENDING_UPDATES`: `"true"` (any case) or false
/// - `TELEGRAM_API_URL`: API base URL; blank values are ignored
pub fn apply_overrides_from(mut config: ResolvedConfig, lookup: impl Fn(&str) -> Option<String>) -> ResolvedConfig {
    if let Some(token) = lookup(ENV_BOT_TOKEN).as_deref().and_then(BotToken::new) {
        config.token = Some(token);
    }

    if let Some(flag) = lookup(ENV_DROP_PENDING_UPDATES) {
        config.drop_pending_updates = parse_flag(&flag);
    }

    if let Some(url) = lookup(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
        config.api_url = url.trim().to_string();
    }

    config
}

/// Apply process environment overrides to resolved config.
pub fn apply_env_overrides(config: ResolvedConfig) -> ResolvedConfig {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only flags the user actually passed take effect.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    log_file_override: Option<PathBuf>,
    keep_pending_updates: bool,
) -> ResolvedConfig {
    if let Some(path) = log_file_override {
        config.log_file_path = Some(path);
    }

    if keep_pending_updates {
        config.drop_pending_updates = false;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
