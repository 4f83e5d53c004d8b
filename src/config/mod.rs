//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{CliArgs, Command, HeadersArgs, Overrides, PurgeArgs, PurgeTarget, SettingArgs};

use crate::directives::DEFAULT_TTL_SECONDS;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "edgecache";
const ENV_PREFIX: &str = "EDGECACHE";
const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4/";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub edge: EdgeSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// TTL rendered when a route declares none (or a malformed one).
    pub default_ttl: u32,
}

#[derive(Debug, Clone)]
pub struct EdgeSettings {
    /// API root; always ends with `/`.
    pub base_url: Url,
    pub zone_id: Option<String>,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
    pub purge_enabled: bool,
}

/// Provider credentials. The two forms are mutually exclusive.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Key { email: String, key: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Credentials::Token(..)"),
            Self::Key { email, .. } => f
                .debug_struct("Credentials::Key")
                .field("email", email)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    edge: RawEdgeSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    default_ttl: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEdgeSettings {
    base_url: Option<String>,
    zone_id: Option<String>,
    api_token: Option<String>,
    api_email: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
    purge_enabled: Option<bool>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(ttl) = overrides.default_ttl {
            self.cache.default_ttl = Some(ttl.into());
        }
        if let Some(zone) = overrides.zone_id.as_ref() {
            self.edge.zone_id = Some(zone.clone());
        }
        if let Some(token) = overrides.api_token.as_ref() {
            self.edge.api_token = Some(token.clone());
        }
        if let Some(url) = overrides.base_url.as_ref() {
            self.edge.base_url = Some(url.clone());
        }
        if let Some(enabled) = overrides.purge_enabled {
            self.edge.purge_enabled = Some(enabled);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            edge,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            cache: build_cache_settings(cache)?,
            edge: build_edge_settings(edge)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let value = cache.default_ttl.unwrap_or(DEFAULT_TTL_SECONDS.into());
    if value == 0 {
        return Err(LoadError::invalid(
            "cache.default_ttl",
            "must be greater than zero",
        ));
    }
    let default_ttl = u32::try_from(value)
        .map_err(|_| LoadError::invalid("cache.default_ttl", "value exceeds supported range for u32"))?;

    Ok(CacheSettings { default_ttl })
}

fn build_edge_settings(edge: RawEdgeSettings) -> Result<EdgeSettings, LoadError> {
    let base_url = parse_base_url(
        edge.base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL),
    )?;

    let timeout_secs = edge.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "edge.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(EdgeSettings {
        base_url,
        zone_id: non_blank(edge.zone_id),
        credentials: build_credentials(edge.api_token, edge.api_email, edge.api_key)?,
        timeout: Duration::from_secs(timeout_secs),
        purge_enabled: edge.purge_enabled.unwrap_or(true),
    })
}

fn build_credentials(
    token: Option<String>,
    email: Option<String>,
    key: Option<String>,
) -> Result<Option<Credentials>, LoadError> {
    if let Some(token) = non_blank(token) {
        return Ok(Some(Credentials::Token(token)));
    }

    match (non_blank(email), non_blank(key)) {
        (Some(email), Some(key)) => Ok(Some(Credentials::Key { email, key })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(LoadError::invalid(
            "edge.api_key",
            "required when edge.api_email is set",
        )),
        (None, Some(_)) => Err(LoadError::invalid(
            "edge.api_email",
            "required when edge.api_key is set",
        )),
    }
}

fn parse_base_url(value: &str) -> Result<Url, LoadError> {
    let mut url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid("edge.base_url", format!("invalid URL: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "edge.base_url",
            "scheme must be http or https",
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
