use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the edgecache binary.
#[derive(Debug, Parser)]
#[command(name = "edgecache", version, about = "Edge cache directives and purge tool")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "EDGECACHE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Invalidate cached content at the edge.
    Purge(PurgeArgs),
    /// Print one zone setting (for example `cache_level`).
    Setting(SettingArgs),
    /// Show the headers a route declaration would render.
    Headers(HeadersArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PurgeArgs {
    #[command(subcommand)]
    pub target: PurgeTarget,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PurgeTarget {
    /// Purge every cached resource in the zone.
    Everything,
    /// Purge responses carrying any of the given cache tags.
    Tags {
        #[arg(value_name = "TAG", required = true)]
        tags: Vec<String>,
    },
    /// Purge individual URLs.
    Urls {
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },
    /// Purge everything served for the given hostnames.
    Hosts {
        #[arg(value_name = "HOST", required = true)]
        hosts: Vec<String>,
    },
    /// Purge everything under the given URL prefixes.
    Prefixes {
        #[arg(value_name = "PREFIX", required = true)]
        prefixes: Vec<String>,
    },
}

#[derive(Debug, Args, Clone)]
pub struct SettingArgs {
    /// Zone setting name.
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Args, Clone)]
pub struct HeadersArgs {
    /// Route TTL in seconds; empty or malformed values use the default.
    #[arg(long, value_name = "SECONDS")]
    pub ttl: Option<String>,

    /// `;`-separated route tags.
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the default TTL applied when a route declares none.
    #[arg(long = "default-ttl", value_name = "SECONDS", global = true)]
    pub default_ttl: Option<u32>,

    /// Override the zone identifier.
    #[arg(long = "zone-id", value_name = "ID", global = true)]
    pub zone_id: Option<String>,

    /// Override the API token (takes precedence over email + key).
    #[arg(long = "api-token", value_name = "TOKEN", global = true)]
    pub api_token: Option<String>,

    /// Override the API base URL.
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Toggle purge calls; when false every purge is skipped.
    #[arg(
        long = "purge-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub purge_enabled: Option<bool>,
}
