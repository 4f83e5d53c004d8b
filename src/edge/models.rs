use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::directives::CacheTags;

/// Response envelope shared by every zone endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
    #[serde(default)]
    pub result: Value,
}

impl ApiEnvelope {
    /// `result.id`, present on purge responses.
    pub fn result_id(&self) -> Option<&str> {
        self.result.get("id").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// What to invalidate at the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeRequest {
    Everything,
    Tags(CacheTags),
    Urls(Vec<String>),
    Hosts(Vec<String>),
    Prefixes(Vec<String>),
}

impl PurgeRequest {
    pub fn tags(tags: impl Into<CacheTags>) -> Self {
        Self::Tags(tags.into())
    }

    pub fn urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Urls(normalize_targets(urls))
    }

    pub fn hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Hosts(normalize_targets(hosts))
    }

    pub fn prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Prefixes(normalize_targets(prefixes))
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Everything => "everything",
            Self::Tags(_) => "tags",
            Self::Urls(_) => "urls",
            Self::Hosts(_) => "hosts",
            Self::Prefixes(_) => "prefixes",
        }
    }

    /// Number of targets; `Everything` counts as one.
    pub fn target_count(&self) -> usize {
        match self {
            Self::Everything => 1,
            Self::Tags(tags) => tags.len(),
            Self::Urls(items) | Self::Hosts(items) | Self::Prefixes(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.target_count() == 0
    }

    /// JSON body for `POST purge_cache`.
    pub fn body(&self) -> Value {
        match self {
            Self::Everything => json!({ "purge_everything": true }),
            Self::Tags(tags) => json!({ "tags": tags.as_slice() }),
            Self::Urls(urls) => json!({ "files": urls }),
            Self::Hosts(hosts) => json!({ "hosts": hosts }),
            Self::Prefixes(prefixes) => json!({ "prefixes": prefixes }),
        }
    }
}

/// Result of a purge call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// The provider accepted the purge; carries its purge id when returned.
    Purged { id: Option<String> },
    /// No upstream call was made.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Purging is switched off for this deployment.
    Disabled,
    /// Nothing left to purge after normalization.
    NoTargets,
}

impl PurgeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Purged { .. } => "purged",
            Self::Skipped(SkipReason::Disabled) => "disabled",
            Self::Skipped(SkipReason::NoTargets) => "empty",
        }
    }
}

fn normalize_targets<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut targets: Vec<String> = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() || targets.iter().any(|existing| existing == trimmed) {
            continue;
        }
        targets.push(trimmed.to_string());
    }
    targets
}
