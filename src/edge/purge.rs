//! Purge and zone-setting operations on top of [`EdgeClient`].

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use crate::directives::CacheTags;

use super::{
    client::EdgeClient,
    error::EdgeError,
    models::{PurgeOutcome, PurgeRequest, SkipReason},
};

const PURGE_ENDPOINT: &str = "purge_cache";
const SETTINGS_ENDPOINT: &str = "settings";

/// Invalidation at the edge. Failures are returned to the caller; nothing retries.
#[async_trait]
pub trait CachePurge: Send + Sync {
    async fn purge(&self, request: PurgeRequest) -> Result<PurgeOutcome, EdgeError>;

    async fn purge_everything(&self) -> Result<PurgeOutcome, EdgeError> {
        self.purge(PurgeRequest::Everything).await
    }

    async fn purge_by_tags(&self, tags: CacheTags) -> Result<PurgeOutcome, EdgeError> {
        self.purge(PurgeRequest::Tags(tags)).await
    }

    async fn purge_by_urls(&self, urls: Vec<String>) -> Result<PurgeOutcome, EdgeError> {
        self.purge(PurgeRequest::urls(urls)).await
    }

    async fn purge_by_hosts(&self, hosts: Vec<String>) -> Result<PurgeOutcome, EdgeError> {
        self.purge(PurgeRequest::hosts(hosts)).await
    }

    async fn purge_by_prefixes(&self, prefixes: Vec<String>) -> Result<PurgeOutcome, EdgeError> {
        self.purge(PurgeRequest::prefixes(prefixes)).await
    }
}

/// Provider-backed purge service.
#[derive(Clone, Debug)]
pub struct EdgeCache {
    client: EdgeClient,
    purge_enabled: bool,
}

impl EdgeCache {
    pub fn new(client: EdgeClient, purge_enabled: bool) -> Self {
        Self {
            client,
            purge_enabled,
        }
    }

    pub fn client(&self) -> &EdgeClient {
        &self.client
    }

    /// Read one zone setting, e.g. `cache_level`. Returns the `result` object.
    #[instrument(skip(self))]
    pub async fn zone_setting(&self, name: &str) -> Result<Value, EdgeError> {
        let name = setting_name(name)?;
        let endpoint = format!("{SETTINGS_ENDPOINT}/{name}");
        let envelope = self.client.get(&endpoint, None).await?;
        Ok(envelope.result)
    }
}

/// Setting names are a single path segment of `[a-z0-9_]`.
fn setting_name(name: &str) -> Result<&str, EdgeError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(name)
    } else {
        Err(EdgeError::InvalidSetting(name.to_string()))
    }
}

#[async_trait]
impl CachePurge for EdgeCache {
    #[instrument(skip_all, fields(kind = request.kind(), targets = request.target_count()))]
    async fn purge(&self, request: PurgeRequest) -> Result<PurgeOutcome, EdgeError> {
        let kind = request.kind();

        let outcome = if !self.purge_enabled {
            Ok(PurgeOutcome::Skipped(SkipReason::Disabled))
        } else if request.is_empty() {
            Ok(PurgeOutcome::Skipped(SkipReason::NoTargets))
        } else {
            self.client
                .post(PURGE_ENDPOINT, &request.body())
                .await
                .map(|envelope| PurgeOutcome::Purged {
                    id: envelope.result_id().map(str::to_owned),
                })
        };

        let label = match &outcome {
            Ok(outcome) => outcome.label(),
            Err(_) => "failed",
        };
        metrics::counter!("edgecache_purge_requests_total", "kind" => kind, "outcome" => label)
            .increment(1);

        if let Ok(outcome) = &outcome {
            info!(edge = "purge", kind, outcome = outcome.label(), "purge finished");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_names_are_single_segments() {
        for name in ["cache_level", "browser_cache_ttl", "0rtt"] {
            assert_eq!(setting_name(name).ok(), Some(name));
        }
        for name in ["", "../../purge_cache", "/cache_level", "Cache_Level", "a/b", "a?b=c"] {
            assert!(
                matches!(setting_name(name), Err(EdgeError::InvalidSetting(_))),
                "name: {name:?}"
            );
        }
    }
}
