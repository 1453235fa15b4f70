//! HTTP client for the item delta-sync endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::cache::{ItemCache, MergeOutcome};
use super::error::SyncError;
use super::protocol::ItemChanges;
use super::store::CacheStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches item deltas from the API with a bearer token.
#[derive(Debug, Clone)]
pub struct SyncClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl SyncClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, SyncError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SyncError::InvalidUrl(base_url));
        }
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url,
            token: token.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/items/updated?since=<ms>`
    pub async fn fetch_changes(&self, since: i64) -> Result<ItemChanges, SyncError> {
        let url = format!("{}/api/items/updated", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("since", since)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(SyncError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ItemChanges>().await?)
    }

    /// Fetches everything changed since the cache's cursor and merges it.
    pub async fn sync_once(&self, cache: &mut ItemCache) -> Result<MergeOutcome, SyncError> {
        let since = cache.last_synced();
        let changes = self.fetch_changes(since).await?;
        let outcome = cache.apply(changes);
        debug!(since, ?outcome, "item sync round complete");
        Ok(outcome)
    }
}

/// Counters reported when [`poll`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub rounds: u64,
    pub failures: u64,
}

/// Sync, persist, sleep; repeat until `shutdown` resolves.
///
/// Failed rounds are logged and retried on the next tick.
pub async fn poll<F>(
    client: &SyncClient,
    cache: &mut ItemCache,
    store: &CacheStore,
    interval: Duration,
    shutdown: F,
) -> PollStats
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stats = PollStats::default();

    loop {
        stats.rounds += 1;
        match client.sync_once(cache).await {
            Ok(outcome) => {
                if outcome != MergeOutcome::default() {
                    info!(
                        added = outcome.added,
                        updated = outcome.updated,
                        removed = outcome.removed,
                        full_refresh = outcome.full_refresh,
                        "items synced"
                    );
                }
                if let Err(e) = store.save(cache).await {
                    warn!(error = %e, "failed to persist item cache");
                }
            }
            Err(e) => {
                stats.failures += 1;
                warn!(error = %e, "item sync failed; retrying next interval");
            }
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!(rounds = stats.rounds, "item sync polling stopped");
                return stats;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_must_be_http() {
        assert!(matches!(
            SyncClient::new("ftp://example.com", "t"),
            Err(SyncError::InvalidUrl(_))
        ));
        let client = SyncClient::new("http://localhost:8080/", "t").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn poll_counts_failures_and_stops_on_shutdown() {
        // Nothing listens on port 9 locally, so every round fails fast.
        let client = SyncClient::new("http://127.0.0.1:9", "t").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("items.json"));
        let mut cache = ItemCache::new();

        let stats = poll(
            &client,
            &mut cache,
            &store,
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_millis(35)),
        )
        .await;

        assert!(stats.rounds >= 1);
        assert_eq!(stats.rounds, stats.failures);
        assert!(!store.path().exists());
    }
}
