use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{cache::ItemCache, SyncError};

/// Persists an [`ItemCache`] as a JSON file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cache; a missing or unreadable file starts from empty.
    pub async fn load(&self) -> ItemCache {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no item cache on disk yet");
                return ItemCache::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read item cache");
                return ItemCache::new();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "discarding corrupt item cache");
            ItemCache::new()
        })
    }

    /// Writes to a sibling temp file and renames it over the target.
    pub async fn save(&self, cache: &ItemCache) -> Result<(), SyncError> {
        let json = serde_json::to_vec(cache)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), items = cache.len(), "item cache saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::protocol::{ItemChanges, ItemRecord};
    use chrono::Utc;
    use uuid::Uuid;

    fn one_item() -> ItemChanges {
        let now = crate::db::now();
        ItemChanges {
            new_items: vec![ItemRecord {
                item_id: Uuid::new_v4(),
                item_number: 1,
                item_name: "Pallet jack".into(),
                item_type: None,
                item_brand: None,
                item_model: None,
                item_barcode: Some("123".into()),
                dimensions: None,
                weight_grams: None,
                notes: None,
                owner_id: None,
                owner_type: None,
                created_by: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            }],
            updated_items: vec![],
            deleted_ids: vec![],
            server_time: Utc::now().timestamp_millis(),
            is_full_refresh: true,
        }
    }

    #[tokio::test]
    async fn save_then_load_restores_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("nested").join("items.json"));

        let mut cache = ItemCache::new();
        cache.apply(one_item());
        store.save(&cache).await.unwrap();

        assert_eq!(store.load().await, cache);
        assert!(!dir.path().join("nested").join("items.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_or_corrupt_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("items.json"));
        assert!(store.load().await.is_empty());

        std::fs::write(store.path(), b"{not json").unwrap();
        let cache = store.load().await;
        assert!(cache.is_empty());
        assert_eq!(cache.last_synced(), 0);
    }
}
