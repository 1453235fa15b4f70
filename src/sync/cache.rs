//! Client-side item cache fed by delta sync.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::protocol::{ItemChanges, ItemRecord};

/// What a single [`ItemCache::apply`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub full_refresh: bool,
}

/// Items keyed by id plus the cursor of the last successful sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCache {
    items: HashMap<Uuid, ItemRecord>,
    /// Millisecond epoch; 0 means never synced
    last_synced: i64,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_synced(&self) -> i64 {
        self.last_synced
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &Uuid) -> Option<&ItemRecord> {
        self.items.get(item_id)
    }

    /// Items ordered by item number, the order tables display them in.
    pub fn items(&self) -> Vec<&ItemRecord> {
        let mut items: Vec<&ItemRecord> = self.items.values().collect();
        items.sort_by_key(|i| (i.item_number, i.item_id));
        items
    }

    /// Merges a delta into the cache.
    ///
    /// A full refresh replaces everything. Otherwise new and updated records are
    /// upserted, keeping a cached copy whose `updated_at` is strictly newer, and
    /// then deleted ids are dropped. Applying the same delta twice is a no-op.
    pub fn apply(&mut self, changes: ItemChanges) -> MergeOutcome {
        let mut outcome = MergeOutcome {
            full_refresh: changes.is_full_refresh,
            ..Default::default()
        };

        if changes.is_full_refresh {
            outcome.removed = self.items.len();
            self.items = changes
                .new_items
                .into_iter()
                .map(|item| (item.item_id, item))
                .collect();
            outcome.added = self.items.len();
        } else {
            for incoming in changes
                .new_items
                .into_iter()
                .chain(changes.updated_items)
            {
                match self.items.get_mut(&incoming.item_id) {
                    Some(current) if current.updated_at > incoming.updated_at => {}
                    Some(current) => {
                        if *current != incoming {
                            *current = incoming;
                            outcome.updated += 1;
                        }
                    }
                    None => {
                        self.items.insert(incoming.item_id, incoming);
                        outcome.added += 1;
                    }
                }
            }

            for id in &changes.deleted_ids {
                if self.items.remove(id).is_some() {
                    outcome.removed += 1;
                }
            }
        }

        self.last_synced = self.last_synced.max(changes.server_time);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    fn record(n: i64, updated_at: DateTime<Utc>, name: &str) -> ItemRecord {
        ItemRecord {
            item_id: Uuid::from_u128(n as u128),
            item_number: n,
            item_name: name.to_string(),
            item_type: None,
            item_brand: None,
            item_model: None,
            item_barcode: None,
            dimensions: None,
            weight_grams: None,
            notes: None,
            owner_id: None,
            owner_type: None,
            created_by: Uuid::nil(),
            created_at: updated_at,
            updated_at,
        }
    }

    fn delta(new: Vec<ItemRecord>, updated: Vec<ItemRecord>, deleted: Vec<Uuid>, t: i64) -> ItemChanges {
        ItemChanges {
            new_items: new,
            updated_items: updated,
            deleted_ids: deleted,
            server_time: t,
            is_full_refresh: false,
        }
    }

    #[test]
    fn full_refresh_replaces_everything() {
        let now = Utc::now();
        let mut cache = ItemCache::new();
        cache.apply(delta(vec![record(1, now, "a"), record(2, now, "b")], vec![], vec![], 10));

        let outcome = cache.apply(ItemChanges {
            new_items: vec![record(3, now, "c")],
            updated_items: vec![],
            deleted_ids: vec![],
            server_time: 20,
            is_full_refresh: true,
        });

        assert!(outcome.full_refresh);
        assert_eq!(outcome.removed, 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.last_synced(), 20);
    }

    #[test]
    fn newer_cached_copy_wins() {
        let now = Utc::now();
        let mut cache = ItemCache::new();
        cache.apply(delta(vec![record(1, now, "fresh")], vec![], vec![], 10));

        let outcome = cache.apply(delta(
            vec![],
            vec![record(1, now - Duration::seconds(5), "stale")],
            vec![],
            11,
        ));

        assert_eq!(outcome.updated, 0);
        assert_eq!(cache.get(&Uuid::from_u128(1)).unwrap().item_name, "fresh");
    }

    #[test]
    fn deletes_apply_after_upserts() {
        let now = Utc::now();
        let mut cache = ItemCache::new();
        let id = Uuid::from_u128(7);
        let outcome = cache.apply(delta(vec![record(7, now, "x")], vec![], vec![id], 5));
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.removed, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn cursor_never_moves_backwards() {
        let mut cache = ItemCache::new();
        cache.apply(delta(vec![], vec![], vec![], 100));
        cache.apply(delta(vec![], vec![], vec![], 50));
        assert_eq!(cache.last_synced(), 100);
    }

    #[test]
    fn items_are_sorted_by_number() {
        let now = Utc::now();
        let mut cache = ItemCache::new();
        cache.apply(delta(
            vec![record(3, now, "c"), record(1, now, "a"), record(2, now, "b")],
            vec![],
            vec![],
            1,
        ));
        let numbers: Vec<i64> = cache.items().iter().map(|i| i.item_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    fn arb_delta() -> impl Strategy<Value = ItemChanges> {
        let base = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let rec = (1i64..20, 0i64..1000, "[a-z]{1,8}")
            .prop_map(move |(n, offset, name)| record(n, base + Duration::milliseconds(offset), &name));
        (
            prop::collection::vec(rec.clone(), 0..10),
            prop::collection::vec(rec, 0..10),
            prop::collection::vec(1u128..20, 0..5),
            0i64..10_000,
        )
            .prop_map(|(new, updated, deleted, t)| {
                delta(new, updated, deleted.into_iter().map(Uuid::from_u128).collect(), t)
            })
    }

    proptest! {
        #[test]
        fn applying_a_delta_twice_is_idempotent(
            seed in prop::collection::vec(arb_delta(), 0..4),
            changes in arb_delta(),
        ) {
            let mut cache = ItemCache::new();
            for d in seed {
                cache.apply(d);
            }
            cache.apply(changes.clone());
            let once = cache.clone();
            cache.apply(changes);
            prop_assert_eq!(once, cache);
        }

        #[test]
        fn deleted_ids_are_absent_after_apply(changes in arb_delta()) {
            let mut cache = ItemCache::new();
            let deleted = changes.deleted_ids.clone();
            cache.apply(changes);
            for id in deleted {
                prop_assert!(cache.get(&id).is_none());
            }
        }
    }
}
