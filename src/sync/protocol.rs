//! Wire types of the item delta-sync endpoint, shared by server and client.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::{
    enums::{ItemType, OwnerType},
    item::{self, Dimensions},
};

/// An item as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub item_id: Uuid,
    pub item_number: i64,
    pub item_name: String,
    pub item_type: Option<ItemType>,
    pub item_brand: Option<String>,
    pub item_model: Option<String>,
    pub item_barcode: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub weight_grams: Option<Decimal>,
    pub notes: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub owner_type: Option<OwnerType>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemRecord {
    pub fn with_owner(mut self, owner: Option<(Uuid, OwnerType)>) -> Self {
        if let Some((id, kind)) = owner {
            self.owner_id = Some(id);
            self.owner_type = Some(kind);
        }
        self
    }
}

impl From<item::Model> for ItemRecord {
    fn from(m: item::Model) -> Self {
        Self {
            item_id: m.item_id,
            item_number: m.item_number,
            item_name: m.item_name,
            item_type: m.item_type,
            item_brand: m.item_brand,
            item_model: m.item_model,
            item_barcode: m.item_barcode,
            dimensions: m.dimensions,
            weight_grams: m.weight_grams,
            notes: m.notes,
            owner_id: None,
            owner_type: None,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Response of `GET /api/items/updated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemChanges {
    pub new_items: Vec<ItemRecord>,
    pub updated_items: Vec<ItemRecord>,
    pub deleted_ids: Vec<Uuid>,
    /// Millisecond epoch to pass as `since` on the next call
    pub server_time: i64,
    pub is_full_refresh: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChangesQuery {
    /// Millisecond epoch of the last successful sync; omit for a full refresh
    pub since: Option<String>,
}

impl ChangesQuery {
    /// Missing, unparsable and non-positive cursors all mean "full refresh".
    pub fn cursor(&self) -> i64 {
        self.since
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v.trunc() as i64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 0)]
    #[case(Some(""), 0)]
    #[case(Some("abc"), 0)]
    #[case(Some("-5"), 0)]
    #[case(Some("0"), 0)]
    #[case(Some("1700000000123"), 1_700_000_000_123)]
    #[case(Some("1700000000123.9"), 1_700_000_000_123)]
    #[case(Some("NaN"), 0)]
    fn cursor_parsing(#[case] raw: Option<&str>, #[case] expected: i64) {
        let q = ChangesQuery {
            since: raw.map(str::to_string),
        };
        assert_eq!(q.cursor(), expected);
    }

    #[test]
    fn changes_use_camel_case_keys() {
        let changes = ItemChanges {
            new_items: vec![],
            updated_items: vec![],
            deleted_ids: vec![],
            server_time: 42,
            is_full_refresh: true,
        };
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["serverTime"], 42);
        assert_eq!(json["isFullRefresh"], true);
        assert!(json["deletedIds"].as_array().unwrap().is_empty());
    }
}
