use super::enums::ItemType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outer dimensions of an item, stored as a JSON column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub length: f64,
}

impl Dimensions {
    pub fn is_valid(&self) -> bool {
        [self.width, self.height, self.length]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// A trackable inventory unit. Rows are never hard-deleted by the API:
/// deletion flips `is_deleted` and writes a tombstone into `deleted_items`
/// so sync clients learn about it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: Uuid,
    #[sea_orm(unique)]
    pub item_number: i64,
    pub item_name: String,
    #[sea_orm(nullable)]
    pub item_type: Option<ItemType>,
    #[sea_orm(nullable)]
    pub item_brand: Option<String>,
    #[sea_orm(nullable)]
    pub item_model: Option<String>,
    #[sea_orm(nullable, unique)]
    pub item_barcode: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub dimensions: Option<Dimensions>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub weight_grams: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::UserId",
        on_delete = "Restrict"
    )]
    Creator,
    #[sea_orm(has_many = "super::item_owner::Entity")]
    Owners,
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::item_owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owners.def()
    }
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = crate::db::now();
        if insert && !self.created_at.is_set() {
            self.created_at = Set(now);
        }
        if !self.updated_at.is_set() {
            self.updated_at = Set(now);
        }
        Ok(self)
    }
}
