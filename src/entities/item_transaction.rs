use super::enums::MovementType;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One stock movement. `new_stock` is always `prev_stock ± movement_amt`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "item_transactions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_tx_id: Uuid,
    #[sea_orm(nullable)]
    pub order_id: Option<Uuid>,
    pub item_id: Uuid,
    pub inventory_id: Uuid,
    pub movement: MovementType,
    pub movement_amt: i32,
    pub prev_stock: i32,
    pub new_stock: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub tx_date: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory::Entity",
        from = "Column::InventoryId",
        to = "super::inventory::Column::InventoryId",
        on_delete = "Cascade"
    )]
    Inventory,
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::OrderId",
        on_delete = "SetNull"
    )]
    Order,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
