use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "address")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub address_id: Uuid,
    #[sea_orm(nullable)]
    #[serde(rename = "address1")]
    pub address_1: Option<String>,
    #[sea_orm(nullable)]
    #[serde(rename = "address2")]
    pub address_2: Option<String>,
    pub city: String,
    pub country: String,
    #[sea_orm(nullable)]
    pub postal_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entity_address::Entity")]
    EntityAddresses,
}

impl Related<super::entity_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntityAddresses.def()
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
