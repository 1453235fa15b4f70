use super::enums::CustomerType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Base row shared by individual and business customers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "customers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub customer_id: Uuid,
    #[sea_orm(unique)]
    pub customer_number: i64,
    pub customer_type: CustomerType,
    #[sea_orm(nullable)]
    pub notes: Option<String>,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::individual_customer::Entity")]
    Individual,
    #[sea_orm(has_one = "super::business_customer::Entity")]
    Business,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::individual_customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Individual.def()
    }
}

impl Related<super::business_customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
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
