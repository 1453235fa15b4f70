use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "company")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub company_id: Uuid,
    #[sea_orm(unique)]
    pub company_number: i64,
    pub company_name: String,
    #[sea_orm(nullable, unique)]
    pub email: Option<String>,
    #[sea_orm(nullable, unique)]
    pub trn: Option<String>,
    #[sea_orm(nullable, unique)]
    pub mobile: Option<String>,
    #[sea_orm(nullable, unique)]
    pub landline: Option<String>,
    #[sea_orm(nullable)]
    pub address_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::AddressId",
        to = "super::address::Column::AddressId",
        on_delete = "SetNull"
    )]
    Address,
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
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
