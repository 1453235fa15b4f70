use super::enums::{ContactType, EntityType};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Links a customer or user to a contact detail row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entity_contact_details")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entity_id: Uuid,
    pub entity_type: EntityType,
    #[sea_orm(primary_key, auto_increment = false)]
    pub contact_details_id: Uuid,
    pub contact_type: ContactType,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contact_detail::Entity",
        from = "Column::ContactDetailsId",
        to = "super::contact_detail::Column::ContactDetailsId",
        on_delete = "Cascade"
    )]
    ContactDetail,
}

impl Related<super::contact_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContactDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
