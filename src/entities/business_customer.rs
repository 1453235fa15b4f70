use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "business_customers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Same value as the owning `customers.customer_id`
    #[sea_orm(primary_key, auto_increment = false)]
    pub business_customer_id: Uuid,
    #[sea_orm(unique)]
    pub business_name: String,
    pub is_tax_registered: bool,
    #[sea_orm(nullable, unique)]
    pub tax_registration_number: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::BusinessCustomerId",
        to = "super::customer::Column::CustomerId",
        on_delete = "Cascade"
    )]
    Customer,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
