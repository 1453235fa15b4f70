use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "individual_customers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Same value as the owning `customers.customer_id`
    #[sea_orm(primary_key, auto_increment = false)]
    pub individual_customer_id: Uuid,
    pub first_name: String,
    #[sea_orm(nullable)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[sea_orm(nullable, unique)]
    pub personal_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::IndividualCustomerId",
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
