use crate::{
    db::{self, DbPool},
    entities::company::{self, Entity as CompanyEntity},
    errors::ServiceError,
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 100, message = "Company name is required"))]
    pub company_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub trn: Option<String>,
    #[validate(length(max = 30))]
    pub mobile: Option<String>,
    #[validate(length(max = 30))]
    pub landline: Option<String>,
    pub notes: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct CompanyService {
    db_pool: Arc<DbPool>,
}

impl CompanyService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_companies(&self) -> Result<Vec<company::Model>, ServiceError> {
        Ok(CompanyEntity::find()
            .order_by_asc(company::Column::CompanyNumber)
            .all(&*self.db_pool)
            .await?)
    }

    /// Unique violations come back as `Conflict` with a per-column message.
    #[instrument(skip(self, request))]
    pub async fn create_company(
        &self,
        request: CreateCompanyRequest,
    ) -> Result<company::Model, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let company_number =
            db::next_sequence_number::<CompanyEntity, _>(&txn, company::Column::CompanyNumber)
                .await?;

        let model = company::ActiveModel {
            company_id: Set(Uuid::new_v4()),
            company_number: Set(company_number),
            company_name: Set(request.company_name.trim().to_string()),
            email: Set(blank_to_none(request.email).map(|e| e.to_lowercase())),
            trn: Set(blank_to_none(request.trn)),
            mobile: Set(blank_to_none(request.mobile)),
            landline: Set(blank_to_none(request.landline)),
            address_id: Set(None),
            notes: Set(blank_to_none(request.notes)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            let err = ServiceError::from(e);
            warn!(error = %err, "company insert rejected");
            err
        })?;
        txn.commit().await?;

        info!(company_id = %model.company_id, company_number, "company created");
        Ok(model)
    }
}
