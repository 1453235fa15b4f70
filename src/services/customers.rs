use crate::{
    db::{self, DbPool},
    entities::{
        address, business_customer, contact_detail,
        customer::{self, Entity as CustomerEntity},
        entity_address, entity_contact_detail,
        enums::{AddressType, ContactType, CustomerType, EntityType},
        individual_customer,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub address1: Option<String>,
    pub address2: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub contact_type: ContactType,
    #[validate(length(min = 1, message = "Contact data is required"))]
    pub contact_data: String,
    #[serde(default)]
    pub is_primary: bool,
}

fn validate_contacts(contacts: &[ContactInput]) -> Result<(), ValidationError> {
    if contacts.iter().filter(|c| c.is_primary).count() > 1 {
        return Err(ValidationError::new("only_one_primary_contact"));
    }
    let bad_email = contacts.iter().any(|c| {
        c.contact_type == ContactType::Email && !validator::validate_email(c.contact_data.trim())
    });
    if bad_email {
        return Err(ValidationError::new("invalid_contact_email"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndividualCustomerRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub personal_id: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[validate]
    pub address: Option<AddressInput>,
    #[validate(custom = "validate_contacts")]
    #[serde(default)]
    pub contact_details: Vec<ContactInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessCustomerRequest {
    #[validate(length(min = 1, message = "Business name is required"))]
    pub business_name: String,
    #[serde(default)]
    pub is_tax_registered: bool,
    pub tax_registration_number: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[validate]
    pub address: Option<AddressInput>,
    #[validate(custom = "validate_contacts")]
    #[serde(default)]
    pub contact_details: Vec<ContactInput>,
}

/// An address linked to a customer, with its role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    pub address_type: AddressType,
    #[serde(flatten)]
    pub address: address::Model,
}

/// Customer row joined with its subtype, contacts and addresses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    pub customer_id: Uuid,
    pub customer_number: i64,
    pub customer_type: CustomerType,
    pub country: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub individual: Option<individual_customer::Model>,
    pub business: Option<business_customer::Model>,
    pub contact_details: Vec<contact_detail::Model>,
    pub addresses: Vec<CustomerAddress>,
}

impl CustomerDetail {
    fn from_parts(customer: customer::Model) -> Self {
        Self {
            customer_id: customer.customer_id,
            customer_number: customer.customer_number,
            customer_type: customer.customer_type,
            country: customer.country,
            notes: customer.notes,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
            individual: None,
            business: None,
            contact_details: Vec::new(),
            addresses: Vec::new(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_individual(
        &self,
        request: CreateIndividualCustomerRequest,
    ) -> Result<CustomerDetail, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let customer = insert_customer(
            &txn,
            CustomerType::Individual,
            &request.country,
            request.notes,
        )
        .await?;

        individual_customer::ActiveModel {
            individual_customer_id: Set(customer.customer_id),
            first_name: Set(request.first_name.trim().to_string()),
            middle_name: Set(non_empty(request.middle_name)),
            last_name: Set(request.last_name.trim().to_string()),
            personal_id: Set(non_empty(request.personal_id)),
        }
        .insert(&txn)
        .await?;

        attach_contact_data(&txn, customer.customer_id, request.address, request.contact_details)
            .await?;
        let detail = load_details(&txn, vec![customer]).await?;
        txn.commit().await.map_err(|e| {
            error!(error = %e, "failed to commit individual customer");
            ServiceError::from(e)
        })?;

        self.finish_create(detail).await
    }

    #[instrument(skip(self, request))]
    pub async fn create_business(
        &self,
        request: CreateBusinessCustomerRequest,
    ) -> Result<CustomerDetail, ServiceError> {
        request.validate()?;
        let tax_number = non_empty(request.tax_registration_number);
        if request.is_tax_registered && tax_number.is_none() {
            return Err(ServiceError::ValidationError(
                "Tax registration number is required for tax registered businesses".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let customer = insert_customer(
            &txn,
            CustomerType::Business,
            &request.country,
            request.notes,
        )
        .await?;

        business_customer::ActiveModel {
            business_customer_id: Set(customer.customer_id),
            business_name: Set(request.business_name.trim().to_string()),
            is_tax_registered: Set(request.is_tax_registered),
            tax_registration_number: Set(tax_number),
        }
        .insert(&txn)
        .await?;

        attach_contact_data(&txn, customer.customer_id, request.address, request.contact_details)
            .await?;
        let detail = load_details(&txn, vec![customer]).await?;
        txn.commit().await?;

        self.finish_create(detail).await
    }

    async fn finish_create(
        &self,
        mut detail: Vec<CustomerDetail>,
    ) -> Result<CustomerDetail, ServiceError> {
        let detail = detail
            .pop()
            .ok_or_else(|| ServiceError::InternalError("customer vanished after insert".into()))?;
        info!(
            customer_id = %detail.customer_id,
            customer_number = detail.customer_number,
            customer_type = ?detail.customer_type,
            "customer created"
        );
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::CustomerCreated {
                    customer_id: detail.customer_id,
                    customer_number: detail.customer_number,
                })
                .await;
        }
        Ok(detail)
    }

    /// Every customer with related data, ordered by customer number.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerDetail>, ServiceError> {
        let db = &*self.db_pool;
        let customers = CustomerEntity::find()
            .order_by_asc(customer::Column::CustomerNumber)
            .all(db)
            .await?;
        load_details(db, customers).await
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerDetail, ServiceError> {
        let db = &*self.db_pool;
        let customer = CustomerEntity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer"))?;
        load_details(db, vec![customer])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found("Customer"))
    }
}

async fn insert_customer(
    txn: &DatabaseTransaction,
    customer_type: CustomerType,
    country: &str,
    notes: Option<String>,
) -> Result<customer::Model, ServiceError> {
    let customer_number =
        db::next_sequence_number::<CustomerEntity, _>(txn, customer::Column::CustomerNumber)
            .await?;
    let customer = customer::ActiveModel {
        customer_id: Set(Uuid::new_v4()),
        customer_number: Set(customer_number),
        customer_type: Set(customer_type),
        notes: Set(non_empty(notes)),
        country: Set(country.trim().to_string()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    Ok(customer)
}

/// Inserts the primary address and contact rows plus their link rows.
async fn attach_contact_data(
    txn: &DatabaseTransaction,
    customer_id: Uuid,
    address_input: Option<AddressInput>,
    contacts: Vec<ContactInput>,
) -> Result<(), ServiceError> {
    let now = db::now();

    if let Some(input) = address_input {
        let address = address::ActiveModel {
            address_id: Set(Uuid::new_v4()),
            address_1: Set(non_empty(input.address1)),
            address_2: Set(non_empty(input.address2)),
            city: Set(input.city.trim().to_string()),
            country: Set(input.country.trim().to_string()),
            postal_code: Set(non_empty(input.postal_code)),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        entity_address::ActiveModel {
            entity_id: Set(customer_id),
            entity_type: Set(EntityType::Customer),
            address_id: Set(address.address_id),
            address_type: Set(AddressType::Primary),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;
    }

    for contact in contacts {
        let detail = contact_detail::ActiveModel {
            contact_details_id: Set(Uuid::new_v4()),
            contact_type: Set(contact.contact_type),
            contact_data: Set(contact.contact_data.trim().to_string()),
            is_primary: Set(contact.is_primary),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        entity_contact_detail::ActiveModel {
            entity_id: Set(customer_id),
            entity_type: Set(EntityType::Customer),
            contact_details_id: Set(detail.contact_details_id),
            contact_type: Set(detail.contact_type),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;
    }

    Ok(())
}

/// Enriches customers with one query per related table, not per row.
async fn load_details<C: ConnectionTrait>(
    conn: &C,
    customers: Vec<customer::Model>,
) -> Result<Vec<CustomerDetail>, ServiceError> {
    if customers.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = customers.iter().map(|c| c.customer_id).collect();

    let mut individuals: HashMap<Uuid, individual_customer::Model> =
        individual_customer::Entity::find()
            .filter(individual_customer::Column::IndividualCustomerId.is_in(ids.clone()))
            .all(conn)
            .await?
            .into_iter()
            .map(|m| (m.individual_customer_id, m))
            .collect();

    let mut businesses: HashMap<Uuid, business_customer::Model> = business_customer::Entity::find()
        .filter(business_customer::Column::BusinessCustomerId.is_in(ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.business_customer_id, m))
        .collect();

    let address_links = entity_address::Entity::find()
        .filter(entity_address::Column::EntityId.is_in(ids.clone()))
        .filter(entity_address::Column::EntityType.eq(EntityType::Customer))
        .order_by_asc(entity_address::Column::CreatedAt)
        .all(conn)
        .await?;
    let addresses: HashMap<Uuid, address::Model> = address::Entity::find()
        .filter(address::Column::AddressId.is_in(address_links.iter().map(|l| l.address_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.address_id, a))
        .collect();

    let contact_links = entity_contact_detail::Entity::find()
        .filter(entity_contact_detail::Column::EntityId.is_in(ids))
        .filter(entity_contact_detail::Column::EntityType.eq(EntityType::Customer))
        .order_by_asc(entity_contact_detail::Column::CreatedAt)
        .all(conn)
        .await?;
    let contacts: HashMap<Uuid, contact_detail::Model> = contact_detail::Entity::find()
        .filter(
            contact_detail::Column::ContactDetailsId
                .is_in(contact_links.iter().map(|l| l.contact_details_id)),
        )
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.contact_details_id, c))
        .collect();

    let mut details: Vec<CustomerDetail> = customers
        .into_iter()
        .map(|c| {
            let id = c.customer_id;
            let mut detail = CustomerDetail::from_parts(c);
            detail.individual = individuals.remove(&id);
            detail.business = businesses.remove(&id);
            detail
        })
        .collect();
    let index: HashMap<Uuid, usize> = details
        .iter()
        .enumerate()
        .map(|(i, d)| (d.customer_id, i))
        .collect();

    for link in address_links {
        if let (Some(&i), Some(address)) = (index.get(&link.entity_id), addresses.get(&link.address_id)) {
            details[i].addresses.push(CustomerAddress {
                address_type: link.address_type,
                address: address.clone(),
            });
        }
    }
    for link in contact_links {
        if let (Some(&i), Some(contact)) =
            (index.get(&link.entity_id), contacts.get(&link.contact_details_id))
        {
            details[i].contact_details.push(contact.clone());
        }
    }

    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(kind: ContactType, data: &str, primary: bool) -> ContactInput {
        ContactInput {
            contact_type: kind,
            contact_data: data.into(),
            is_primary: primary,
        }
    }

    #[test]
    fn at_most_one_primary_contact() {
        let ok = vec![
            contact(ContactType::Mobile, "+971500000000", true),
            contact(ContactType::Landline, "+97140000000", false),
        ];
        assert!(validate_contacts(&ok).is_ok());

        let two = vec![
            contact(ContactType::Mobile, "+971500000000", true),
            contact(ContactType::Email, "a@b.com", true),
        ];
        assert!(validate_contacts(&two).is_err());
    }

    #[test]
    fn email_contacts_must_look_like_email() {
        assert!(validate_contacts(&[contact(ContactType::Email, "nope", false)]).is_err());
        assert!(validate_contacts(&[contact(ContactType::Other, "nope", false)]).is_ok());
    }

    #[test]
    fn request_validation_covers_nested_address() {
        let request = CreateBusinessCustomerRequest {
            business_name: "Acme Freight".into(),
            is_tax_registered: false,
            tax_registration_number: None,
            notes: None,
            country: "AE".into(),
            address: Some(AddressInput {
                address1: None,
                address2: None,
                city: String::new(),
                country: "AE".into(),
                postal_code: None,
            }),
            contact_details: vec![],
        };
        assert!(request.validate().is_err());
    }
}
