use crate::{
    db::{self, DbPool},
    entities::{
        enums::{LedgerTransactionType, VendorType},
        vendor::{self, Entity as VendorEntity},
        vendor_ledger, vendor_payment, vendor_service, vendor_transaction,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(ValidationError::new("must_not_be_negative"))
    } else {
        Ok(())
    }
}

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorRequest {
    #[validate(length(min = 1, max = 100, message = "Vendor name must be 1-100 characters"))]
    pub vendor_name: String,
    pub vendor_type: VendorType,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorServiceRequest {
    #[validate(length(min = 1, max = 100, message = "Service name must be 1-100 characters"))]
    pub service_name: String,
    #[validate(custom = "validate_non_negative")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorTransactionRequest {
    pub vendor_service_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub quantity: i32,
    pub order_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub tx_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorPaymentRequest {
    #[validate(custom = "validate_positive")]
    pub amount: Decimal,
    pub payment_date: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Manual ledger line; exactly one side must be positive.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualLedgerEntryRequest {
    pub transaction_type: LedgerTransactionType,
    #[validate(custom = "validate_non_negative")]
    pub debit: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub credit: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorDetail {
    #[serde(flatten)]
    pub vendor: vendor::Model,
    pub services: Vec<vendor_service::Model>,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorTransactionReceipt {
    pub transaction: vendor_transaction::Model,
    /// `None` for zero-cost work, which leaves the ledger untouched
    pub ledger_entry: Option<vendor_ledger::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorPaymentReceipt {
    pub payment: vendor_payment::Model,
    pub ledger_entry: vendor_ledger::Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLine {
    #[serde(flatten)]
    pub entry: vendor_ledger::Model,
    pub running_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorLedger {
    pub vendor_id: Uuid,
    pub entries: Vec<LedgerLine>,
    pub closing_balance: Decimal,
}

/// Accumulates Σdebit − Σcredit over entries in the given order.
pub fn running_balances(entries: Vec<vendor_ledger::Model>) -> (Vec<LedgerLine>, Decimal) {
    let mut balance = Decimal::ZERO;
    let lines = entries
        .into_iter()
        .map(|entry| {
            balance += entry.debit - entry.credit;
            LedgerLine {
                entry,
                running_balance: balance,
            }
        })
        .collect();
    (lines, balance)
}

/// Splits a manual entry into (debit, credit) at cent precision, requiring
/// exactly one positive side after rounding.
fn ledger_sides(
    debit: Option<Decimal>,
    credit: Option<Decimal>,
) -> Result<(Decimal, Decimal), ServiceError> {
    let debit = debit.unwrap_or(Decimal::ZERO).round_dp(2);
    let credit = credit.unwrap_or(Decimal::ZERO).round_dp(2);
    match (debit > Decimal::ZERO, credit > Decimal::ZERO) {
        (true, false) | (false, true) => Ok((debit, credit)),
        _ => Err(ServiceError::ValidationError(
            "Exactly one of debit or credit must be greater than zero".to_string(),
        )),
    }
}

struct LedgerPosting {
    vendor_id: Uuid,
    transaction_type: LedgerTransactionType,
    debit: Decimal,
    credit: Decimal,
    description: Option<String>,
    related_transaction_id: Option<Uuid>,
    created_by: Uuid,
    transaction_date: DateTime<Utc>,
}

async fn post_ledger(
    txn: &DatabaseTransaction,
    posting: LedgerPosting,
) -> Result<vendor_ledger::Model, ServiceError> {
    Ok(vendor_ledger::ActiveModel {
        ledger_id: Set(Uuid::new_v4()),
        vendor_id: Set(posting.vendor_id),
        transaction_date: Set(posting.transaction_date),
        transaction_type: Set(posting.transaction_type),
        debit: Set(posting.debit),
        credit: Set(posting.credit),
        description: Set(posting.description),
        related_transaction_id: Set(posting.related_transaction_id),
        created_by: Set(Some(posting.created_by)),
        created_at: Set(db::now()),
    }
    .insert(txn)
    .await?)
}

async fn find_vendor<C: ConnectionTrait>(conn: &C, vendor_id: Uuid) -> Result<vendor::Model, ServiceError> {
    VendorEntity::find_by_id(vendor_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Vendor"))
}

async fn ledger_entries<C: ConnectionTrait>(
    conn: &C,
    vendor_id: Uuid,
) -> Result<Vec<vendor_ledger::Model>, ServiceError> {
    Ok(vendor_ledger::Entity::find()
        .filter(vendor_ledger::Column::VendorId.eq(vendor_id))
        .order_by_asc(vendor_ledger::Column::TransactionDate)
        .order_by_asc(vendor_ledger::Column::CreatedAt)
        .all(conn)
        .await?)
}

/// Vendors, their priced services and the running account ledger
#[derive(Clone)]
pub struct VendorService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl VendorService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn announce(&self, entry: &vendor_ledger::Model) {
        info!(
            vendor_id = %entry.vendor_id,
            ledger_id = %entry.ledger_id,
            transaction_type = ?entry.transaction_type,
            debit = %entry.debit,
            credit = %entry.credit,
            "vendor ledger posted"
        );
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::VendorLedgerPosted {
                    vendor_id: entry.vendor_id,
                    ledger_id: entry.ledger_id,
                    debit: entry.debit,
                    credit: entry.credit,
                })
                .await;
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_vendor(&self, request: CreateVendorRequest) -> Result<vendor::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let vendor_number =
            db::next_sequence_number::<VendorEntity, _>(&txn, vendor::Column::VendorNumber).await?;
        let vendor = vendor::ActiveModel {
            vendor_id: Set(Uuid::new_v4()),
            vendor_number: Set(vendor_number),
            vendor_name: Set(request.vendor_name.trim().to_string()),
            vendor_type: Set(request.vendor_type),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        info!(vendor_id = %vendor.vendor_id, vendor_number, "vendor created");
        Ok(vendor)
    }

    #[instrument(skip(self))]
    pub async fn list_vendors(&self) -> Result<Vec<vendor::Model>, ServiceError> {
        Ok(VendorEntity::find()
            .order_by_asc(vendor::Column::VendorNumber)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_vendor(&self, vendor_id: Uuid) -> Result<VendorDetail, ServiceError> {
        let db = &*self.db_pool;
        let vendor = find_vendor(db, vendor_id).await?;
        let services = vendor_service::Entity::find()
            .filter(vendor_service::Column::VendorId.eq(vendor_id))
            .order_by_asc(vendor_service::Column::ServiceName)
            .all(db)
            .await?;
        let (_, balance) = running_balances(ledger_entries(db, vendor_id).await?);
        Ok(VendorDetail {
            vendor,
            services,
            balance,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn add_service(
        &self,
        vendor_id: Uuid,
        created_by: Uuid,
        request: CreateVendorServiceRequest,
    ) -> Result<vendor_service::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        find_vendor(db, vendor_id).await?;
        Ok(vendor_service::ActiveModel {
            vendor_service_id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            service_name: Set(request.service_name.trim().to_string()),
            rate: Set(request.rate.round_dp(2)),
            created_by: Set(created_by),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }

    /// Bills a vendor service and posts the matching INVOICE debit.
    #[instrument(skip(self, request), fields(service_id = %request.vendor_service_id))]
    pub async fn record_transaction(
        &self,
        vendor_id: Uuid,
        emp_id: Uuid,
        request: CreateVendorTransactionRequest,
    ) -> Result<VendorTransactionReceipt, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let vendor = find_vendor(&txn, vendor_id).await?;
        let service = vendor_service::Entity::find_by_id(request.vendor_service_id)
            .filter(vendor_service::Column::VendorId.eq(vendor_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::BadRequest("Service does not belong to this vendor".to_string())
            })?;

        let rate = service.rate;
        let total_cost = (rate * Decimal::from(request.quantity)).round_dp(2);
        let tx_date = request.tx_date.unwrap_or_else(db::now);

        let transaction = vendor_transaction::ActiveModel {
            vendor_tx_id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            order_id: Set(request.order_id),
            customer_id: Set(request.customer_id),
            vendor_service_id: Set(service.vendor_service_id),
            rate: Set(rate),
            quantity: Set(request.quantity),
            total_cost: Set(total_cost),
            emp_id: Set(emp_id),
            tx_date: Set(tx_date),
            created_at: Set(db::now()),
        }
        .insert(&txn)
        .await?;

        let ledger_entry = if total_cost.is_zero() {
            info!(vendor_tx_id = %transaction.vendor_tx_id, "zero-cost transaction, no invoice posted");
            None
        } else {
            Some(
                post_ledger(
                    &txn,
                    LedgerPosting {
                        vendor_id,
                        transaction_type: LedgerTransactionType::Invoice,
                        debit: total_cost,
                        credit: Decimal::ZERO,
                        description: Some(format!(
                            "{} x {} for {}",
                            request.quantity, service.service_name, vendor.vendor_name
                        )),
                        related_transaction_id: Some(transaction.vendor_tx_id),
                        created_by: emp_id,
                        transaction_date: tx_date,
                    },
                )
                .await?,
            )
        };
        txn.commit().await?;

        if let Some(entry) = &ledger_entry {
            self.announce(entry).await;
        }
        Ok(VendorTransactionReceipt {
            transaction,
            ledger_entry,
        })
    }

    /// Records a payment to the vendor and the matching PAYMENT credit.
    #[instrument(skip(self, request))]
    pub async fn record_payment(
        &self,
        vendor_id: Uuid,
        emp_id: Uuid,
        request: CreateVendorPaymentRequest,
    ) -> Result<VendorPaymentReceipt, ServiceError> {
        request.validate()?;
        let amount = request.amount.round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be at least 0.01".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        find_vendor(&txn, vendor_id).await?;
        let payment_date = request.payment_date.unwrap_or_else(db::now);

        let payment = vendor_payment::ActiveModel {
            pay_id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            amount: Set(amount),
            emp_id: Set(emp_id),
            payment_date: Set(payment_date),
            notes: Set(request.notes.clone()),
            created_at: Set(db::now()),
        }
        .insert(&txn)
        .await?;

        let ledger_entry = post_ledger(
            &txn,
            LedgerPosting {
                vendor_id,
                transaction_type: LedgerTransactionType::Payment,
                debit: Decimal::ZERO,
                credit: amount,
                description: request.notes.or_else(|| Some("Payment".to_string())),
                related_transaction_id: Some(payment.pay_id),
                created_by: emp_id,
                transaction_date: payment_date,
            },
        )
        .await?;
        txn.commit().await?;

        self.announce(&ledger_entry).await;
        Ok(VendorPaymentReceipt {
            payment,
            ledger_entry,
        })
    }

    /// ADJUSTMENT or STARTING_BALANCE line entered by hand.
    #[instrument(skip(self, request))]
    pub async fn post_manual_entry(
        &self,
        vendor_id: Uuid,
        emp_id: Uuid,
        request: ManualLedgerEntryRequest,
    ) -> Result<vendor_ledger::Model, ServiceError> {
        request.validate()?;
        if !matches!(
            request.transaction_type,
            LedgerTransactionType::Adjustment | LedgerTransactionType::StartingBalance
        ) {
            return Err(ServiceError::ValidationError(
                "Manual entries must be ADJUSTMENT or STARTING_BALANCE".to_string(),
            ));
        }
        let (debit, credit) = ledger_sides(request.debit, request.credit)?;

        let txn = self.db_pool.begin().await?;
        find_vendor(&txn, vendor_id).await?;
        let entry = post_ledger(
            &txn,
            LedgerPosting {
                vendor_id,
                transaction_type: request.transaction_type,
                debit,
                credit,
                description: request.description,
                related_transaction_id: None,
                created_by: emp_id,
                transaction_date: request.transaction_date.unwrap_or_else(db::now),
            },
        )
        .await?;
        txn.commit().await?;

        self.announce(&entry).await;
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn ledger(&self, vendor_id: Uuid) -> Result<VendorLedger, ServiceError> {
        let db = &*self.db_pool;
        find_vendor(db, vendor_id).await?;
        let (entries, closing_balance) = running_balances(ledger_entries(db, vendor_id).await?);
        Ok(VendorLedger {
            vendor_id,
            entries,
            closing_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn entry(debit: Decimal, credit: Decimal) -> vendor_ledger::Model {
        let now = db::now();
        vendor_ledger::Model {
            ledger_id: Uuid::new_v4(),
            vendor_id: Uuid::nil(),
            transaction_date: now,
            transaction_type: LedgerTransactionType::Adjustment,
            debit,
            credit,
            description: None,
            related_transaction_id: None,
            created_by: None,
            created_at: now,
        }
    }

    #[test]
    fn running_balance_is_debit_minus_credit() {
        let (lines, closing) = running_balances(vec![
            entry(dec!(100.00), Decimal::ZERO),
            entry(Decimal::ZERO, dec!(40.50)),
            entry(dec!(12.25), Decimal::ZERO),
        ]);
        let balances: Vec<Decimal> = lines.iter().map(|l| l.running_balance).collect();
        assert_eq!(balances, vec![dec!(100.00), dec!(59.50), dec!(71.75)]);
        assert_eq!(closing, dec!(71.75));
    }

    #[test]
    fn manual_entries_need_exactly_one_side() {
        assert_eq!(
            ledger_sides(Some(dec!(5)), None).unwrap(),
            (dec!(5), Decimal::ZERO)
        );
        assert_eq!(
            ledger_sides(None, Some(dec!(5))).unwrap(),
            (Decimal::ZERO, dec!(5))
        );
        assert_matches!(
            ledger_sides(Some(dec!(5)), Some(dec!(1))),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(ledger_sides(None, Some(Decimal::ZERO)), Err(_));
        assert_matches!(ledger_sides(None, Some(dec!(0.004))), Err(_));
        assert_eq!(
            ledger_sides(Some(dec!(12.346)), Some(dec!(0.001))).unwrap(),
            (dec!(12.35), Decimal::ZERO)
        );
    }

    #[test]
    fn rates_and_amounts_are_range_checked() {
        assert!(validate_non_negative(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative(&dec!(-0.01)).is_err());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&dec!(0.01)).is_ok());
    }
}
