use crate::{
    db::{self, DbPool},
    entities::{
        enums::{MovementError, MovementType},
        inventory::{self, Entity as InventoryEntity},
        item, item_transaction,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Location used when a movement does not name one.
pub const DEFAULT_LOCATION: &str = "MAIN";

static LOCATION_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9_-]{0,19}$").unwrap());

fn validate_location_code(code: &str) -> Result<(), ValidationError> {
    if LOCATION_CODE_RE.is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_location_code"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementRequest {
    pub item_id: Uuid,
    #[validate(custom = "validate_location_code")]
    pub location_code: Option<String>,
    pub movement: MovementType,
    #[validate(range(min = 1, message = "Amount must be greater than zero"))]
    pub amount: i32,
    pub order_id: Option<Uuid>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InventoryQuery {
    pub item_id: Option<Uuid>,
}

/// A single movement to apply inside a caller-owned transaction.
#[derive(Debug, Clone)]
pub struct Movement<'a> {
    pub item_id: Uuid,
    pub location_code: &'a str,
    pub movement: MovementType,
    pub amount: i32,
    pub order_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Finds or creates the stock row, applies the movement and writes the
/// transaction record. Runs on whatever connection it is given, so callers
/// that hold a transaction get all-or-nothing semantics.
pub async fn apply_movement<C: ConnectionTrait>(
    conn: &C,
    movement: Movement<'_>,
) -> Result<item_transaction::Model, ServiceError> {
    if movement.amount <= 0 {
        return Err(ServiceError::ValidationError(
            "Amount must be greater than zero".to_string(),
        ));
    }

    let now = db::now();
    let stock = match InventoryEntity::find()
        .filter(inventory::Column::ItemId.eq(movement.item_id))
        .filter(inventory::Column::LocationCode.eq(movement.location_code))
        .one(conn)
        .await?
    {
        Some(row) => row,
        None => {
            inventory::ActiveModel {
                inventory_id: Set(Uuid::new_v4()),
                item_id: Set(movement.item_id),
                location_code: Set(movement.location_code.to_string()),
                quantity: Set(0),
                last_updated: Set(now),
            }
            .insert(conn)
            .await?
        }
    };

    let prev_stock = stock.quantity;
    let new_stock = movement
        .movement
        .apply(prev_stock, movement.amount)
        .map_err(|e| match e {
            MovementError::Insufficient => {
                ServiceError::InsufficientStock("Insufficient stock".to_string())
            }
            MovementError::Overflow => ServiceError::ValidationError("Quantity too large".to_string()),
        })?;

    let inventory_id = stock.inventory_id;
    let mut active = stock.into_active_model();
    active.quantity = Set(new_stock);
    active.last_updated = Set(now);
    active.update(conn).await?;

    let tx = item_transaction::ActiveModel {
        item_tx_id: Set(Uuid::new_v4()),
        order_id: Set(movement.order_id),
        item_id: Set(movement.item_id),
        inventory_id: Set(inventory_id),
        movement: Set(movement.movement),
        movement_amt: Set(movement.amount),
        prev_stock: Set(prev_stock),
        new_stock: Set(new_stock),
        notes: Set(movement.notes),
        tx_date: Set(now),
    }
    .insert(conn)
    .await?;

    Ok(tx)
}

#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_stock(&self, query: InventoryQuery) -> Result<Vec<inventory::Model>, ServiceError> {
        let mut select = InventoryEntity::find();
        if let Some(item_id) = query.item_id {
            select = select.filter(inventory::Column::ItemId.eq(item_id));
        }
        Ok(select
            .order_by_asc(inventory::Column::ItemId)
            .order_by_asc(inventory::Column::LocationCode)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(item_id = %request.item_id, movement = %request.movement))]
    pub async fn record_movement(
        &self,
        request: StockMovementRequest,
    ) -> Result<item_transaction::Model, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let live = item::Entity::find_by_id(request.item_id)
            .filter(item::Column::IsDeleted.eq(false))
            .one(&txn)
            .await?;
        if live.is_none() {
            return Err(ServiceError::not_found("Item"));
        }

        let location = request
            .location_code
            .as_deref()
            .unwrap_or(DEFAULT_LOCATION)
            .to_string();
        let tx = apply_movement(
            &txn,
            Movement {
                item_id: request.item_id,
                location_code: &location,
                movement: request.movement,
                amount: request.amount,
                order_id: request.order_id,
                notes: request.notes,
            },
        )
        .await
        .map_err(|e| {
            if matches!(e, ServiceError::InsufficientStock(_)) {
                warn!(location = %location, "stock movement rejected");
            }
            e
        })?;
        txn.commit().await?;

        info!(
            item_tx_id = %tx.item_tx_id,
            prev_stock = tx.prev_stock,
            new_stock = tx.new_stock,
            "stock moved"
        );
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StockMoved {
                    item_id: tx.item_id,
                    inventory_id: tx.inventory_id,
                    movement: tx.movement,
                    amount: tx.movement_amt,
                    new_stock: tx.new_stock,
                })
                .await;
        }
        Ok(tx)
    }

    /// Movement history for one stock row, newest first.
    #[instrument(skip(self))]
    pub async fn transactions(
        &self,
        inventory_id: Uuid,
    ) -> Result<Vec<item_transaction::Model>, ServiceError> {
        let db = &*self.db_pool;
        if InventoryEntity::find_by_id(inventory_id).one(db).await?.is_none() {
            return Err(ServiceError::not_found("Inventory"));
        }
        Ok(item_transaction::Entity::find()
            .filter(item_transaction::Column::InventoryId.eq(inventory_id))
            .order_by_desc(item_transaction::Column::TxDate)
            .all(db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MAIN", true)]
    #[case("WH-2", true)]
    #[case("bay_1", false)]
    #[case("", false)]
    #[case("A23456789012345678901", false)]
    fn location_codes(#[case] code: &str, #[case] ok: bool) {
        assert_eq!(validate_location_code(code).is_ok(), ok);
    }

    #[test]
    fn zero_amount_fails_validation() {
        let request = StockMovementRequest {
            item_id: Uuid::new_v4(),
            location_code: None,
            movement: MovementType::In,
            amount: 0,
            order_id: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }
}
