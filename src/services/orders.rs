use crate::{
    db::{self, DbPool},
    entities::{
        customer,
        enums::{DeliveryMethod, MovementType, OrderStatus, OrderType, PackingType},
        item,
        order::{self, Entity as OrderEntity},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::{apply_movement, Movement, DEFAULT_LOCATION},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub item_id: Uuid,
    pub quantity: i32,
}

fn validate_lines(lines: &[OrderLineInput]) -> Result<(), ValidationError> {
    if lines.iter().any(|l| l.quantity <= 0) {
        return Err(ValidationError::new("quantity_must_be_positive"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub order_type: OrderType,
    pub movement: MovementType,
    pub packing_type: PackingType,
    pub delivery_method: DeliveryMethod,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub address_id: Option<Uuid>,
    #[validate(
        length(min = 1, message = "An order needs at least one item"),
        custom = "validate_lines"
    )]
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

/// Service for orders and their fulfilment
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }

    /// Creates a PENDING order and its lines in one transaction.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_order(
        &self,
        creator_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;

        if customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::BadRequest("Customer not found".to_string()));
        }

        let wanted: HashSet<Uuid> = request.items.iter().map(|l| l.item_id).collect();
        let live = item::Entity::find()
            .filter(item::Column::ItemId.is_in(wanted.iter().copied()))
            .filter(item::Column::IsDeleted.eq(false))
            .count(&txn)
            .await?;
        if live != wanted.len() as u64 {
            return Err(ServiceError::BadRequest(
                "One or more items do not exist or were deleted".to_string(),
            ));
        }

        let order_number =
            db::next_sequence_number::<OrderEntity, _>(&txn, order::Column::OrderNumber).await?;
        let order = order::ActiveModel {
            order_id: Set(Uuid::new_v4()),
            order_number: Set(order_number),
            creator_id: Set(creator_id),
            customer_id: Set(request.customer_id),
            order_type: Set(request.order_type),
            movement: Set(request.movement),
            packing_type: Set(request.packing_type),
            delivery_method: Set(request.delivery_method),
            notes: Set(request.notes.filter(|n| !n.trim().is_empty())),
            status: Set(OrderStatus::Pending),
            address_id: Set(request.address_id),
            fulfilled_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to insert order");
            ServiceError::from(e)
        })?;

        let mut items = Vec::with_capacity(request.items.len());
        for line in request.items {
            let row = order_item::ActiveModel {
                order_item_id: Set(Uuid::new_v4()),
                order_id: Set(order.order_id),
                item_id: Set(line.item_id),
                quantity: Set(line.quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            items.push(row);
        }

        txn.commit().await?;
        info!(order_id = %order.order_id, order_number, lines = items.len(), "order created");
        self.emit(Event::OrderCreated(order.order_id)).await;

        Ok(OrderDetail { order, items })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order"))?;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(OrderDetail { order, items })
    }

    /// Newest first, optionally filtered by status and customer.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        query: OrderListQuery,
        default_limit: u64,
        max_limit: u64,
    ) -> Result<OrderPage, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));

        let mut select = OrderEntity::find();
        if let Some(status) = query.status {
            select = select.filter(order::Column::Status.eq(status));
        }
        if let Some(customer_id) = query.customer_id {
            select = select.filter(order::Column::CustomerId.eq(customer_id));
        }

        let paginator = select
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::OrderNumber)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        Ok(OrderPage {
            orders,
            total,
            page,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Moves an order along its lifecycle. Completing it moves stock for
    /// every line; any shortfall rolls the whole change back.
    #[instrument(skip(self), fields(next = %next))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        next: OrderStatus,
    ) -> Result<OrderDetail, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order"))?;

        let current = order.status;
        if !current.can_transition_to(next) {
            warn!(%current, "rejected order status change");
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot change order status from {} to {}",
                current, next
            )));
        }

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&txn)
            .await?;

        let mut active = order.clone().into_active_model();
        active.status = Set(next);
        if next == OrderStatus::Completed {
            for line in &items {
                apply_movement(
                    &txn,
                    Movement {
                        item_id: line.item_id,
                        location_code: DEFAULT_LOCATION,
                        movement: order.movement,
                        amount: line.quantity,
                        order_id: Some(order_id),
                        notes: Some(format!("Order #{}", order.order_number)),
                    },
                )
                .await?;
            }
            active.fulfilled_at = Set(Some(db::now()));
        }
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(%order_id, from = %current, to = %next, "order status changed");
        self.emit(Event::OrderStatusChanged {
            order_id,
            old_status: current,
            new_status: next,
        })
        .await;

        Ok(OrderDetail {
            order: updated,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<OrderLineInput>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id: Uuid::new_v4(),
            order_type: OrderType::CustomerOrder,
            movement: MovementType::Out,
            packing_type: PackingType::Pallet,
            delivery_method: DeliveryMethod::Pickup,
            notes: None,
            address_id: None,
            items,
        }
    }

    #[test]
    fn orders_need_items_with_positive_quantities() {
        assert!(request(vec![]).validate().is_err());
        assert!(request(vec![OrderLineInput {
            item_id: Uuid::new_v4(),
            quantity: 0
        }])
        .validate()
        .is_err());
        assert!(request(vec![OrderLineInput {
            item_id: Uuid::new_v4(),
            quantity: 3
        }])
        .validate()
        .is_ok());
    }
}
