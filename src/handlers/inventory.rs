use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::AuthRouterExt,
    entities::{inventory, item_transaction},
    errors::ServiceError,
    handlers::common::{created, AppJson},
    services::inventory::{InventoryQuery, StockMovementRequest},
    AppState,
};

pub fn inventory_routes() -> Router<AppState> {
    let employee = Router::new()
        .route("/api/inventory/movements", post(record_movement))
        .with_employee();
    let authenticated = Router::new()
        .route("/api/inventory", get(list_inventory))
        .route(
            "/api/inventory/:inventory_id/transactions",
            get(inventory_transactions),
        )
        .with_auth();
    employee.merge(authenticated)
}

#[utoipa::path(
    get,
    path = "/api/inventory",
    tag = "inventory",
    params(InventoryQuery),
    responses((status = 200, description = "Stock rows", body = [inventory::Model])),
    security(("Bearer" = []))
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<Vec<inventory::Model>>, ServiceError> {
    Ok(Json(state.services.inventory.list_stock(query).await?))
}

#[utoipa::path(
    post,
    path = "/api/inventory/movements",
    tag = "inventory",
    request_body = StockMovementRequest,
    responses(
        (status = 201, description = "Movement recorded", body = item_transaction::Model),
        (status = 400, description = "Invalid movement or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn record_movement(
    State(state): State<AppState>,
    AppJson(request): AppJson<StockMovementRequest>,
) -> Result<(StatusCode, Json<item_transaction::Model>), ServiceError> {
    let tx = state.services.inventory.record_movement(request).await?;
    Ok(created(tx))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{inventory_id}/transactions",
    tag = "inventory",
    params(("inventory_id" = Uuid, Path, description = "Stock row id")),
    responses(
        (status = 200, description = "Movements, newest first", body = [item_transaction::Model]),
        (status = 404, description = "Inventory not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn inventory_transactions(
    State(state): State<AppState>,
    Path(inventory_id): Path<Uuid>,
) -> Result<Json<Vec<item_transaction::Model>>, ServiceError> {
    Ok(Json(state.services.inventory.transactions(inventory_id).await?))
}
