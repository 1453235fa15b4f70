use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::common::{created, page_limits, AppJson},
    services::orders::{
        CreateOrderRequest, OrderDetail, OrderListQuery, OrderPage, UpdateOrderStatusRequest,
    },
    AppState,
};

pub fn order_routes() -> Router<AppState> {
    let employee = Router::new()
        .route("/api/orders", post(create_order))
        .route("/api/orders/:order_id/status", put(update_order_status))
        .with_employee();
    let authenticated = Router::new()
        .route("/api/orders", get(list_orders))
        .route("/api/orders/:order_id", get(get_order))
        .with_auth();
    employee.merge(authenticated)
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderDetail),
        (status = 400, description = "Invalid order", body = crate::errors::ErrorResponse),
        (status = 401, description = "Employees only"),
    ),
    security(("Bearer" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(request): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetail>), ServiceError> {
    let order = state
        .services
        .orders
        .create_order(user.user_id, request)
        .await?;
    Ok(created(order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "orders",
    params(OrderListQuery),
    responses((status = 200, description = "Orders, newest first", body = OrderPage)),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderPage>, ServiceError> {
    let (default_limit, max_limit) = page_limits(&state);
    Ok(Json(
        state
            .services
            .orders
            .list_orders(query, default_limit, max_limit)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "orders",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its lines", body = OrderDetail),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ServiceError> {
    Ok(Json(state.services.orders.get_order(order_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/orders/{order_id}/status",
    tag = "orders",
    params(("order_id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderDetail),
        (status = 400, description = "Transition not allowed or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateOrderStatusRequest>,
) -> Result<Json<OrderDetail>, ServiceError> {
    Ok(Json(
        state
            .services
            .orders
            .update_status(order_id, request.status)
            .await?,
    ))
}
