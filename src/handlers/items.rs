use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::common::{created, page_limits, AppJson, MessageResponse},
    services::items::{CreateItemRequest, ItemListQuery, ItemPage, OwnerOption, UpdateItemRequest},
    sync::{ChangesQuery, ItemChanges, ItemRecord},
    AppState,
};

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/all", get(all_items))
        .route("/api/items/updated", get(updated_items))
        .route(
            "/api/items/:item_id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/item-owners", get(item_owners))
        .with_auth()
}

#[utoipa::path(
    post,
    path = "/api/items",
    tag = "items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemRecord),
        (status = 400, description = "Failed to create item", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = []))
)]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<AppJson<CreateItemRequest>, ServiceError>,
) -> Result<(StatusCode, Json<ItemRecord>), ServiceError> {
    let AppJson(request) = payload
        .map_err(|e| ServiceError::ValidationError(format!("Failed to create item: {}", e)))?;
    let item = state
        .services
        .items
        .create_item(user.user_id, request)
        .await
        .map_err(|e| match e {
            ServiceError::Conflict(msg) | ServiceError::BadRequest(msg) => {
                ServiceError::BadRequest(format!("Failed to create item: {}", msg))
            }
            other => other,
        })?;
    Ok(created(item))
}

#[utoipa::path(
    get,
    path = "/api/items",
    tag = "items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "A page of live items", body = ItemPage),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = []))
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<ItemPage>, ServiceError> {
    let (default_limit, max_limit) = page_limits(&state);
    let page = state
        .services
        .items
        .list_items(query, default_limit, max_limit)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/items/all",
    tag = "items",
    responses((status = 200, description = "Every live item by number", body = [ItemRecord])),
    security(("Bearer" = []))
)]
pub async fn all_items(State(state): State<AppState>) -> Result<Json<Vec<ItemRecord>>, ServiceError> {
    Ok(Json(state.services.items.all_items().await?))
}

#[utoipa::path(
    get,
    path = "/api/items/updated",
    tag = "items",
    params(ChangesQuery),
    responses(
        (status = 200, description = "Items changed since the cursor", body = ItemChanges),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = []))
)]
pub async fn updated_items(
    State(state): State<AppState>,
    Query(query): Query<ChangesQuery>,
) -> Result<Json<ItemChanges>, ServiceError> {
    Ok(Json(state.services.items.changes_since(query.cursor()).await?))
}

#[utoipa::path(
    get,
    path = "/api/items/{item_id}",
    tag = "items",
    params(("item_id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "The item", body = ItemRecord),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemRecord>, ServiceError> {
    Ok(Json(state.services.items.get_item(item_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/items/{item_id}",
    tag = "items",
    params(("item_id" = Uuid, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated item", body = ItemRecord),
        (status = 400, description = "Invalid update", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateItemRequest>,
) -> Result<Json<ItemRecord>, ServiceError> {
    Ok(Json(state.services.items.update_item(item_id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/items/{item_id}",
    tag = "items",
    params(("item_id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item moved to trash", body = MessageResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.services.items.delete_item(item_id, user.user_id).await?;
    Ok(Json(MessageResponse::ok("Item moved to trash")))
}

#[utoipa::path(
    get,
    path = "/api/item-owners",
    tag = "items",
    responses((status = 200, description = "Selectable item owners", body = [OwnerOption])),
    security(("Bearer" = []))
)]
pub async fn item_owners(State(state): State<AppState>) -> Result<Json<Vec<OwnerOption>>, ServiceError> {
    Ok(Json(state.services.items.owner_options().await?))
}
