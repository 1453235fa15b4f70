use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::AuthRouterExt,
    errors::ServiceError,
    handlers::common::page_limits,
    services::users::{UserListQuery, UserPage, UserProfile},
    AppState,
};

pub fn user_routes() -> Router<AppState> {
    let employee = Router::new()
        .route("/api/users", get(list_users))
        .with_employee();
    let authenticated = Router::new()
        .route("/api/users/:user_id", get(get_user))
        .with_auth();
    employee.merge(authenticated)
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>, ServiceError> {
    Ok(Json(state.services.users.get_user(user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(UserListQuery),
    responses(
        (status = 200, description = "A page of users", body = UserPage),
        (status = 401, description = "Employees only"),
    ),
    security(("Bearer" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserPage>, ServiceError> {
    let (default_limit, max_limit) = page_limits(&state);
    Ok(Json(
        state
            .services
            .users
            .list_users(query, default_limit, max_limit)
            .await?,
    ))
}
