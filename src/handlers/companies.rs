use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::{
    auth::AuthRouterExt,
    entities::company,
    errors::ServiceError,
    handlers::common::{created, AppJson},
    services::companies::CreateCompanyRequest,
    AppState,
};

pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/api/companies", get(list_companies).post(create_company))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "companies",
    responses((status = 200, description = "Companies by number", body = [company::Model])),
    security(("Bearer" = []))
)]
pub async fn list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<company::Model>>, ServiceError> {
    Ok(Json(state.services.companies.list_companies().await?))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = company::Model),
        (status = 400, description = "Invalid input or duplicate contact", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_company(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<company::Model>), ServiceError> {
    let company = state.services.companies.create_company(request).await?;
    Ok(created(company))
}
