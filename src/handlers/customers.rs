use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthRouterExt,
    errors::ServiceError,
    handlers::common::AppJson,
    services::customers::{
        CreateBusinessCustomerRequest, CreateIndividualCustomerRequest, CustomerDetail,
    },
    ApiResponse, AppState,
};

/// Customer endpoints answer failures as `{ success: false, error }`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerErrorResponse {
    pub success: bool,
    pub error: String,
}

pub struct CustomerError(ServiceError);

impl From<ServiceError> for CustomerError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CustomerError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_internal() {
            tracing::error!(error = %self.0, "customer request failed");
        }
        let body = CustomerErrorResponse {
            success: false,
            error: self.0.response_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Read and business-create routes need a login; individual create is employee-only.
pub fn customer_routes() -> Router<AppState> {
    let employee = Router::new()
        .route("/api/customers/individual", post(create_individual))
        .with_employee();

    let authenticated = Router::new()
        .route("/api/customers", get(list_customers))
        .route("/api/customers/business", post(create_business))
        .route("/api/customers/:customer_id", get(get_customer))
        .with_auth();

    employee.merge(authenticated)
}

#[utoipa::path(
    post,
    path = "/api/customers/individual",
    tag = "customers",
    request_body = CreateIndividualCustomerRequest,
    responses(
        (status = 200, description = "Customer created", body = ApiResponse<CustomerDetail>),
        (status = 400, description = "Invalid input or duplicate", body = CustomerErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = CustomerErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_individual(
    State(state): State<AppState>,
    payload: Result<AppJson<CreateIndividualCustomerRequest>, ServiceError>,
) -> Result<Json<ApiResponse<CustomerDetail>>, CustomerError> {
    let AppJson(request) = payload?;
    let customer = state.services.customers.create_individual(request).await?;
    Ok(Json(
        ApiResponse::success(customer).with_message("Customer created successfully"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/customers/business",
    tag = "customers",
    request_body = CreateBusinessCustomerRequest,
    responses(
        (status = 200, description = "Customer created", body = ApiResponse<CustomerDetail>),
        (status = 400, description = "Invalid input or duplicate", body = CustomerErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = CustomerErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_business(
    State(state): State<AppState>,
    payload: Result<AppJson<CreateBusinessCustomerRequest>, ServiceError>,
) -> Result<Json<ApiResponse<CustomerDetail>>, CustomerError> {
    let AppJson(request) = payload?;
    let customer = state.services.customers.create_business(request).await?;
    Ok(Json(
        ApiResponse::success(customer).with_message("Customer created successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "customers",
    responses((status = 200, description = "Customers with related data", body = [CustomerDetail])),
    security(("Bearer" = []))
)]
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerDetail>>, CustomerError> {
    Ok(Json(state.services.customers.list_customers().await?))
}

#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}",
    tag = "customers",
    params(("customer_id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "The customer", body = CustomerDetail),
        (status = 404, description = "Customer not found", body = CustomerErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<CustomerDetail>, CustomerError> {
    Ok(Json(state.services.customers.get_customer(customer_id).await?))
}
