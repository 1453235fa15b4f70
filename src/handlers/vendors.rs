use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{vendor, vendor_ledger, vendor_service},
    errors::ServiceError,
    handlers::common::{created, AppJson},
    services::vendors::{
        CreateVendorPaymentRequest, CreateVendorRequest, CreateVendorServiceRequest,
        CreateVendorTransactionRequest, ManualLedgerEntryRequest, VendorDetail, VendorLedger,
        VendorPaymentReceipt, VendorTransactionReceipt,
    },
    AppState,
};

pub fn vendor_routes() -> Router<AppState> {
    let employee = Router::new()
        .route("/api/vendors", post(create_vendor))
        .route("/api/vendors/:vendor_id/services", post(add_service))
        .route("/api/vendors/:vendor_id/transactions", post(record_transaction))
        .route("/api/vendors/:vendor_id/payments", post(record_payment))
        .route("/api/vendors/:vendor_id/ledger", post(post_ledger_entry))
        .with_employee();
    let authenticated = Router::new()
        .route("/api/vendors", get(list_vendors))
        .route("/api/vendors/:vendor_id", get(get_vendor))
        .route("/api/vendors/:vendor_id/ledger", get(vendor_ledger))
        .with_auth();
    employee.merge(authenticated)
}

#[utoipa::path(
    post,
    path = "/api/vendors",
    tag = "vendors",
    request_body = CreateVendorRequest,
    responses(
        (status = 201, description = "Vendor created", body = vendor::Model),
        (status = 400, description = "Invalid vendor", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateVendorRequest>,
) -> Result<(StatusCode, Json<vendor::Model>), ServiceError> {
    Ok(created(state.services.vendors.create_vendor(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/vendors",
    tag = "vendors",
    responses((status = 200, description = "Vendors by number", body = [vendor::Model])),
    security(("Bearer" = []))
)]
pub async fn list_vendors(State(state): State<AppState>) -> Result<Json<Vec<vendor::Model>>, ServiceError> {
    Ok(Json(state.services.vendors.list_vendors().await?))
}

#[utoipa::path(
    get,
    path = "/api/vendors/{vendor_id}",
    tag = "vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Vendor with services and balance", body = VendorDetail),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<VendorDetail>, ServiceError> {
    Ok(Json(state.services.vendors.get_vendor(vendor_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/vendors/{vendor_id}/services",
    tag = "vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor id")),
    request_body = CreateVendorServiceRequest,
    responses(
        (status = 201, description = "Service added", body = vendor_service::Model),
        (status = 400, description = "Invalid rate", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn add_service(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(vendor_id): Path<Uuid>,
    AppJson(request): AppJson<CreateVendorServiceRequest>,
) -> Result<(StatusCode, Json<vendor_service::Model>), ServiceError> {
    let service = state
        .services
        .vendors
        .add_service(vendor_id, user.user_id, request)
        .await?;
    Ok(created(service))
}

#[utoipa::path(
    post,
    path = "/api/vendors/{vendor_id}/transactions",
    tag = "vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor id")),
    request_body = CreateVendorTransactionRequest,
    responses(
        (status = 201, description = "Transaction and INVOICE entry recorded", body = VendorTransactionReceipt),
        (status = 400, description = "Invalid transaction", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn record_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(vendor_id): Path<Uuid>,
    AppJson(request): AppJson<CreateVendorTransactionRequest>,
) -> Result<(StatusCode, Json<VendorTransactionReceipt>), ServiceError> {
    let receipt = state
        .services
        .vendors
        .record_transaction(vendor_id, user.user_id, request)
        .await?;
    Ok(created(receipt))
}

#[utoipa::path(
    post,
    path = "/api/vendors/{vendor_id}/payments",
    tag = "vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor id")),
    request_body = CreateVendorPaymentRequest,
    responses(
        (status = 201, description = "Payment and PAYMENT entry recorded", body = VendorPaymentReceipt),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(vendor_id): Path<Uuid>,
    AppJson(request): AppJson<CreateVendorPaymentRequest>,
) -> Result<(StatusCode, Json<VendorPaymentReceipt>), ServiceError> {
    let receipt = state
        .services
        .vendors
        .record_payment(vendor_id, user.user_id, request)
        .await?;
    Ok(created(receipt))
}

#[utoipa::path(
    post,
    path = "/api/vendors/{vendor_id}/ledger",
    tag = "vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor id")),
    request_body = ManualLedgerEntryRequest,
    responses(
        (status = 201, description = "Ledger entry posted", body = vendor_ledger::Model),
        (status = 400, description = "Exactly one of debit or credit must be positive", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn post_ledger_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(vendor_id): Path<Uuid>,
    AppJson(request): AppJson<ManualLedgerEntryRequest>,
) -> Result<(StatusCode, Json<vendor_ledger::Model>), ServiceError> {
    let entry = state
        .services
        .vendors
        .post_manual_entry(vendor_id, user.user_id, request)
        .await?;
    Ok(created(entry))
}

#[utoipa::path(
    get,
    path = "/api/vendors/{vendor_id}/ledger",
    tag = "vendors",
    params(("vendor_id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Entries with running balance", body = VendorLedger),
        (status = 404, description = "Vendor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn vendor_ledger(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<VendorLedger>, ServiceError> {
    Ok(Json(state.services.vendors.ledger(vendor_id).await?))
}
