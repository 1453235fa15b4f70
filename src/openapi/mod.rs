use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Back-office API",
        version = "0.1.0",
        description = r#"
# Logistics back office

Customers, items, inventory, orders, vendors and users over one relational schema.

## Item sync

`GET /api/items/updated?since=<ms>` returns items created, updated and deleted after the
cursor. Clients store the returned `serverTime` and pass it back as the next `since`.

## Authentication

Every `/api/*` route except signup and login needs a bearer token:

```
Authorization: Bearer <jwt>
```

## Errors

```json
{
  "success": false,
  "error": "Bad Request",
  "message": "Insufficient stock",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Signup and login"),
        (name = "items", description = "Items and delta sync"),
        (name = "customers", description = "Individual and business customers"),
        (name = "users", description = "User lookups"),
        (name = "companies", description = "Owning companies"),
        (name = "inventory", description = "Stock and movements"),
        (name = "orders", description = "Orders and fulfilment"),
        (name = "vendors", description = "Vendors, services and ledger"),
        (name = "health", description = "Liveness and status")
    ),
    paths(
        crate::handlers::auth::signup,
        crate::handlers::auth::login,

        crate::handlers::items::create_item,
        crate::handlers::items::list_items,
        crate::handlers::items::all_items,
        crate::handlers::items::updated_items,
        crate::handlers::items::get_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,
        crate::handlers::items::item_owners,

        crate::handlers::customers::create_individual,
        crate::handlers::customers::create_business,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,

        crate::handlers::users::get_user,
        crate::handlers::users::list_users,

        crate::handlers::companies::list_companies,
        crate::handlers::companies::create_company,

        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::record_movement,
        crate::handlers::inventory::inventory_transactions,

        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,

        crate::handlers::vendors::create_vendor,
        crate::handlers::vendors::list_vendors,
        crate::handlers::vendors::get_vendor,
        crate::handlers::vendors::add_service,
        crate::handlers::vendors::record_transaction,
        crate::handlers::vendors::record_payment,
        crate::handlers::vendors::post_ledger_entry,
        crate::handlers::vendors::vendor_ledger,

        crate::health::health_check,
        crate::health::api_status,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::handlers::common::MessageResponse,
            crate::sync::ItemRecord,
            crate::sync::ItemChanges,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_sync_endpoint_and_bearer_scheme() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("/api/items/updated"));
        assert!(json.contains("/api/vendors/{vendor_id}/ledger"));
        assert!(json.contains("\"Bearer\""));
    }
}
