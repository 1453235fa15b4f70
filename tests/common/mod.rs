#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use backoffice_api::{
    auth::SignupRequest,
    config::AppConfig,
    db,
    entities::enums::UserType,
    events::{self, EventSender},
    AppState,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str =
    "k9Qz4vT1mW8pL2nR7sY5bX3cJ6hF0dG_integration_suite_signing_key_for_tests_only";

/// Application state backed by a throwaway SQLite file, with one employee
/// and one customer account already signed up.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub employee_id: Uuid,
    pub employee_token: String,
    pub customer_token: String,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir");
        let db_path = db_dir.path().join("backoffice_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));
        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx));

        let (employee_id, employee_token) =
            signup_with_token(&state, "staff@example.com", UserType::Employee).await;
        let (_, customer_token) =
            signup_with_token(&state, "client@example.com", UserType::Customer).await;

        Self {
            router: backoffice_api::build_router(state.clone()),
            state,
            employee_id,
            employee_token,
            customer_token,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read response body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Request as the seeded employee.
    pub async fn as_employee(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request(method, uri, body, Some(&self.employee_token))
            .await
    }

    /// Request as the seeded customer account.
    pub async fn as_customer(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request(method, uri, body, Some(&self.customer_token))
            .await
    }

    /// Creates an item and returns its id.
    pub async fn create_item(&self, name: &str) -> Uuid {
        let (status, body) = self
            .as_employee(
                Method::POST,
                "/api/items",
                Some(serde_json::json!({ "itemName": name, "itemType": "CARTON" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create item failed: {body}");
        uuid_field(&body, "itemId")
    }

    /// Creates an individual customer and returns its id.
    pub async fn create_customer(&self, first_name: &str) -> Uuid {
        let (status, body) = self
            .as_employee(
                Method::POST,
                "/api/customers/individual",
                Some(serde_json::json!({
                    "firstName": first_name,
                    "lastName": "Tester",
                    "country": "AE",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create customer failed: {body}");
        uuid_field(&body["data"], "customerId")
    }

    /// Books stock in at the default location.
    pub async fn stock_in(&self, item_id: Uuid, amount: i32) -> Value {
        let (status, body) = self
            .as_employee(
                Method::POST,
                "/api/inventory/movements",
                Some(serde_json::json!({
                    "itemId": item_id,
                    "movement": "IN",
                    "amount": amount,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "stock in failed: {body}");
        body
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

async fn signup_with_token(state: &AppState, email: &str, user_type: UserType) -> (Uuid, String) {
    let user = state
        .auth
        .signup(SignupRequest {
            email: email.to_string(),
            password: "correct-horse".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            user_type: Some(user_type),
        })
        .await
        .expect("seed user");
    let token = state.auth.generate_token(&user).expect("issue token");
    (user.user_id, token.access_token)
}

pub fn uuid_field(value: &Value, field: &str) -> Uuid {
    value[field]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("missing uuid field {field} in {value}"))
}
