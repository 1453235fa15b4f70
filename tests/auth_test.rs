mod common;

use axum::http::{Method, StatusCode};
use backoffice_api::entities::login_attempt;
use common::{uuid_field, TestApp};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

#[tokio::test]
async fn signup_then_login_returns_token_and_profile() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({
                "email": "Noor@Example.com",
                "password": "secret-pass",
                "firstName": "Noor",
                "lastName": "Aziz"
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let user_id = uuid_field(&body, "userId");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "noor@example.com", "password": "secret-pass" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert!(body["expiresIn"].as_i64().unwrap() > 0);
    assert_eq!(body["user"]["email"], "noor@example.com");
    assert_eq!(body["user"]["userType"], "CUSTOMER");
    assert_eq!(uuid_field(&body["user"], "userId"), user_id);

    let token = body["accessToken"].as_str().unwrap();
    let (status, _) = app
        .request(Method::GET, "/api/items", None, Some(token))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_signup_uses_signup_error_shape() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({
                "email": "staff@example.com",
                "password": "another-pass",
                "firstName": "Dup",
                "lastName": "User"
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["errorMessage"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn bad_password_is_401_and_recorded() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "staff@example.com", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let failures = login_attempt::Entity::find()
        .filter(login_attempt::Column::Success.eq(false))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().any(|a| a.user_id.is_some()));
    assert!(failures.iter().any(|a| a.user_id.is_none()));
}

#[tokio::test]
async fn user_routes_split_between_employees_and_users() {
    let app = TestApp::new().await;

    let (status, _) = app.as_customer(Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .as_employee(Method::GET, "/api/users?page=1&limit=1", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .as_customer(Method::GET, &format!("/api/users/{}", app.employee_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "staff@example.com");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn health_and_status_are_public() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["checks"]["database"], "up");

    let (status, body) = app.request(Method::GET, "/api/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["environment"], "test");
}

#[tokio::test]
async fn malformed_signup_and_login_bodies_are_400() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::POST, "/api/auth/signup", Some(json!({})), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["errorMessage"].is_string());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({
                "email": "x@example.com",
                "password": "secret-pass",
                "firstName": "X",
                "lastName": "Y",
                "userType": "ROBOT"
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .request(Method::POST, "/api/auth/login", Some(json!({ "email": "x" })), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}
