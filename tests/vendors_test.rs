mod common;

use axum::http::{Method, StatusCode};
use backoffice_api::{
    entities::enums::LedgerTransactionType,
    services::vendors::{VendorDetail, VendorLedger},
};
use common::{uuid_field, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

async fn vendor_with_service(app: &TestApp, rate: &str) -> (Uuid, Uuid) {
    let (status, vendor) = app
        .as_employee(
            Method::POST,
            "/api/vendors",
            Some(json!({ "vendorName": "Falcon Lifts", "vendorType": "FORKLIFT" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let vendor_id = uuid_field(&vendor, "vendorId");

    let (status, service) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{vendor_id}/services"),
            Some(json!({ "serviceName": "Forklift hour", "rate": rate })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    (vendor_id, uuid_field(&service, "vendorServiceId"))
}

#[tokio::test]
async fn ledger_keeps_a_running_balance() {
    let app = TestApp::new().await;
    let (vendor_id, service_id) = vendor_with_service(&app, "75.50").await;

    let (status, _) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{vendor_id}/ledger"),
            Some(json!({
                "transactionType": "STARTING_BALANCE",
                "debit": "100.00",
                "transactionDate": "2024-01-01T00:00:00Z"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, receipt) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{vendor_id}/transactions"),
            Some(json!({
                "vendorServiceId": service_id,
                "quantity": 3,
                "txDate": "2024-02-01T00:00:00Z"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["ledgerEntry"]["transactionType"], "INVOICE");
    assert_eq!(
        receipt["ledgerEntry"]["relatedTransactionId"],
        receipt["transaction"]["vendorTxId"]
    );

    let (status, _) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{vendor_id}/payments"),
            Some(json!({ "amount": "200", "paymentDate": "2024-03-01T00:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .as_customer(Method::GET, &format!("/api/vendors/{vendor_id}/ledger"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let ledger: VendorLedger = serde_json::from_value(body).unwrap();
    let kinds: Vec<_> = ledger
        .entries
        .iter()
        .map(|l| l.entry.transaction_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            LedgerTransactionType::StartingBalance,
            LedgerTransactionType::Invoice,
            LedgerTransactionType::Payment
        ]
    );
    let running: Vec<_> = ledger.entries.iter().map(|l| l.running_balance).collect();
    assert_eq!(running, vec![dec!(100), dec!(326.50), dec!(126.50)]);
    assert_eq!(ledger.closing_balance, dec!(126.50));

    let (_, body) = app
        .as_customer(Method::GET, &format!("/api/vendors/{vendor_id}"), None)
        .await;
    let detail: VendorDetail = serde_json::from_value(body).unwrap();
    assert_eq!(detail.balance, dec!(126.50));
    assert_eq!(detail.services.len(), 1);
}

#[tokio::test]
async fn service_from_another_vendor_is_rejected() {
    let app = TestApp::new().await;
    let (vendor_a, _) = vendor_with_service(&app, "10").await;
    let (_, service_b) = vendor_with_service(&app, "20").await;

    let (status, body) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{vendor_a}/transactions"),
            Some(json!({ "vendorServiceId": service_b, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Service does not belong to this vendor");
}

#[tokio::test]
async fn manual_entries_need_exactly_one_side_and_a_manual_type() {
    let app = TestApp::new().await;
    let (vendor_id, _) = vendor_with_service(&app, "10").await;
    let uri = format!("/api/vendors/{vendor_id}/ledger");

    for body in [
        json!({ "transactionType": "ADJUSTMENT", "debit": "5", "credit": "5" }),
        json!({ "transactionType": "ADJUSTMENT" }),
        json!({ "transactionType": "INVOICE", "debit": "5" }),
        json!({ "transactionType": "ADJUSTMENT", "credit": "-1" }),
    ] {
        let (status, _) = app.as_employee(Method::POST, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, entry) = app
        .as_employee(
            Method::POST,
            &uri,
            Some(json!({ "transactionType": "ADJUSTMENT", "credit": "12.345" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["transactionType"], "ADJUSTMENT");
}

#[tokio::test]
async fn vendor_writes_are_employee_only_and_unknown_vendor_is_404() {
    let app = TestApp::new().await;

    let (status, _) = app
        .as_customer(
            Method::POST,
            "/api/vendors",
            Some(json!({ "vendorName": "Nope", "vendorType": "LABOUR" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .as_employee(
            Method::GET,
            &format!("/api/vendors/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Vendor not found");

    let (status, _) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{}/payments", Uuid::new_v4()),
            Some(json!({ "amount": "1" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_rate_work_is_recorded_without_an_invoice() {
    let app = TestApp::new().await;
    let (vendor_id, service_id) = vendor_with_service(&app, "0").await;

    let (status, receipt) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{vendor_id}/transactions"),
            Some(json!({ "vendorServiceId": service_id, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["transaction"]["quantity"], 2);
    assert!(receipt["ledgerEntry"].is_null());

    let (_, body) = app
        .as_employee(Method::GET, &format!("/api/vendors/{vendor_id}/ledger"), None)
        .await;
    let ledger: VendorLedger = serde_json::from_value(body).unwrap();
    assert!(ledger.entries.is_empty());
    assert_eq!(ledger.closing_balance, dec!(0));
}

#[tokio::test]
async fn sub_cent_amounts_are_rejected_before_reaching_the_ledger() {
    let app = TestApp::new().await;
    let (vendor_id, _) = vendor_with_service(&app, "10").await;

    let (status, body) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{vendor_id}/payments"),
            Some(json!({ "amount": "0.001" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payment amount must be at least 0.01");

    let (status, body) = app
        .as_employee(
            Method::POST,
            &format!("/api/vendors/{vendor_id}/ledger"),
            Some(json!({ "transactionType": "ADJUSTMENT", "debit": "0.004" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Exactly one of debit or credit must be greater than zero"
    );

    let (_, body) = app
        .as_employee(Method::GET, &format!("/api/vendors/{vendor_id}/ledger"), None)
        .await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 0);
}
