use actix_web::http::StatusCode;
use chrono::{Duration, Utc};
use fine_payment_engine::{
    db_types::{FineId, FineStatus, NewFine},
    traits::{FineLookup, PaymentGatewayError},
    TransactionFlowApi,
};
use fpg_common::Tiyin;
use serde_json::{json, Value};

use super::{
    helpers::{fresh_api, payme_config, post_payme, rpc, valid_auth_header},
    mocks::MockStore,
};
use crate::jsonrpc::handle_rpc_body;

fn error_code(response: &Value) -> i64 {
    response["error"]["code"].as_i64().expect("Response has no error code")
}

#[actix_web::test]
async fn unparseable_body_is_a_parse_error() {
    let api = fresh_api().await;
    let (status, response) =
        post_payme(&api, &payme_config(true), Some(&valid_auth_header()), r#"{"method": "CheckTransaction", "#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], Value::Null);
    assert_eq!(error_code(&response), -32700);
}

#[actix_web::test]
async fn malformed_envelope_keeps_the_id() {
    let api = fresh_api().await;
    let response = rpc(&api, json!({"id": 5, "params": {}})).await;
    assert_eq!(response["id"], 5);
    assert_eq!(error_code(&response), -32600);

    let response = rpc(&api, json!({"method": "CreateTransaction", "params": {"amount": 100}, "id": 6})).await;
    assert_eq!(response["id"], 6);
    assert_eq!(error_code(&response), -32600);
}

#[actix_web::test]
async fn unknown_method() {
    let api = fresh_api().await;
    let response = rpc(&api, json!({"method": "ChangePassword", "params": {"password": "x"}, "id": 11})).await;
    assert_eq!(response["id"], 11);
    assert_eq!(error_code(&response), -32601);
    assert_eq!(response["error"]["message"]["ru"], "Метод не поддерживается");
}

#[actix_web::test]
async fn missing_order_id_names_the_field() {
    let api = fresh_api().await;
    let response =
        rpc(&api, json!({"method": "CheckPerformTransaction", "params": {"amount": 500, "account": {}}, "id": 1})).await;
    assert_eq!(error_code(&response), -31050);
    assert_eq!(response["error"]["data"], "order_id");
}

#[actix_web::test]
async fn unknown_transaction() {
    let api = fresh_api().await;
    let response = rpc(&api, json!({"method": "CheckTransaction", "params": {"id": "nope"}, "id": "abc"})).await;
    assert_eq!(response["id"], "abc");
    assert_eq!(error_code(&response), -31003);
}

#[actix_web::test]
async fn full_lifecycle_over_http() {
    let api = fresh_api().await;
    let issued = Utc::now() - Duration::days(20);
    api.db().insert_fine(NewFine::new("F-100", Tiyin::from(50_000), issued)).await.unwrap();
    let fine_id = FineId::from("F-100");

    let response = rpc(
        &api,
        json!({"method": "CheckPerformTransaction", "params": {"amount": 50_000, "account": {"order_id": "F-100"}}, "id": 1}),
    )
    .await;
    assert_eq!(response["result"], json!({"allow": true}));

    let response = rpc(
        &api,
        json!({"method": "CheckPerformTransaction", "params": {"amount": 40_000, "account": {"order_id": "F-100"}}, "id": 2}),
    )
    .await;
    assert_eq!(error_code(&response), -31001);

    let gateway_time = Utc::now().timestamp_millis();
    let create = json!({
        "method": "CreateTransaction",
        "params": {"id": "tx-100", "time": gateway_time, "amount": 50_000, "account": {"order_id": "F-100"}},
        "id": 3
    });
    let response = rpc(&api, create.clone()).await;
    assert_eq!(response["id"], 3);
    assert_eq!(response["result"]["transaction"], "tx-100");
    assert_eq!(response["result"]["state"], 1);
    let create_time = response["result"]["create_time"].as_i64().unwrap();
    assert!(create_time > 0);

    // A retry is answered from the stored record
    let replay = rpc(&api, create).await;
    assert_eq!(replay["result"], response["result"]);

    let response = rpc(&api, json!({"method": "PerformTransaction", "params": {"id": "tx-100"}, "id": 4})).await;
    assert_eq!(response["result"]["state"], 2);
    assert!(response["result"]["perform_time"].as_i64().unwrap() >= create_time);
    assert_eq!(api.db().fetch_fine(&fine_id).await.unwrap().unwrap().status, FineStatus::Paid);

    let response = rpc(&api, json!({"method": "CheckTransaction", "params": {"id": "tx-100"}, "id": 5})).await;
    assert_eq!(response["result"]["state"], 2);
    assert_eq!(response["result"]["cancel_time"], 0);
    assert_eq!(response["result"]["reason"], Value::Null);

    let response =
        rpc(&api, json!({"method": "CancelTransaction", "params": {"id": "tx-100", "reason": 5}, "id": 6})).await;
    assert_eq!(response["result"]["state"], -2);
    assert!(response["result"]["cancel_time"].as_i64().unwrap() > 0);
    assert_eq!(api.db().fetch_fine(&fine_id).await.unwrap().unwrap().status, FineStatus::Pending);

    let to = Utc::now().timestamp_millis() + 1_000;
    let response = rpc(&api, json!({"method": "GetStatement", "params": {"from": 0, "to": to}, "id": 7})).await;
    let transactions = response["result"]["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["id"], "tx-100");
    assert_eq!(transactions[0]["time"], gateway_time);
    assert_eq!(transactions[0]["account"]["order_id"], "F-100");
    assert_eq!(transactions[0]["state"], -2);
    assert_eq!(transactions[0]["reason"], 5);
}

#[actix_web::test]
async fn storage_failure_is_a_system_error() {
    let mut store = MockStore::new();
    store.expect_fetch_fine().returning(|_| Err(PaymentGatewayError::DatabaseError("disk I/O error".into())));
    let api = TransactionFlowApi::new(store, Duration::hours(12));
    let body = json!({
        "method": "CheckPerformTransaction",
        "params": {"amount": 500, "account": {"order_id": "F-1"}},
        "id": 42
    })
    .to_string();
    let response = handle_rpc_body(&api, body.as_bytes(), Utc::now()).await;
    let value = serde_json::to_value(response).unwrap();
    assert_eq!(value["id"], 42);
    assert_eq!(error_code(&value), -32400);
    // Internal details are logged, never sent to the gateway
    assert!(!value.to_string().contains("disk I/O error"));
}
