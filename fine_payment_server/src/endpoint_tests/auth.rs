use actix_web::http::StatusCode;
use serde_json::{json, Value};

use super::helpers::{fresh_api, payme_config, post_payme, valid_auth_header};

fn check_transaction() -> String {
    json!({"method": "CheckTransaction", "params": {"id": "tx-1"}, "id": 9}).to_string()
}

fn assert_unauthorized(status: StatusCode, response: &Value) {
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["error"]["code"], -32504);
    assert_eq!(response["error"]["message"]["en"], "Authorization invalid");
}

#[actix_web::test]
async fn missing_header() {
    let api = fresh_api().await;
    let (status, response) = post_payme(&api, &payme_config(true), None, &check_transaction()).await;
    assert_unauthorized(status, &response);
}

#[actix_web::test]
async fn wrong_key() {
    let api = fresh_api().await;
    let header = format!("Basic {}", base64::encode("Paycom:not-the-key"));
    let (status, response) = post_payme(&api, &payme_config(true), Some(&header), &check_transaction()).await;
    assert_unauthorized(status, &response);
}

#[actix_web::test]
async fn not_basic_auth() {
    let api = fresh_api().await;
    let (status, response) = post_payme(&api, &payme_config(true), Some("Bearer abc"), &check_transaction()).await;
    assert_unauthorized(status, &response);
}

#[actix_web::test]
async fn valid_credentials_reach_the_handler() {
    let api = fresh_api().await;
    let (status, response) =
        post_payme(&api, &payme_config(true), Some(&valid_auth_header()), &check_transaction()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["id"], 9);
    assert_eq!(response["error"]["code"], -31003);
}

#[actix_web::test]
async fn disabled_checks_allow_everything() {
    let api = fresh_api().await;
    let (status, response) = post_payme(&api, &payme_config(false), None, &check_transaction()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["id"], 9);
    assert_eq!(response["error"]["code"], -31003);
}
