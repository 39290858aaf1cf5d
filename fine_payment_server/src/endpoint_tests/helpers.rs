use actix_web::{
    http::{
        header::{ContentType, AUTHORIZATION},
        StatusCode,
    },
    test,
    test::TestRequest,
    web,
    App,
};
use chrono::Duration;
use fine_payment_engine::{test_utils::prepare_env::fresh_database, SqliteDatabase, TransactionFlowApi};
use fpg_common::Secret;
use log::debug;
use serde_json::Value;

use crate::{
    config::PaymeConfig,
    middleware::PaymeAuthMiddlewareFactory,
    routes::{health, PaymeWebhookRoute},
};

pub const TEST_MERCHANT_KEY: &str = "ZPDODSiTYKuX0jyO7Kl2to4rQbNwG3Jc";

pub fn payme_config(auth_checks: bool) -> PaymeConfig {
    PaymeConfig { login: "Paycom".into(), merchant_key: Secret::new(TEST_MERCHANT_KEY.to_string()), auth_checks }
}

/// The header the gateway sends with the test merchant key.
pub fn valid_auth_header() -> String {
    format!("Basic {}", base64::encode(format!("Paycom:{TEST_MERCHANT_KEY}")))
}

pub async fn fresh_api() -> TransactionFlowApi<SqliteDatabase> {
    TransactionFlowApi::new(fresh_database().await, Duration::hours(12))
}

/// Posts `body` to `/payme` on an app wired like the real server, and returns the status and decoded JSON answer.
pub async fn post_payme(
    api: &TransactionFlowApi<SqliteDatabase>,
    config: &PaymeConfig,
    auth_header: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let app = App::new().app_data(web::Data::new(api.clone())).service(health).service(
        web::scope("/payme")
            .wrap(PaymeAuthMiddlewareFactory::new(&config.login, config.merchant_key.clone(), config.auth_checks))
            .service(PaymeWebhookRoute::<SqliteDatabase>::new()),
    );
    let service = test::init_service(app).await;
    let mut req = TestRequest::post().uri("/payme").insert_header(ContentType::json()).set_payload(body.to_string());
    if let Some(header) = auth_header {
        req = req.insert_header((AUTHORIZATION, header));
    }
    debug!("Making request: {body}");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let bytes = test::read_body(res).await;
    let value = serde_json::from_slice(&bytes).expect("Response was not JSON");
    (status, value)
}

/// Posts an authorized JSON-RPC call.
pub async fn rpc(api: &TransactionFlowApi<SqliteDatabase>, body: Value) -> Value {
    let (status, value) = post_payme(api, &payme_config(true), Some(&valid_auth_header()), &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    value
}
