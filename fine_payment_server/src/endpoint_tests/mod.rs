mod auth;
mod helpers;
mod mocks;
mod payme;

use actix_web::{http::StatusCode, test, test::TestRequest, App};

use crate::routes::health;

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().service(health)).await;
    let res = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = test::read_body(res).await;
    assert_eq!(body.as_ref(), "👍️\n".as_bytes());
}
