//! Gateway authorization middleware for Actix Web.
//!
//! Payme authenticates every webhook call with HTTP Basic auth: the `Authorization` header carries
//! `Basic base64("<login>:<merchant key>")`, where the login is `Paycom` and the key is issued by Payme to the merchant.
//!
//! A call that fails the check never reaches the handler. The gateway still expects a JSON-RPC answer with HTTP 200, so
//! the middleware replies with an `InvalidAuthorization` (-32504) error envelope with a `null` id.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpResponse,
};
use fpg_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::jsonrpc::{RpcError, RpcResponse};

pub struct PaymeAuthMiddlewareFactory {
    login: String,
    key: Secret<String>,
    // If false, then the middleware does not check the credentials and always allows the call
    enabled: bool,
}

impl PaymeAuthMiddlewareFactory {
    pub fn new(login: &str, key: Secret<String>, enabled: bool) -> Self {
        PaymeAuthMiddlewareFactory { login: login.into(), key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PaymeAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = PaymeAuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PaymeAuthMiddlewareService {
            login: self.login.clone(),
            key: self.key.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct PaymeAuthMiddlewareService<S> {
    login: String,
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for PaymeAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        if !self.enabled {
            trace!("🔐️ Gateway authorization checks are disabled. Allowing request.");
            return Box::pin(async move { service.call(req).await.map(ServiceResponse::map_into_left_body) });
        }
        let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let authorized = is_authorized(header, &self.login, self.key.reveal());
        Box::pin(async move {
            if authorized {
                trace!("🔐️ Gateway authorization ✅️");
                service.call(req).await.map(ServiceResponse::map_into_left_body)
            } else {
                warn!("🔐️ Gateway call with missing or invalid credentials. Denying access.");
                let body = RpcResponse::failure(Value::Null, RpcError::invalid_authorization());
                Ok(req.into_response(HttpResponse::Ok().json(body)).map_into_right_body())
            }
        })
    }
}

/// Checks an `Authorization` header value against the expected credentials. An empty merchant key never matches.
pub fn is_authorized(header: Option<&str>, login: &str, key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    let Some(token) = header.and_then(|h| h.strip_prefix("Basic ")) else {
        return false;
    };
    match base64::decode(token.trim()) {
        Ok(decoded) => credentials_match(&decoded, format!("{login}:{key}").as_bytes()),
        Err(e) => {
            trace!("🔐️ Authorization header is not valid base64. {e}");
            false
        },
    }
}

/// Compares credentials in constant time. Only the length of the expected value can leak.
fn credentials_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.ct_eq(expected).into()
}
