//! JSON-RPC envelope handling for the merchant webhook.
//!
//! The gateway always expects HTTP 200 with a JSON-RPC 2.0 body, so every failure in here, from a body that is not JSON
//! at all to a database outage, is turned into an [`RpcError`] and returned inside the envelope. The request `id` is
//! echoed in every response once it could be read.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use fine_payment_engine::{
    payme_objects::{
        CancelTransactionParams,
        CheckPerformTransactionParams,
        CheckTransactionParams,
        CreateTransactionParams,
        GetStatementParams,
        PerformTransactionParams,
    },
    LocalizedMessage,
    PaymeError,
    TransactionFlowApi,
    TransactionStore,
};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_AUTHORIZATION: i32 = -32504;

const MSG_PARSE_ERROR: LocalizedMessage =
    LocalizedMessage::new("Ошибка разбора JSON", "JSON tahlil xatosi", "Could not parse the request body");
const MSG_INVALID_REQUEST: LocalizedMessage =
    LocalizedMessage::new("Неверный запрос", "Noto'g'ri so'rov", "Invalid request");
const MSG_METHOD_NOT_FOUND: LocalizedMessage =
    LocalizedMessage::new("Метод не поддерживается", "Usul qo'llab-quvvatlanmaydi", "Method not supported");
const MSG_INVALID_AUTHORIZATION: LocalizedMessage =
    LocalizedMessage::new("Авторизация недействительна", "Avtorizatsiya yaroqsiz", "Authorization invalid");

//--------------------------------------        Envelope        --------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error) }
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("JSON-RPC error {code} ({})", message.en)]
pub struct RpcError {
    pub code: i32,
    pub message: LocalizedMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'static str>,
}

impl RpcError {
    pub fn parse_error() -> Self {
        Self { code: PARSE_ERROR, message: MSG_PARSE_ERROR, data: None }
    }

    pub fn invalid_request() -> Self {
        Self { code: INVALID_REQUEST, message: MSG_INVALID_REQUEST, data: None }
    }

    pub fn method_not_found() -> Self {
        Self { code: METHOD_NOT_FOUND, message: MSG_METHOD_NOT_FOUND, data: None }
    }

    pub fn invalid_authorization() -> Self {
        Self { code: INVALID_AUTHORIZATION, message: MSG_INVALID_AUTHORIZATION, data: None }
    }
}

impl From<PaymeError> for RpcError {
    fn from(e: PaymeError) -> Self {
        Self { code: e.code(), message: e.message(), data: e.data() }
    }
}

//--------------------------------------        Methods         --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymeMethod {
    CheckPerformTransaction,
    CreateTransaction,
    PerformTransaction,
    CancelTransaction,
    CheckTransaction,
    GetStatement,
}

#[derive(Debug, Clone, Error)]
#[error("Unknown method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for PaymeMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CheckPerformTransaction" => Ok(Self::CheckPerformTransaction),
            "CreateTransaction" => Ok(Self::CreateTransaction),
            "PerformTransaction" => Ok(Self::PerformTransaction),
            "CancelTransaction" => Ok(Self::CancelTransaction),
            "CheckTransaction" => Ok(Self::CheckTransaction),
            "GetStatement" => Ok(Self::GetStatement),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl Display for PaymeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CheckPerformTransaction => "CheckPerformTransaction",
            Self::CreateTransaction => "CreateTransaction",
            Self::PerformTransaction => "PerformTransaction",
            Self::CancelTransaction => "CancelTransaction",
            Self::CheckTransaction => "CheckTransaction",
            Self::GetStatement => "GetStatement",
        };
        f.write_str(s)
    }
}

/// A gateway call with its params decoded into the method's own type.
#[derive(Debug, Clone)]
pub enum PaymeCall {
    CheckPerformTransaction(CheckPerformTransactionParams),
    CreateTransaction(CreateTransactionParams),
    PerformTransaction(PerformTransactionParams),
    CancelTransaction(CancelTransactionParams),
    CheckTransaction(CheckTransactionParams),
    GetStatement(GetStatementParams),
}

impl PaymeCall {
    pub fn new(method: PaymeMethod, params: Value) -> Result<Self, serde_json::Error> {
        let call = match method {
            PaymeMethod::CheckPerformTransaction => Self::CheckPerformTransaction(serde_json::from_value(params)?),
            PaymeMethod::CreateTransaction => Self::CreateTransaction(serde_json::from_value(params)?),
            PaymeMethod::PerformTransaction => Self::PerformTransaction(serde_json::from_value(params)?),
            PaymeMethod::CancelTransaction => Self::CancelTransaction(serde_json::from_value(params)?),
            PaymeMethod::CheckTransaction => Self::CheckTransaction(serde_json::from_value(params)?),
            PaymeMethod::GetStatement => Self::GetStatement(serde_json::from_value(params)?),
        };
        Ok(call)
    }
}

//--------------------------------------        Dispatch        --------------------------------------------------------
/// Runs a decoded call against the transaction flow and serializes its result.
pub async fn dispatch<B: TransactionStore>(
    api: &TransactionFlowApi<B>,
    call: PaymeCall,
    now: DateTime<Utc>,
) -> Result<Value, PaymeError> {
    match call {
        PaymeCall::CheckPerformTransaction(p) => to_result(api.check_perform_transaction(p, now).await?),
        PaymeCall::CreateTransaction(p) => to_result(api.create_transaction(p, now).await?),
        PaymeCall::PerformTransaction(p) => to_result(api.perform_transaction(p, now).await?),
        PaymeCall::CancelTransaction(p) => to_result(api.cancel_transaction(p, now).await?),
        PaymeCall::CheckTransaction(p) => to_result(api.check_transaction(p).await?),
        PaymeCall::GetStatement(p) => to_result(api.get_statement(p).await?),
    }
}

fn to_result<T: Serialize>(result: T) -> Result<Value, PaymeError> {
    serde_json::to_value(result).map_err(|e| PaymeError::DatabaseError(format!("Could not serialize result. {e}")))
}

/// Turns a raw request body into a response envelope. Never fails: every problem becomes an error envelope.
pub async fn handle_rpc_body<B: TransactionStore>(
    api: &TransactionFlowApi<B>,
    body: &[u8],
    now: DateTime<Utc>,
) -> RpcResponse {
    let value = match serde_json::from_slice::<Value>(body) {
        Ok(v) => v,
        Err(e) => {
            debug!("💻️ Request body is not valid JSON. {e}");
            return RpcResponse::failure(Value::Null, RpcError::parse_error());
        },
    };
    // The id is recovered before anything else so that even a malformed request gets it echoed back.
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request = match serde_json::from_value::<RpcRequest>(value) {
        Ok(r) => r,
        Err(e) => {
            debug!("💻️ Malformed JSON-RPC envelope. {e}");
            return RpcResponse::failure(id, RpcError::invalid_request());
        },
    };
    let method = match PaymeMethod::from_str(&request.method) {
        Ok(m) => m,
        Err(e) => {
            info!("💻️ {e}");
            return RpcResponse::failure(id, RpcError::method_not_found());
        },
    };
    let call = match PaymeCall::new(method, request.params) {
        Ok(c) => c,
        Err(e) => {
            debug!("💻️ Invalid params for {method}. {e}");
            return RpcResponse::failure(id, RpcError::invalid_request());
        },
    };
    trace!("💻️ Dispatching {method} (id {id})");
    match dispatch(api, call, now).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(e) => {
            match &e {
                PaymeError::DatabaseError(_) => error!("💻️ {method} failed. {e}"),
                _ => debug!("💻️ {method} refused. {e}"),
            }
            RpcResponse::failure(id, e.into())
        },
    }
}
