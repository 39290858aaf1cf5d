//! Typed parameters and results for the six gateway methods.
//!
//! Field names follow the gateway's wire format. Every time is in epoch milliseconds; unset times are reported as `0`
//! and an unset cancel reason as `null`.
use fpg_common::Tiyin;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::db_types::{FineId, Transaction, TransactionId, TransactionState};

//--------------------------------------        Account         --------------------------------------------------------
/// The payer's account fields. The only one the merchant uses is `order_id`, which names the fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, deserialize_with = "optional_order_id")]
    pub order_id: Option<FineId>,
}

impl Account {
    pub fn new<F: Into<FineId>>(order_id: F) -> Self {
        Self { order_id: Some(order_id.into()) }
    }
}

/// The gateway may send the order id as a string or a bare number. Empty strings and `null` count as missing.
fn optional_order_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<FineId>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(FineId(s))),
        Some(Value::Number(n)) => Ok(Some(FineId(n.to_string()))),
        Some(other) => Err(serde::de::Error::custom(format!("order_id must be a string, not {other}"))),
    }
}

//--------------------------------------         Params         --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckPerformTransactionParams {
    pub amount: Tiyin,
    #[serde(default)]
    pub account: Account,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionParams {
    pub id: TransactionId,
    /// The gateway's own creation time for the transaction.
    pub time: i64,
    pub amount: Tiyin,
    #[serde(default)]
    pub account: Account,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformTransactionParams {
    pub id: TransactionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTransactionParams {
    pub id: TransactionId,
    pub reason: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckTransactionParams {
    pub id: TransactionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStatementParams {
    pub from: i64,
    pub to: i64,
}

//--------------------------------------        Results         --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPerformTransactionResult {
    pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionResult {
    pub create_time: i64,
    pub transaction: TransactionId,
    pub state: TransactionState,
}

impl From<&Transaction> for CreateTransactionResult {
    fn from(tx: &Transaction) -> Self {
        Self { create_time: tx.create_time, transaction: tx.transaction_id.clone(), state: tx.state }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformTransactionResult {
    pub transaction: TransactionId,
    pub perform_time: i64,
    pub state: TransactionState,
}

impl From<&Transaction> for PerformTransactionResult {
    fn from(tx: &Transaction) -> Self {
        Self { transaction: tx.transaction_id.clone(), perform_time: tx.perform_time.unwrap_or(0), state: tx.state }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelTransactionResult {
    pub transaction: TransactionId,
    pub cancel_time: i64,
    pub state: TransactionState,
    pub reason: Option<i32>,
}

impl From<&Transaction> for CancelTransactionResult {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction: tx.transaction_id.clone(),
            cancel_time: tx.cancel_time.unwrap_or(0),
            state: tx.state,
            reason: tx.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTransactionResult {
    pub create_time: i64,
    pub perform_time: i64,
    pub cancel_time: i64,
    pub transaction: TransactionId,
    pub state: TransactionState,
    pub reason: Option<i32>,
}

impl From<&Transaction> for CheckTransactionResult {
    fn from(tx: &Transaction) -> Self {
        Self {
            create_time: tx.create_time,
            perform_time: tx.perform_time.unwrap_or(0),
            cancel_time: tx.cancel_time.unwrap_or(0),
            transaction: tx.transaction_id.clone(),
            state: tx.state,
            reason: tx.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementAccount {
    pub order_id: FineId,
}

/// One line of a `GetStatement` answer: the stored transaction plus the fields the gateway needs to match it against
/// its own records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub id: TransactionId,
    pub time: i64,
    pub amount: Tiyin,
    pub account: StatementAccount,
    pub create_time: i64,
    pub perform_time: i64,
    pub cancel_time: i64,
    pub transaction: TransactionId,
    pub state: TransactionState,
    pub reason: Option<i32>,
}

impl From<&Transaction> for StatementEntry {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.transaction_id.clone(),
            time: tx.time,
            amount: tx.amount,
            account: StatementAccount { order_id: tx.fine_id.clone() },
            create_time: tx.create_time,
            perform_time: tx.perform_time.unwrap_or(0),
            cancel_time: tx.cancel_time.unwrap_or(0),
            transaction: tx.transaction_id.clone(),
            state: tx.state,
            reason: tx.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStatementResult {
    pub transactions: Vec<StatementEntry>,
}
