use fpg_common::Tiyin;
use serde::Serialize;
use thiserror::Error;

use crate::{
    db_types::{FineId, TransactionId},
    traits::PaymentGatewayError,
};

pub const INVALID_AMOUNT: i32 = -31001;
pub const TRANSACTION_NOT_FOUND: i32 = -31003;
pub const CANT_DO_OPERATION: i32 = -31008;
pub const PRODUCT_NOT_FOUND: i32 = -31050;
pub const ALREADY_DONE: i32 = -31060;
pub const SYSTEM_ERROR: i32 = -32400;

/// The account field the gateway should highlight for account-related errors.
pub const ORDER_ID_FIELD: &str = "order_id";

/// An error message in the three languages the gateway displays to payers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalizedMessage {
    pub ru: &'static str,
    pub uz: &'static str,
    pub en: &'static str,
}

impl LocalizedMessage {
    pub const fn new(ru: &'static str, uz: &'static str, en: &'static str) -> Self {
        Self { ru, uz, en }
    }
}

const MSG_INVALID_AMOUNT: LocalizedMessage =
    LocalizedMessage::new("Недопустимая сумма", "Noto'g'ri summa", "Invalid amount");
const MSG_PRODUCT_NOT_FOUND: LocalizedMessage =
    LocalizedMessage::new("Нам не удалось найти штраф.", "Biz jarimani topolmadik.", "We could not find the fine.");
const MSG_PENDING: LocalizedMessage = LocalizedMessage::new(
    "Ожидается оплата за штраф",
    "Jarima uchun to'lov kutilayapti",
    "Payment of fine in pending",
);
const MSG_ALREADY_DONE: LocalizedMessage =
    LocalizedMessage::new("Штраф оплачен", "Jarima uchun to'lov qilingan", "The fine has been paid.");
const MSG_TRANSACTION_NOT_FOUND: LocalizedMessage =
    LocalizedMessage::new("Транзакция не найдена", "Tranzaktsiya topilmadi", "Transaction not found");
const MSG_CANT_DO_OPERATION: LocalizedMessage =
    LocalizedMessage::new("Мы не можем сделать операцию", "Biz operatsiyani bajara olmaymiz", "We can't do operation");
const MSG_INVALID_TIME: LocalizedMessage =
    LocalizedMessage::new("Неверное время транзакции", "Tranzaksiya vaqti noto'g'ri", "Invalid transaction time");
const MSG_SYSTEM_ERROR: LocalizedMessage = LocalizedMessage::new("Системная ошибка", "Tizim xatosi", "System error");

/// Every way a gateway call can fail once it has been routed to the transaction flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymeError {
    #[error("The account.order_id field is missing")]
    OrderIdMissing,
    #[error("Fine {0} does not exist")]
    FineNotFound(FineId),
    #[error("Fine {0} already has a pending transaction")]
    FineHasPendingTransaction(FineId),
    #[error("Fine {0} has already been paid")]
    FineAlreadyPaid(FineId),
    #[error("Invalid amount. Expected {expected}, but got {actual}")]
    InvalidAmount { expected: Tiyin, actual: Tiyin },
    #[error("Transaction {0} does not exist")]
    TransactionNotFound(TransactionId),
    #[error("Cannot perform this operation. {0}")]
    CantDoOperation(String),
    #[error("{0} is not a valid transaction time")]
    InvalidTransactionTime(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl PaymeError {
    /// The protocol error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::OrderIdMissing | Self::FineNotFound(_) | Self::FineHasPendingTransaction(_) => PRODUCT_NOT_FOUND,
            Self::FineAlreadyPaid(_) => ALREADY_DONE,
            Self::InvalidAmount { .. } => INVALID_AMOUNT,
            Self::TransactionNotFound(_) => TRANSACTION_NOT_FOUND,
            Self::CantDoOperation(_) | Self::InvalidTransactionTime(_) => CANT_DO_OPERATION,
            Self::DatabaseError(_) => SYSTEM_ERROR,
        }
    }

    /// The payer-facing message. Internal details stay in the `Display` text, which is only logged.
    pub fn message(&self) -> LocalizedMessage {
        match self {
            Self::OrderIdMissing | Self::FineNotFound(_) => MSG_PRODUCT_NOT_FOUND,
            Self::FineHasPendingTransaction(_) => MSG_PENDING,
            Self::FineAlreadyPaid(_) => MSG_ALREADY_DONE,
            Self::InvalidAmount { .. } => MSG_INVALID_AMOUNT,
            Self::TransactionNotFound(_) => MSG_TRANSACTION_NOT_FOUND,
            Self::CantDoOperation(_) => MSG_CANT_DO_OPERATION,
            Self::InvalidTransactionTime(_) => MSG_INVALID_TIME,
            Self::DatabaseError(_) => MSG_SYSTEM_ERROR,
        }
    }

    /// The `data` member of the error object, naming the offending account field where there is one.
    pub fn data(&self) -> Option<&'static str> {
        match self {
            Self::OrderIdMissing | Self::FineNotFound(_) | Self::FineHasPendingTransaction(_) => Some(ORDER_ID_FIELD),
            _ => None,
        }
    }
}

impl From<PaymentGatewayError> for PaymeError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::FineNotFound(id) => Self::FineNotFound(id),
            PaymentGatewayError::FineWithdrawn(id) => Self::CantDoOperation(format!("Fine {id} is not open for payment")),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
