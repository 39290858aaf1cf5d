use thiserror::Error;

use crate::{
    db_types::{FineId, NewTransaction, Transaction, TransactionId, TransactionState},
    traits::{FineLookup, InsertTransactionResult},
};

/// Persistence for gateway transactions.
///
/// Implementations must make every method atomic. In particular, the `mark_*` methods update the transaction *and* the
/// associated fine in a single database transaction, and only do so if the stored state still matches what the caller
/// expects. If the stored record has moved on, they change nothing and return `None`.
#[allow(async_fn_in_trait)]
pub trait TransactionStore: Clone + FineLookup {
    /// Fetches the transaction with the given gateway id.
    async fn fetch_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// Fetches the pending transaction attached to the fine, if there is one. There is never more than one.
    async fn fetch_pending_transaction_for_fine(
        &self,
        fine_id: &FineId,
    ) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// Fetches every transaction (in any state) attached to the fine, oldest first.
    async fn fetch_transactions_for_fine(&self, fine_id: &FineId) -> Result<Vec<Transaction>, PaymentGatewayError>;

    /// Stores a new transaction in the `Pending` state.
    ///
    /// Storage-level uniqueness is authoritative here: a duplicate transaction id yields `AlreadyExists`, and a second
    /// pending transaction for the same fine yields `FineBusy`.
    async fn insert_transaction(&self, tx: NewTransaction) -> Result<InsertTransactionResult, PaymentGatewayError>;

    /// Moves a `Pending` transaction to `Performed`, records `perform_time` and marks the fine as paid.
    ///
    /// Returns `None` without changing anything if the transaction is no longer pending.
    async fn mark_transaction_performed(
        &self,
        id: &TransactionId,
        perform_time: i64,
    ) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// Moves a transaction from `from_state` to its cancelled counterpart, records the reason and (if not already set)
    /// the cancel time, and returns the fine to `pending` unless it has been deleted.
    ///
    /// Returns `None` without changing anything if the stored state is no longer `from_state`.
    async fn mark_transaction_cancelled(
        &self,
        id: &TransactionId,
        from_state: TransactionState,
        reason: i32,
        cancel_time: i64,
    ) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// Fetches all transactions with `from <= create_time <= to`, ordered by creation time.
    async fn fetch_transactions_created_between(
        &self,
        from: i64,
        to: i64,
    ) -> Result<Vec<Transaction>, PaymentGatewayError>;

    /// Fetches pending transactions whose deadline is at or before `now`, earliest deadline first.
    async fn fetch_expired_transactions(&self, now: i64) -> Result<Vec<Transaction>, PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested fine {0} does not exist")]
    FineNotFound(FineId),
    #[error("The fine {0} is not open for payment")]
    FineWithdrawn(FineId),
    #[error("The fine {0} could not be stored. {1}")]
    InvalidFine(FineId, String),
    #[error("The stored record could not be decoded. {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => Self::CorruptRecord(e.to_string()),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
