use crate::db_types::{FineId, Transaction, TransactionId};

/// The outcome of [`crate::traits::TransactionStore::insert_transaction`].
#[derive(Debug, Clone)]
pub enum InsertTransactionResult {
    Inserted(Transaction),
    /// A transaction with this id is already stored. Nothing was written.
    AlreadyExists(TransactionId),
    /// The fine already has another pending transaction attached to it. Nothing was written.
    FineBusy(FineId),
}
