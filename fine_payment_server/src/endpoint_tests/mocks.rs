use fine_payment_engine::{
    db_types::{Fine, FineId, FineStatus, NewTransaction, Transaction, TransactionId, TransactionState},
    traits::{FineLookup, InsertTransactionResult, PaymentGatewayError, TransactionStore},
};
use mockall::mock;

mock! {
    pub Store {}
    impl Clone for Store {
        fn clone(&self) -> Self;
    }
    impl FineLookup for Store {
        async fn fetch_fine(&self, id: &FineId) -> Result<Option<Fine>, PaymentGatewayError>;
        async fn update_fine_status(&self, id: &FineId, status: FineStatus) -> Result<Fine, PaymentGatewayError>;
    }
    impl TransactionStore for Store {
        async fn fetch_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, PaymentGatewayError>;
        async fn fetch_pending_transaction_for_fine(&self, fine_id: &FineId) -> Result<Option<Transaction>, PaymentGatewayError>;
        async fn fetch_transactions_for_fine(&self, fine_id: &FineId) -> Result<Vec<Transaction>, PaymentGatewayError>;
        async fn insert_transaction(&self, tx: NewTransaction) -> Result<InsertTransactionResult, PaymentGatewayError>;
        async fn mark_transaction_performed(&self, id: &TransactionId, perform_time: i64) -> Result<Option<Transaction>, PaymentGatewayError>;
        async fn mark_transaction_cancelled(&self, id: &TransactionId, from_state: TransactionState, reason: i32, cancel_time: i64) -> Result<Option<Transaction>, PaymentGatewayError>;
        async fn fetch_transactions_created_between(&self, from: i64, to: i64) -> Result<Vec<Transaction>, PaymentGatewayError>;
        async fn fetch_expired_transactions(&self, now: i64) -> Result<Vec<Transaction>, PaymentGatewayError>;
    }
}
