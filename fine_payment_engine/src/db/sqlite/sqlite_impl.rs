//! `SqliteDatabase` is the concrete storage backend of the fine payment engine.
//!
//! It implements [`FineLookup`] and [`TransactionStore`] on top of a sqlx connection pool. Updates that touch both a
//! transaction and its fine run in a single database transaction.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::{fines, new_pool, transactions, SqliteDatabaseError};
use crate::{
    db_types::{Fine, FineId, FineStatus, NewFine, NewTransaction, Transaction, TransactionId, TransactionState},
    traits::{FineLookup, InsertTransactionResult, PaymentGatewayError, TransactionStore},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object. The database file is created if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Stores a new fine. Fine management belongs to the fine subsystem; this exists for seeding and tests.
    pub async fn insert_fine(&self, fine: NewFine) -> Result<Fine, PaymentGatewayError> {
        let id = fine.id.clone();
        let mut conn = self.pool.acquire().await?;
        fines::insert_fine(fine, &mut conn).await.map_err(|e| match e {
            SqliteDatabaseError::DriverError(sqlx::Error::Database(de)) if de.is_check_violation() => {
                PaymentGatewayError::InvalidFine(id, de.message().to_string())
            },
            SqliteDatabaseError::DriverError(sqlx::Error::Database(de)) if de.is_unique_violation() => {
                PaymentGatewayError::InvalidFine(id, "A fine with this id already exists".to_string())
            },
            e => e.into(),
        })
    }

    pub async fn close(&self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl FineLookup for SqliteDatabase {
    async fn fetch_fine(&self, id: &FineId) -> Result<Option<Fine>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let fine = fines::fetch_fine(id, &mut conn).await?;
        Ok(fine)
    }

    async fn update_fine_status(&self, id: &FineId, status: FineStatus) -> Result<Fine, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        fines::update_fine_status(id, status, &mut conn)
            .await?
            .ok_or_else(|| PaymentGatewayError::FineNotFound(id.clone()))
    }
}

impl TransactionStore for SqliteDatabase {
    async fn fetch_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_transaction(id, &mut conn).await?;
        Ok(tx)
    }

    async fn fetch_pending_transaction_for_fine(
        &self,
        fine_id: &FineId,
    ) -> Result<Option<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_pending_transaction_for_fine(fine_id, &mut conn).await?;
        Ok(tx)
    }

    async fn fetch_transactions_for_fine(&self, fine_id: &FineId) -> Result<Vec<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let txs = transactions::fetch_transactions_for_fine(fine_id, &mut conn).await?;
        Ok(txs)
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> Result<InsertTransactionResult, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let tx_id = tx.transaction_id.clone();
        let fine_id = tx.fine_id.clone();
        match transactions::insert_transaction(tx, &mut conn).await {
            Ok(record) => Ok(InsertTransactionResult::Inserted(record)),
            Err(SqliteDatabaseError::DriverError(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                // Either the gateway id is taken, or the fine already has a pending transaction.
                if transactions::fetch_transaction(&tx_id, &mut conn).await?.is_some() {
                    debug!("🗃️ Transaction {tx_id} already exists");
                    Ok(InsertTransactionResult::AlreadyExists(tx_id))
                } else {
                    debug!("🗃️ Fine {fine_id} already has a pending transaction. {tx_id} was not stored");
                    Ok(InsertTransactionResult::FineBusy(fine_id))
                }
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_transaction_performed(
        &self,
        id: &TransactionId,
        perform_time: i64,
    ) -> Result<Option<Transaction>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let Some(record) = transactions::mark_performed(id, perform_time, &mut *tx).await? else {
            return Ok(None);
        };
        // Dropping `tx` on error rolls the state change back.
        fines::mark_fine_paid(&record.fine_id, &mut *tx).await?;
        tx.commit().await?;
        debug!("🗃️ Transaction {id} performed. Fine {} is paid", record.fine_id);
        Ok(Some(record))
    }

    async fn mark_transaction_cancelled(
        &self,
        id: &TransactionId,
        from_state: TransactionState,
        reason: i32,
        cancel_time: i64,
    ) -> Result<Option<Transaction>, PaymentGatewayError> {
        let Some(to_state) = from_state.cancelled() else {
            return Ok(None);
        };
        let mut tx = self.pool.begin().await?;
        let Some(record) = transactions::mark_cancelled(id, from_state, to_state, reason, cancel_time, &mut *tx).await?
        else {
            return Ok(None);
        };
        let reopened = fines::reopen_fine(&record.fine_id, &mut *tx).await?;
        tx.commit().await?;
        debug!("🗃️ Transaction {id} cancelled ({from_state} -> {to_state}, reason {reason}). Fine reopened: {reopened}");
        Ok(Some(record))
    }

    async fn fetch_transactions_created_between(
        &self,
        from: i64,
        to: i64,
    ) -> Result<Vec<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let txs = transactions::fetch_transactions_created_between(from, to, &mut conn).await?;
        Ok(txs)
    }

    async fn fetch_expired_transactions(&self, now: i64) -> Result<Vec<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let txs = transactions::fetch_expired_transactions(now, &mut conn).await?;
        Ok(txs)
    }
}
