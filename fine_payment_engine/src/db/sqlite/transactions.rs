use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{FineId, NewTransaction, Transaction, TransactionId, TransactionState},
};

/// Inserts a new pending transaction. Unique violations (on `transaction_id`, or on the one-pending-per-fine index) are
/// returned as-is so that the caller can tell them apart.
pub async fn insert_transaction(
    tx: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, SqliteDatabaseError> {
    let record = sqlx::query_as::<_, Transaction>(
        r#"
            INSERT INTO transactions (
                transaction_id,
                fine_id,
                amount,
                gateway_time,
                state,
                create_time,
                expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(tx.transaction_id)
    .bind(tx.fine_id)
    .bind(tx.amount)
    .bind(tx.time)
    .bind(TransactionState::Pending)
    .bind(tx.create_time)
    .bind(tx.expires_at)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    trace!("🗃️ Transaction {} inserted for fine {}", record.transaction_id, record.fine_id);
    Ok(record)
}

pub async fn fetch_transaction(
    id: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SqliteDatabaseError> {
    let tx = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE transaction_id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

pub async fn fetch_pending_transaction_for_fine(
    fine_id: &FineId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SqliteDatabaseError> {
    let tx = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE fine_id = $1 AND state = $2")
        .bind(fine_id)
        .bind(TransactionState::Pending)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

pub async fn fetch_transactions_for_fine(
    fine_id: &FineId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, SqliteDatabaseError> {
    let txs = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE fine_id = $1 ORDER BY id ASC")
        .bind(fine_id)
        .fetch_all(conn)
        .await?;
    Ok(txs)
}

/// Compare-and-swap from `Pending` to `Performed`. Returns `None` if the transaction was not pending.
pub async fn mark_performed(
    id: &TransactionId,
    perform_time: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SqliteDatabaseError> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
            UPDATE transactions SET state = $1, perform_time = $2
            WHERE transaction_id = $3 AND state = $4
            RETURNING *;
        "#,
    )
    .bind(TransactionState::Performed)
    .bind(perform_time)
    .bind(id)
    .bind(TransactionState::Pending)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(tx)
}

/// Compare-and-swap from `from` to `to`. The cancel time is only written if it has never been set.
pub async fn mark_cancelled(
    id: &TransactionId,
    from: TransactionState,
    to: TransactionState,
    reason: i32,
    cancel_time: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SqliteDatabaseError> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
            UPDATE transactions SET state = $1, reason = $2, cancel_time = COALESCE(cancel_time, $3)
            WHERE transaction_id = $4 AND state = $5
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(reason)
    .bind(cancel_time)
    .bind(id)
    .bind(from)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(tx)
}

/// Transactions created in `[from, to]` (inclusive), in creation order.
pub async fn fetch_transactions_created_between(
    from: i64,
    to: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, SqliteDatabaseError> {
    let txs = sqlx::query_as::<_, Transaction>(
        r#"
            SELECT * FROM transactions
            WHERE create_time >= $1 AND create_time <= $2
            ORDER BY create_time ASC, id ASC;
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await?;
    Ok(txs)
}

pub async fn fetch_expired_transactions(
    now: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, SqliteDatabaseError> {
    let txs = sqlx::query_as::<_, Transaction>(
        r#"
            SELECT * FROM transactions
            WHERE state = $1 AND expires_at <= $2
            ORDER BY expires_at ASC;
        "#,
    )
    .bind(TransactionState::Pending)
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(txs)
}
