use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Fine, FineId, FineStatus, NewFine},
};

/// Inserts a new fine in the `pending` state. Storage CHECK constraints reject negative amounts and discounts larger
/// than the full amount.
pub async fn insert_fine(fine: NewFine, conn: &mut SqliteConnection) -> Result<Fine, SqliteDatabaseError> {
    let fine = sqlx::query_as::<_, Fine>(
        r#"
            INSERT INTO fines (id, amount, discounted_amount, issued_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(fine.id)
    .bind(fine.amount)
    .bind(fine.discounted_amount)
    .bind(fine.issued_at)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Fine {} inserted", fine.id);
    Ok(fine)
}

pub async fn fetch_fine(id: &FineId, conn: &mut SqliteConnection) -> Result<Option<Fine>, SqliteDatabaseError> {
    let fine = sqlx::query_as::<_, Fine>("SELECT * FROM fines WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(fine)
}

/// Unconditionally sets the status of the fine. Returns `None` if there is no such fine.
pub async fn update_fine_status(
    id: &FineId,
    status: FineStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Fine>, SqliteDatabaseError> {
    let fine = sqlx::query_as::<_, Fine>(
        r#"
            UPDATE fines SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(id)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    trace!("🗃️ Fine {id} status set to {status}: {}", fine.is_some());
    Ok(fine)
}

/// Marks the fine as paid. Deleted (or missing) fines cannot be paid, and the call fails with
/// [`SqliteDatabaseError::FineWithdrawn`] so that the enclosing database transaction is rolled back.
pub async fn mark_fine_paid(id: &FineId, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE fines SET status = 'paid', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status != 'deleted';
        "#,
    )
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::FineWithdrawn(id.clone()));
    }
    trace!("🗃️ Fine {id} marked as paid");
    Ok(())
}

/// Returns a paid fine to `pending`. Fines in any other status are left alone; in particular a deleted fine stays
/// deleted. Returns whether the fine was changed.
pub async fn reopen_fine(id: &FineId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE fines SET status = 'pending', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'paid';
        "#,
    )
    .bind(id)
    .execute(conn)
    .await?;
    let reopened = result.rows_affected() > 0;
    trace!("🗃️ Fine {id} reopened: {reopened}");
    Ok(reopened)
}
