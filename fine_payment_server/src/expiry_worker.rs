use std::time::Duration;

use chrono::Utc;
use fine_payment_engine::{db_types::Transaction, SqliteDatabase, TransactionFlowApi};
use log::*;
use tokio::task::JoinHandle;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The first sweep runs straight away, which picks up every deadline that passed while the server was down.
/// `api` must be a clone of the instance the HTTP handlers use, so that both share the same transaction locks.
pub fn start_expiry_worker(api: TransactionFlowApi<SqliteDatabase>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Transaction expiry worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running transaction expiry job");
            match api.expire_stale_transactions(Utc::now()).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No transactions expired"),
                Ok(expired) => {
                    info!("🕰️ {} transactions expired", expired.len());
                    debug!("🕰️ Expired transactions: {}", transaction_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running transaction expiry job: {e}");
                },
            }
        }
    })
}

fn transaction_list(transactions: &[Transaction]) -> String {
    transactions
        .iter()
        .map(|t| format!("[{}] fine_id: {}", t.transaction_id, t.fine_id))
        .collect::<Vec<String>>()
        .join(", ")
}
