//! SQLite backend for the payment engine.
//!
//! The free functions in [`fines`] and [`transactions`] are the low-level queries. They take a bare
//! `&mut SqliteConnection` and are not atomic on their own; [`SqliteDatabase`] composes them inside `pool.begin()`
//! transactions where a change spans more than one statement.
//!
//! `INSERT`/`UPDATE ... RETURNING` statements are always drained with `fetch_all`. A statement that is stepped only
//! once leaves the connection's write transaction open after it goes back to the pool, and other connections never
//! see the change.
mod errors;
mod sqlite_impl;

pub mod fines;
pub mod transactions;

use std::{str::FromStr, time::Duration};

pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
pub use sqlite_impl::SqliteDatabase;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    info!("🗃️ Connected to {url}");
    Ok(pool)
}
