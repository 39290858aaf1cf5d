//! Fine Payment Engine
//!
//! The merchant side of the Payme payment protocol, for collecting payment of fines.
//!
//! The gateway drives every payment through a short life cycle of remote calls: it asks whether a fine can be paid,
//! opens a transaction, and then either performs or cancels it. This library validates those calls against the fines
//! and transactions it has on record, and moves each transaction through its state machine. The transport (HTTP and
//! JSON-RPC) lives in the server crate.
//!
//! The library is divided into three sections:
//! 1. Database management ([`mod@traits`] and the SQLite backend). The traits describe what the engine needs from
//!    storage. [`SqliteDatabase`] is the bundled implementation. The data types it stores are in [`mod@db_types`].
//! 2. The payment engine public API ([`mod@payme_api`]). [`TransactionFlowApi`] handles each gateway method, and also
//!    cancels transactions that outlive their deadline.
//! 3. Test utilities, behind the `test_utils` feature.
mod db;

pub mod db_types;
pub mod payme_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use payme_api::{
    errors::{LocalizedMessage, PaymeError},
    locks::TransactionLocks,
    payme_objects,
    transaction_flow_api::{TransactionFlowApi, DEFAULT_TRANSACTION_TIMEOUT_HOURS},
};
pub use traits::{FineLookup, InsertTransactionResult, PaymentGatewayError, TransactionStore};
