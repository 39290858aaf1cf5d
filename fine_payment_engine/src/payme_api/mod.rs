//! # Fine payment engine public API
//!
//! * [`transaction_flow_api`] drives gateway transactions through their life cycle. It is the only thing the transport
//!   layer needs to talk to.
//! * [`payme_objects`] holds the typed parameters and results of the six gateway methods.
//! * [`errors`] maps every failure to its protocol code and payer-facing message.
//! * [`amount_policy`] decides how much a fine costs at a given moment.
//! * [`locks`] serializes work on a single transaction id.
//!
//! # API usage
//!
//! ```rust,ignore
//! use fine_payment_engine::{SqliteDatabase, TransactionFlowApi};
//! let db = SqliteDatabase::new_with_url("sqlite://data/fines.db", 25).await?;
//! let api = TransactionFlowApi::new(db, chrono::Duration::hours(12));
//! let result = api.check_transaction(params).await?;
//! ```
pub mod amount_policy;
pub mod errors;
pub mod locks;
pub mod payme_objects;
pub mod transaction_flow_api;
