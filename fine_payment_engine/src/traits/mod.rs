//! #  Storage contracts for the payment engine.
//!
//! These traits define what a database *backend* must provide for the transaction flow to run on top of it.
//!
//! * [`FineLookup`] is the engine's narrow view of the fine subsystem: resolving a fine by its id, and flipping its
//!   status when a transaction is performed or cancelled.
//! * [`TransactionStore`] persists gateway transactions. Every method that changes more than one field (or more than one
//!   table) is atomic: either the whole change is visible, or none of it is.
//!
//! The state machine itself lives in [`crate::TransactionFlowApi`]. Backends only offer compare-and-swap style
//! updates; deciding *whether* a transition is legal is not their job.
mod data_objects;
mod fine_lookup;
mod transaction_store;

pub use data_objects::InsertTransactionResult;
pub use fine_lookup::FineLookup;
pub use transaction_store::{PaymentGatewayError, TransactionStore};
