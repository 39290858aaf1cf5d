//! # Fine payment server
//! This crate hosts the HTTP front end of the fine payment gateway. It is responsible for:
//! * Receiving the merchant webhook calls that the Payme gateway makes while a payer settles a fine.
//! * Checking the gateway's credentials on every call.
//! * Decoding the JSON-RPC envelope and handing each call to the transaction flow in `fine_payment_engine`.
//! * Running the expiry worker, which cancels transactions that stay pending for too long.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payme`: The JSON-RPC 2.0 webhook for the Payme merchant API.

pub mod cli;
pub mod config;
pub mod errors;
pub mod expiry_worker;
pub mod jsonrpc;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
