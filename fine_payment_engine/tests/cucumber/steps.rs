use std::str::FromStr;

use chrono::Duration;
use cucumber::{then, when};
use fine_payment_engine::{
    db_types::{FineId, FineStatus, TransactionId, REASON_TIMEOUT},
    payme_objects::{
        Account,
        CancelTransactionParams,
        CheckPerformTransactionParams,
        CheckTransactionParams,
        CreateTransactionParams,
        GetStatementParams,
        PerformTransactionParams,
    },
    FineLookup,
    TransactionStore,
};
use fpg_common::Tiyin;
use log::*;

use crate::cucumber::FineWorld;

#[when(expr = "the gateway checks whether fine {word} can be paid with {int} tiyin")]
async fn check_perform(world: &mut FineWorld, fine_id: String, amount: i64) {
    let params = CheckPerformTransactionParams { amount: Tiyin::from(amount), account: Account::new(fine_id) };
    let result = world.api().check_perform_transaction(params, world.now()).await;
    world.record(result);
}

#[when(expr = "the gateway creates transaction {word} for fine {word} with {int} tiyin")]
async fn create_transaction(world: &mut FineWorld, tx_id: String, fine_id: String, amount: i64) {
    let now = world.now();
    let params = CreateTransactionParams {
        id: TransactionId::from(tx_id),
        time: now.timestamp_millis() - 250,
        amount: Tiyin::from(amount),
        account: Account::new(fine_id),
    };
    let result = world.api().create_transaction(params, now).await;
    world.record(result);
}

#[when(expr = "the gateway performs transaction {word}")]
async fn perform_transaction(world: &mut FineWorld, tx_id: String) {
    let params = PerformTransactionParams { id: TransactionId::from(tx_id) };
    let result = world.api().perform_transaction(params, world.now()).await;
    world.record(result);
}

#[when(expr = "the gateway cancels transaction {word} with reason {int}")]
async fn cancel_transaction(world: &mut FineWorld, tx_id: String, reason: i32) {
    let params = CancelTransactionParams { id: TransactionId::from(tx_id), reason };
    let result = world.api().cancel_transaction(params, world.now()).await;
    world.record(result);
}

#[when(expr = "the gateway checks transaction {word}")]
async fn check_transaction(world: &mut FineWorld, tx_id: String) {
    let params = CheckTransactionParams { id: TransactionId::from(tx_id) };
    let result = world.api().check_transaction(params).await;
    world.record(result);
}

#[when(expr = "the gateway requests a statement for the last {int} hours")]
async fn get_statement(world: &mut FineWorld, hours: i64) {
    let now = world.now();
    let params =
        GetStatementParams { from: (now - Duration::hours(hours)).timestamp_millis(), to: now.timestamp_millis() };
    let result = world.api().get_statement(params).await;
    world.record(result);
}

#[when(expr = "{int} hours pass")]
async fn hours_pass(world: &mut FineWorld, hours: i64) {
    world.now = Some(world.now() + Duration::hours(hours));
}

#[when(expr = "{int} minutes pass")]
async fn minutes_pass(world: &mut FineWorld, minutes: i64) {
    world.now = Some(world.now() + Duration::minutes(minutes));
}

#[when("the expiry sweep runs")]
async fn expiry_sweep(world: &mut FineWorld) {
    let expired = world.api().expire_stale_transactions(world.now()).await.expect("Expiry sweep failed");
    debug!("🥒️ {} transactions expired", expired.len());
}

#[then("the payment is allowed")]
async fn payment_allowed(world: &mut FineWorld) {
    let value = world.last_result().as_ref().expect("The call failed");
    assert_eq!(value["allow"], true);
}

#[then(expr = "the call succeeds with state {int}")]
async fn call_succeeds(world: &mut FineWorld, state: i32) {
    match world.last_result() {
        Ok(value) => assert_eq!(value["state"], state, "Unexpected state in {value}"),
        Err(e) => panic!("Expected state {state}, but the call failed: {e}"),
    }
}

#[then(expr = "the call fails with error code {int}")]
async fn call_fails(world: &mut FineWorld, code: i32) {
    match world.last_result() {
        Ok(value) => panic!("Expected error {code}, but the call returned {value}"),
        Err(e) => assert_eq!(e.code(), code, "Unexpected error: {e}"),
    }
}

#[then("the result is identical to the previous one")]
async fn result_is_replayed(world: &mut FineWorld) {
    let previous = world.previous_result.as_ref().expect("There is no previous result");
    assert_eq!(previous, world.last_result());
}

#[then(expr = "the result has {word} {int}")]
async fn result_has_field(world: &mut FineWorld, field: String, expected: i64) {
    let value = world.last_result().as_ref().expect("The call failed");
    assert_eq!(value[field.as_str()], expected, "Unexpected {field} in {value}");
}

#[then(expr = "the result has no {word}")]
async fn result_has_null_field(world: &mut FineWorld, field: String) {
    let value = world.last_result().as_ref().expect("The call failed");
    assert!(value[field.as_str()].is_null(), "Expected {field} to be null in {value}");
}

#[then(expr = "the statement lists {int} transactions")]
async fn statement_size(world: &mut FineWorld, count: usize) {
    let value = world.last_result().as_ref().expect("The call failed");
    let transactions = value["transactions"].as_array().expect("Not a statement");
    assert_eq!(transactions.len(), count);
}

#[then(expr = "fine {word} is {word}")]
async fn fine_status(world: &mut FineWorld, fine_id: String, status: String) {
    let expected = FineStatus::from_str(&status).expect("Not a fine status");
    let fine = world.api().db().fetch_fine(&FineId::from(fine_id)).await.expect("Error fetching fine");
    let fine = fine.expect("Fine does not exist");
    assert_eq!(fine.status, expected, "Fine {} has the wrong status", fine.id);
}

#[then(expr = "transaction {word} has state {int}")]
async fn transaction_state(world: &mut FineWorld, tx_id: String, state: i32) {
    let tx = world.api().db().fetch_transaction(&TransactionId::from(tx_id)).await.expect("Error fetching transaction");
    let tx = tx.expect("Transaction does not exist");
    assert_eq!(tx.state.code(), state, "Transaction {} has the wrong state", tx.transaction_id);
}

#[then(expr = "transaction {word} was cancelled because it expired")]
async fn transaction_expired(world: &mut FineWorld, tx_id: String) {
    let tx = world.api().db().fetch_transaction(&TransactionId::from(tx_id)).await.expect("Error fetching transaction");
    let tx = tx.expect("Transaction does not exist");
    assert!(tx.state.is_cancelled(), "Transaction {} is not cancelled", tx.transaction_id);
    assert_eq!(tx.reason, Some(REASON_TIMEOUT));
    assert!(tx.cancel_time.is_some());
}
