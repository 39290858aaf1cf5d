use chrono::{DateTime, Utc};
use cucumber::World;
use fine_payment_engine::{
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    PaymeError,
    SqliteDatabase,
    TransactionFlowApi,
};
use log::*;
use serde_json::Value;

#[derive(Default, Debug, World)]
pub struct FineWorld {
    pub system: Option<FinePaymentSystem>,
    /// The simulated wall clock. Every gateway call made by a step happens at this time.
    pub now: Option<DateTime<Utc>>,
    pub last_result: Option<Result<Value, PaymeError>>,
    pub previous_result: Option<Result<Value, PaymeError>>,
}

#[derive(Debug)]
pub struct FinePaymentSystem {
    pub db_path: String,
    pub api: TransactionFlowApi<SqliteDatabase>,
}

impl FineWorld {
    pub fn api(&self) -> &TransactionFlowApi<SqliteDatabase> {
        &self.system.as_ref().expect("TransactionFlowApi not initialised").api
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.expect("The clock has not been set")
    }

    pub fn record<T: serde::Serialize>(&mut self, result: Result<T, PaymeError>) {
        let result = result.map(|v| serde_json::to_value(v).expect("Result is not serializable"));
        debug!("🥒️ Gateway call returned {result:?}");
        self.previous_result = self.last_result.take();
        self.last_result = Some(result);
    }

    pub fn last_result(&self) -> &Result<Value, PaymeError> {
        self.last_result.as_ref().expect("No gateway call has been made yet")
    }
}

impl FinePaymentSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        create_database(&url).await;
        run_migrations(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let api = TransactionFlowApi::new(db, chrono::Duration::hours(12));
        Self { db_path: url, api }
    }
}
