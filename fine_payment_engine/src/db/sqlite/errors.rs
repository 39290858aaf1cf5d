use thiserror::Error;

use crate::{db_types::FineId, traits::PaymentGatewayError};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Fine {0} is not open for payment")]
    FineWithdrawn(FineId),
}

impl From<SqliteDatabaseError> for PaymentGatewayError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DriverError(e) => e.into(),
            SqliteDatabaseError::MigrationError(e) => Self::DatabaseError(e.to_string()),
            SqliteDatabaseError::FineWithdrawn(id) => Self::FineWithdrawn(id),
        }
    }
}
