use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("The record store did not respond in time; the request can be retried.")]
    Timeout,

    #[error("Failed to talk to the database: {0}")]
    ConnectionError(sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("A stored row could not be interpreted: {0}")]
    InvalidRow(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // Pool exhaustion and I/O stalls are transient; callers surface
            // these as retryable instead of failing the request outright.
            sqlx::Error::PoolTimedOut => DbError::Timeout,
            other => DbError::ConnectionError(other),
        }
    }
}

impl DbError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Timeout)
    }
}
