use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed kline row: {0}")]
    MalformedRow(String),

    #[error("Strategy error: {0}")]
    Strategy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Connectivity faults the caller should back off and retry.
    /// Data, plugin, and input faults are not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Exchange(_) | Error::Http(_) | Error::Database(_)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
