use thiserror::Error;

/// Errors from talking to the remote jobs API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum BqError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    #[error("job id must not be empty")]
    InvalidJobId,

    #[error("invalid configuration: {0}")]
    Config(String),
}
