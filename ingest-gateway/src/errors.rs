use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Errors that can occur while handling an ingest request
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Invalid batch payload: {0}")]
    InvalidBatch(String),

    #[error("Batch must contain at least one record")]
    EmptyBatch,

    #[error("Upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("Upstream returned status {1} for {0}")]
    UpstreamRejected(String, http::StatusCode),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ValidationError),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry client error: {0}")]
    RegistryClientError(#[from] registry::ClientError),
}

impl GatewayError {
    /// Whether the error is caller-caused and should map to a 400 response.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GatewayError::RequestBodyError(_)
                | GatewayError::InvalidBatch(_)
                | GatewayError::EmptyBatch
        )
    }
}
