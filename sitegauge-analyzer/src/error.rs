use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("markup cannot be parsed as a document")]
    MalformedInput,

    #[error("analysis cancelled")]
    Cancelled,

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl AnalyzeError {
    /// Network-level failures are retried with backoff; everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalyzeError::Network { .. } => true,
            AnalyzeError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
