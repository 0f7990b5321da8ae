use thiserror::Error;

/// Failures at the routing/delivery boundary. Decoding itself never fails.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no response content for {url}")]
    EmptyResponse { url: String },

    #[error("no parser for {url}")]
    NoParser { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP delivery failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl PipelineError {
    /// URLs nobody handles are routine in a capture; callers log these quietly.
    pub fn is_unrouted(&self) -> bool {
        matches!(self, PipelineError::NoParser { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
