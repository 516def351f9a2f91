use crate::FailureCause;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlamaLoadError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Ollama returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LlamaLoadError>;

impl LlamaLoadError {
    /// How a request failure is reported once it reaches the task boundary.
    pub fn failure_cause(&self) -> FailureCause {
        match self {
            LlamaLoadError::Timeout(_) => FailureCause::Timeout,
            LlamaLoadError::Status { status, .. } => FailureCause::Status(*status),
            LlamaLoadError::Decode(_) | LlamaLoadError::Json(_) => FailureCause::Decode,
            LlamaLoadError::Transport(_) | LlamaLoadError::Config(_) | LlamaLoadError::Io(_) => {
                FailureCause::Transport
            }
        }
    }
}
