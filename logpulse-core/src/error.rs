use thiserror::Error;

/// Unified error type for logpulse.
///
/// Only payload-level failures ever reach this type. Malformed individual
/// records are dropped by the normalizer and never become errors.
#[derive(Error, Debug)]
pub enum PulseError {
    #[error("{0}")]
    InvalidUpload(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PulseError {
    pub fn invalid_upload(msg: impl Into<String>) -> Self {
        Self::InvalidUpload(msg.into())
    }

    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            PulseError::InvalidUpload(_) => 400,
            _ => 500,
        }
    }

    /// True when the caller sent something we refuse to store.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

pub type Result<T, E = PulseError> = std::result::Result<T, E>;
