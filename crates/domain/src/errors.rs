//! Error types used throughout the client

use thiserror::Error;

/// Failure reported by the HTTP transport collaborator.
///
/// `Network` means the server was never reached (or the exchange broke
/// midway); `Status` means the server answered with a non-success code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Status code: {status}, message: {reason}")]
    Status { status: u16, reason: String, body: Vec<u8> },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(_) | Self::InvalidRequest(_) => None,
        }
    }

    /// Response body decoded as UTF-8 (lossy), empty for non-status errors.
    pub fn body_text(&self) -> String {
        match self {
            Self::Status { body, .. } => String::from_utf8_lossy(body).into_owned(),
            Self::Network(_) | Self::InvalidRequest(_) => String::new(),
        }
    }
}

/// Terminal failures of a shelf upload.
#[derive(Error, Debug)]
pub enum ShelfUploadError {
    /// The server refused a part with a status that retrying cannot fix.
    #[error("Shelf upload rejected: status code {status}, message: {reason}")]
    NonRetriable { status: u16, reason: String },

    /// Every round was spent; `errors` holds each failure in the order seen.
    #[error("Reached the limit of attempts to send a file ({attempts} attempts, {} errors)", .errors.len())]
    AttemptsExhausted { attempts: u32, errors: Vec<TransportError> },

    #[error("Shelf upload returned malformed missing parts: {0}")]
    MalformedMissingParts(String),
}

impl ShelfUploadError {
    /// Underlying causes collected across all rounds.
    pub fn causes(&self) -> &[TransportError] {
        match self {
            Self::AttemptsExhausted { errors, .. } => errors,
            Self::NonRetriable { .. } | Self::MalformedMissingParts(_) => &[],
        }
    }
}

/// Terminal failures while waiting for an asynchronous task.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Can't GET '{endpoint}'. Timeout {elapsed_secs}s expired.")]
    Timeout { endpoint: String, elapsed_secs: u64 },

    #[error("Task failed: {reason} (status {status}{})", code_suffix(.error_code))]
    Failed { status: u16, reason: String, error_code: Option<String> },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Waiting for task result was cancelled")]
    Cancelled,
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(", code {c}")).unwrap_or_default()
}

/// Main error type for the Diadoc client
#[derive(Error, Debug)]
pub enum DiadocError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    ShelfUpload(#[from] ShelfUploadError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Diadoc client operations
pub type Result<T> = std::result::Result<T, DiadocError>;
