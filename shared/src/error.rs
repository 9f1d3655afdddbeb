use thiserror::Error;

/// Failures surfaced by the cart operations.
///
/// At the HTTP boundary every variant collapses into the same
/// `{"success": false, "message": ...}` envelope carrying the `Display` text.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("User not found")]
    UserNotFound,

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Stored user document is malformed: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported value {value:?} for {name}")]
    InvalidValue { name: &'static str, value: String },
}
