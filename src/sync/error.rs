use thiserror::Error;

/// Errors raised by the item sync client.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The server rejected the bearer token
    #[error("Sync rejected: authentication required")]
    Unauthorized,

    /// Any other non-2xx response
    #[error("Server returned status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
