//! Error types for the ctbrec client.

/// Errors surfaced by [`RecClient`](crate::client::RecClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a fail envelope (`status != "success"`).
    #[error("request failed: {message}")]
    RequestFailed {
        /// Message carried in the server's `msg` field.
        message: String,
    },

    /// The server answered with a non-200 HTTP status.
    #[error("HTTP error: {status} : {reason} : {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status code.
        reason: String,
        /// Raw response body for debugging.
        body: String,
    },

    /// A model reference matched none of the three recognized shapes
    /// (descriptor, URL, `Site:Name` shorthand).
    #[error("invalid model definition: {0}")]
    InvalidModelDefinition(String),

    /// A model or model-group reference could not be resolved against
    /// current server state.
    #[error("not found: {0}")]
    NotFound(String),

    /// Model-group creation requested a name already in use.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body could not be parsed, or a payload could not be
    /// serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
