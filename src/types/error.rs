use thiserror::Error;

/// Errors that can occur when using the ARIA client.
#[derive(Error, Debug)]
pub enum AriaError {
    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error (DNS, refused connection, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A REST request exceeded the configured timeout
    #[error("timeout")]
    Timeout,

    /// Settings file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by a custom [`Backend`](crate::store::Backend) implementation
    #[error("{0}")]
    Backend(String),
}

/// Convenience type alias for `Result<T, AriaError>`.
pub type Result<T> = std::result::Result<T, AriaError>;
