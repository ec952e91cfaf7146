use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base url: {0}")]
    Url(String),
    #[error(
        "Connection failed. Please ensure:\n  1. The analysis server is running ({url})\n  2. No firewall is blocking the connection\n  3. The server URL is correct\n({reason})"
    )]
    Connection { url: String, reason: String },
    #[error("http error: {0}")]
    Http(String),
    #[error("{message}")]
    Server { status: Option<u16>, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("upload rejected: {0}")]
    Rejected(String),
}

impl ApiError {
    /// Connectivity problems, as opposed to errors reported by the server.
    pub fn is_connection(&self) -> bool {
        matches!(self, ApiError::Connection { .. })
    }
}
