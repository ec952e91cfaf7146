use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no API key configured for the chat model")]
    MissingApiKey,
    #[error("invalid chat endpoint: {0}")]
    Url(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("chat model returned status {0}")]
    Status(u16),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("chat model returned no text")]
    EmptyResponse,
}
