use crate::audio::AudioError;
use crate::error::api::ApiError;
use crate::error::config::ConfigError;
use thiserror::Error;

/// Everything a command can fail with. Only `main` turns these into exit codes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid analysis result in {path}: {message}")]
    ResultFile { path: String, message: String },
    #[error("No audio selected. Record or choose a file first.")]
    NothingSelected,
}

impl AppError {
    pub fn file(path: &std::path::Path, source: std::io::Error) -> Self {
        AppError::File {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Audio(e) if e.is_device_error() => 2,
            AppError::Api(e) if e.is_connection() => 3,
            AppError::Api(_) => 4,
            _ => 1,
        }
    }
}
