use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Microphone access was denied. Please check permissions.")]
    PermissionDenied,

    #[error("Could not access microphone: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to initialize audio device: {0}")]
    DeviceInitFailed(String),

    #[error("Failed to start audio stream: {0}")]
    StreamStartFailed(String),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    #[error("No audio captured (silence or too short)")]
    NoAudioCaptured,

    #[error("Failed to resample audio: {0}")]
    ResampleFailed(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Audio format error: {0}")]
    FormatError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Errors that end a capture attempt before any audio is recorded.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            AudioError::PermissionDenied
                | AudioError::DeviceUnavailable(_)
                | AudioError::DeviceInitFailed(_)
                | AudioError::StreamStartFailed(_)
        )
    }
}
