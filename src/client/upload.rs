use crate::error::api::ApiError;
use crate::audio::wav::HEADER_LEN;
use crate::types::asset::AudioAsset;

/// Extensions the analysis service accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "m4a", "flac", "webm"];

/// Largest upload the service accepts.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Local copy of the server's upload limits, checked before sending.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed_extensions: Vec<String>,
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Longest 16-bit PCM WAV that still fits under `max_bytes`.
    pub fn max_pcm_secs(&self, sample_rate: u32, channels: u16) -> u64 {
        let bytes_per_sec = u64::from(sample_rate) * u64::from(channels.max(1)) * 2;
        if bytes_per_sec == 0 {
            return 0;
        }
        let payload = (self.max_bytes as u64).saturating_sub(HEADER_LEN as u64);
        payload / bytes_per_sec
    }

    pub fn check(&self, asset: &AudioAsset, file_name: &str) -> Result<(), ApiError> {
        if asset.is_empty() {
            return Err(ApiError::Rejected("audio file is empty".into()));
        }
        if asset.len() > self.max_bytes {
            return Err(ApiError::Rejected(format!(
                "File too large. Maximum size is {}MB",
                self.max_bytes / (1024 * 1024)
            )));
        }
        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext {
            Some(ext) if self.allowed_extensions.iter().any(|a| *a == ext) => Ok(()),
            _ => Err(ApiError::Rejected(format!(
                "File type not allowed. Allowed: {}",
                self.allowed_extensions.join(", ")
            ))),
        }
    }
}
