use std::path::Path;

/// MIME type of the 16-bit PCM WAV produced by the encoder.
pub const WAV_MIME: &str = "audio/wav";

/// MIME type of the recorder's float32 WAV capture container.
pub const CAPTURE_MIME: &str = "audio/wav;codecs=float";

/// Fallback MIME type for recordings whose source does not report one.
pub const DEFAULT_RECORDING_MIME: &str = "audio/webm";

/// File name used when uploading a recording.
pub const RECORDING_FILE_NAME: &str = "recording.wav";

/// Opaque audio payload plus its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: Option<String>,
}

impl AudioAsset {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Read a user-selected file, guessing the MIME type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_for_extension)
            .unwrap_or("application/octet-stream");
        let asset = AudioAsset::new(bytes, mime);
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => asset.with_file_name(name),
            None => asset,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Best-effort container extension, from the file name first, then the MIME type.
    pub fn extension(&self) -> Option<String> {
        if let Some(ext) = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
        {
            return Some(ext.to_ascii_lowercase());
        }
        extension_for_mime(&self.mime_type).map(str::to_string)
    }
}

pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "ogg" => Some("audio/ogg"),
        "m4a" => Some("audio/mp4"),
        "flac" => Some("audio/flac"),
        "webm" => Some("audio/webm"),
        _ => None,
    }
}

pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    // Parameters such as ";codecs=opus" do not change the container.
    let essence = mime.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/ogg" => Some("ogg"),
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some("m4a"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/webm" => Some("webm"),
        _ => None,
    }
}
