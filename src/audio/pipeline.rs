use crate::audio::{AudioError, decoder, normalize, wav};
use crate::types::asset::AudioAsset;

/// Whether a finished recording went through the WAV conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Converted,
    /// Decoding or encoding failed; the raw capture is used as-is.
    NeedsConversion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRecording {
    pub asset: AudioAsset,
    pub status: ConversionStatus,
}

/// Decode, normalize and re-encode as 16-bit PCM WAV.
pub fn convert_to_wav(asset: &AudioAsset) -> Result<AudioAsset, AudioError> {
    let decoded = decoder::decode(asset)?;
    let normalized = normalize::normalize(decoded);
    wav::encode_asset(&normalized)
}

/// Run the conversion chain, falling back to the raw asset on any failure.
pub fn finish_recording(raw: AudioAsset) -> FinishedRecording {
    match convert_to_wav(&raw) {
        Ok(asset) => FinishedRecording {
            asset,
            status: ConversionStatus::Converted,
        },
        Err(e) => {
            tracing::warn!(error = %e, mime = %raw.mime_type, "conversion failed, keeping original recording");
            FinishedRecording {
                asset: raw,
                status: ConversionStatus::NeedsConversion,
            }
        }
    }
}
