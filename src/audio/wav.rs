//! 16-bit PCM RIFF/WAVE encoding.
//!
//! Output is byte-exact for a given input: samples are clamped, scaled
//! asymmetrically (`* 32768` below zero, `* 32767` otherwise) and truncated
//! toward zero.

use super::{AudioError, DecodedAudio};
use crate::types::asset::{AudioAsset, WAV_MIME};

pub const HEADER_LEN: usize = 44;
pub const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;
const FMT_CHUNK_LEN: u32 = 16;

/// Frame-major interleave: channel 0..N of frame 0, then frame 1, ...
pub fn interleave(audio: &DecodedAudio) -> Vec<f32> {
    let channels = audio.channels();
    let mut out = Vec::with_capacity(audio.frames() * channels.len());
    for frame in 0..audio.frames() {
        for channel in channels {
            out.push(channel[frame]);
        }
    }
    out
}

pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    // `as` truncates toward zero; NaN maps to 0.
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode `audio` as a canonical 44-byte-header PCM WAV file.
pub fn encode(audio: &DecodedAudio) -> Result<Vec<u8>, AudioError> {
    let channels = u16::try_from(audio.channel_count())
        .map_err(|_| AudioError::FormatError("too many channels for WAV".into()))?;
    let block_align = channels
        .checked_mul(BYTES_PER_SAMPLE)
        .ok_or_else(|| AudioError::FormatError("too many channels for WAV".into()))?;
    let sample_rate = audio.sample_rate();
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| AudioError::FormatError("byte rate overflows WAV header".into()))?;

    let interleaved = interleave(audio);
    let data_len = interleaved
        .len()
        .checked_mul(usize::from(BYTES_PER_SAMPLE))
        .and_then(|len| u32::try_from(len).ok())
        .filter(|len| len.checked_add(HEADER_LEN as u32 - 8).is_some())
        .ok_or_else(|| AudioError::FormatError("recording too long for a WAV container".into()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(data_len + HEADER_LEN as u32 - 8).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for sample in interleaved {
        out.extend_from_slice(&quantize(sample).to_le_bytes());
    }
    Ok(out)
}

/// Encode and tag as an uncompressed WAV asset.
pub fn encode_asset(audio: &DecodedAudio) -> Result<AudioAsset, AudioError> {
    Ok(AudioAsset::new(encode(audio)?, WAV_MIME))
}

/// 32-bit IEEE float WAV, the recorder's lossless capture container.
///
/// Layout: `RIFF`/`WAVE`, an 18-byte `fmt ` chunk (tag 3, `cbSize` 0), a
/// `fact` chunk with the frame count, then `data`.
pub fn encode_float(audio: &DecodedAudio) -> Result<Vec<u8>, AudioError> {
    const HEADER: u32 = 58;
    let channels = u16::try_from(audio.channel_count())
        .ok()
        .filter(|c| *c <= u16::MAX / 4)
        .ok_or_else(|| AudioError::FormatError("too many channels for WAV".into()))?;
    let block_align = channels * 4;
    let sample_rate = audio.sample_rate();
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| AudioError::FormatError("byte rate overflows WAV header".into()))?;
    let frames = u32::try_from(audio.frames())
        .map_err(|_| AudioError::FormatError("recording too long for a WAV container".into()))?;

    let interleaved = interleave(audio);
    let data_len = interleaved
        .len()
        .checked_mul(4)
        .and_then(|len| u32::try_from(len).ok())
        .filter(|len| len.checked_add(HEADER - 8).is_some())
        .ok_or_else(|| AudioError::FormatError("recording too long for a WAV container".into()))?;

    let mut out = Vec::with_capacity(HEADER as usize + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(data_len + HEADER - 8).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&18u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_IEEE_FLOAT.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&32u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(b"fact");
    out.extend_from_slice(&4u32.to_le_bytes());
    out.extend_from_slice(&frames.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in interleaved {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    Ok(out)
}
