use crate::audio::{AudioError, DecodedAudio};
use crate::types::asset::AudioAsset;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode a compressed or container-wrapped asset into per-channel floats at
/// the asset's own sample rate.
pub fn decode(asset: &AudioAsset) -> Result<DecodedAudio, AudioError> {
    if asset.is_empty() {
        return Err(AudioError::Decode("empty audio payload".into()));
    }

    let mss = MediaSourceStream::new(
        Box::new(Cursor::new(asset.bytes.clone())),
        Default::default(),
    );

    let mut hint = Hint::new();
    if let Some(ext) = asset.extension() {
        hint.with_extension(&ext);
    }
    hint.mime_type(&asset.mime_type);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("unrecognized container: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("no decodable audio track".into()))?;
    let track_id = track.id;
    let declared_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("unsupported codec: {e}")))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut layout: Option<(u32, usize)> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Decode(format!("failed to read packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!(error = e, "skipping corrupt packet");
                continue;
            }
            Err(e) => return Err(AudioError::Decode(format!("failed to decode packet: {e}"))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        match layout {
            None => layout = Some((spec.rate, channels)),
            Some((rate, count)) if rate != spec.rate || count != channels => {
                return Err(AudioError::Decode(
                    "stream changes format mid-way".into(),
                ));
            }
            Some(_) => {}
        }

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buf.samples());
    }

    let Some((rate, channels)) = layout else {
        return Err(AudioError::Decode("no audio frames in stream".into()));
    };
    let rate = declared_rate.unwrap_or(rate);
    if interleaved.is_empty() {
        return Err(AudioError::Decode("no audio frames in stream".into()));
    }

    let audio = DecodedAudio::from_interleaved(rate, channels, &interleaved)
        .map_err(|e| AudioError::Decode(e.to_string()))?;
    tracing::debug!(
        sample_rate = audio.sample_rate(),
        channels = audio.channel_count(),
        frames = audio.frames(),
        "decoded audio"
    );
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav;

    #[test]
    fn decodes_pcm_wav_back_to_floats() {
        let source = DecodedAudio::new(
            16_000,
            vec![vec![0.25, -0.5, 0.0, 0.75], vec![-0.25, 0.5, 1.0, -1.0]],
        )
        .unwrap();
        let asset = wav::encode_asset(&source).unwrap();

        let decoded = decode(&asset).unwrap();
        assert_eq!(decoded.sample_rate(), 16_000);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frames(), 4);
        for (a, b) in decoded.channels().iter().zip(source.channels()) {
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-3, "{x} vs {y}");
            }
        }
    }

    #[test]
    fn float_capture_container_is_lossless() {
        let source = DecodedAudio::new(44_100, vec![vec![0.01, -0.02, 0.03, 0.0]]).unwrap();
        let asset = AudioAsset::new(wav::encode_float(&source).unwrap(), "audio/wav;codecs=float");
        assert_eq!(decode(&asset).unwrap(), source);
    }

    #[test]
    fn rejects_garbage() {
        let asset = AudioAsset::new(b"definitely not audio".to_vec(), "audio/webm");
        assert!(matches!(decode(&asset), Err(AudioError::Decode(_))));
    }

    #[test]
    fn rejects_empty_payload() {
        let asset = AudioAsset::new(Vec::new(), "audio/wav");
        assert!(matches!(decode(&asset), Err(AudioError::Decode(_))));
    }
}
