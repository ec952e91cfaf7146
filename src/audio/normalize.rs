//! Peak-based gain normalization for quiet recordings.
//!
//! A single scalar gain is applied uniformly to every sample; there is no
//! time-varying gain curve.

use super::{DecodedAudio, NormalizedAudio};

/// Peaks at or above this level are left alone.
pub const QUIET_THRESHOLD: f32 = 0.1;

/// Peak level a quiet recording is boosted to.
pub const TARGET_PEAK: f32 = 0.7;

/// Maximum absolute sample value across all channels.
pub fn peak(audio: &DecodedAudio) -> f32 {
    audio
        .channels()
        .iter()
        .flat_map(|ch| ch.iter())
        .fold(0.0f32, |peak, s| peak.max(s.abs()))
}

/// Gain needed to bring `peak` to the target, or `None` when the signal is
/// silent or already loud enough.
///
/// Computed in `f64`: for subnormal peaks the ratio exceeds `f32::MAX`.
pub fn gain_for_peak(peak: f32) -> Option<f64> {
    if peak > 0.0 && peak < QUIET_THRESHOLD {
        Some(f64::from(TARGET_PEAK) / f64::from(peak))
    } else {
        None
    }
}

/// Boost quiet audio so its peak reaches [`TARGET_PEAK`]. The result is not
/// clamped.
pub fn normalize(mut audio: DecodedAudio) -> NormalizedAudio {
    let peak = peak(&audio);
    match gain_for_peak(peak) {
        Some(gain) => {
            for channel in audio.channels_mut() {
                for sample in channel.iter_mut() {
                    *sample = (f64::from(*sample) * gain) as f32;
                }
            }
            tracing::info!(peak, gain, "audio normalized");
        }
        None => {
            tracing::debug!(peak, "no normalization needed");
        }
    }
    audio
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(channels: Vec<Vec<f32>>) -> DecodedAudio {
        DecodedAudio::new(44_100, channels).unwrap()
    }

    #[test]
    fn silence_is_unchanged() {
        let input = audio(vec![vec![0.0; 64], vec![0.0; 64]]);
        assert_eq!(normalize(input.clone()), input);
    }

    #[test]
    fn loud_audio_is_unchanged_and_idempotent() {
        let input = audio(vec![vec![0.1, -0.05, 0.02], vec![-0.3, 0.0, 0.25]]);
        let once = normalize(input.clone());
        assert_eq!(once, input);
        assert_eq!(normalize(once.clone()), once);
    }

    #[test]
    fn threshold_peak_is_not_boosted() {
        let input = audio(vec![vec![0.0, -QUIET_THRESHOLD, 0.05]]);
        assert_eq!(normalize(input.clone()), input);
    }

    #[test]
    fn quiet_audio_reaches_target_peak() {
        let input = audio(vec![vec![0.01, -0.02, 0.005], vec![0.0, 0.015, -0.03]]);
        let out = normalize(input);
        assert!((peak(&out) - TARGET_PEAK).abs() < 1e-6);
        // Uniform gain: ratios between samples are preserved.
        let ch0 = out.channel(0).unwrap();
        assert!((ch0[1] / ch0[0] + 2.0).abs() < 1e-5);
    }

    #[test]
    fn gain_uses_cross_channel_peak() {
        let out = normalize(audio(vec![vec![0.01], vec![-0.05]]));
        let gain = TARGET_PEAK / 0.05;
        assert!((out.channel(0).unwrap()[0] - 0.01 * gain).abs() < 1e-6);
        assert!((out.channel(1).unwrap()[0] + TARGET_PEAK).abs() < 1e-6);
    }

    #[test]
    fn gain_for_peak_bounds() {
        assert_eq!(gain_for_peak(0.0), None);
        assert_eq!(gain_for_peak(0.1), None);
        assert_eq!(gain_for_peak(0.9), None);
        let gain = gain_for_peak(0.05).unwrap();
        assert!((gain - 14.0).abs() < 1e-4);
        assert!(gain_for_peak(1e-39).is_some_and(f64::is_finite));
    }

    #[test]
    fn subnormal_peak_still_reaches_target() {
        let out = normalize(audio(vec![vec![1e-39, 0.0, -5e-40]]));
        let ch = out.channel(0).unwrap();
        assert!(ch.iter().all(|s| s.is_finite()));
        assert_eq!(ch[1], 0.0);
        assert!((peak(&out) - TARGET_PEAK).abs() < 1e-6);
        assert!((ch[2] + TARGET_PEAK / 2.0).abs() < 1e-3);
    }
}
