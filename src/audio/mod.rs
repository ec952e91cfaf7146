pub mod capture;
pub mod decoder;
pub mod error;
pub mod meter;
pub mod normalize;
pub mod pipeline;
pub mod recorder;
pub mod resampler;
pub mod wav;

pub use error::AudioError;

/// Sample rate requested from the capture device.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Per-channel float samples at a fixed sample rate.
///
/// All channels hold the same number of frames. Samples are nominally in
/// `[-1.0, 1.0]` but are not clamped here.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

/// Output of the normalizer. Same shape as its input.
pub type NormalizedAudio = DecodedAudio;

impl DecodedAudio {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::FormatError("sample rate must be positive".into()));
        }
        let Some(first) = channels.first() else {
            return Err(AudioError::FormatError("audio has no channels".into()));
        };
        let frames = first.len();
        if channels.iter().any(|ch| ch.len() != frames) {
            return Err(AudioError::FormatError(
                "channels have different lengths".into(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Split frame-major samples into per-channel buffers. A trailing
    /// partial frame is dropped.
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: usize,
        samples: &[f32],
    ) -> Result<Self, AudioError> {
        if channel_count == 0 {
            return Err(AudioError::FormatError("audio has no channels".into()));
        }
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, sample) in frame.iter().enumerate() {
                channels[ch].push(*sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}
