use crate::audio::{AudioError, DecodedAudio};
use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

pub struct Resampler {
    resampler: SincFixedIn<f32>,
    from_rate: u32,
    to_rate: u32,
    channels: usize,
}

impl Resampler {
    pub fn new(from_rate: u32, to_rate: u32, channels: usize) -> Result<Self, AudioError> {
        if from_rate == 0 || to_rate == 0 || channels == 0 {
            return Err(AudioError::ResampleFailed(format!(
                "invalid resampler shape: {from_rate} Hz -> {to_rate} Hz, {channels} channels"
            )));
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let resampler = SincFixedIn::<f32>::new(
            to_rate as f64 / from_rate as f64,
            2.0, // max_resample_ratio_relative
            params,
            from_rate as usize, // chunk_size: one second of input
            channels,
        )
        .map_err(|e| AudioError::ResampleFailed(e.to_string()))?;

        Ok(Resampler {
            resampler,
            from_rate,
            to_rate,
            channels,
        })
    }

    pub fn resample(&mut self, input: &DecodedAudio) -> Result<DecodedAudio, AudioError> {
        if input.sample_rate() != self.from_rate || input.channel_count() != self.channels {
            return Err(AudioError::ResampleFailed(format!(
                "expected {} Hz x{}, got {} Hz x{}",
                self.from_rate,
                self.channels,
                input.sample_rate(),
                input.channel_count()
            )));
        }

        // SincFixedIn expects fixed chunk sizes
        let chunk_size = self.from_rate as usize;
        let frames = input.frames();
        let mut output: Vec<Vec<f32>> = vec![Vec::new(); self.channels];

        let mut start = 0;
        while start < frames {
            let end = (start + chunk_size).min(frames);
            let valid = end - start;

            let waves_in: Vec<Vec<f32>> = input
                .channels()
                .iter()
                .map(|ch| {
                    let mut chunk = ch[start..end].to_vec();
                    // Pad the last partial chunk with silence
                    chunk.resize(chunk_size, 0.0);
                    chunk
                })
                .collect();

            let waves_out = self
                .resampler
                .process(&waves_in, None)
                .map_err(|e| AudioError::ResampleFailed(e.to_string()))?;

            // Only keep the portion corresponding to real input
            let keep = if valid == chunk_size {
                usize::MAX
            } else {
                (valid as f64 * self.to_rate as f64 / self.from_rate as f64) as usize
            };
            for (out, wave) in output.iter_mut().zip(waves_out) {
                let take = keep.min(wave.len());
                out.extend_from_slice(&wave[..take]);
            }

            start = end;
        }

        DecodedAudio::new(self.to_rate, output)
    }
}

/// Convenience wrapper that returns the input unchanged when the rate already matches.
pub fn resample_to(input: DecodedAudio, to_rate: u32) -> Result<DecodedAudio, AudioError> {
    if input.sample_rate() == to_rate {
        return Ok(input);
    }
    let mut resampler = Resampler::new(input.sample_rate(), to_rate, input.channel_count())?;
    resampler.resample(&input)
}
