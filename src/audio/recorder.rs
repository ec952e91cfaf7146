use crate::audio::capture::{
    CaptureConstraints, CaptureFormat, CaptureSource, ChunkBuffer, ChunkSink,
};
use crate::audio::meter::VolumeMeter;
use crate::audio::pipeline::{self, FinishedRecording};
use crate::audio::{AudioError, DecodedAudio, resampler, wav};
use crate::types::asset::{AudioAsset, DEFAULT_RECORDING_MIME};

/// Result of [`Recorder::toggle`].
#[derive(Debug)]
pub enum Toggle {
    Started(CaptureFormat),
    Stopped(FinishedRecording),
}

/// One capture session at a time over a [`CaptureSource`].
pub struct Recorder<S: CaptureSource> {
    source: S,
    constraints: CaptureConstraints,
    buffer: ChunkBuffer,
    meter: VolumeMeter,
    active: Option<CaptureFormat>,
}

impl<S: CaptureSource> Recorder<S> {
    pub fn new(source: S, constraints: CaptureConstraints) -> Self {
        Self {
            source,
            constraints,
            buffer: ChunkBuffer::default(),
            meter: VolumeMeter::new(),
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn meter(&self) -> VolumeMeter {
        self.meter.clone()
    }

    /// Format of the capture in progress.
    pub fn format(&self) -> Option<CaptureFormat> {
        self.active
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// Start when idle, stop and convert when recording. This is the only
    /// way to begin a capture.
    pub fn toggle(&mut self) -> Result<Toggle, AudioError> {
        if self.is_recording() {
            self.stop().map(Toggle::Stopped)
        } else {
            self.start().map(Toggle::Started)
        }
    }

    fn start(&mut self) -> Result<CaptureFormat, AudioError> {
        if self.is_recording() {
            return Err(AudioError::AlreadyRecording);
        }
        self.buffer.clear();
        self.meter.reset();

        let sink = ChunkSink::new(self.buffer.clone(), self.meter.clone());
        match self.source.open(&self.constraints, sink) {
            Ok(format) if format.channels == 0 || format.sample_rate == 0 => {
                self.source.release();
                Err(AudioError::DeviceInitFailed(format!(
                    "device reported an invalid format: {format:?}"
                )))
            }
            Ok(format) => {
                tracing::info!(
                    sample_rate = format.sample_rate,
                    channels = format.channels,
                    "recording started"
                );
                self.active = Some(format);
                Ok(format)
            }
            Err(e) => {
                self.source.release();
                tracing::error!(error = %e, "could not start recording");
                Err(e)
            }
        }
    }

    /// Stop capturing and package the raw recording without converting it.
    /// The device is released before anything else can fail.
    pub fn stop_raw(&mut self) -> Result<AudioAsset, AudioError> {
        let format = self.active.take().ok_or(AudioError::NotRecording)?;
        self.source.release();
        self.meter.reset();

        let chunks = self.buffer.take();
        let mime = self
            .source
            .native_mime_type()
            .unwrap_or_else(|| DEFAULT_RECORDING_MIME.to_string());
        let raw = package(chunks, format, self.constraints.sample_rate, mime)?;
        tracing::info!(bytes = raw.len(), mime = %raw.mime_type, "recording stopped");
        Ok(raw)
    }

    /// Stop capturing and run decode, normalize and WAV encode, falling back
    /// to the raw recording when conversion fails.
    fn stop(&mut self) -> Result<FinishedRecording, AudioError> {
        let raw = self.stop_raw()?;
        Ok(pipeline::finish_recording(raw))
    }
}

impl<S: CaptureSource> Drop for Recorder<S> {
    fn drop(&mut self) {
        if self.active.take().is_some() {
            self.source.release();
        }
    }
}

/// Concatenate chunks and wrap them in the float capture container at
/// `target_rate`.
fn package(
    chunks: Vec<Vec<f32>>,
    format: CaptureFormat,
    target_rate: u32,
    mime: String,
) -> Result<AudioAsset, AudioError> {
    let samples = chunks.concat();
    let channels = usize::from(format.channels);
    if samples.len() < channels {
        return Err(AudioError::NoAudioCaptured);
    }

    let audio = DecodedAudio::from_interleaved(format.sample_rate, channels, &samples)?;
    let audio = if audio.sample_rate() == target_rate {
        audio
    } else {
        match resampler::resample_to(audio.clone(), target_rate) {
            Ok(resampled) => resampled,
            Err(e) => {
                tracing::warn!(error = %e, "keeping device sample rate");
                audio
            }
        }
    };

    tracing::debug!(
        secs = audio.duration_secs(),
        sample_rate = audio.sample_rate(),
        "capture packaged"
    );
    Ok(AudioAsset::new(wav::encode_float(&audio)?, mime))
}
