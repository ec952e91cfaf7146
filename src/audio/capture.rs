use crate::audio::meter::VolumeMeter;
use crate::audio::{AudioError, TARGET_SAMPLE_RATE};
use crate::types::asset::CAPTURE_MIME;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BuildStreamError, Device, FromSample, PlayStreamError, Sample, SampleFormat, SizedSample,
    Stream, StreamConfig, SupportedStreamConfig, SupportedStreamConfigsError,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Time CPAL callbacks may still be in flight after the stream is dropped.
const FLUSH_GRACE: Duration = Duration::from_millis(100);

/// Fixed capture settings requested from the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    pub sample_rate: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            sample_rate: TARGET_SAMPLE_RATE,
        }
    }
}

/// Shape of the interleaved chunks a source delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Interleaved chunks in arrival order.
#[derive(Clone, Default)]
pub struct ChunkBuffer {
    chunks: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl ChunkBuffer {
    /// A callback that panicked mid-push poisons the lock; the chunks already
    /// stored are still whole, so keep using them.
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<f32>>> {
        self.chunks.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("capture buffer lock poisoned, recovering buffered audio");
            poisoned.into_inner()
        })
    }

    pub fn push(&self, chunk: Vec<f32>) {
        self.lock().push(chunk);
    }

    /// Drain every buffered chunk.
    pub fn take(&self) -> Vec<Vec<f32>> {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle a source pushes captured audio into. Feeds the level meter too.
#[derive(Clone)]
pub struct ChunkSink {
    buffer: ChunkBuffer,
    meter: VolumeMeter,
}

impl ChunkSink {
    pub fn new(buffer: ChunkBuffer, meter: VolumeMeter) -> Self {
        Self { buffer, meter }
    }

    pub fn push(&self, chunk: Vec<f32>) {
        self.meter.observe(&chunk);
        self.buffer.push(chunk);
    }
}

/// An input device the recorder can drive.
pub trait CaptureSource {
    /// Open the device and start delivering chunks into `sink`.
    fn open(
        &mut self,
        constraints: &CaptureConstraints,
        sink: ChunkSink,
    ) -> Result<CaptureFormat, AudioError>;

    /// Stop delivering chunks and release the device. Safe to call when not open.
    fn release(&mut self);

    /// MIME type of the container this source's recordings are packaged in.
    fn native_mime_type(&self) -> Option<String> {
        None
    }
}

/// Default input device through CPAL.
#[derive(Default)]
pub struct CpalSource {
    stream: Option<Stream>,
}

impl CpalSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureSource for CpalSource {
    fn open(
        &mut self,
        constraints: &CaptureConstraints,
        sink: ChunkSink,
    ) -> Result<CaptureFormat, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no input device found".into()))?;

        tracing::debug!(
            echo_cancellation = constraints.echo_cancellation,
            noise_suppression = constraints.noise_suppression,
            auto_gain_control = constraints.auto_gain_control,
            "platform voice processing is not exposed by cpal; capturing unprocessed input"
        );

        let supported = pick_config(&device, constraints.sample_rate)?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, sink)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, sink)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, sink)?,
            SampleFormat::I32 => build_stream::<i32>(&device, &config, sink)?,
            other => {
                return Err(AudioError::DeviceInitFailed(format!(
                    "unsupported sample format {other:?}"
                )));
            }
        };

        stream.play().map_err(|e| match e {
            PlayStreamError::DeviceNotAvailable => {
                AudioError::DeviceUnavailable("device disconnected".into())
            }
            other => AudioError::StreamStartFailed(other.to_string()),
        })?;

        let format = CaptureFormat {
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        };
        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = format.sample_rate,
            channels = format.channels,
            "capture started"
        );

        self.stream = Some(stream);
        Ok(format)
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            std::thread::sleep(FLUSH_GRACE);
            tracing::debug!("capture device released");
        }
    }

    fn native_mime_type(&self) -> Option<String> {
        Some(CAPTURE_MIME.to_string())
    }
}

/// Prefer a configuration that can run at `rate`; otherwise the device default.
fn pick_config(device: &Device, rate: u32) -> Result<SupportedStreamConfig, AudioError> {
    let ranges = device.supported_input_configs().map_err(|e| match e {
        SupportedStreamConfigsError::DeviceNotAvailable => {
            AudioError::DeviceUnavailable("device disconnected".into())
        }
        other => AudioError::DeviceInitFailed(other.to_string()),
    })?;

    let wanted = cpal::SampleRate(rate);
    let mut candidates: Vec<_> = ranges
        .filter(|r| r.min_sample_rate() <= wanted && wanted <= r.max_sample_rate())
        .collect();
    // f32 first, then fewer channels
    candidates.sort_by_key(|r| (r.sample_format() != SampleFormat::F32, r.channels()));
    if let Some(range) = candidates.into_iter().next() {
        return Ok(range.with_sample_rate(wanted));
    }

    let fallback = device
        .default_input_config()
        .map_err(|e| AudioError::DeviceInitFailed(e.to_string()))?;
    tracing::info!(
        requested = rate,
        actual = fallback.sample_rate().0,
        "device cannot capture at the requested rate; recording will be resampled"
    );
    Ok(fallback)
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    sink: ChunkSink,
) -> Result<Stream, AudioError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let chunk: Vec<f32> = data.iter().map(|s| f32::from_sample(*s)).collect();
                sink.push(chunk);
            },
            |err| tracing::warn!(error = %err, "input stream error"),
            None,
        )
        .map_err(classify_build_error)
}

fn classify_build_error(err: BuildStreamError) -> AudioError {
    match err {
        BuildStreamError::DeviceNotAvailable => {
            AudioError::DeviceUnavailable("device disconnected".into())
        }
        BuildStreamError::BackendSpecific { err } => {
            let text = err.description.to_lowercase();
            if text.contains("permission") || text.contains("denied") || text.contains("authoriz")
            {
                AudioError::PermissionDenied
            } else {
                AudioError::StreamStartFailed(err.description)
            }
        }
        other => AudioError::StreamStartFailed(other.to_string()),
    }
}
