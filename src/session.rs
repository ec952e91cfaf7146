//! Application state: the current selection, the recorder lifecycle and the
//! latest analysis.

use crate::audio::AudioError;
use crate::audio::capture::CaptureSource;
use crate::audio::pipeline::{self, ConversionStatus, FinishedRecording};
use crate::audio::recorder::{Recorder, Toggle};
use crate::error::api::ApiError;
use crate::types::analysis::AnalysisResult;
use crate::types::asset::{AudioAsset, RECORDING_FILE_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    /// Capture stopped and the device released; the raw recording waits
    /// for [`Session::finish_conversion`].
    Converting,
    /// A selection is available for upload.
    Ready,
}

/// The audio that will be uploaded next. Only one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    File { asset: AudioAsset, file_name: String },
    Recording(FinishedRecording),
}

impl Selection {
    pub fn asset(&self) -> &AudioAsset {
        match self {
            Selection::File { asset, .. } => asset,
            Selection::Recording(finished) => &finished.asset,
        }
    }

    /// Recordings are always sent as `recording.wav`, even when conversion
    /// fell back to the raw capture.
    pub fn file_name(&self) -> &str {
        match self {
            Selection::File { file_name, .. } => file_name,
            Selection::Recording(_) => RECORDING_FILE_NAME,
        }
    }

    pub fn status_line(&self) -> String {
        match self {
            Selection::File { file_name, asset } => {
                format!("Selected {file_name} ({} bytes)", asset.len())
            }
            Selection::Recording(FinishedRecording {
                status: ConversionStatus::Converted,
                ..
            }) => "Recording ready".to_string(),
            Selection::Recording(FinishedRecording {
                status: ConversionStatus::NeedsConversion,
                ..
            }) => "Recording ready (may need conversion)".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    selection: Option<Selection>,
    result: Option<AnalysisResult>,
    analysis_in_flight: bool,
    /// Raw capture held between stop and conversion.
    pending: Option<AudioAsset>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            selection: None,
            result: None,
            analysis_in_flight: false,
            pending: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn analysis_in_flight(&self) -> bool {
        self.analysis_in_flight
    }

    /// Replace any pending recording with a chosen file.
    pub fn select_file(&mut self, asset: AudioAsset, file_name: &str) -> Result<(), AudioError> {
        if matches!(self.state, SessionState::Recording | SessionState::Converting) {
            return Err(AudioError::AlreadyRecording);
        }
        self.selection = Some(Selection::File {
            asset,
            file_name: file_name.to_string(),
        });
        self.result = None;
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Start recording when idle or ready, otherwise stop and convert.
    pub fn toggle_recording<S: CaptureSource>(
        &mut self,
        recorder: &mut Recorder<S>,
    ) -> Result<SessionState, AudioError> {
        if recorder.is_recording() {
            self.stop_recording(recorder)?;
            return self.finish_conversion();
        }
        match recorder.toggle()? {
            Toggle::Started(_) => {
                self.selection = None;
                self.result = None;
                self.state = SessionState::Recording;
            }
            Toggle::Stopped(finished) => self.select_recording(finished),
        }
        Ok(self.state)
    }

    /// First half of a stop: release the device and hold the raw capture.
    /// Leaves the session in [`SessionState::Converting`].
    pub fn stop_recording<S: CaptureSource>(
        &mut self,
        recorder: &mut Recorder<S>,
    ) -> Result<SessionState, AudioError> {
        match recorder.stop_raw() {
            Ok(raw) => {
                self.pending = Some(raw);
                self.state = SessionState::Converting;
                Ok(self.state)
            }
            Err(e) => {
                self.state = self.resting_state();
                Err(e)
            }
        }
    }

    /// Second half of a stop: convert the held capture and select it.
    pub fn finish_conversion(&mut self) -> Result<SessionState, AudioError> {
        let raw = self.pending.take().ok_or(AudioError::NotRecording)?;
        self.select_recording(pipeline::finish_recording(raw));
        Ok(self.state)
    }

    fn select_recording(&mut self, finished: FinishedRecording) {
        tracing::info!(status = ?finished.status, "recording selected");
        self.selection = Some(Selection::Recording(finished));
        self.result = None;
        self.state = SessionState::Ready;
    }

    fn resting_state(&self) -> SessionState {
        if self.selection.is_some() {
            SessionState::Ready
        } else {
            SessionState::Idle
        }
    }

    /// Asset and file name to upload, if something is selected.
    pub fn upload_target(&self) -> Option<(&AudioAsset, &str)> {
        self.selection.as_ref().map(|s| (s.asset(), s.file_name()))
    }

    /// Mark an analysis as started. Returns false when there is nothing to
    /// upload or a request is already running.
    pub fn begin_analysis(&mut self) -> bool {
        if self.state != SessionState::Ready || self.analysis_in_flight {
            return false;
        }
        self.analysis_in_flight = true;
        true
    }

    pub fn finish_analysis(
        &mut self,
        outcome: Result<AnalysisResult, ApiError>,
    ) -> Result<&AnalysisResult, ApiError> {
        self.analysis_in_flight = false;
        let result = outcome?;
        Ok(self.result.insert(result))
    }

    /// Drop the selection and result, e.g. after a device error.
    pub fn reset(&mut self) {
        self.selection = None;
        self.result = None;
        self.pending = None;
        self.analysis_in_flight = false;
        self.state = SessionState::Idle;
    }
}
