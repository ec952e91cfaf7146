use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

const FLOOR_DB: f32 = -60.0;

/// Live input level shared between the capture callback and the UI.
#[derive(Clone, Debug)]
pub struct VolumeMeter {
    level_bits: Arc<AtomicU32>,
}

/// Advice shown next to the meter while recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelHint {
    VeryQuiet,
    TooQuiet,
    Good,
    TooLoud,
}

impl LevelHint {
    pub fn from_percent(percent: f32) -> Self {
        if percent < 5.0 {
            LevelHint::VeryQuiet
        } else if percent < 20.0 {
            LevelHint::TooQuiet
        } else if percent > 85.0 {
            LevelHint::TooLoud
        } else {
            LevelHint::Good
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LevelHint::VeryQuiet => "Very quiet - speak louder!",
            LevelHint::TooQuiet => "Too quiet - increase volume",
            LevelHint::TooLoud => "Too loud - reduce volume",
            LevelHint::Good => "Good level - keep speaking",
        }
    }
}

impl VolumeMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(0.0f32.to_bits())),
        }
    }

    /// Update from a chunk of captured samples.
    pub fn observe(&self, samples: &[f32]) {
        self.set_percent(level_percent(samples));
    }

    pub fn set_percent(&self, percent: f32) {
        self.level_bits
            .store(percent.clamp(0.0, 100.0).to_bits(), Ordering::Relaxed);
    }

    pub fn percent(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }

    pub fn hint(&self) -> LevelHint {
        LevelHint::from_percent(self.percent())
    }

    pub fn reset(&self) {
        self.set_percent(0.0);
    }
}

impl Default for VolumeMeter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return FLOOR_DB;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = energy.sqrt().max(1e-6);
    (20.0 * rms.log10()).max(FLOOR_DB)
}

/// RMS level mapped linearly from [-60 dBFS, 0 dBFS] onto [0, 100].
pub fn level_percent(samples: &[f32]) -> f32 {
    let db = rms_db(samples);
    ((db - FLOOR_DB) / -FLOOR_DB * 100.0).clamp(0.0, 100.0)
}
