//! Schema of the analysis service's result payload.
//!
//! Every field is optional on the wire. Missing fields take the defaults
//! documented on each item, and [`AnalysisResult::sanitized`] is applied once
//! when the payload crosses the API boundary so the rest of the crate can
//! use the values directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emotion label used when the service returns none.
pub const DEFAULT_EMOTION: &str = "neutral";

/// Neutral midpoint for personality traits the service omits.
const TRAIT_MIDPOINT: f64 = 50.0;

/// `{ success, data?, error? }` envelope returned by `POST /analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<AnalysisResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AnalysisResult {
    /// Dominant emotion label. Default: `"neutral"`.
    #[serde(default)]
    pub emotion: String,
    /// Percent. Default: 0.
    #[serde(default)]
    pub emotion_confidence: f64,
    /// Percent. Default: 0.
    #[serde(default)]
    pub vocal_health_score: f64,
    /// Percent. Default: 0.
    #[serde(default)]
    pub stress_level: f64,
    #[serde(default)]
    pub stress_components: StressComponents,
    #[serde(default, alias = "personality_traits")]
    pub personality_analysis: PersonalityTraits,
    /// Label to percent. Default: empty.
    #[serde(default)]
    pub emotion_distribution: BTreeMap<String, f64>,
    #[serde(default)]
    pub emotion_timeline: Vec<TimelinePoint>,
    #[serde(default)]
    pub heatmap: Heatmap,
    #[serde(default)]
    pub timeline_emotion: String,
    #[serde(default)]
    pub issues_detected: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub early_illness_signals: Vec<String>,
    #[serde(default)]
    pub trigger_word_alert: Vec<String>,
    /// Years. Default: 0.
    #[serde(default)]
    pub voice_age: f64,
    /// Fraction in [0, 1]. Default: none.
    #[serde(default)]
    pub age_confidence: Option<f64>,
    #[serde(default)]
    pub age_features: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub live_analysis: LiveAnalysis,
    #[serde(default)]
    pub raw: RawAnalysis,
}

/// Stress contributions, each a percent. Default: 0.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StressComponents {
    #[serde(default)]
    pub health: f64,
    #[serde(default)]
    pub emotion: f64,
    #[serde(default)]
    pub instability: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub tremor: f64,
}

/// Big-five style trait percentages. Each defaults to 50.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PersonalityTraits {
    #[serde(default = "trait_midpoint")]
    pub openness: f64,
    #[serde(default = "trait_midpoint")]
    pub conscientiousness: f64,
    #[serde(default = "trait_midpoint")]
    pub extraversion: f64,
    #[serde(default = "trait_midpoint")]
    pub agreeableness: f64,
    #[serde(default = "trait_midpoint")]
    pub emotional_stability: f64,
    #[serde(default = "trait_midpoint")]
    pub neuroticism: f64,
}

fn trait_midpoint() -> f64 {
    TRAIT_MIDPOINT
}

impl Default for PersonalityTraits {
    fn default() -> Self {
        Self {
            openness: TRAIT_MIDPOINT,
            conscientiousness: TRAIT_MIDPOINT,
            extraversion: TRAIT_MIDPOINT,
            agreeableness: TRAIT_MIDPOINT,
            emotional_stability: TRAIT_MIDPOINT,
            neuroticism: TRAIT_MIDPOINT,
        }
    }
}

impl PersonalityTraits {
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("Openness", self.openness),
            ("Conscientiousness", self.conscientiousness),
            ("Extraversion", self.extraversion),
            ("Agreeableness", self.agreeableness),
            ("Emotional stability", self.emotional_stability),
            ("Neuroticism", self.neuroticism),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TimelinePoint {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Column-oriented heatmap as sent by the service.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Heatmap {
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub confidences: Vec<f64>,
}

/// One heatmap cell.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapCell<'a> {
    pub time: &'a str,
    pub emotion: &'a str,
    pub confidence: f64,
}

impl Heatmap {
    /// Cells as (time, emotion, confidence). Missing confidences read as 0.
    pub fn cells(&self) -> Vec<HeatmapCell<'_>> {
        self.times
            .iter()
            .zip(&self.emotions)
            .enumerate()
            .map(|(i, (time, emotion))| HeatmapCell {
                time: time.as_str(),
                emotion: emotion.as_str(),
                confidence: self.confidences.get(i).copied().unwrap_or(0.0),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty() || self.emotions.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LiveAnalysis {
    #[serde(default)]
    pub status: String,
    /// Seconds. Default: 0.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub quality: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawAnalysis {
    #[serde(default)]
    pub emotion: Option<RawEmotion>,
    #[serde(default)]
    pub health: Option<RawHealth>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawEmotion {
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawHealth {
    #[serde(default)]
    pub metrics: Option<HealthMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HealthMetrics {
    #[serde(default)]
    pub jitter: Option<f64>,
    #[serde(default)]
    pub shimmer: Option<f64>,
    /// Harmonics-to-noise ratio in dB.
    #[serde(default)]
    pub hnr: Option<f64>,
    #[serde(default)]
    pub pitch_mean: Option<f64>,
}

fn percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

fn finite_opt(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl AnalysisResult {
    /// Apply boundary defaults: empty emotion becomes `"neutral"`, percentages
    /// are clamped to [0, 100], non-finite numbers take their default, and
    /// the heatmap columns are truncated to a common length.
    pub fn sanitized(mut self) -> Self {
        if self.emotion.trim().is_empty() {
            self.emotion = DEFAULT_EMOTION.to_string();
        }
        self.emotion_confidence = percent(self.emotion_confidence);
        self.vocal_health_score = percent(self.vocal_health_score);
        self.stress_level = percent(self.stress_level);

        let c = &mut self.stress_components;
        for v in [
            &mut c.health,
            &mut c.emotion,
            &mut c.instability,
            &mut c.pitch,
            &mut c.tremor,
        ] {
            *v = percent(*v);
        }

        let p = &mut self.personality_analysis;
        for v in [
            &mut p.openness,
            &mut p.conscientiousness,
            &mut p.extraversion,
            &mut p.agreeableness,
            &mut p.emotional_stability,
            &mut p.neuroticism,
        ] {
            *v = if (*v).is_finite() {
                (*v).clamp(0.0, 100.0)
            } else {
                TRAIT_MIDPOINT
            };
        }

        self.emotion_distribution.retain(|_, v| v.is_finite());
        for point in &mut self.emotion_timeline {
            point.confidence = percent(point.confidence);
        }

        let h = &mut self.heatmap;
        let len = h.times.len().min(h.emotions.len());
        h.times.truncate(len);
        h.emotions.truncate(len);
        h.confidences.truncate(len);
        for v in &mut h.confidences {
            *v = finite_or(*v, 0.0);
        }

        self.voice_age = finite_or(self.voice_age, 0.0);
        self.age_confidence = finite_opt(self.age_confidence);
        self.live_analysis.duration = finite_or(self.live_analysis.duration, 0.0).max(0.0);

        if let Some(emotion) = &mut self.raw.emotion {
            emotion.confidence = finite_opt(emotion.confidence);
        }
        if let Some(metrics) = self.raw.health.as_mut().and_then(|h| h.metrics.as_mut()) {
            metrics.jitter = finite_opt(metrics.jitter);
            metrics.shimmer = finite_opt(metrics.shimmer);
            metrics.hnr = finite_opt(metrics.hnr);
            metrics.pitch_mean = finite_opt(metrics.pitch_mean);
        }
        self
    }

    pub fn health_metrics(&self) -> Option<&HealthMetrics> {
        self.raw.health.as_ref()?.metrics.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_takes_documented_defaults() {
        let result: AnalysisResult = serde_json::from_value(json!({})).unwrap();
        let result = result.sanitized();
        assert_eq!(result.emotion, DEFAULT_EMOTION);
        assert_eq!(result.vocal_health_score, 0.0);
        assert_eq!(result.personality_analysis, PersonalityTraits::default());
        assert_eq!(result.personality_analysis.openness, 50.0);
        assert!(result.issues_detected.is_empty());
        assert!(result.heatmap.cells().is_empty());
        assert_eq!(result.live_analysis.duration, 0.0);
        assert_eq!(result.age_confidence, None);
    }

    #[test]
    fn accepts_personality_traits_alias() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "personality_traits": { "openness": 71.5, "neuroticism": 20.0 }
        }))
        .unwrap();
        assert_eq!(result.personality_analysis.openness, 71.5);
        assert_eq!(result.personality_analysis.neuroticism, 20.0);
        assert_eq!(result.personality_analysis.agreeableness, 50.0);
    }

    #[test]
    fn sanitizing_clamps_and_truncates() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "emotion": "happy",
            "stress_level": 140.0,
            "vocal_health_score": -3.0,
            "heatmap": {
                "times": ["0.0s", "1.0s", "2.0s"],
                "emotions": ["happy", "sad"],
                "confidences": [80.0]
            }
        }))
        .unwrap();
        let result = result.sanitized();
        assert_eq!(result.stress_level, 100.0);
        assert_eq!(result.vocal_health_score, 0.0);

        let cells = result.heatmap.cells();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].time, "0.0s");
        assert_eq!(cells[0].confidence, 80.0);
        assert_eq!(cells[1].emotion, "sad");
        assert_eq!(cells[1].confidence, 0.0);
    }

    #[test]
    fn non_finite_values_reset_to_defaults() {
        let mut result = AnalysisResult::default();
        result.personality_analysis.openness = f64::NAN;
        result.voice_age = f64::INFINITY;
        result.age_confidence = Some(f64::NAN);
        let result = result.sanitized();
        assert_eq!(result.personality_analysis.openness, 50.0);
        assert_eq!(result.voice_age, 0.0);
        assert_eq!(result.age_confidence, None);
    }

    #[test]
    fn envelope_parses_error_shape() {
        let resp: AnalyzeResponse =
            serde_json::from_value(json!({"success": false, "error": "bad file"})).unwrap();
        assert!(!resp.success);
        assert!(resp.data.is_none());
        assert_eq!(resp.error.as_deref(), Some("bad file"));
    }

    #[test]
    fn raw_metrics_are_reachable() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "raw": { "health": { "metrics": { "hnr": 8.5, "pitch_mean": 0 } } }
        }))
        .unwrap();
        let metrics = result.health_metrics().unwrap();
        assert_eq!(metrics.hnr, Some(8.5));
        assert_eq!(metrics.pitch_mean, Some(0.0));
        assert_eq!(metrics.jitter, None);
    }
}
