//! Plain-text rendering of an analysis and the recording-quality checks.

use crate::types::analysis::AnalysisResult;
use std::fmt::Write;

/// Shorter recordings give unreliable results.
pub const MIN_RELIABLE_SECS: f64 = 5.0;
const LOW_HEALTH_SCORE: f64 = 30.0;
const LOW_AGE_CONFIDENCE: f64 = 0.5;
const LOW_EMOTION_CONFIDENCE: f64 = 50.0;
const POOR_HNR_DB: f64 = 10.0;

/// Hints that the recording itself was poor, derived from the result.
pub fn quality_warnings(result: &AnalysisResult) -> Vec<String> {
    let mut warnings = Vec::new();

    let duration = result.live_analysis.duration;
    if duration < MIN_RELIABLE_SECS {
        warnings.push(format!(
            "Recording too short ({duration}s) - at least 5 seconds recommended for accurate results"
        ));
    }
    if result.vocal_health_score < LOW_HEALTH_SCORE {
        warnings.push("Very low audio quality detected - results may be inaccurate".to_string());
    }
    if result.age_features.as_ref().is_some_and(|f| f.is_empty()) {
        warnings.push(
            "Insufficient audio data for age estimation - recording may be too short or too quiet"
                .to_string(),
        );
    }
    if let Some(confidence) = result.age_confidence.filter(|c| *c < LOW_AGE_CONFIDENCE) {
        warnings.push(format!(
            "Low confidence in age estimation ({}%) - audio quality may be poor",
            (confidence * 100.0).round()
        ));
    }
    if let Some(confidence) = result
        .raw
        .emotion
        .as_ref()
        .and_then(|e| e.confidence)
        .filter(|c| *c < LOW_EMOTION_CONFIDENCE)
    {
        warnings.push(format!(
            "Low confidence in emotion detection ({confidence}%) - try speaking more expressively"
        ));
    }
    if let Some(metrics) = result.health_metrics() {
        match metrics.hnr {
            Some(hnr) if hnr > 0.0 && hnr < POOR_HNR_DB => warnings.push(format!(
                "Poor audio signal quality (HNR: {hnr:.1} dB) - background noise or microphone issues detected"
            )),
            Some(hnr) if hnr <= 0.0 => warnings.push(
                "Very poor audio quality - check microphone and reduce background noise"
                    .to_string(),
            ),
            _ => {}
        }
        if metrics.pitch_mean == Some(0.0) {
            warnings.push(
                "No voice pitch detected - microphone may not be capturing audio properly"
                    .to_string(),
            );
        }
    }
    warnings
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn bullet_list(out: &mut String, title: &str, items: &[String], empty: &str) {
    let _ = writeln!(out, "{title}:");
    if items.is_empty() {
        let _ = writeln!(out, "  - {empty}");
    }
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

fn bar(percent: f64) -> String {
    let filled = (percent.clamp(0.0, 100.0) / 5.0).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(20 - filled))
}

/// Full text report, in the order the results are usually read.
pub fn render(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let warnings = quality_warnings(result);
    if !warnings.is_empty() {
        let _ = writeln!(out, "Quality warnings:");
        for w in &warnings {
            let _ = writeln!(out, "  ! {w}");
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Emotion:       {} ({:.1}% confidence)",
        capitalize(&result.emotion),
        result.emotion_confidence
    );
    let _ = writeln!(out, "Vocal health:  {:.1}%", result.vocal_health_score);
    let _ = writeln!(out, "Stress level:  {:.1}%", result.stress_level);
    let _ = writeln!(out, "Duration:      {:.1}s", result.live_analysis.duration);
    if result.voice_age > 0.0 {
        let _ = writeln!(out, "Voice age:     ~{:.0}", result.voice_age);
    }
    let _ = writeln!(out);

    if !result.emotion_distribution.is_empty() {
        let _ = writeln!(out, "Emotion distribution:");
        let mut entries: Vec<_> = result.emotion_distribution.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(a.1));
        for (label, percent) in entries {
            let _ = writeln!(out, "  {:<12} {} {:5.1}%", label, bar(*percent), percent);
        }
        let _ = writeln!(out);
    }

    let s = &result.stress_components;
    let _ = writeln!(out, "Stress components:");
    for (name, value) in [
        ("Health", s.health),
        ("Emotion", s.emotion),
        ("Instability", s.instability),
        ("Pitch", s.pitch),
        ("Tremor", s.tremor),
    ] {
        let _ = writeln!(out, "  {:<20} {} {:5.1}", name, bar(value), value);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Personality:");
    for (name, value) in result.personality_analysis.entries() {
        let _ = writeln!(out, "  {:<20} {} {:5.1}%", name, bar(value), value);
    }
    let _ = writeln!(out);

    if !result.emotion_timeline.is_empty() {
        let _ = writeln!(out, "Emotion timeline:");
        for point in &result.emotion_timeline {
            let _ = writeln!(
                out,
                "  {:>8}  {} ({:.1}%)",
                point.time, point.emotion, point.confidence
            );
        }
        let _ = writeln!(out);
    }

    if !result.heatmap.is_empty() {
        let _ = writeln!(out, "Heatmap:");
        for cell in result.heatmap.cells() {
            let _ = writeln!(
                out,
                "  {:>8}  {:<12} {:.1}%",
                cell.time, cell.emotion, cell.confidence
            );
        }
        let _ = writeln!(out);
    }

    bullet_list(&mut out, "Issues detected", &result.issues_detected, "No issues detected");
    let _ = writeln!(
        out,
        "Trigger words: {}",
        if result.trigger_word_alert.is_empty() {
            "No trigger words detected".to_string()
        } else {
            result.trigger_word_alert.join(", ")
        }
    );
    bullet_list(&mut out, "Suggestions", &result.suggestions, "None");
    bullet_list(
        &mut out,
        "Early illness signals",
        &result.early_illness_signals,
        "No health concerns detected",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::analysis::{HealthMetrics, RawEmotion, RawHealth};

    fn healthy() -> AnalysisResult {
        let mut result = AnalysisResult::default().sanitized();
        result.live_analysis.duration = 12.0;
        result.vocal_health_score = 80.0;
        result
    }

    fn with_metrics(hnr: Option<f64>, pitch_mean: Option<f64>) -> AnalysisResult {
        let mut result = healthy();
        result.raw.health = Some(RawHealth {
            metrics: Some(HealthMetrics {
                hnr,
                pitch_mean,
                ..HealthMetrics::default()
            }),
        });
        result
    }

    #[test]
    fn clean_result_has_no_warnings() {
        assert!(quality_warnings(&healthy()).is_empty());
    }

    #[test]
    fn short_quiet_recording_is_flagged() {
        let mut result = healthy();
        result.live_analysis.duration = 2.5;
        result.vocal_health_score = 12.0;
        result.age_confidence = Some(0.25);
        result.age_features = Some(serde_json::Map::new());
        let warnings = quality_warnings(&result);
        assert_eq!(warnings.len(), 4);
        assert!(warnings[0].contains("(2.5s)"));
        assert!(warnings[3].contains("(25%)"));
    }

    #[test]
    fn low_raw_emotion_confidence_is_flagged() {
        let mut result = healthy();
        result.raw.emotion = Some(RawEmotion {
            confidence: Some(31.0),
        });
        let warnings = quality_warnings(&result);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("(31%)"));
    }

    #[test]
    fn hnr_bands() {
        let poor = quality_warnings(&with_metrics(Some(6.4), Some(120.0)));
        assert_eq!(poor.len(), 1);
        assert!(poor[0].contains("HNR: 6.4 dB"));

        let very_poor = quality_warnings(&with_metrics(Some(0.0), Some(120.0)));
        assert!(very_poor[0].starts_with("Very poor audio quality"));

        assert!(quality_warnings(&with_metrics(Some(18.0), Some(120.0))).is_empty());
        assert!(quality_warnings(&with_metrics(None, None)).is_empty());
    }

    #[test]
    fn zero_pitch_is_flagged() {
        let warnings = quality_warnings(&with_metrics(Some(15.0), Some(0.0)));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("No voice pitch detected"));
    }

    #[test]
    fn render_lists_sections_and_placeholders() {
        let mut result = healthy();
        result.emotion = "happy".into();
        result.emotion_confidence = 91.3;
        result.emotion_distribution.insert("happy".into(), 70.0);
        result.emotion_distribution.insert("sad".into(), 30.0);
        result.suggestions = vec!["Keep it up".into()];

        let text = render(&result);
        assert!(text.starts_with("Emotion:       Happy (91.3% confidence)"));
        assert!(text.contains("Issues detected:\n  - No issues detected"));
        assert!(text.contains("Trigger words: No trigger words detected"));
        assert!(text.contains("  - Keep it up"));
        assert!(text.contains("No health concerns detected"));
        let happy = text.find("  happy").unwrap();
        let sad = text.find("  sad").unwrap();
        assert!(happy < sad);
        assert!(!text.contains("Quality warnings"));
    }

    #[test]
    fn bar_is_twenty_wide() {
        assert_eq!(bar(0.0), ".".repeat(20));
        assert_eq!(bar(100.0), "#".repeat(20));
        assert_eq!(bar(250.0).len(), 20);
        assert_eq!(&bar(50.0)[..10], "##########");
    }
}
