//! Canned answers keyed on keywords in the question.

use crate::types::analysis::AnalysisResult;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Stress,
    Health,
    Emotion,
    Personality,
    Suggestions,
    Issues,
    Duration,
    Overview,
}

/// Checked in order; the first match wins.
const TOPIC_PATTERNS: &[(Topic, &str)] = &[
    (Topic::Stress, r"(?i)\b(stress\w*|anxi\w*|tense|tension|nervous|calm)\b"),
    (Topic::Health, r"(?i)\b(health\w*|vocal|hoarse\w*|throat|sick|ill|illness|jitter|shimmer)\b"),
    (Topic::Emotion, r"(?i)\b(emotion\w*|feel\w*|mood|happy|sad|angry|fear\w*)\b"),
    (Topic::Personality, r"(?i)\b(personality|traits?|introvert\w*|extrovert\w*|extravert\w*|openness)\b"),
    (Topic::Suggestions, r"(?i)\b(improve\w*|suggest\w*|tips?|advice|recommend\w*|better)\b"),
    (Topic::Issues, r"(?i)\b(issues?|problems?|wrong|concerns?)\b"),
    (Topic::Duration, r"(?i)\b(duration|long|length|seconds?)\b"),
];

fn compiled() -> &'static [(Topic, Regex)] {
    static PATTERNS: OnceLock<Vec<(Topic, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        TOPIC_PATTERNS
            .iter()
            .filter_map(|(topic, pattern)| Regex::new(pattern).ok().map(|re| (*topic, re)))
            .collect()
    })
}

pub fn classify(question: &str) -> Topic {
    compiled()
        .iter()
        .find(|(_, re)| re.is_match(question))
        .map(|(topic, _)| *topic)
        .unwrap_or(Topic::Overview)
}

fn stress_band(level: f64) -> &'static str {
    if level > 70.0 {
        "high"
    } else if level > 40.0 {
        "moderate"
    } else {
        "low"
    }
}

fn health_band(score: f64) -> &'static str {
    if score >= 70.0 {
        "good"
    } else if score >= 50.0 {
        "fair"
    } else {
        "below average"
    }
}

pub fn answer(question: &str, result: &AnalysisResult) -> String {
    match classify(question) {
        Topic::Stress => {
            let mut text = format!(
                "Your stress level is {:.1}%, which is {}.",
                result.stress_level,
                stress_band(result.stress_level)
            );
            if result.stress_level > 70.0 {
                text.push_str(" Try slow breathing or a short break before recording again.");
            } else {
                text.push_str(" Your voice does not show strong signs of tension.");
            }
            text
        }
        Topic::Health => {
            let mut text = format!(
                "Your vocal health score is {:.1}%, which is {}.",
                result.vocal_health_score,
                health_band(result.vocal_health_score)
            );
            if let Some(signal) = result.early_illness_signals.first() {
                text.push_str(&format!(" One thing to watch: {signal}."));
            } else if result.vocal_health_score < 50.0 {
                text.push_str(" Consider vocal rest and staying hydrated.");
            }
            text
        }
        Topic::Emotion => format!(
            "The dominant emotion detected was {} with {:.1}% confidence.",
            result.emotion, result.emotion_confidence
        ),
        Topic::Personality => {
            let (name, value) = result
                .personality_analysis
                .entries()
                .into_iter()
                .fold(("", f64::MIN), |best, (name, value)| {
                    if value > best.1 { (name, value) } else { best }
                });
            format!(
                "Your strongest voice-inferred trait is {} at {:.1}%. These estimates come from vocal patterns and are only a rough indication.",
                name.to_lowercase(),
                value
            )
        }
        Topic::Suggestions => {
            if result.suggestions.is_empty() {
                "No specific suggestions came back. Keep recording in a quiet room and speaking naturally.".to_string()
            } else {
                format!("Here is what I suggest: {}.", result.suggestions.join("; "))
            }
        }
        Topic::Issues => {
            if result.issues_detected.is_empty() {
                "No issues were detected in your recording.".to_string()
            } else {
                format!("Detected issues: {}.", result.issues_detected.join("; "))
            }
        }
        Topic::Duration => format!(
            "The analyzed recording was {:.1} seconds long. At least 5 seconds gives more reliable results.",
            result.live_analysis.duration
        ),
        Topic::Overview => format!(
            "Your voice shows {} emotion, a vocal health score of {:.1}% and a stress level of {:.1}%. Ask me about stress, health, emotion, personality or suggestions for more detail.",
            result.emotion, result.vocal_health_score, result.stress_level
        ),
    }
}
