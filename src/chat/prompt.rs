use crate::types::analysis::AnalysisResult;
use std::fmt::Write;

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

/// Prompt for the language model: the analysis summary followed by the question.
pub fn build_prompt(question: &str, result: &AnalysisResult) -> String {
    let p = &result.personality_analysis;
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are an AI assistant for a voice analysis system. The user analyzed their voice and got these results:"
    );
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Emotion: {} ({:.1}% confidence)",
        result.emotion, result.emotion_confidence
    );
    let _ = writeln!(prompt, "Vocal Health: {:.1}%", result.vocal_health_score);
    let _ = writeln!(prompt, "Stress Level: {:.1}%", result.stress_level);
    let _ = writeln!(
        prompt,
        "Recording Duration: {:.2} seconds",
        result.live_analysis.duration
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Personality Traits:");
    let _ = writeln!(prompt, "- Openness: {:.1}%", p.openness);
    let _ = writeln!(prompt, "- Conscientiousness: {:.1}%", p.conscientiousness);
    let _ = writeln!(prompt, "- Extraversion: {:.1}%", p.extraversion);
    let _ = writeln!(prompt, "- Agreeableness: {:.1}%", p.agreeableness);
    let _ = writeln!(prompt, "- Neuroticism: {:.1}%", p.neuroticism);
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Issues: {}", join_or(&result.issues_detected, "None"));
    let _ = writeln!(prompt, "Suggestions: {}", join_or(&result.suggestions, "None"));
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "User Question: {}", question.trim());
    let _ = writeln!(prompt);
    let _ = write!(
        prompt,
        "Provide a helpful, friendly response in 2-3 sentences. Be supportive and informative."
    );
    prompt
}
