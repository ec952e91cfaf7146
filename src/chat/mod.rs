//! Question answering over a finished analysis.

pub mod prompt;
pub mod rules;

use crate::client::chat::LlmClient;
use crate::config::ChatConfig;
use crate::types::analysis::AnalysisResult;

pub const EMPTY_QUESTION_HINT: &str =
    "Ask a question about your results, for example \"How stressed do I sound?\"";

/// Answers with the language model when one is configured, and with the
/// keyword rules otherwise or when the model call fails.
#[derive(Clone, Default)]
pub struct ChatAssistant {
    llm: Option<LlmClient>,
}

impl ChatAssistant {
    pub fn new(llm: Option<LlmClient>) -> Self {
        Self { llm }
    }

    pub fn rules_only() -> Self {
        Self { llm: None }
    }

    /// A missing API key is not an error; the assistant just stays rule-based.
    pub fn from_config(config: &ChatConfig) -> Self {
        match LlmClient::from_config(config) {
            Ok(client) => Self::new(Some(client)),
            Err(e) => {
                tracing::debug!(error = %e, "language model unavailable, using rule-based answers");
                Self::rules_only()
            }
        }
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn answer(&self, question: &str, result: &AnalysisResult) -> String {
        let question = question.trim();
        if question.is_empty() {
            return EMPTY_QUESTION_HINT.to_string();
        }
        if let Some(llm) = &self.llm {
            match llm.generate(&prompt::build_prompt(question, result)).await {
                Ok(text) => return text,
                Err(e) => {
                    tracing::debug!(error = %e, "language model call failed, falling back to rules");
                }
            }
        }
        rules::answer(question, result)
    }
}
