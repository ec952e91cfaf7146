use std::time::Duration;

use crate::config::ChatConfig;
use crate::error::chat::ChatError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, trimmed.
    pub(crate) fn first_text(&self) -> Option<String> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Text-generation client for a Gemini-style `generateContent` endpoint.
#[derive(Clone)]
pub struct LlmClient {
    base: Url,
    model: String,
    api_key: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        if api_key.trim().is_empty() {
            return Err(ChatError::MissingApiKey);
        }
        let base = Url::parse(endpoint).map_err(|e| ChatError::Url(e.to_string()))?;
        Ok(Self {
            base,
            model: model.to_string(),
            api_key,
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| ChatError::Http(e.to_string()))?,
        })
    }

    /// Build from config, reading the key from the configured env var.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let key = config.api_key().ok_or(ChatError::MissingApiKey)?;
        Self::new(
            &config.endpoint,
            &config.model,
            key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn generate_url(&self) -> Result<Url, ChatError> {
        let mut url = self
            .base
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| ChatError::Url(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };
        let resp = self
            .http
            .post(self.generate_url()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ChatError::Status(resp.status().as_u16()));
        }
        let data = resp
            .json::<GenerateResponse>()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        data.first_text().ok_or(ChatError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_model_and_key() {
        let client = LlmClient::new(
            "https://generativelanguage.googleapis.com",
            "gemini-pro",
            "k3y".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.generate_url().unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent?key=k3y"
        );
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(
            LlmClient::new("https://x.test", "m", "  ".into(), Duration::from_secs(1)),
            Err(ChatError::MissingApiKey)
        ));
    }

    #[test]
    fn first_text_walks_candidates() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  Hello there.  "}]}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("Hello there."));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.first_text(), None);

        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":" "}]}}]}"#)
                .unwrap();
        assert_eq!(blank.first_text(), None);
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }
}
