use std::time::Duration;

use crate::client::upload::UploadPolicy;
use crate::error::api::ApiError;
use crate::types::analysis::{AnalysisResult, AnalyzeResponse, HealthStatus};
use crate::types::asset::AudioAsset;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

const GENERIC_FAILURE: &str = "Analysis failed";

#[derive(Clone)]
pub struct AnalysisClient {
    base: Url,
    http: reqwest::Client,
    policy: UploadPolicy,
}

impl AnalysisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        // Url::join drops the last path segment unless it ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).map_err(|e| ApiError::Url(e.to_string()))?;
        Ok(Self {
            base,
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| ApiError::Http(e.to_string()))?,
            policy: UploadPolicy::default(),
        })
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::Url(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_connect() || e.is_timeout() {
            ApiError::Connection {
                url: self.base_url().to_string(),
                reason: e.to_string(),
            }
        } else {
            ApiError::Http(e.to_string())
        }
    }

    /// Liveness probe: `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint("health")?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !resp.status().is_success() {
            return Err(ApiError::Server {
                status: Some(resp.status().as_u16()),
                message: format!("health check failed with status {}", resp.status()),
            });
        }
        resp.json::<HealthStatus>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Upload `asset` as the multipart field `audio` to `POST /analyze`.
    pub async fn analyze(
        &self,
        asset: &AudioAsset,
        file_name: &str,
    ) -> Result<AnalysisResult, ApiError> {
        self.policy.check(asset, file_name)?;
        let url = self.endpoint("analyze")?;

        let part = match Part::bytes(asset.bytes.clone())
            .file_name(file_name.to_string())
            .mime_str(&asset.mime_type)
        {
            Ok(part) => part,
            Err(_) => Part::bytes(asset.bytes.clone()).file_name(file_name.to_string()),
        };
        let form = Form::new().part("audio", part);

        tracing::info!(%url, file_name, bytes = asset.len(), "uploading audio for analysis");
        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        tracing::debug!(status = status.as_u16(), "analysis response received");
        if !status.is_success() {
            let is_json = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.contains("application/json"));
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: Some(status.as_u16()),
                message: server_error_message(is_json, &body),
            });
        }

        let envelope = resp
            .json::<AnalyzeResponse>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        unwrap_envelope(envelope)
    }
}

/// Message for a non-2xx response: the JSON `error` field, else the body
/// text, else a generic message.
pub(crate) fn server_error_message(is_json: bool, body: &str) -> String {
    if is_json {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    } else {
        let text = body.trim();
        if text.is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            text.to_string()
        }
    }
}

pub(crate) fn unwrap_envelope(envelope: AnalyzeResponse) -> Result<AnalysisResult, ApiError> {
    match envelope {
        AnalyzeResponse {
            success: true,
            data: Some(data),
            ..
        } => Ok(data.sanitized()),
        AnalyzeResponse { success: true, .. } => {
            Err(ApiError::Decode("response has no analysis data".into()))
        }
        AnalyzeResponse { error, .. } => Err(ApiError::Server {
            status: None,
            message: error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Unknown error".to_string()),
        }),
    }
}
