//! Wire client for the remote text-generation service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use thiserror::Error;
use url::Url;

use crate::config::Settings;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Prompt text plus an optional response schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrompt {
    pub text: String,
    pub response_schema: Option<serde_json::Value>,
}

impl ModelPrompt {
    pub fn freeform(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response_schema: None,
        }
    }

    pub fn constrained(text: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            response_schema: Some(schema),
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteModelError {
    #[error("generation request failed: {0:#}")]
    Transport(#[source] anyhow::Error),
    #[error("unexpected response envelope: {0}")]
    Envelope(String),
}

#[async_trait]
pub trait RemoteModel: Send + Sync {
    /// Returns the candidate text, or `None` when the service answered
    /// without any.
    async fn complete(
        &self,
        credential: &str,
        prompt: &ModelPrompt,
    ) -> std::result::Result<Option<String>, RemoteModelError>;
}

/// `generateContent` client.
pub struct GeminiModel {
    http: Client,
    endpoint: Url,
}

impl GeminiModel {
    pub fn new(base_url: &str, model: &str, http: Client) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .with_context(|| format!("invalid generation base url '{base_url}'"))?;
        // `join` replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(&format!("v1beta/models/{model}:generateContent"))
            .with_context(|| format!("invalid model name '{model}'"))?;
        Ok(Self { http, endpoint })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build generation http client")?;
        Self::new(&settings.api_base_url, &settings.model, http)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, credential: &str, body: &GenerateContentRequest) -> Result<String> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, credential)
            .json(body)
            .send()
            .await
            .context("failed to reach generation service")?
            .error_for_status()
            .context("generation service returned an error status")?;
        res.text()
            .await
            .context("failed to read generation response body")
    }
}

#[async_trait]
impl RemoteModel for GeminiModel {
    async fn complete(
        &self,
        credential: &str,
        prompt: &ModelPrompt,
    ) -> std::result::Result<Option<String>, RemoteModelError> {
        let mut body = GenerateContentRequest::from_prompt(prompt.text.clone());
        if let Some(schema) = &prompt.response_schema {
            body.generation_config = Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema.clone(),
            });
        }

        let raw = self
            .send(credential, &body)
            .await
            .map_err(RemoteModelError::Transport)?;
        let envelope: GenerateContentResponse = serde_json::from_str(&raw)
            .map_err(|err| RemoteModelError::Envelope(err.to_string()))?;
        Ok(envelope.first_text())
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
