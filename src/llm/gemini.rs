use crate::config::LlmConfig;
use crate::llm::{resolve_api_key, CompletionClient, LlmError};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Completion client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, endpoint: String) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Builds a client from config, resolving the key from `explicit_key`,
    /// the config file, or the environment
    pub fn from_config(config: &LlmConfig, explicit_key: Option<&str>) -> Result<Self, ConfigError> {
        let key = resolve_api_key(explicit_key.or(config.api_key.as_deref()))?;
        Self::new(key, config.model.clone(), config.endpoint.clone())
            .map_err(|e| ConfigError::Validation(format!("cannot build LLM client: {}", e)))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        tracing::debug!("Sending {} byte prompt to {}", prompt.len(), self.model);

        let response = self
            .http
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        extract_text(&payload).ok_or(LlmError::EmptyResponse)
    }
}

/// Concatenates the text parts of the first candidate
fn extract_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
