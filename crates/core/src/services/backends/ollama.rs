use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisSettings;
use crate::services::insight::{InsightCapability, InsightError};

/// How a prompt is framed before it is sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    Plain,
    /// Gemma chat turn markers around the user prompt.
    GemmaTurns,
}

impl PromptStyle {
    pub fn frame(&self, prompt: &str) -> String {
        match self {
            PromptStyle::Plain => prompt.to_string(),
            PromptStyle::GemmaTurns => {
                format!("<start_of_turn>user\n{prompt}\n<end_of_turn>\n<start_of_turn>model\n")
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// Capability backed by an Ollama `/generate` endpoint.
///
/// A shared `reqwest::Client` serves concurrent requests, so this capability is reentrant.
#[derive(Debug, Clone)]
pub struct OllamaCapability {
    client: Client,
    endpoint: String,
    model: String,
    style: PromptStyle,
    max_tokens: u32,
    temperature: f64,
}

impl OllamaCapability {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        style: PromptStyle,
        max_tokens: u32,
        temperature: f64,
        request_timeout: Option<Duration>,
    ) -> Result<Self, InsightError> {
        let mut builder =
            Client::builder().user_agent(concat!("binsight/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(InsightError::Config("endpoint must not be empty".into()));
        }
        Ok(Self { client, endpoint, model: model.into(), style, max_tokens, temperature })
    }

    pub fn from_settings(
        model: &str,
        style: PromptStyle,
        settings: &AnalysisSettings,
    ) -> Result<Self, InsightError> {
        Self::new(
            settings.endpoint.clone(),
            model,
            style,
            settings.max_tokens,
            settings.temperature,
            settings.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn generate_url(&self) -> String {
        format!("{}/generate", self.endpoint)
    }
}

#[async_trait]
impl InsightCapability for OllamaCapability {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
        let framed = self.style.frame(prompt);
        let request = GenerateRequest {
            model: &self.model,
            prompt: &framed,
            stream: false,
            options: GenerateOptions { num_predict: self.max_tokens, temperature: self.temperature },
        };
        debug!(model = %self.model, prompt_len = framed.len(), "sending generate request");

        let response = self.client.post(self.generate_url()).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                InsightError::Service(format!("invalid response body: {e}"))
            } else {
                InsightError::Service(format!("HTTP {status}"))
            }
        })?;
        if let Some(err) = parsed.error {
            return Err(InsightError::Service(err));
        }
        if !status.is_success() {
            return Err(InsightError::Service(format!("HTTP {status}")));
        }
        Ok(parsed.response)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
