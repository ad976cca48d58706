use async_trait::async_trait;
use serde_json::json;

use crate::{format_request, CodeOracle, GenRequest, OPENSCAD_SYSTEM_PROMPT};
use scadforge_types::{Result, ScadForgeError};

// ---------------------------------------------------------------------------
// OpenAiOracle
// ---------------------------------------------------------------------------

/// Chat-completions backend. Tries the primary model first and retries once
/// with the cheaper fallback model when the primary call fails, since model
/// access varies by account.
#[derive(Debug)]
pub struct OpenAiOracle {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
    fallback_model: String,
}

impl OpenAiOracle {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4-turbo".to_string(),
            fallback_model: "gpt-3.5-turbo".to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ScadForgeError::Config("OPENAI_API_KEY is not set".to_string())
        })?;
        Ok(Self::new(key))
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    fn build_request_body(&self, model: &str, request: &GenRequest) -> serde_json::Value {
        let mut body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": OPENSCAD_SYSTEM_PROMPT },
                { "role": "user", "content": format_request(request) },
            ],
            "temperature": request.temperature,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    async fn complete(&self, model: &str, request: &GenRequest) -> Result<String> {
        let body = self.build_request_body(model, request);

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ScadForgeError::OracleUnavailable {
                provider: "openai".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let response_body =
            resp.text()
                .await
                .map_err(|e| ScadForgeError::OracleUnavailable {
                    provider: "openai".into(),
                    message: e.to_string(),
                })?;

        if !status.is_success() {
            return Err(ScadForgeError::OracleUnavailable {
                provider: "openai".into(),
                message: format!(
                    "{} returned {}: {}",
                    model,
                    status.as_u16(),
                    extract_error_message(&response_body)
                ),
            });
        }

        let parsed: serde_json::Value = serde_json::from_str(&response_body).map_err(|e| {
            ScadForgeError::OracleUnavailable {
                provider: "openai".into(),
                message: format!("failed to parse response JSON: {e}"),
            }
        })?;

        parse_completion(&parsed).ok_or_else(|| ScadForgeError::OracleUnavailable {
            provider: "openai".into(),
            message: "response contained no message content".into(),
        })
    }
}

fn parse_completion(body: &serde_json::Value) -> Option<String> {
    let text = body["choices"][0]["message"]["content"].as_str()?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// CodeOracle implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl CodeOracle for OpenAiOracle {
    async fn generate(&self, request: &GenRequest) -> Result<String> {
        match self.complete(&self.model, request).await {
            Ok(code) => Ok(code),
            Err(err) => {
                tracing::warn!(
                    model = %self.model,
                    fallback = %self.fallback_model,
                    error = %err,
                    "primary model failed, retrying with fallback model"
                );
                self.complete(&self.fallback_model, request).await
            }
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
