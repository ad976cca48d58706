use async_trait::async_trait;
use serde_json::json;

use crate::{format_request, CodeOracle, GenRequest, OPENSCAD_SYSTEM_PROMPT};
use scadforge_types::{Result, ScadForgeError};

// ---------------------------------------------------------------------------
// OllamaOracle
// ---------------------------------------------------------------------------

/// Local Ollama backend using the non-streaming `/api/generate` endpoint.
#[derive(Debug)]
pub struct OllamaOracle {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaOracle {
    pub fn new(model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "http://localhost:11434".to_string(),
            model,
        }
    }

    /// Build from `OLLAMA_HOST` and `OLLAMA_MODEL`. Only the model has a
    /// default: a missing host keeps the standard localhost port.
    pub fn from_env() -> Self {
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "mistral".to_string());
        let mut oracle = Self::new(model);
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            oracle.base_url = host;
        }
        oracle
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Probe the server's tag list to see whether Ollama is reachable.
    pub async fn check_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn build_request_body(&self, request: &GenRequest) -> serde_json::Value {
        json!({
            "model": self.model,
            "prompt": format_request(request),
            "system": OPENSCAD_SYSTEM_PROMPT,
            "stream": false,
            "options": { "temperature": request.temperature },
        })
    }
}

// ---------------------------------------------------------------------------
// CodeOracle implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl CodeOracle for OllamaOracle {
    async fn generate(&self, request: &GenRequest) -> Result<String> {
        let body = self.build_request_body(request);

        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ScadForgeError::OracleUnavailable {
                provider: "ollama".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let response_body =
            resp.text()
                .await
                .map_err(|e| ScadForgeError::OracleUnavailable {
                    provider: "ollama".into(),
                    message: e.to_string(),
                })?;

        if !status.is_success() {
            return Err(ScadForgeError::OracleUnavailable {
                provider: "ollama".into(),
                message: format!("{} returned {}", self.model, status.as_u16()),
            });
        }

        let parsed: serde_json::Value = serde_json::from_str(&response_body).map_err(|e| {
            ScadForgeError::OracleUnavailable {
                provider: "ollama".into(),
                message: format!("failed to parse response JSON: {e}"),
            }
        })?;

        let code = parsed["response"].as_str().unwrap_or("").trim();
        if code.is_empty() {
            return Err(ScadForgeError::OracleUnavailable {
                provider: "ollama".into(),
                message: "response contained no text".into(),
            });
        }
        Ok(code.to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
