use serde::{Deserialize, Serialize};

use super::oracle::{build_http_client, map_transport_error, ClassificationOracle};
use super::ClassificationError;

/// Ollama HTTP client using the native `/api/generate` endpoint.
pub struct OllamaOracle {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaOracle {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, ClassificationError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: build_http_client(timeout_secs)?,
            timeout_secs,
        })
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl ClassificationOracle for OllamaOracle {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, ClassificationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            format: "json",
            options: OllamaOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassificationError::OracleStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;
        let parsed: OllamaGenerateResponse = serde_json::from_str(&text)
            .map_err(|e| ClassificationError::ResponseEnvelope(e.to_string()))?;

        Ok(parsed.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
