use std::sync::Mutex;

use super::{ClassificationError, OllamaOracle, OpenAiCompatOracle};
use crate::config::{OracleBackend, OracleConfig};

/// Seam to the language model that judges requirements.
///
/// Implementations run with temperature 0 and ask for a JSON object
/// answer. Requests carry no conversation state between calls.
pub trait ClassificationOracle: Send + Sync {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, ClassificationError>;

    /// Model identifier, for logs and dumps.
    fn model(&self) -> &str;
}

/// Shared reqwest error mapping for the HTTP oracle clients.
pub(crate) fn map_transport_error(
    e: reqwest::Error,
    base_url: &str,
    timeout_secs: u64,
) -> ClassificationError {
    if e.is_timeout() {
        ClassificationError::OracleTimeout { secs: timeout_secs }
    } else if e.is_connect() {
        ClassificationError::OracleConnection(base_url.to_string())
    } else {
        ClassificationError::HttpClient(e.to_string())
    }
}

pub(crate) fn build_http_client(
    timeout_secs: u64,
) -> Result<reqwest::blocking::Client, ClassificationError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClassificationError::HttpClient(e.to_string()))
}

/// Build the oracle client selected by configuration.
pub fn build_oracle(
    config: &OracleConfig,
) -> Result<Box<dyn ClassificationOracle>, ClassificationError> {
    tracing::info!(
        backend = %config.backend,
        url = %config.base_url,
        model = %config.model,
        timeout_secs = config.timeout_secs,
        "Classification oracle configured"
    );
    Ok(match config.backend {
        OracleBackend::OpenAiCompat => Box::new(OpenAiCompatOracle::new(
            &config.base_url,
            config.api_key.clone(),
            &config.model,
            config.timeout_secs,
        )?),
        OracleBackend::Ollama => Box::new(OllamaOracle::new(
            &config.base_url,
            &config.model,
            config.timeout_secs,
        )?),
    })
}

/// Mock oracle for testing: returns a fixed answer and records prompts.
pub struct MockOracle {
    response: Result<String, fn() -> ClassificationError>,
    prompts: Mutex<Vec<String>>,
}

impl MockOracle {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Oracle that fails every call with the error built by `make_error`.
    pub fn failing(make_error: fn() -> ClassificationError) -> Self {
        Self {
            response: Err(make_error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl ClassificationOracle for MockOracle {
    fn complete(&self, _system: &str, prompt: &str) -> Result<String, ClassificationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match &self.response {
            Ok(answer) => Ok(answer.clone()),
            Err(make_error) => Err(make_error()),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;

    #[test]
    fn mock_returns_fixed_answer_and_records_prompts() {
        let oracle = MockOracle::new(r#"{"folder_id": "3"}"#);
        assert_eq!(oracle.complete("sys", "first").unwrap(), r#"{"folder_id": "3"}"#);
        oracle.complete("sys", "second").unwrap();
        assert_eq!(oracle.prompts(), vec!["first".to_string(), "second".to_string()]);
        assert_eq!(oracle.call_count(), 2);
    }

    #[test]
    fn failing_mock_still_records_call() {
        let oracle = MockOracle::failing(|| ClassificationError::OracleTimeout { secs: 1 });
        let err = oracle.complete("sys", "p").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OracleTimeout);
        assert_eq!(oracle.call_count(), 1);
    }

    #[test]
    fn factory_selects_backend() {
        let mut config = OracleConfig {
            backend: OracleBackend::Ollama,
            base_url: "http://127.0.0.1:1".into(),
            api_key: None,
            model: "tiny".into(),
            timeout_secs: 5,
        };
        assert_eq!(build_oracle(&config).unwrap().model(), "tiny");

        config.backend = OracleBackend::OpenAiCompat;
        config.model = "gpt-local".into();
        assert_eq!(build_oracle(&config).unwrap().model(), "gpt-local");
    }
}
