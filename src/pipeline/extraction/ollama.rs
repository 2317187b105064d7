use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::error::InferenceError;
use super::traits::InferenceClient;
use super::types::InferenceRequest;

/// Ollama HTTP client using structured outputs (`format` = JSON schema).
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InferenceError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    /// Local instance at localhost:11434 with a 5-minute timeout.
    pub fn default_local() -> Result<Self, InferenceError> {
        Self::new("http://localhost:11434", 300)
    }

    pub fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| InferenceError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    fn transport_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_connect() {
            InferenceError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            InferenceError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            InferenceError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    format: &'a serde_json::Value,
    stream: bool,
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

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl InferenceClient for OllamaClient {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<String, InferenceError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: request.model,
            prompt: request.prompt,
            system: request.system,
            format: request.schema,
            stream: false,
            options: OllamaOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| InferenceError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn is_model_available(&self, model: &str) -> Result<bool, InferenceError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|m| m.starts_with(model)))
    }
}

/// Mock inference client for testing: replays canned completions in order,
/// repeating the last one once exhausted, and records every prompt.
pub struct MockInferenceClient {
    responses: Vec<Result<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl MockInferenceClient {
    pub fn new(response: &str) -> Self {
        Self::sequence(vec![Ok(response.to_string())])
    }

    /// `Err` entries are returned as transport failures.
    pub fn sequence(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl InferenceClient for MockInferenceClient {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<String, InferenceError> {
        let index = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|e| InferenceError::HttpClient(e.to_string()))?;
            calls.push(request.prompt.to_string());
            calls.len() - 1
        };

        let response = self
            .responses
            .get(index)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_else(|| Ok("{}".to_string()));
        response.map_err(InferenceError::HttpClient)
    }

    fn is_model_available(&self, _model: &str) -> Result<bool, InferenceError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(schema: &'a serde_json::Value) -> InferenceRequest<'a> {
        InferenceRequest {
            model: "gemma3:27b",
            system: "sys",
            prompt: "prompt",
            schema,
        }
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", 30).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn generate_request_carries_schema_as_format() {
        let schema = serde_json::json!({"type": "object"});
        let body = OllamaGenerateRequest {
            model: "m",
            prompt: "p",
            system: "s",
            format: &schema,
            stream: false,
            options: OllamaOptions { temperature: 0.0 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["format"]["type"], "object");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn unreachable_server_is_connection_error() {
        let client = OllamaClient::new("http://127.0.0.1:1", 2).unwrap();
        let schema = serde_json::json!({});
        match client.infer(&request(&schema)) {
            Err(InferenceError::Connection(url)) => assert_eq!(url, "http://127.0.0.1:1"),
            Err(InferenceError::HttpClient(_)) => {}
            other => panic!("expected connection failure, got {other:?}"),
        }
    }

    #[test]
    fn mock_replays_sequence_then_repeats_last() {
        let mock = MockInferenceClient::sequence(vec![
            Ok("first".into()),
            Err("boom".into()),
            Ok("last".into()),
        ]);
        let schema = serde_json::json!({});
        assert_eq!(mock.infer(&request(&schema)).unwrap(), "first");
        assert!(mock.infer(&request(&schema)).is_err());
        assert_eq!(mock.infer(&request(&schema)).unwrap(), "last");
        assert_eq!(mock.infer(&request(&schema)).unwrap(), "last");
        assert_eq!(mock.call_count(), 4);
    }

    #[test]
    fn trait_is_object_safe() {
        let mock = MockInferenceClient::new("{}");
        let client: &dyn InferenceClient = &mock;
        assert!(client.is_model_available("anything").unwrap());
    }
}
