//! Error types for per-chunk extraction and inference calls.

use thiserror::Error;

/// Failures of the inference service call itself.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference service is not reachable at {0}")]
    Connection(String),

    #[error("Inference service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Validation failed for '{variable}': {reason}")]
    Validation { variable: String, reason: String },

    #[error("Model refused to answer: {0}")]
    Refusal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shard {shard_id} of {total_shards} has no patients to process")]
    EmptyPartition { shard_id: usize, total_shards: usize },
}

impl From<serde_json::Error> for ExtractionError {
    fn from(e: serde_json::Error) -> Self {
        Self::JsonParsing(e.to_string())
    }
}
