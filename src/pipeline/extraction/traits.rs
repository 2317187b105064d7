//! Inference service boundary.

use super::error::InferenceError;
use super::types::InferenceRequest;

/// Synchronous request/response access to a structured-output model.
///
/// Implementations return the raw completion text; sanitising, refusal
/// detection and validation happen in the extractor.
pub trait InferenceClient: Send + Sync {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<String, InferenceError>;

    /// Check if a specific model is available.
    fn is_model_available(&self, model: &str) -> Result<bool, InferenceError>;
}
