//! Per-chunk extraction against an inference service.
//!
//! Flow per chunk: prompt (instructions + patient tag + schema + notes) →
//! inference call → output sanitising → JSON parsing and per-field
//! validation → observations. Failures surface as `ExtractionError` and
//! are turned into `ChunkError` entries by the orchestrator.

pub mod error;
pub mod extractor;
pub mod ollama;
pub mod parser;
pub mod prompt;
pub mod sanitize;
pub mod traits;
pub mod types;

pub use error::{ExtractionError, InferenceError};
pub use extractor::{chunk_error, ChunkExtractor, ExtractorSettings};
pub use ollama::{MockInferenceClient, OllamaClient};
pub use traits::InferenceClient;
pub use types::*;
