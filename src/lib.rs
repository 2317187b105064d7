//! Structured fact extraction from clinical notes.
//!
//! Notes are chunked per patient, read by a local LLM in two phases
//! (unconditional variables first, then the variables their answers
//! activate), resolved into one value per variable and exported. The
//! evaluation engine scores exported values against a reference set.

pub mod config;
pub mod evaluation; // Type-dispatched metrics, kappa, agreement
pub mod logging;
pub mod models;
pub mod pipeline;

pub use config::{ConfigError, EvaluationConfig, PipelineConfig};
pub use models::{ClinicalNote, FactValue, PartialDate, PatientMeta};
pub use pipeline::findings::{aggregate, flat_export_row, PatientRecord};
pub use pipeline::orchestrator::{RunOutput, StagedRunner};
pub use pipeline::variables::Registry;
