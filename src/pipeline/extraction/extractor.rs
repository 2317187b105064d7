//! Per-chunk extractor: one inference call per chunk and phase.

use super::error::ExtractionError;
use super::parser::parse_extraction_response;
use super::prompt::{build_chunk_prompt, DEFAULT_SYSTEM_PROMPT};
use super::sanitize::sanitize_model_output;
use super::traits::InferenceClient;
use super::types::{ChunkError, ChunkErrorKind, InferenceRequest, Observation, Phase};
use crate::models::PatientMeta;
use crate::pipeline::chunker::Chunk;
use crate::pipeline::variables::PhaseSchema;

/// Settings shared by every extraction call of a run.
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub model_name: String,
    pub system_prompt: String,
    pub include_patient_meta: bool,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            model_name: "gemma3:27b".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            include_patient_meta: true,
        }
    }
}

pub struct ChunkExtractor<'a> {
    client: &'a dyn InferenceClient,
    settings: ExtractorSettings,
}

impl<'a> ChunkExtractor<'a> {
    pub fn new(client: &'a dyn InferenceClient, settings: ExtractorSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Extract the schema's variables from one chunk.
    ///
    /// Produces at most one observation per variable.
    pub fn extract(
        &self,
        chunk: &Chunk,
        schema: &PhaseSchema,
        patient_meta: Option<&PatientMeta>,
        phase: Phase,
    ) -> Result<Vec<Observation>, ExtractionError> {
        let meta = patient_meta.filter(|_| self.settings.include_patient_meta);
        let prompt = build_chunk_prompt(schema, chunk, meta);
        let json_schema = schema.json_schema();

        let raw = self.client.infer(&InferenceRequest {
            model: &self.settings.model_name,
            system: &self.settings.system_prompt,
            prompt: &prompt,
            schema: &json_schema,
        })?;

        let response = sanitize_model_output(&raw);
        let facts = parse_extraction_response(&response, schema)?;

        tracing::debug!(
            patient_id = %chunk.patient_id,
            chunk_index = chunk.index,
            phase = phase.as_str(),
            facts = facts.len(),
            "Chunk extracted"
        );

        Ok(facts
            .into_iter()
            .map(|f| Observation::from_parsed(f, chunk.index, phase))
            .collect())
    }
}

/// Classify a per-chunk failure for the run history.
pub fn chunk_error(chunk: &Chunk, phase: Phase, error: &ExtractionError) -> ChunkError {
    let kind = match error {
        ExtractionError::Refusal(_) => ChunkErrorKind::Refusal,
        ExtractionError::Validation { .. } => ChunkErrorKind::Validation,
        ExtractionError::JsonParsing(_) => ChunkErrorKind::Parsing,
        _ => ChunkErrorKind::Inference,
    };
    ChunkError {
        patient_id: chunk.patient_id.clone(),
        chunk_index: chunk.index,
        phase,
        kind,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FactValue;
    use crate::pipeline::extraction::ollama::MockInferenceClient;
    use crate::pipeline::variables::Registry;

    fn chunk() -> Chunk {
        Chunk {
            patient_id: "p1".into(),
            index: 2,
            text: "<note id=\"5\">s/p appendectomy 2001</note>".into(),
            source_note_ids: vec![5],
        }
    }

    #[test]
    fn extracts_observations_tagged_with_chunk_and_phase() {
        let mock = MockInferenceClient::new(
            "```json\n{\"appendectomy\": {\"citation\": \"s/p appendectomy\", \"value\": true, \"note_id\": 5}}\n```",
        );
        let extractor = ChunkExtractor::new(&mock, ExtractorSettings::default());
        let schema = Registry::builtin().unconditional();

        let obs = extractor.extract(&chunk(), &schema, None, Phase::One).unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].variable_id, "appendectomy");
        assert_eq!(obs[0].value, FactValue::Bool(true));
        assert_eq!(obs[0].chunk_index, 2);
        assert_eq!(obs[0].phase, Phase::One);
    }

    #[test]
    fn patient_meta_can_be_disabled() {
        let mock = MockInferenceClient::new("{}");
        let settings = ExtractorSettings {
            include_patient_meta: false,
            ..Default::default()
        };
        let extractor = ChunkExtractor::new(&mock, settings);
        let meta = PatientMeta {
            date_of_birth: Some("1990-01-01".into()),
            ..Default::default()
        };
        let schema = Registry::builtin().unconditional();
        extractor.extract(&chunk(), &schema, Some(&meta), Phase::One).unwrap();
        assert!(!mock.prompts()[0].contains("DoB"));
    }

    #[test]
    fn failures_classify_into_chunk_errors() {
        let schema = Registry::builtin().unconditional();

        let refusing = MockInferenceClient::new("{\"refusal\": \"no\"}");
        let err = ChunkExtractor::new(&refusing, ExtractorSettings::default())
            .extract(&chunk(), &schema, None, Phase::Two)
            .unwrap_err();
        let recorded = chunk_error(&chunk(), Phase::Two, &err);
        assert_eq!(recorded.kind, ChunkErrorKind::Refusal);
        assert_eq!(recorded.chunk_index, 2);

        let down = MockInferenceClient::sequence(vec![Err("connection refused".into())]);
        let err = ChunkExtractor::new(&down, ExtractorSettings::default())
            .extract(&chunk(), &schema, None, Phase::One)
            .unwrap_err();
        assert_eq!(chunk_error(&chunk(), Phase::One, &err).kind, ChunkErrorKind::Inference);
    }
}
