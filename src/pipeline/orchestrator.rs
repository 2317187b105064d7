//! Staged extraction orchestrator.
//!
//! Two-phase state machine per patient:
//! Phase one extracts the unconditional variables from every chunk, the
//! phase-one observations are resolved, activation rules select the
//! phase-two variables, and phase two re-reads the same chunks with that
//! narrowed schema. Chunk failures are recorded, never raised.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::chunker::{prepare_notes, NoteChunker, PatientChunks};
use super::extraction::{
    chunk_error, ChunkError, ChunkExtractor, ExtractorSettings, InferenceClient, Observation, Phase,
};
use super::findings::{aggregate, PatientRecord};
use super::resolution::{resolve_all, NoteIndex};
use super::variables::{PhaseSchema, Registry, ResolvedMap};
use crate::models::{ClinicalNote, PatientMeta};

/// Generate a new run ID.
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ═══════════════════════════════════════════
// Run state
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    PhaseOne,
    PhaseTwo,
    Done,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhaseOne => "phase_one",
            Self::PhaseTwo => "phase_two",
            Self::Done => "done",
        }
    }
}

/// Append-only run history of one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRun {
    pub patient_id: String,
    pub state: RunState,
    /// Observations of both phases, in chunk order within each phase.
    pub observations: Vec<Observation>,
    pub errors: Vec<ChunkError>,
    /// Phase-one resolved map the activation rules were evaluated on.
    pub phase_one_resolved: ResolvedMap,
    /// Variables selected for phase two, in catalog order.
    pub phase_two_variables: Vec<String>,
    pub chunks_processed: u32,
}

impl PatientRun {
    fn new(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            state: RunState::PhaseOne,
            observations: Vec::new(),
            errors: Vec::new(),
            phase_one_resolved: ResolvedMap::new(),
            phase_two_variables: Vec::new(),
            chunks_processed: 0,
        }
    }
}

/// Counters for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub patients_processed: u32,
    pub patients_skipped: u32,
    pub chunks_processed: u32,
    pub chunk_errors: u32,
    pub phase_two_patients: u32,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub run_id: String,
    pub patients: Vec<PatientRun>,
    pub summary: RunSummary,
}

// ═══════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════

pub struct StagedRunner {
    registry: Registry,
    settings: ExtractorSettings,
}

impl StagedRunner {
    pub fn new(registry: Registry, settings: ExtractorSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run both phases for one patient. Returns `None` for a patient with
    /// no chunks.
    pub fn run_patient(
        &self,
        client: &dyn InferenceClient,
        patient: &PatientChunks,
        notes: &NoteIndex,
        meta: Option<&PatientMeta>,
    ) -> Option<PatientRun> {
        if patient.chunks.is_empty() {
            tracing::debug!(patient_id = %patient.patient_id, "Patient has no chunks, skipping");
            return None;
        }

        let extractor = ChunkExtractor::new(client, self.settings.clone());
        let mut run = PatientRun::new(&patient.patient_id);

        let phase_one = self.registry.unconditional();
        self.run_phase(&extractor, patient, &phase_one, meta, Phase::One, &mut run);

        run.phase_one_resolved = resolve_all(&phase_one.fields, &run.observations, notes);
        let phase_two = self.registry.activated(&run.phase_one_resolved);

        if phase_two.is_empty() {
            tracing::info!(
                patient_id = %patient.patient_id,
                "No active variables, skipping phase two"
            );
        } else {
            run.state = RunState::PhaseTwo;
            run.phase_two_variables = phase_two.ids().into_iter().map(String::from).collect();
            tracing::debug!(
                patient_id = %patient.patient_id,
                variables = ?run.phase_two_variables,
                "Phase two activated"
            );
            self.run_phase(&extractor, patient, &phase_two, meta, Phase::Two, &mut run);
        }

        run.state = RunState::Done;
        Some(run)
    }

    fn run_phase(
        &self,
        extractor: &ChunkExtractor<'_>,
        patient: &PatientChunks,
        schema: &PhaseSchema,
        meta: Option<&PatientMeta>,
        phase: Phase,
        run: &mut PatientRun,
    ) {
        for chunk in &patient.chunks {
            run.chunks_processed += 1;
            match extractor.extract(chunk, schema, meta, phase) {
                Ok(observations) => run.observations.extend(observations),
                Err(e) => {
                    tracing::warn!(
                        patient_id = %chunk.patient_id,
                        chunk_index = chunk.index,
                        phase = phase.as_str(),
                        error = %e,
                        "Chunk extraction failed, continuing"
                    );
                    run.errors.push(chunk_error(chunk, phase, &e));
                }
            }
        }
    }

    /// Run every patient. Patients are independent; with the `parallel`
    /// feature they run concurrently, each patient's chunks in order.
    pub fn run_all(
        &self,
        client: &dyn InferenceClient,
        patients: &[PatientChunks],
        notes: &NoteIndex,
        metas: &HashMap<String, PatientMeta>,
    ) -> RunOutput {
        let start = Instant::now();
        let run_id = new_run_id();
        tracing::info!(run_id = %run_id, patients = patients.len(), "Starting extraction run");

        let run_one = |p: &PatientChunks| self.run_patient(client, p, notes, metas.get(&p.patient_id));

        #[cfg(feature = "parallel")]
        let results: Vec<Option<PatientRun>> = {
            use rayon::prelude::*;
            patients.par_iter().map(run_one).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let results: Vec<Option<PatientRun>> = patients.iter().map(run_one).collect();

        let mut summary = RunSummary::default();
        let mut runs = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Some(run) => {
                    summary.patients_processed += 1;
                    summary.chunks_processed += run.chunks_processed;
                    summary.chunk_errors += run.errors.len() as u32;
                    if !run.phase_two_variables.is_empty() {
                        summary.phase_two_patients += 1;
                    }
                    runs.push(run);
                }
                None => summary.patients_skipped += 1,
            }
        }
        summary.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            run_id = %run_id,
            processed = summary.patients_processed,
            skipped = summary.patients_skipped,
            chunk_errors = summary.chunk_errors,
            duration_ms = summary.duration_ms,
            "Extraction run complete"
        );

        RunOutput {
            run_id,
            patients: runs,
            summary,
        }
    }

    /// Full pass from raw notes to exported patient records: dedup and
    /// order the notes, chunk, run both phases, aggregate findings.
    pub fn run_notes(
        &self,
        client: &dyn InferenceClient,
        notes: Vec<ClinicalNote>,
        metas: &HashMap<String, PatientMeta>,
        chunker: &NoteChunker,
    ) -> (RunOutput, Vec<PatientRecord>) {
        let notes = prepare_notes(notes);
        let index = NoteIndex::from_notes(&notes);
        let chunks = chunker.chunk(&notes);

        let output = self.run_all(client, &chunks, &index, metas);
        let records = output
            .patients
            .iter()
            .map(|run| aggregate(&self.registry, run, &index, metas.get(&run.patient_id)))
            .collect();
        (output, records)
    }
}
