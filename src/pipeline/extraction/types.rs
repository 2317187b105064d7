//! Core types for per-chunk extraction.

use serde::{Deserialize, Serialize};

use crate::models::{FactValue, NoteId};

// ═══════════════════════════════════════════
// Phase
// ═══════════════════════════════════════════

/// Extraction phase an observation or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Unconditional variables.
    One,
    /// Variables activated by phase-one results.
    Two,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "phase_1",
            Self::Two => "phase_2",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Model answer
// ═══════════════════════════════════════════

/// One validated field of a model answer, before it is tied to a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFact {
    pub variable_id: String,
    pub value: FactValue,
    pub citation: String,
    pub note_id: NoteId,
}

/// Inputs to one inference call.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub prompt: &'a str,
    /// JSON schema the answer must follow.
    pub schema: &'a serde_json::Value,
}

// ═══════════════════════════════════════════
// Observations and chunk errors
// ═══════════════════════════════════════════

/// One variable's value as read from exactly one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub variable_id: String,
    pub value: FactValue,
    /// Words from the note supporting the value.
    pub citation: String,
    /// Note the model attributed the value to.
    pub note_id: NoteId,
    pub chunk_index: usize,
    pub phase: Phase,
}

impl Observation {
    pub fn from_parsed(fact: ParsedFact, chunk_index: usize, phase: Phase) -> Self {
        Self {
            variable_id: fact.variable_id,
            value: fact.value,
            citation: fact.citation,
            note_id: fact.note_id,
            chunk_index,
            phase,
        }
    }
}

/// Recorded failure of one chunk in one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkError {
    pub patient_id: String,
    pub chunk_index: usize,
    pub phase: Phase,
    pub kind: ChunkErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkErrorKind {
    Refusal,
    Validation,
    Parsing,
    Inference,
}

impl ChunkErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refusal => "refusal",
            Self::Validation => "validation",
            Self::Parsing => "parsing",
            Self::Inference => "inference",
        }
    }
}
