//! Note chunker.
//!
//! Packs a patient's notes, in chronological order, into chunks of at most
//! `max_chunk_chars` characters. Notes are never split: each note is
//! wrapped as `<note id="..">text</note>` and either fits in the current
//! chunk or starts a new one. A single oversized note becomes its own chunk.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{ClinicalNote, NoteId};

/// Default character budget per chunk.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 18_000;

/// A block of whole notes belonging to one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub patient_id: String,
    /// Position within the patient's chunk list.
    pub index: usize,
    pub text: String,
    pub source_note_ids: Vec<NoteId>,
}

/// All chunks of one patient, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientChunks {
    pub patient_id: String,
    pub chunks: Vec<Chunk>,
}

pub struct NoteChunker {
    max_chunk_chars: usize,
}

impl NoteChunker {
    pub fn new(max_chunk_chars: usize) -> Self {
        Self { max_chunk_chars }
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    /// Chunk notes for every patient. Notes are ordered by patient then
    /// date first (stable, so same-day notes keep input order).
    pub fn chunk(&self, notes: &[ClinicalNote]) -> Vec<PatientChunks> {
        let mut ordered: Vec<&ClinicalNote> = notes.iter().collect();
        ordered.sort_by(|a, b| {
            a.patient_id
                .cmp(&b.patient_id)
                .then_with(|| a.partial_date().cmp(&b.partial_date()))
        });

        let mut result: Vec<PatientChunks> = Vec::new();
        let mut buffer = ChunkBuffer::default();
        let mut current_patient: Option<&str> = None;

        for note in ordered {
            let wrapped = wrap_note(note);
            let wrapped_len = wrapped.chars().count();

            let is_new_patient = current_patient.is_some_and(|p| p != note.patient_id);
            let fits = buffer.char_len + wrapped_len <= self.max_chunk_chars;

            if is_new_patient || (!fits && !buffer.is_empty()) {
                if let Some(patient) = current_patient {
                    push_chunk(&mut result, patient, buffer.take());
                }
            }
            current_patient = Some(note.patient_id.as_str());
            buffer.append(&wrapped, wrapped_len, note.id);
        }

        if let Some(patient) = current_patient {
            if !buffer.is_empty() {
                push_chunk(&mut result, patient, buffer.take());
            }
        }

        tracing::debug!(
            patients = result.len(),
            chunks = result.iter().map(|p| p.chunks.len()).sum::<usize>(),
            max_chunk_chars = self.max_chunk_chars,
            "Chunked notes"
        );
        result
    }
}

impl Default for NoteChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

/// Convenience wrapper over [`NoteChunker::chunk`].
pub fn chunk_notes(notes: &[ClinicalNote], max_chunk_chars: usize) -> Vec<PatientChunks> {
    NoteChunker::new(max_chunk_chars).chunk(notes)
}

/// Drop notes whose text duplicates an earlier note (first wins), then
/// stable-sort by patient and note date. Unparsable dates sort first.
pub fn prepare_notes(notes: Vec<ClinicalNote>) -> Vec<ClinicalNote> {
    let before = notes.len();
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: Vec<ClinicalNote> = notes
        .into_iter()
        .filter(|n| seen.insert(n.text.clone()))
        .collect();

    kept.sort_by(|a, b| {
        a.patient_id
            .cmp(&b.patient_id)
            .then_with(|| a.partial_date().cmp(&b.partial_date()))
    });

    if kept.len() < before {
        tracing::info!(dropped = before - kept.len(), "Dropped duplicate notes");
    }
    kept
}

fn wrap_note(note: &ClinicalNote) -> String {
    format!("<note id=\"{}\">{}</note>", note.id, note.text.trim())
}

#[derive(Default)]
struct ChunkBuffer {
    text: String,
    char_len: usize,
    note_ids: Vec<NoteId>,
}

impl ChunkBuffer {
    fn is_empty(&self) -> bool {
        self.note_ids.is_empty()
    }

    fn append(&mut self, wrapped: &str, wrapped_len: usize, note_id: NoteId) {
        self.text.push_str(wrapped);
        self.char_len += wrapped_len;
        self.note_ids.push(note_id);
    }

    fn take(&mut self) -> (String, Vec<NoteId>) {
        self.char_len = 0;
        (std::mem::take(&mut self.text), std::mem::take(&mut self.note_ids))
    }
}

fn push_chunk(result: &mut Vec<PatientChunks>, patient_id: &str, (text, ids): (String, Vec<NoteId>)) {
    let needs_group = result.last().map_or(true, |p| p.patient_id != patient_id);
    if needs_group {
        result.push(PatientChunks {
            patient_id: patient_id.to_string(),
            chunks: Vec::new(),
        });
    }
    if let Some(group) = result.last_mut() {
        group.chunks.push(Chunk {
            patient_id: patient_id.to_string(),
            index: group.chunks.len(),
            text,
            source_note_ids: ids,
        });
    }
}
