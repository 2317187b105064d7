//! Prompt construction for one chunk.

use crate::models::PatientMeta;
use crate::pipeline::chunker::Chunk;
use crate::pipeline::variables::PhaseSchema;

/// Default system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You're a medical professional tasked with extracting structured data from medical notes.";

/// Output rules given to the model ahead of the schema.
pub const EXTRACTION_INSTRUCTIONS: &str = "NEVER use newlines or \\t in your output. \
Use the schema provided to extract the data. \
If you can't find the information about one of the fields, return null. \
E.g. when the notes don't mention an appendectomy, don't return false, but null for the whole field. \
When adding citations to the values, only cite the relevant words. \
When replying with a date, ALWAYS use ISO format (YYYY-MM-DD, YYYY-MM or YYYY). \
Set note_id to the id of the note the citation was taken from.";

/// Build the user prompt: instructions, optional patient tag, schema, then
/// the chunk's wrapped notes.
pub fn build_chunk_prompt(
    schema: &PhaseSchema,
    chunk: &Chunk,
    patient_meta: Option<&PatientMeta>,
) -> String {
    let meta_tag = patient_meta.map(|m| m.prompt_tag()).unwrap_or_default();
    let schema_json = schema.json_schema().to_string();

    let mut prompt = String::with_capacity(
        EXTRACTION_INSTRUCTIONS.len() + meta_tag.len() + schema_json.len() + chunk.text.len() + 32,
    );
    prompt.push_str(EXTRACTION_INSTRUCTIONS);
    prompt.push_str(&meta_tag);
    prompt.push_str("\n<schema>");
    prompt.push_str(&schema_json);
    prompt.push_str("</schema>");
    prompt.push_str(&chunk.text);
    prompt
}
