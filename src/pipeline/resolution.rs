//! Resolution engine.
//!
//! Collapses a patient's per-chunk observations of one variable into a
//! single canonical value. Every strategy is pure, deterministic, and
//! returns `None` for an empty input.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::extraction::Observation;
use super::variables::{ResolvedMap, ResolverKind, VariableDefinition};
use crate::models::{ClinicalNote, FactValue, NoteId, PartialDate, Record};

/// An observed value paired with the date of the note it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedValue {
    pub date: PartialDate,
    pub value: FactValue,
}

impl TimestampedValue {
    pub fn new(date: PartialDate, value: FactValue) -> Self {
        Self { date, value }
    }
}

/// Note dates by note id, for dating observations.
#[derive(Debug, Clone, Default)]
pub struct NoteIndex {
    dates: HashMap<NoteId, Option<PartialDate>>,
}

impl NoteIndex {
    pub fn from_notes(notes: &[ClinicalNote]) -> Self {
        let dates = notes.iter().map(|n| (n.id, n.partial_date())).collect();
        Self { dates }
    }

    pub fn contains(&self, note_id: NoteId) -> bool {
        self.dates.contains_key(&note_id)
    }

    pub fn date_of(&self, note_id: NoteId) -> Option<PartialDate> {
        self.dates.get(&note_id).copied().flatten()
    }
}

/// Date every observation of `variable_id` by its source note.
///
/// Observations citing an unknown note, or a note without a parseable
/// date, cannot be placed in time and are dropped with a warning.
pub fn timestamped_values(
    observations: &[Observation],
    variable_id: &str,
    notes: &NoteIndex,
) -> Vec<TimestampedValue> {
    observations
        .iter()
        .filter(|o| o.variable_id == variable_id)
        .filter_map(|o| {
            if !notes.contains(o.note_id) {
                tracing::warn!(
                    variable = variable_id,
                    note_id = o.note_id,
                    "No matching note found for observation, dropping from resolution"
                );
                return None;
            }
            match notes.date_of(o.note_id) {
                Some(date) => Some(TimestampedValue::new(date, o.value.clone())),
                None => {
                    tracing::warn!(
                        variable = variable_id,
                        note_id = o.note_id,
                        "Source note has no parseable date, dropping from resolution"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Resolve every definition in `definitions` that carries a strategy.
/// Variables with no observations, or no strategy, are left out.
pub fn resolve_all<'d, I>(definitions: I, observations: &[Observation], notes: &NoteIndex) -> ResolvedMap
where
    I: IntoIterator<Item = &'d VariableDefinition>,
{
    let mut resolved = ResolvedMap::new();
    for def in definitions {
        let Some(kind) = def.resolver else {
            continue;
        };
        let values = timestamped_values(observations, def.id, notes);
        if let Some(value) = resolve(kind, &values) {
            resolved.insert(def.id.to_string(), value);
        }
    }
    resolved
}

/// Apply `kind` to `values`, given in chunk emission order.
pub fn resolve(kind: ResolverKind, values: &[TimestampedValue]) -> Option<FactValue> {
    if values.is_empty() {
        return None;
    }
    match kind {
        ResolverKind::MostFrequent => most_frequent(values),
        ResolverKind::MostRecent => most_recent(values),
        ResolverKind::LeastRecent => least_recent(values),
        ResolverKind::AnyTrue => Some(any_true(values)),
        ResolverKind::ListUnique => Some(list_unique(values)),
        ResolverKind::EarliestDate => earliest_date(values),
    }
}

/// Highest occurrence count; ties go to the value seen first.
fn most_frequent(values: &[TimestampedValue]) -> Option<FactValue> {
    let mut counts: Vec<(&FactValue, usize)> = Vec::new();
    for tv in values {
        match counts.iter_mut().find(|(v, _)| *v == &tv.value) {
            Some((_, n)) => *n += 1,
            None => counts.push((&tv.value, 1)),
        }
    }

    let mut best: Option<(&FactValue, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v.clone())
}

/// Latest date wins; among equal dates the first encountered.
fn most_recent(values: &[TimestampedValue]) -> Option<FactValue> {
    let mut best = values.first()?;
    for tv in &values[1..] {
        if tv.date > best.date {
            best = tv;
        }
    }
    Some(best.value.clone())
}

/// Earliest date wins; among equal dates the first encountered.
fn least_recent(values: &[TimestampedValue]) -> Option<FactValue> {
    let mut best = values.first()?;
    for tv in &values[1..] {
        if tv.date < best.date {
            best = tv;
        }
    }
    Some(best.value.clone())
}

fn any_true(values: &[TimestampedValue]) -> FactValue {
    FactValue::Bool(values.iter().any(|tv| tv.value.as_bool() == Some(true)))
}

/// Union of all list observations, deduplicated, in first-seen order.
/// Non-list observations are ignored.
fn list_unique(values: &[TimestampedValue]) -> FactValue {
    let has_records = values
        .iter()
        .any(|tv| matches!(tv.value, FactValue::RecordList(_)));

    if has_records {
        let mut records: Vec<Record> = Vec::new();
        for tv in values {
            if let FactValue::RecordList(items) = &tv.value {
                for item in items {
                    if !records.contains(item) {
                        records.push(item.clone());
                    }
                }
            }
        }
        return FactValue::RecordList(records);
    }

    let mut items: Vec<String> = Vec::new();
    for tv in values {
        if let FactValue::TextList(list) = &tv.value {
            for item in list {
                if !items.contains(item) {
                    items.push(item.clone());
                }
            }
        }
    }
    FactValue::TextList(items)
}

/// Minimum parseable date, rendered at the precision it was written.
fn earliest_date(values: &[TimestampedValue]) -> Option<FactValue> {
    values
        .iter()
        .filter_map(|tv| tv.value.as_text())
        .filter_map(PartialDate::parse)
        .min()
        .map(|d| FactValue::Text(d.to_string()))
}
