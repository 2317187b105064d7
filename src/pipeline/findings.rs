//! Finding aggregator and patient export.
//!
//! Builds one finding per registry variable for every patient, using the
//! full registry rather than the variables actually extracted: variables
//! that were never activated resolve to absent with empty evidence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::orchestrator::PatientRun;
use super::resolution::{resolve, timestamped_values, NoteIndex};
use super::variables::Registry;
use crate::models::{FactValue, NoteId, PatientMeta};

/// Confidence attached to model-read evidence. The model gives no score.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// One observation supporting (or contradicting) a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source_note_id: NoteId,
    pub citation: String,
    pub value: FactValue,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub variable_id: String,
    pub export_id: Option<String>,
    /// Resolved value; `None` when nothing was observed or the variable
    /// has no resolution strategy.
    pub value: Option<FactValue>,
    pub evidence: Vec<Evidence>,
    pub confidence: f64,
}

/// Exported per-patient artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub findings: Vec<Finding>,
    pub date_of_birth: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
}

impl PatientRecord {
    pub fn finding(&self, variable_id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.variable_id == variable_id)
    }
}

/// Aggregate a patient's run history into findings over the full registry.
pub fn aggregate(
    registry: &Registry,
    run: &PatientRun,
    notes: &NoteIndex,
    meta: Option<&PatientMeta>,
) -> PatientRecord {
    let findings = registry
        .definitions()
        .iter()
        .map(|def| {
            let value = def.resolver.and_then(|kind| {
                let values = timestamped_values(&run.observations, def.id, notes);
                resolve(kind, &values)
            });

            let evidence = run
                .observations
                .iter()
                .filter(|o| o.variable_id == def.id)
                .map(|o| Evidence {
                    source_note_id: o.note_id,
                    citation: o.citation.clone(),
                    value: o.value.clone(),
                    confidence: DEFAULT_CONFIDENCE,
                })
                .collect();

            Finding {
                variable_id: def.id.to_string(),
                export_id: def.export_id.map(String::from),
                value,
                evidence,
                confidence: DEFAULT_CONFIDENCE,
            }
        })
        .collect();

    let meta = meta.cloned().unwrap_or_default();
    PatientRecord {
        patient_id: run.patient_id.clone(),
        findings,
        date_of_birth: meta.date_of_birth,
        first_name: meta.first_name,
        last_name: meta.last_name,
        gender: meta.gender,
    }
}

/// One `{export_id: exported value}` row per patient, for every variable
/// with an export mapping. Keys follow catalog order.
pub fn flat_export_row(registry: &Registry, record: &PatientRecord) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("patient_id".to_string(), Value::String(record.patient_id.clone()));
    for def in registry.definitions() {
        let Some(export_id) = def.export_id else {
            continue;
        };
        let resolved = record.finding(def.id).and_then(|f| f.value.as_ref());
        if let Some(exported) = def.export_value(resolved) {
            row.insert(export_id.to_string(), exported);
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClinicalNote;
    use crate::pipeline::extraction::{Observation, Phase};
    use crate::pipeline::orchestrator::RunState;
    use crate::pipeline::variables::ResolvedMap;

    fn obs(variable: &str, note_id: NoteId, value: FactValue, citation: &str) -> Observation {
        Observation {
            variable_id: variable.into(),
            value,
            citation: citation.into(),
            note_id,
            chunk_index: 0,
            phase: Phase::One,
        }
    }

    fn run(observations: Vec<Observation>) -> PatientRun {
        PatientRun {
            patient_id: "p1".into(),
            state: RunState::Done,
            observations,
            errors: vec![],
            phase_one_resolved: ResolvedMap::new(),
            phase_two_variables: vec![],
            chunks_processed: 1,
        }
    }

    fn index() -> NoteIndex {
        NoteIndex::from_notes(&[
            ClinicalNote::new(1, "p1", "2018-01-01", "a"),
            ClinicalNote::new(2, "p1", "2022-01-01", "b"),
        ])
    }

    #[test]
    fn one_finding_per_registry_variable() {
        let registry = Registry::builtin();
        let record = aggregate(&registry, &run(vec![]), &index(), None);
        assert_eq!(record.findings.len(), registry.len());
        assert!(record.findings.iter().all(|f| f.value.is_none() && f.evidence.is_empty()));
    }

    #[test]
    fn evidence_keeps_every_observation() {
        let registry = Registry::builtin();
        let record = aggregate(
            &registry,
            &run(vec![
                obs("smoking_history", 1, FactValue::Text("current_smoker".into()), "smokes"),
                obs("smoking_history", 2, FactValue::Text("former_smoker".into()), "quit"),
                obs("smoking_history", 99, FactValue::Text("never_smoker".into()), "never"),
            ]),
            &index(),
            None,
        );
        let finding = record.finding("smoking_history").unwrap();
        assert_eq!(finding.value, Some(FactValue::Text("former_smoker".into())));
        assert_eq!(finding.evidence.len(), 3, "unmatched notes still count as evidence");
        assert_eq!(finding.evidence[2].source_note_id, 99);
        assert_eq!(finding.export_id.as_deref(), Some("smoking_history"));
    }

    #[test]
    fn demographics_are_copied() {
        let meta = PatientMeta {
            first_name: Some("Ada".into()),
            last_name: Some("L".into()),
            date_of_birth: Some("1970-01-01".into()),
            gender: Some("F".into()),
        };
        let record = aggregate(&Registry::builtin(), &run(vec![]), &index(), Some(&meta));
        assert_eq!(record.date_of_birth.as_deref(), Some("1970-01-01"));
        assert_eq!(record.gender.as_deref(), Some("F"));
    }

    #[test]
    fn flat_row_applies_export_mappings() {
        let registry = Registry::builtin();
        let record = aggregate(
            &registry,
            &run(vec![
                obs("ibd_type", 1, FactValue::Text("uc".into()), "UC"),
                obs("appendectomy", 1, FactValue::Bool(true), "appy"),
            ]),
            &index(),
            None,
        );
        let row = flat_export_row(&registry, &record);
        assert_eq!(row["ibd_type"], Value::from(2));
        assert_eq!(row["appendectomy"], Value::from(1));
        assert_eq!(row["perianal_dis"], Value::from(0));
        assert_eq!(row["behaviour"], Value::from(99));
        assert_eq!(row["date_ibd_dx"], Value::from(""));
        assert!(!row.contains_key("pers_cancer_hx"));
    }

    #[test]
    fn record_serializes_with_snake_case_fields() {
        let record = aggregate(&Registry::builtin(), &run(vec![]), &index(), None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["patient_id"], "p1");
        assert!(json["findings"][0]["variable_id"].is_string());
        assert!(json["findings"][0]["value"].is_null());
    }
}
