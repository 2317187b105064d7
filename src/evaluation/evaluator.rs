//! Type dispatch: a variable's declared value type picks its metric family.

use serde_json::Value;

use super::error::EvaluationError;
use super::metrics;
use super::types::{EvaluationReport, EvaluationSet, SkippedVariable, VariableMetrics};
use crate::config::EvaluationConfig;
use crate::pipeline::variables::{Registry, ValueType, VariableDefinition};

/// Look up the variable and check both sides pair up.
pub(crate) fn paired_definition<'r>(
    registry: &'r Registry,
    variable_id: &str,
    ground_truth: &[Value],
    predicted: &[Value],
) -> Result<&'r VariableDefinition, EvaluationError> {
    let def = registry
        .get(variable_id)
        .ok_or_else(|| EvaluationError::UnknownVariable(variable_id.to_string()))?;

    if ground_truth.len() != predicted.len() {
        return Err(EvaluationError::LengthMismatch {
            variable: variable_id.to_string(),
            ground_truth: ground_truth.len(),
            predicted: predicted.len(),
        });
    }
    Ok(def)
}

/// Score one variable with the metric family of its declared type.
pub fn evaluate(
    registry: &Registry,
    variable_id: &str,
    ground_truth: &[Value],
    predicted: &[Value],
    config: &EvaluationConfig,
) -> Result<VariableMetrics, EvaluationError> {
    let def = paired_definition(registry, variable_id, ground_truth, predicted)?;
    let (t, p) = (ground_truth, predicted);

    let result = match def.value_type {
        ValueType::Boolean => VariableMetrics::Binary(metrics::binary(t, p)),
        ValueType::Label(_) => {
            let labels = def.value_type.label_space().unwrap_or_default();
            VariableMetrics::Multiclass(metrics::multiclass(t, p, &labels))
        }
        ValueType::Date => VariableMetrics::Date(metrics::date(t, p, config.date_tolerance_days)),
        ValueType::Integer => {
            VariableMetrics::Numeric(metrics::numeric(t, p, config.numeric_tolerance))
        }
        ValueType::LabelList(_) => {
            let labels = def.value_type.label_space().unwrap_or_default();
            VariableMetrics::MultiLabel(metrics::multi_label(t, p, &labels))
        }
        ValueType::RecordList(_) => {
            VariableMetrics::RecordSet(metrics::record_set(t, p, config.jaccard_threshold))
        }
        ValueType::DateList => {
            VariableMetrics::DateList(metrics::date_list(t, p, config.date_tolerance_days))
        }
        ValueType::Text => {
            return Err(EvaluationError::UnsupportedType {
                variable: variable_id.to_string(),
                kind: def.value_type.kind(),
            })
        }
    };
    Ok(result)
}

/// Score every variable of the set. Variables that cannot be scored are
/// listed in `skipped` and do not affect the others.
pub fn evaluate_all(
    registry: &Registry,
    set: &EvaluationSet,
    config: &EvaluationConfig,
) -> EvaluationReport {
    let mut report = EvaluationReport::default();

    for (variable_id, record) in set {
        match evaluate(registry, variable_id, &record.ground_truth, &record.predicted, config) {
            Ok(metrics) => {
                tracing::debug!(
                    variable = %variable_id,
                    family = metrics.family(),
                    support = metrics.support(),
                    "Variable evaluated"
                );
                report.metrics.insert(variable_id.clone(), metrics);
            }
            Err(e) => {
                tracing::warn!(variable = %variable_id, reason = %e, "Skipping variable in evaluation");
                report.skipped.push(SkippedVariable::new(variable_id, &e));
            }
        }
    }

    tracing::info!(
        evaluated = report.metrics.len(),
        skipped = report.skipped.len(),
        "Evaluation complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::types::EvaluationRecord;
    use crate::pipeline::variables::catalog::VARIABLES;
    use serde_json::json;

    /// Builtin catalog plus a free-text variable, which has no metric family.
    fn registry_with_text() -> Registry {
        let mut defs = VARIABLES.to_vec();
        defs.push(VariableDefinition {
            id: "clinician_comment",
            name: "Clinician comment",
            description: "Free text",
            prompt: "Any other comment?",
            value_type: ValueType::Text,
            activation: None,
            resolver: None,
            export_id: None,
            export: None,
        });
        Registry::new(defs)
    }

    #[test]
    fn dispatches_by_declared_type() {
        let registry = Registry::builtin();
        let config = EvaluationConfig::default();
        let cases = [
            ("appendectomy", json!(true), "binary"),
            ("ibd_type", json!("uc"), "multiclass"),
            ("date_ibd_dx", json!("2020-01-01"), "date"),
            ("pers_cancer_hx", json!(["breast"]), "multi_label"),
            ("fam_cancer_hx", json!([]), "record_set"),
            ("date_hosp", json!(["2020-01-01"]), "date_list"),
        ];
        for (id, value, family) in cases {
            let m = evaluate(&registry, id, &[value.clone()], &[value], &config).unwrap();
            assert_eq!(m.family(), family, "family of {id}");
            assert_eq!(m.support(), 1);
        }
    }

    #[test]
    fn structured_history_missing_prediction() {
        let m = evaluate(
            &Registry::builtin(),
            "fam_cancer_hx",
            &[json!([{"relationship": "first_degree_relative", "type": "breast"}])],
            &[json!([])],
            &EvaluationConfig::default(),
        )
        .unwrap();
        let VariableMetrics::RecordSet(m) = m else {
            panic!("expected record-set metrics");
        };
        assert_eq!(m.jaccard_mean, 0.0);
        assert_eq!(m.exact_match_rate, 0.0);
        assert_eq!(m.f1_thresh, 0.0);
    }

    #[test]
    fn date_list_tolerance_comes_from_config() {
        let gt = [json!(["2020-01-01"])];
        let pred = [json!(["2020-01-20"])];
        let strict = EvaluationConfig {
            date_tolerance_days: 10,
            ..Default::default()
        };

        let loose = evaluate(&Registry::builtin(), "date_hosp", &gt, &pred, &EvaluationConfig::default());
        let tight = evaluate(&Registry::builtin(), "date_hosp", &gt, &pred, &strict);
        match (loose.unwrap(), tight.unwrap()) {
            (VariableMetrics::DateList(l), VariableMetrics::DateList(t)) => {
                assert_eq!(l.f1_micro, 1.0);
                assert_eq!(t.f1_micro, 0.0);
                assert_eq!((t.false_positives, t.false_negatives), (1, 1));
            }
            other => panic!("expected date-list metrics, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_and_unknown_are_skipped() {
        let mut set = EvaluationSet::new();
        set.insert("clinician_comment".into(), EvaluationRecord::new(vec![json!("x")], vec![json!("y")]));
        set.insert("no_such_variable".into(), EvaluationRecord::new(vec![json!(1)], vec![json!(1)]));
        set.insert("appendectomy".into(), EvaluationRecord::new(vec![json!(true)], vec![json!(true)]));

        let report = evaluate_all(&registry_with_text(), &set, &EvaluationConfig::default());
        assert_eq!(report.metrics.len(), 1);
        assert!(report.metrics.contains_key("appendectomy"));

        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.variable.as_str()).collect();
        assert_eq!(skipped, vec!["clinician_comment", "no_such_variable"]);
        assert!(report.skipped[0].reason.contains("text"));
    }

    #[test]
    fn length_mismatch_is_reported() {
        let err = evaluate(
            &Registry::builtin(),
            "appendectomy",
            &[json!(true), json!(false)],
            &[json!(true)],
            &EvaluationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EvaluationError::LengthMismatch { ground_truth: 2, predicted: 1, .. }));
    }

    #[test]
    fn report_serializes_with_family_tag() {
        let mut set = EvaluationSet::new();
        set.insert("appendectomy".into(), EvaluationRecord::new(vec![json!(true)], vec![json!(true)]));
        let report = evaluate_all(&Registry::builtin(), &set, &EvaluationConfig::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metrics"]["appendectomy"]["family"], "binary");
        assert_eq!(json["metrics"]["appendectomy"]["support"], 1);
    }
}
