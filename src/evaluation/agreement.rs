//! Inter-rater agreement between ground truth and predictions: Cohen's
//! kappa and percentage agreement.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::error::EvaluationError;
use super::evaluator::paired_definition;
use super::metrics::set_overlap;
use super::normalize;
use super::types::{Agreement, AgreementReport, EvaluationSet, KappaReport, SkippedVariable};
use crate::pipeline::variables::{Registry, ValueType};

// ═══════════════════════════════════════════
// Cohen's kappa
// ═══════════════════════════════════════════

/// Cohen's kappa of two equally long label sequences.
///
/// `None` when expected agreement is 1, i.e. both raters used one and the
/// same label throughout.
pub fn cohen_kappa<T: Ord>(a: &[T], b: &[T]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n == 0 {
        return None;
    }

    let mut marginal_a: BTreeMap<&T, usize> = BTreeMap::new();
    let mut marginal_b: BTreeMap<&T, usize> = BTreeMap::new();
    let mut observed = 0usize;
    for (x, y) in a.iter().zip(b) {
        *marginal_a.entry(x).or_default() += 1;
        *marginal_b.entry(y).or_default() += 1;
        if x == y {
            observed += 1;
        }
    }

    let n = n as f64;
    let p_observed = observed as f64 / n;
    let p_expected: f64 = marginal_a
        .iter()
        .map(|(label, count)| {
            let other = marginal_b.get(label).copied().unwrap_or(0);
            (*count as f64 / n) * (other as f64 / n)
        })
        .sum();

    if (1.0 - p_expected).abs() < f64::EPSILON {
        return None;
    }
    Some((p_observed - p_expected) / (1.0 - p_expected))
}

/// One comparable label per value. Lists become their sorted members
/// joined by `|`. Record lists and free text have no label form.
fn kappa_labels(value_type: ValueType, raw: &[Value]) -> Option<Vec<String>> {
    let label = |v: &Value| -> Option<String> {
        Some(match value_type {
            ValueType::Boolean => normalize::boolean(v).to_string(),
            ValueType::Label(_) => normalize::label(v),
            ValueType::Date => normalize::date(v).unwrap_or_default(),
            ValueType::Integer => normalize::numeric(v).map(|n| n.to_string()).unwrap_or_default(),
            ValueType::LabelList(_) => join(normalize::label_set(v)),
            ValueType::DateList => join(
                normalize::date_list(v)
                    .into_iter()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .collect(),
            ),
            ValueType::RecordList(_) | ValueType::Text => return None,
        })
    };
    raw.iter().map(label).collect()
}

fn join(items: BTreeSet<String>) -> String {
    items.into_iter().collect::<Vec<_>>().join("|")
}

/// Kappa of one variable. Constant sequences on either side are
/// `NoVariability`, never a zero score.
pub fn kappa(
    registry: &Registry,
    variable_id: &str,
    ground_truth: &[Value],
    predicted: &[Value],
) -> Result<f64, EvaluationError> {
    let def = paired_definition(registry, variable_id, ground_truth, predicted)?;
    let unsupported = || EvaluationError::UnsupportedType {
        variable: variable_id.to_string(),
        kind: def.value_type.kind(),
    };

    let t = kappa_labels(def.value_type, ground_truth).ok_or_else(unsupported)?;
    let p = kappa_labels(def.value_type, predicted).ok_or_else(unsupported)?;

    let distinct = |labels: &[String]| labels.iter().collect::<BTreeSet<_>>().len();
    if distinct(&t) <= 1 || distinct(&p) <= 1 {
        return Err(EvaluationError::NoVariability(variable_id.to_string()));
    }

    cohen_kappa(&t, &p).ok_or_else(|| EvaluationError::NoVariability(variable_id.to_string()))
}

pub fn kappa_all(registry: &Registry, set: &EvaluationSet) -> KappaReport {
    let mut report = KappaReport::default();
    for (variable_id, record) in set {
        match kappa(registry, variable_id, &record.ground_truth, &record.predicted) {
            Ok(k) => {
                report.kappa.insert(variable_id.clone(), k);
            }
            Err(e) => {
                tracing::info!(variable = %variable_id, reason = %e, "Skipping kappa");
                report.skipped.push(SkippedVariable::new(variable_id, &e));
            }
        }
    }
    report
}

// ═══════════════════════════════════════════
// Percentage agreement
// ═══════════════════════════════════════════

fn exact_rate<T: PartialEq>(t: Vec<T>, p: Vec<T>) -> f64 {
    let matches = t.iter().zip(&p).filter(|(a, b)| a == b).count();
    if t.is_empty() {
        0.0
    } else {
        matches as f64 / t.len() as f64
    }
}

fn mean_overlap<T: Ord>(pairs: impl Iterator<Item = (BTreeSet<T>, BTreeSet<T>)>) -> f64 {
    let scores: Vec<f64> = pairs.map(|(a, b)| set_overlap(&a, &b)).collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Share of patients on which prediction and ground truth agree after
/// normalisation. List types score the mean per-patient set overlap.
pub fn percentage_agreement(
    registry: &Registry,
    variable_id: &str,
    ground_truth: &[Value],
    predicted: &[Value],
) -> Result<Agreement, EvaluationError> {
    let def = paired_definition(registry, variable_id, ground_truth, predicted)?;
    let (t, p) = (ground_truth, predicted);
    let pairs = || t.iter().zip(p);

    let value = match def.value_type {
        ValueType::Boolean => exact_rate(
            t.iter().map(normalize::boolean).collect(),
            p.iter().map(normalize::boolean).collect(),
        ),
        ValueType::Label(_) => exact_rate(
            t.iter().map(normalize::label).collect(),
            p.iter().map(normalize::label).collect(),
        ),
        ValueType::Date => exact_rate(
            t.iter().map(normalize::date).collect(),
            p.iter().map(normalize::date).collect(),
        ),
        ValueType::Integer => exact_rate(
            t.iter().map(normalize::numeric).collect(),
            p.iter().map(normalize::numeric).collect(),
        ),
        ValueType::LabelList(_) => {
            mean_overlap(pairs().map(|(a, b)| (normalize::label_set(a), normalize::label_set(b))))
        }
        ValueType::DateList => mean_overlap(pairs().map(|(a, b)| {
            (
                normalize::date_list(a).into_iter().collect::<BTreeSet<_>>(),
                normalize::date_list(b).into_iter().collect::<BTreeSet<_>>(),
            )
        })),
        ValueType::RecordList(_) => {
            mean_overlap(pairs().map(|(a, b)| (normalize::record_set(a), normalize::record_set(b))))
        }
        ValueType::Text => {
            return Err(EvaluationError::UnsupportedType {
                variable: variable_id.to_string(),
                kind: def.value_type.kind(),
            })
        }
    };

    Ok(Agreement {
        value,
        case_count: t.len().max(p.len()),
    })
}

pub fn agreement_all(registry: &Registry, set: &EvaluationSet) -> AgreementReport {
    let mut report = AgreementReport::default();
    for (variable_id, record) in set {
        match percentage_agreement(registry, variable_id, &record.ground_truth, &record.predicted) {
            Ok(a) => {
                report.agreement.insert(variable_id.clone(), a);
            }
            Err(e) => {
                tracing::warn!(variable = %variable_id, reason = %e, "Skipping agreement");
                report.skipped.push(SkippedVariable::new(variable_id, &e));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::types::EvaluationRecord;
    use serde_json::json;

    #[test]
    fn kappa_perfect_and_chance() {
        let a = ["x", "y", "x", "y"];
        assert!((cohen_kappa(&a, &a).unwrap() - 1.0).abs() < 1e-9);

        // po = 0.5, pe = 0.5 -> kappa 0.
        let b = ["x", "x", "y", "y"];
        assert!(cohen_kappa(&a, &b).unwrap().abs() < 1e-9);
    }

    #[test]
    fn kappa_skips_constant_side() {
        let err = kappa(
            &Registry::builtin(),
            "appendectomy",
            &[json!(true), json!(false), json!(true)],
            &[json!(true), json!(true), json!(true)],
        )
        .unwrap_err();
        assert_eq!(err, EvaluationError::NoVariability("appendectomy".into()));
    }

    #[test]
    fn kappa_absent_counts_as_false() {
        let k = kappa(
            &Registry::builtin(),
            "appendectomy",
            &[json!(true), Value::Null, json!(true), json!(false)],
            &[json!(true), json!(false), json!(true), Value::Null],
        )
        .unwrap();
        assert!((k - 1.0).abs() < 1e-9);
    }

    #[test]
    fn kappa_not_defined_for_record_lists() {
        let err = kappa(
            &Registry::builtin(),
            "fam_cancer_hx",
            &[json!([]), json!([{"relationship": "other", "type": "lung"}])],
            &[json!([]), json!([])],
        )
        .unwrap_err();
        assert!(matches!(err, EvaluationError::UnsupportedType { .. }));
    }

    #[test]
    fn kappa_all_collects_skips() {
        let mut set = EvaluationSet::new();
        set.insert(
            "ibd_type".into(),
            EvaluationRecord::new(vec![json!("uc"), json!("cd")], vec![json!("uc"), json!("cd")]),
        );
        set.insert(
            "psc_hx".into(),
            EvaluationRecord::new(vec![json!(false), json!(false)], vec![json!(true), json!(false)]),
        );
        let report = kappa_all(&Registry::builtin(), &set);
        assert_eq!(report.kappa.len(), 1);
        assert_eq!(report.skipped[0].variable, "psc_hx");
    }

    #[test]
    fn scalar_agreement_is_exact_match_rate() {
        let a = percentage_agreement(
            &Registry::builtin(),
            "date_ibd_dx",
            &[json!("2020"), json!("2020-05-01"), Value::Null],
            &[json!("2020-01-01"), json!("2020-05-02"), Value::Null],
        )
        .unwrap();
        assert!((a.value - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(a.case_count, 3);
    }

    #[test]
    fn list_agreement_uses_set_overlap() {
        let a = percentage_agreement(
            &Registry::builtin(),
            "date_hosp",
            &[json!([]), json!(["2020-01-01"]), json!(["2020-01-01", "2021-01-01"])],
            &[Value::Null, json!([]), json!(["2021-01-01"])],
        )
        .unwrap();
        // 1.0 (both empty) + 0.0 (one side empty) + 0.5
        assert!((a.value - 0.5).abs() < 1e-9);
        assert_eq!(a.case_count, 3);
    }

    #[test]
    fn label_list_agreement() {
        let a = percentage_agreement(
            &Registry::builtin(),
            "pers_cancer_hx",
            &[json!(["breast", "lung"])],
            &[json!(["lung", "breast"])],
        )
        .unwrap();
        assert_eq!(a.value, 1.0);
    }
}
