//! The seven metric families and their counting helpers.
//!
//! Every family takes already-paired sequences; pairing and length checks
//! happen in the evaluator.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde_json::Value;

use super::normalize;
use super::types::{
    ClassificationMetrics, DateListMetrics, MultiLabelMetrics, RecordSetMetrics, ToleranceMetrics,
};
use crate::models::days_between;

// ═══════════════════════════════════════════
// Counting helpers
// ═══════════════════════════════════════════

/// `num / den`, or `zero_division` when `den` is zero.
fn ratio(num: usize, den: usize, zero_division: f64) -> f64 {
    if den == 0 {
        zero_division
    } else {
        num as f64 / den as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// F1 from raw counts: `2tp / (2tp + fp + fn)`.
fn f1_score(tp: usize, fp: usize, fn_: usize, zero_division: f64) -> f64 {
    ratio(2 * tp, 2 * tp + fp + fn_, zero_division)
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

/// Macro precision/recall/F1 over `labels` plus plain accuracy.
///
/// With an empty `labels` set the labels seen on either side are used.
/// Zero denominators score 0.
pub(crate) fn classification<T: Ord + Clone>(
    y_true: &[T],
    y_pred: &[T],
    labels: &BTreeSet<T>,
) -> ClassificationMetrics {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return ClassificationMetrics::default();
    }

    let mut space: BTreeSet<T> = labels.clone();
    if space.is_empty() {
        space.extend(y_true[..n].iter().cloned());
        space.extend(y_pred[..n].iter().cloned());
    }

    let mut counts: BTreeMap<&T, Counts> = space.iter().map(|l| (l, Counts::default())).collect();
    let mut correct = 0;
    for (t, p) in y_true.iter().zip(y_pred) {
        if t == p {
            correct += 1;
            if let Some(c) = counts.get_mut(t) {
                c.tp += 1;
            }
            continue;
        }
        if let Some(c) = counts.get_mut(p) {
            c.fp += 1;
        }
        if let Some(c) = counts.get_mut(t) {
            c.fn_ += 1;
        }
    }

    let per_label: Vec<(f64, f64, f64)> = counts
        .values()
        .map(|c| {
            (
                ratio(c.tp, c.tp + c.fp, 0.0),
                ratio(c.tp, c.tp + c.fn_, 0.0),
                f1_score(c.tp, c.fp, c.fn_, 0.0),
            )
        })
        .collect();

    ClassificationMetrics {
        accuracy: ratio(correct, n, 0.0),
        precision: mean(&per_label.iter().map(|m| m.0).collect::<Vec<_>>()),
        recall: mean(&per_label.iter().map(|m| m.1).collect::<Vec<_>>()),
        f1: mean(&per_label.iter().map(|m| m.2).collect::<Vec<_>>()),
        support: n,
    }
}

/// `|a ∩ b| / |a ∪ b|`; two empty sets score 1.
fn set_jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    ratio(a.intersection(b).count(), union, 1.0)
}

/// Set-overlap used by percentage agreement: Jaccard, with one-sided
/// empties scoring 0.
pub(crate) fn set_overlap<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        _ => set_jaccard(a, b),
    }
}

// ═══════════════════════════════════════════
// Families
// ═══════════════════════════════════════════

/// Absent is false.
pub fn binary(ground_truth: &[Value], predicted: &[Value]) -> ClassificationMetrics {
    let t: Vec<bool> = ground_truth.iter().map(normalize::boolean).collect();
    let p: Vec<bool> = predicted.iter().map(normalize::boolean).collect();
    classification(&t, &p, &BTreeSet::new())
}

/// Macro scores over the declared labels plus any other value seen,
/// including the empty string for absent.
pub fn multiclass(
    ground_truth: &[Value],
    predicted: &[Value],
    label_space: &[&str],
) -> ClassificationMetrics {
    let t: Vec<String> = ground_truth.iter().map(normalize::label).collect();
    let p: Vec<String> = predicted.iter().map(normalize::label).collect();

    let mut labels: BTreeSet<String> = label_space.iter().map(|l| l.to_string()).collect();
    labels.extend(t.iter().cloned());
    labels.extend(p.iter().cloned());
    classification(&t, &p, &labels)
}

/// Presence scored as binary classification, plus within-tolerance
/// accuracy where both-absent counts as correct.
fn tolerance<T: Copy>(
    t: &[Option<T>],
    p: &[Option<T>],
    within: impl Fn(T, T) -> bool,
) -> ToleranceMetrics {
    let present_t: Vec<bool> = t.iter().map(Option::is_some).collect();
    let present_p: Vec<bool> = p.iter().map(Option::is_some).collect();
    let clf = classification(&present_t, &present_p, &BTreeSet::new());

    let hits = t
        .iter()
        .zip(p)
        .filter(|pair| match pair {
            (None, None) => true,
            (Some(a), Some(b)) => within(*a, *b),
            _ => false,
        })
        .count();

    ToleranceMetrics {
        accuracy: clf.accuracy,
        precision: clf.precision,
        recall: clf.recall,
        f1: clf.f1,
        support: clf.support,
        accuracy_tol: ratio(hits, clf.support, 0.0),
    }
}

pub fn date(ground_truth: &[Value], predicted: &[Value], tolerance_days: i64) -> ToleranceMetrics {
    let t: Vec<Option<NaiveDate>> = ground_truth.iter().map(normalize::calendar).collect();
    let p: Vec<Option<NaiveDate>> = predicted.iter().map(normalize::calendar).collect();
    tolerance(&t, &p, |a, b| days_between(a, b) <= tolerance_days)
}

pub fn numeric(ground_truth: &[Value], predicted: &[Value], tolerance_abs: f64) -> ToleranceMetrics {
    let t: Vec<Option<f64>> = ground_truth.iter().map(normalize::numeric).collect();
    let p: Vec<Option<f64>> = predicted.iter().map(normalize::numeric).collect();
    tolerance(&t, &p, |a, b| (a - b).abs() <= tolerance_abs)
}

/// Sets binarized against `label_space`; labels outside it are ignored.
/// Zero denominators score 1, so two empty sets are a perfect match.
pub fn multi_label(
    ground_truth: &[Value],
    predicted: &[Value],
    label_space: &[&str],
) -> MultiLabelMetrics {
    let n = ground_truth.len().min(predicted.len());
    if n == 0 {
        return MultiLabelMetrics::default();
    }

    let space: BTreeSet<String> = label_space.iter().map(|l| l.to_string()).collect();
    let binarize = |raw: &Value| -> BTreeSet<String> {
        normalize::label_set(raw)
            .into_iter()
            .filter(|l| {
                let known = space.contains(l);
                if !known {
                    tracing::debug!(label = %l, "Label outside the label space ignored");
                }
                known
            })
            .collect()
    };

    let mut per_label: BTreeMap<&str, Counts> =
        space.iter().map(|l| (l.as_str(), Counts::default())).collect();
    let mut jaccards = Vec::with_capacity(n);

    for (gt, pred) in ground_truth.iter().zip(predicted) {
        let t = binarize(gt);
        let p = binarize(pred);
        jaccards.push(set_jaccard(&t, &p));

        for (label, c) in per_label.iter_mut() {
            match (t.contains(*label), p.contains(*label)) {
                (true, true) => c.tp += 1,
                (false, true) => c.fp += 1,
                (true, false) => c.fn_ += 1,
                (false, false) => {}
            }
        }
    }

    let total = per_label.values().fold(Counts::default(), |acc, c| Counts {
        tp: acc.tp + c.tp,
        fp: acc.fp + c.fp,
        fn_: acc.fn_ + c.fn_,
    });
    let macro_f1: Vec<f64> = per_label
        .values()
        .map(|c| f1_score(c.tp, c.fp, c.fn_, 1.0))
        .collect();

    MultiLabelMetrics {
        jaccard_mean: mean(&jaccards),
        f1_micro: f1_score(total.tp, total.fp, total.fn_, 1.0),
        f1_macro: if macro_f1.is_empty() { 1.0 } else { mean(&macro_f1) },
        support: n,
    }
}

/// Sets of structured records compared per patient.
///
/// A record "matches" when its Jaccard reaches `threshold`; the F1 treats
/// a non-empty ground-truth set as the positive class.
pub fn record_set(ground_truth: &[Value], predicted: &[Value], threshold: f64) -> RecordSetMetrics {
    let n = ground_truth.len().min(predicted.len());
    if n == 0 {
        return RecordSetMetrics::default();
    }

    let mut jaccards = Vec::with_capacity(n);
    let mut exact = 0;
    let mut positives = Counts::default();

    for (gt, pred) in ground_truth.iter().zip(predicted) {
        let t = normalize::record_set(gt);
        let p = normalize::record_set(pred);
        let jaccard = set_jaccard(&t, &p);
        jaccards.push(jaccard);
        if jaccard == 1.0 {
            exact += 1;
        }

        match (!t.is_empty(), jaccard >= threshold) {
            (true, true) => positives.tp += 1,
            (false, true) => positives.fp += 1,
            (true, false) => positives.fn_ += 1,
            (false, false) => {}
        }
    }

    RecordSetMetrics {
        jaccard_mean: mean(&jaccards),
        exact_match_rate: ratio(exact, n, 0.0),
        f1_thresh: f1_score(positives.tp, positives.fp, positives.fn_, 0.0),
        support: n,
    }
}

/// Greedy one-to-one matching of two chronologically sorted date lists.
///
/// Each ground-truth date, in order, takes the closest unmatched predicted
/// date within `tolerance_days`; on equal distance the earlier prediction
/// wins. Returns the number of matches.
pub(crate) fn match_dates(gt: &[NaiveDate], pred: &[NaiveDate], tolerance_days: i64) -> usize {
    let mut used = vec![false; pred.len()];
    let mut matched = 0;

    for g in gt {
        let mut best: Option<(usize, i64)> = None;
        for (j, p) in pred.iter().enumerate() {
            if used[j] {
                continue;
            }
            let delta = days_between(*g, *p);
            if delta <= tolerance_days && best.map_or(true, |(_, d)| delta < d) {
                best = Some((j, delta));
            }
        }
        if let Some((j, _)) = best {
            used[j] = true;
            matched += 1;
        }
    }
    matched
}

/// Micro-averaged matching scores over all patients, plus per-patient
/// Jaccard and exact-match rate.
pub fn date_list(ground_truth: &[Value], predicted: &[Value], tolerance_days: i64) -> DateListMetrics {
    let n = ground_truth.len().min(predicted.len());
    if n == 0 {
        return DateListMetrics::default();
    }

    let mut total = Counts::default();
    let mut jaccards = Vec::with_capacity(n);
    let mut exact = 0;

    for (gt, pred) in ground_truth.iter().zip(predicted) {
        let t = normalize::date_list(gt);
        let p = normalize::date_list(pred);
        let tp = match_dates(&t, &p, tolerance_days);
        let fp = p.len() - tp;
        let fn_ = t.len() - tp;

        total.tp += tp;
        total.fp += fp;
        total.fn_ += fn_;
        jaccards.push(ratio(tp, tp + fp + fn_, 1.0));
        if fp == 0 && fn_ == 0 {
            exact += 1;
        }
    }

    DateListMetrics {
        precision_micro: ratio(total.tp, total.tp + total.fp, 0.0),
        recall_micro: ratio(total.tp, total.tp + total.fn_, 0.0),
        f1_micro: f1_score(total.tp, total.fp, total.fn_, 0.0),
        jaccard_mean: mean(&jaccards),
        exact_match_rate: ratio(exact, n, 0.0),
        true_positives: total.tp,
        false_positives: total.fp,
        false_negatives: total.fn_,
        support: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn date_list_match_within_tolerance() {
        let m = date_list(&[json!(["2020-01-01"])], &[json!(["2020-01-20"])], 30);
        assert_eq!(m.true_positives, 1);
        assert!(close(m.precision_micro, 1.0));
        assert!(close(m.recall_micro, 1.0));
        assert!(close(m.f1_micro, 1.0));
        assert!(close(m.jaccard_mean, 1.0));
        assert!(close(m.exact_match_rate, 1.0));
    }

    #[test]
    fn date_list_miss_outside_tolerance() {
        let m = date_list(&[json!(["2020-01-01"])], &[json!(["2020-01-20"])], 10);
        assert_eq!(m.true_positives, 0);
        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.false_positives, 1);
        assert!(close(m.f1_micro, 0.0));
        assert!(close(m.jaccard_mean, 0.0));
    }

    #[test]
    fn date_list_greedy_takes_closest() {
        let d = |s: &str| crate::models::calendar_date(s).unwrap();
        let gt = [d("2020-01-10"), d("2020-01-12")];
        let pred = [d("2020-01-01"), d("2020-01-11"), d("2020-03-01")];
        // First gt date takes 01-11 (delta 1), second falls back to 01-01 (delta 11).
        assert_eq!(match_dates(&gt, &pred, 30), 2);
        assert_eq!(match_dates(&gt, &pred, 5), 1);
    }

    #[test]
    fn date_list_all_empty_record_is_exact() {
        let m = date_list(&[json!([])], &[Value::Null], 30);
        assert!(close(m.jaccard_mean, 1.0));
        assert!(close(m.exact_match_rate, 1.0));
        assert!(close(m.f1_micro, 0.0), "no counts at all scores zero");
    }

    #[test]
    fn empty_input_scores_zero_with_no_support() {
        let m = date_list(&[], &[], 30);
        assert_eq!(m, DateListMetrics::default());
        assert_eq!(m.support, 0);
    }

    #[test]
    fn record_set_missing_prediction() {
        let gt = [json!([{"relationship": "father", "type": "breast"}])];
        let pred = [json!([])];
        let m = record_set(&gt, &pred, 0.75);
        assert!(close(m.jaccard_mean, 0.0));
        assert!(close(m.exact_match_rate, 0.0));
        // Positive ground truth, negative prediction: one false negative.
        assert!(close(m.f1_thresh, 0.0));
    }

    #[test]
    fn record_set_partial_overlap_against_threshold() {
        let gt = [json!([
            {"relationship": "father", "type": "breast"},
            {"relationship": "mother", "type": "lung"}
        ])];
        let pred = [json!([{"relationship": "father", "type": "breast"}])];
        let m = record_set(&gt, &pred, 0.5);
        assert!(close(m.jaccard_mean, 0.5));
        assert!(close(m.f1_thresh, 1.0));
        assert!(close(record_set(&gt, &pred, 0.75).f1_thresh, 0.0));
    }

    #[test]
    fn binary_treats_absent_as_false() {
        let m = binary(&[json!(true), Value::Null], &[json!(true), json!(false)]);
        assert!(close(m.accuracy, 1.0));
        assert!(close(m.f1, 1.0));
        assert_eq!(m.support, 2);
    }

    #[test]
    fn multiclass_averages_over_declared_labels() {
        let gt = [json!("uc"), json!("uc")];
        let pred = [json!("uc"), json!("uc")];
        let observed_only = classification(
            &["uc".to_string(), "uc".to_string()],
            &["uc".to_string(), "uc".to_string()],
            &BTreeSet::new(),
        );
        assert!(close(observed_only.f1, 1.0));

        // Unseen labels score 0 and pull the macro average down.
        let m = multiclass(&gt, &pred, &["cd", "uc", "ibdu"]);
        assert!(close(m.accuracy, 1.0));
        assert!(close(m.f1, 1.0 / 3.0));
    }

    #[test]
    fn date_tolerance_and_presence() {
        let gt = [json!("2020-01-01"), Value::Null, json!("2019"), json!("2021-06-01")];
        let pred = [json!("2020-01-25"), Value::Null, Value::Null, json!("2022-06-01")];
        let m = date(&gt, &pred, 30);
        assert!(close(m.accuracy_tol, 0.5), "match + both absent out of four");
        assert!(close(m.accuracy, 0.75), "presence agrees on three of four");
    }

    #[test]
    fn numeric_within_absolute_tolerance() {
        let m = numeric(&[json!(10), json!(3)], &[json!(12), json!(6)], 2.0);
        assert!(close(m.accuracy_tol, 0.5));
        assert!(close(m.accuracy, 1.0));
    }

    #[test]
    fn multi_label_empty_sets_are_perfect() {
        let space = ["breast", "lung"];
        let m = multi_label(&[json!([]), json!(["breast"])], &[Value::Null, json!(["breast"])], &space);
        assert!(close(m.jaccard_mean, 1.0));
        assert!(close(m.f1_micro, 1.0));
        // "lung" never appears on either side: zero-division scores 1.
        assert!(close(m.f1_macro, 1.0));
    }

    #[test]
    fn multi_label_ignores_labels_outside_space() {
        let m = multi_label(&[json!(["breast"])], &[json!(["breast", "made_up"])], &["breast"]);
        assert!(close(m.jaccard_mean, 1.0));
    }

    #[test]
    fn set_overlap_edge_cases() {
        let empty: BTreeSet<&str> = BTreeSet::new();
        let one = BTreeSet::from(["a"]);
        assert!(close(set_overlap(&empty, &empty), 1.0));
        assert!(close(set_overlap(&one, &empty), 0.0));
        assert!(close(set_overlap(&one, &one), 1.0));
    }
}
