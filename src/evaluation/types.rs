use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::EvaluationError;

/// Parallel ground-truth and predicted sequences for one variable, one
/// entry per evaluated patient. Values are raw JSON as read from the
/// reference file and the export; `null` means absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub ground_truth: Vec<Value>,
    pub predicted: Vec<Value>,
}

impl EvaluationRecord {
    pub fn new(ground_truth: Vec<Value>, predicted: Vec<Value>) -> Self {
        Self {
            ground_truth,
            predicted,
        }
    }

    pub fn len(&self) -> usize {
        self.ground_truth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ground_truth.is_empty()
    }
}

/// Evaluation input keyed by variable id.
pub type EvaluationSet = BTreeMap<String, EvaluationRecord>;

// ═══════════════════════════════════════════
// Metric families
// ═══════════════════════════════════════════

/// Macro-averaged classification scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Presence scored as a binary classification, plus the share of pairs
/// that agree within tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToleranceMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
    pub accuracy_tol: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiLabelMetrics {
    pub jaccard_mean: f64,
    pub f1_micro: f64,
    pub f1_macro: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSetMetrics {
    pub jaccard_mean: f64,
    pub exact_match_rate: f64,
    /// Binary F1 of "record matched" at the Jaccard threshold.
    pub f1_thresh: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateListMetrics {
    pub precision_micro: f64,
    pub recall_micro: f64,
    pub f1_micro: f64,
    pub jaccard_mean: f64,
    pub exact_match_rate: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub support: usize,
}

/// Metrics of one variable, tagged with the family that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum VariableMetrics {
    Binary(ClassificationMetrics),
    Multiclass(ClassificationMetrics),
    Date(ToleranceMetrics),
    Numeric(ToleranceMetrics),
    MultiLabel(MultiLabelMetrics),
    RecordSet(RecordSetMetrics),
    DateList(DateListMetrics),
}

impl VariableMetrics {
    pub fn family(&self) -> &'static str {
        match self {
            Self::Binary(_) => "binary",
            Self::Multiclass(_) => "multiclass",
            Self::Date(_) => "date",
            Self::Numeric(_) => "numeric",
            Self::MultiLabel(_) => "multi_label",
            Self::RecordSet(_) => "record_set",
            Self::DateList(_) => "date_list",
        }
    }

    pub fn support(&self) -> usize {
        match self {
            Self::Binary(m) | Self::Multiclass(m) => m.support,
            Self::Date(m) | Self::Numeric(m) => m.support,
            Self::MultiLabel(m) => m.support,
            Self::RecordSet(m) => m.support,
            Self::DateList(m) => m.support,
        }
    }
}

// ═══════════════════════════════════════════
// Reports
// ═══════════════════════════════════════════

/// A variable left out of a report, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedVariable {
    pub variable: String,
    pub reason: String,
}

impl SkippedVariable {
    pub fn new(variable: &str, error: &EvaluationError) -> Self {
        Self {
            variable: variable.to_string(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metrics: BTreeMap<String, VariableMetrics>,
    pub skipped: Vec<SkippedVariable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KappaReport {
    pub kappa: BTreeMap<String, f64>,
    pub skipped: Vec<SkippedVariable>,
}

/// Percentage agreement of one variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    /// In `[0, 1]`.
    pub value: f64,
    pub case_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgreementReport {
    pub agreement: BTreeMap<String, Agreement>,
    pub skipped: Vec<SkippedVariable>,
}
